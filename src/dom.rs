//! Index arena holding the parsed document.
//!
//! `html5ever` tokenizes and builds an `RcDom`; that tree is flattened once
//! into [`Document`], where every node lives in a `Vec` and relations are
//! stored as [`NodeId`] indices. Candidates and best-node references are
//! plain ids, so nothing but the arena owns a node.

use crate::constants::{NON_CONTENT_TAGS, VOID_ELEMENTS};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// Position of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable HTML tree. Detached nodes stay in the arena but are unreachable
/// from [`Document::root`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse an HTML string.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self::from_rcdom(&dom)
    }

    fn from_rcdom(dom: &RcDom) -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        };

        let root = doc.root();
        let mut stack: Vec<(Handle, NodeId)> = dom
            .document
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), root))
            .collect();

        while let Some((handle, parent)) = stack.pop() {
            let data = match &handle.data {
                RcNodeData::Element { name, attrs, .. } => NodeData::Element(ElementData {
                    tag: name.local.to_string().to_ascii_lowercase(),
                    attrs: attrs
                        .borrow()
                        .iter()
                        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                        .collect(),
                }),
                RcNodeData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
                RcNodeData::Comment { contents } => NodeData::Comment(contents.to_string()),
                _ => continue,
            };

            let id = doc.push(data);
            doc.append_child(parent, id);

            for child in handle.children.borrow().iter().rev() {
                stack.push((child.clone(), id));
            }
        }

        doc
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).into_iter().next()
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|&id| self.is_tag(id, "body"))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        self.text(id).map(|t| t.trim().is_empty()).unwrap_or(false)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|element| element.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn retain_attrs<F>(&mut self, id: NodeId, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(key, value)| keep(key, value));
        }
    }

    /// `class` and `id` joined by a space, the string matched by the class/id heuristics.
    pub fn class_and_id(&self, id: NodeId) -> String {
        format!(
            "{} {}",
            self.attr(id, "class").unwrap_or(""),
            self.attr(id, "id").unwrap_or("")
        )
    }

    pub fn rename(&mut self, id: NodeId, tag: &str) {
        if let Some(element) = self.element_mut(id) {
            element.tag = tag.to_string();
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    fn sibling_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.sibling_index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Every node below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is_element(node))
            .collect()
    }

    /// Descendant elements whose tag is in `tags`, in document order.
    pub fn elements_by_tag(&self, id: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.tag(node).map(|t| tags.contains(&t)).unwrap_or(false))
            .collect()
    }

    /// Element ancestors from the parent upward, at most `max_depth` of them.
    pub fn ancestors(&self, id: NodeId, max_depth: Option<usize>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if !self.is_element(parent) {
                break;
            }
            out.push(parent);
            if max_depth.map(|max| out.len() >= max).unwrap_or(false) {
                break;
            }
            current = self.parent(parent);
        }
        out
    }

    pub fn has_ancestor_tag(&self, id: NodeId, tag: &str, max_depth: Option<usize>) -> bool {
        self.ancestors(id, max_depth)
            .into_iter()
            .any(|ancestor| self.is_tag(ancestor, tag))
    }

    /// True when `node` is `ancestor` or sits below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True while the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    pub fn count_elements(&self, id: NodeId) -> usize {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is_element(node))
            .count()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        self.detach(node);
        let Some((parent, index)) = self.sibling_index(reference) else {
            return;
        };
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, node);
    }

    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if self.parent(old).is_none() {
            return;
        }
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Replace `id` by its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        for child in self.children(id).to_vec() {
            self.insert_before(id, child);
        }
        self.detach(id);
    }

    /// Move every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from).to_vec() {
            self.append_child(to, child);
        }
    }

    /// Concatenated text below `id`, skipping script-like subtrees.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
            return out;
        }
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            match self.data(current) {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element(element) => {
                    if NON_CONTENT_TAGS.contains(&element.tag.as_str()) {
                        continue;
                    }
                    stack.extend(self.children(current).iter().rev().copied());
                }
                _ => {}
            }
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(id, true, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(id, false, &mut out);
        out
    }

    fn serialize_into(&self, id: NodeId, include_self: bool, out: &mut String) {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut stack = Vec::new();
        if include_self {
            stack.push(Step::Open(id));
        } else {
            stack.extend(self.children(id).iter().rev().map(|&c| Step::Open(c)));
        }

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(node) => match self.data(node) {
                    NodeData::Element(element) => {
                        out.push('<');
                        out.push_str(&element.tag);
                        for (name, value) in &element.attrs {
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            escape_into(value, true, out);
                            out.push('"');
                        }
                        out.push('>');
                        if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                            continue;
                        }
                        stack.push(Step::Close(node));
                        stack.extend(self.children(node).iter().rev().map(|&c| Step::Open(c)));
                    }
                    NodeData::Text(text) => {
                        let raw = self
                            .parent(node)
                            .and_then(|p| self.tag(p))
                            .map(|t| matches!(t, "script" | "style"))
                            .unwrap_or(false);
                        if raw {
                            out.push_str(text);
                        } else {
                            escape_into(text, false, out);
                        }
                    }
                    NodeData::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                    }
                    NodeData::Document => {
                        stack.extend(self.children(node).iter().rev().map(|&c| Step::Open(c)));
                    }
                },
                Step::Close(node) => {
                    if let Some(tag) = self.tag(node) {
                        out.push_str("</");
                        out.push_str(tag);
                        out.push('>');
                    }
                }
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_html_head_body() {
        let doc = Document::parse("<p>Hello</p>");
        let html = doc.document_element().unwrap();
        assert!(doc.is_tag(html, "html"));
        let body = doc.body().unwrap();
        let p = doc.element_children(body)[0];
        assert!(doc.is_tag(p, "p"));
        assert_eq!(doc.text_content(p), "Hello");
    }

    #[test]
    fn test_mutation_keeps_tree_consistent() {
        let mut doc = Document::parse("<div id=a><span>one</span><span>two</span></div>");
        let body = doc.body().unwrap();
        let div = doc.element_children(body)[0];
        let spans = doc.element_children(div);

        doc.detach(spans[0]);
        assert!(!doc.is_attached(spans[0]));
        assert_eq!(doc.text_content(div), "two");

        let p = doc.create_element("p");
        doc.replace(spans[1], p);
        doc.append_child(p, spans[1]);
        assert_eq!(doc.inner_html(div), "<p><span>two</span></p>");

        doc.unwrap(p);
        assert_eq!(doc.outer_html(div), "<div id=\"a\"><span>two</span></div>");
    }

    #[test]
    fn test_sibling_navigation() {
        let doc = Document::parse("<ul><li>a</li> <li>b</li> <li>c</li></ul>");
        let body = doc.body().unwrap();
        let ul = doc.element_children(body)[0];
        let items = doc.element_children(ul);
        assert_eq!(doc.next_sibling(items[2]), None);
        assert!(doc.next_sibling(items[0]).map(|n| doc.is_whitespace_text(n)).unwrap());
    }

    #[test]
    fn test_serialization_escapes_text_and_attributes() {
        let doc = Document::parse(r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; <br>x</p>"#);
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; <br>x</p>"#
        );
    }

    #[test]
    fn test_text_content_skips_scripts() {
        let doc = Document::parse("<p>visible<script>var hidden = 1;</script></p>");
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "visible");
    }

    #[test]
    fn test_ancestors_are_bounded() {
        let doc = Document::parse("<div><section><article><p>deep</p></article></section></div>");
        let p = doc.elements_by_tag(doc.root(), &["p"])[0];
        let all = doc.ancestors(p, None);
        let tags: Vec<_> = all.iter().filter_map(|&a| doc.tag(a)).collect();
        assert_eq!(tags, ["article", "section", "div", "body", "html"]);
        assert_eq!(doc.ancestors(p, Some(2)).len(), 2);
    }
}
