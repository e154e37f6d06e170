//! Document preparation before scoring.
//!
//! [`prep_document`] strips subtrees that can never be article content,
//! drops clutter by tag/class/id when it holds no substantial text, and
//! normalizes markup so that prose ends up in scoreable `<p>` elements.
//! Running it twice on the same tree is a no-op.

use crate::constants::{
    ParseFlags, LAZY_IMAGE_ATTRIBUTES, NON_CONTENT_TAGS, REGEXPS, UNLIKELY_ROLES, UNLIKELY_TAGS,
    UNLIKELY_TEXT_BLOCK_LENGTH,
};
use crate::dom::{Document, NodeData, NodeId};
use crate::dom_utils;
use crate::options::ReadabilityOptions;
use crate::utils;
use tracing::debug;
use url::Url;

/// Prepare `doc` for scoring.
pub fn prep_document(
    doc: &mut Document,
    options: &ReadabilityOptions,
    base_url: Option<&Url>,
    flags: ParseFlags,
) {
    let removed = remove_non_content(doc);
    let hidden = remove_hidden(doc);
    let unlikely = if flags.contains(ParseFlags::STRIP_UNLIKELYS) {
        strip_unlikely_candidates(doc)
    } else {
        0
    };

    normalize_tags(doc);
    if let Some(body) = doc.body() {
        replace_brs(doc, body);
    }
    normalize_containers(doc);
    fix_lazy_images(doc, base_url);

    if options.debug {
        debug!(
            removed,
            hidden, unlikely, "prepared document for scoring"
        );
    }
}

/// Remove scripts, styles, templates, link elements and comments.
pub fn remove_non_content(doc: &mut Document) -> usize {
    let doomed: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&id| match doc.data(id) {
            NodeData::Comment(_) => true,
            NodeData::Element(element) => NON_CONTENT_TAGS.contains(&element.tag.as_str()),
            _ => false,
        })
        .collect();

    let count = doomed.len();
    for id in doomed {
        doc.detach(id);
    }
    count
}

fn remove_hidden(doc: &mut Document) -> usize {
    let Some(body) = doc.body() else {
        return 0;
    };

    let mut count = 0;
    for id in doc.descendant_elements(body) {
        if doc.is_attached(id) && !dom_utils::is_probably_visible(doc, id) {
            doc.detach(id);
            count += 1;
        }
    }
    count
}

/// Whether the tag, role or class/id of `id` marks it as page furniture.
pub fn is_unlikely_candidate(doc: &Document, id: NodeId) -> bool {
    let Some(tag) = doc.tag(id) else {
        return false;
    };
    if matches!(tag, "html" | "body" | "a" | "article" | "main") {
        return false;
    }

    if UNLIKELY_TAGS.contains(&tag) {
        return true;
    }

    if doc
        .attr(id, "role")
        .map(|role| UNLIKELY_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
    {
        return true;
    }

    let match_string = doc.class_and_id(id);
    REGEXPS.unlikely_candidates.is_match(&match_string)
        && !REGEXPS.ok_maybe_its_a_candidate.is_match(&match_string)
}

/// Drop unlikely candidates unless they hold a substantial block of text.
fn strip_unlikely_candidates(doc: &mut Document) -> usize {
    let Some(body) = doc.body() else {
        return 0;
    };

    let mut count = 0;
    for id in doc.descendant_elements(body) {
        if !doc.is_attached(id) || !is_unlikely_candidate(doc, id) {
            continue;
        }
        if doc.has_ancestor_tag(id, "table", None) || doc.has_ancestor_tag(id, "code", None) {
            continue;
        }
        if dom_utils::longest_text_block(doc, id) >= UNLIKELY_TEXT_BLOCK_LENGTH {
            continue;
        }
        doc.detach(id);
        count += 1;
    }
    count
}

/// Swap presentational or role-only tags for neutral equivalents.
fn normalize_tags(doc: &mut Document) {
    let Some(body) = doc.body() else {
        return;
    };

    for id in doc.descendant_elements(body) {
        match doc.tag(id) {
            Some("font") => doc.rename(id, "span"),
            Some("center") => doc.rename(id, "div"),
            Some(_) if doc
                .attr(id, "role")
                .map(|role| role.eq_ignore_ascii_case("paragraph"))
                .unwrap_or(false) =>
            {
                doc.rename(id, "p");
                doc.remove_attr(id, "role");
            }
            _ => {}
        }
    }
}

/// Skip whitespace-only text nodes starting at `node`.
fn next_non_whitespace(doc: &Document, mut node: Option<NodeId>) -> Option<NodeId> {
    while let Some(id) = node {
        if !doc.is_whitespace_text(id) {
            return Some(id);
        }
        node = doc.next_sibling(id);
    }
    None
}

fn is_whitespace_node(doc: &Document, id: NodeId) -> bool {
    doc.is_whitespace_text(id) || doc.is_tag(id, "br")
}

/// Turn runs of two or more `<br>` into paragraph boundaries.
///
/// `<div>foo<br>bar<br> <br><br>abc</div>` becomes
/// `<div>foo<br>bar<p>abc</p></div>`.
pub fn replace_brs(doc: &mut Document, root: NodeId) {
    for br in doc.elements_by_tag(root, &["br"]) {
        if !doc.is_attached(br) {
            continue;
        }

        let mut replaced = false;
        let mut next = next_non_whitespace(doc, doc.next_sibling(br));
        while let Some(candidate) = next.filter(|&n| doc.is_tag(n, "br")) {
            replaced = true;
            let after = doc.next_sibling(candidate);
            doc.detach(candidate);
            next = next_non_whitespace(doc, after);
        }

        if !replaced {
            continue;
        }

        let p = doc.create_element("p");
        doc.replace(br, p);

        let mut next = doc.next_sibling(p);
        while let Some(sibling) = next {
            if doc.is_tag(sibling, "br") {
                let following = next_non_whitespace(doc, doc.next_sibling(sibling));
                if following.map(|f| doc.is_tag(f, "br")).unwrap_or(false) {
                    break;
                }
            }
            if !dom_utils::is_phrasing_content(doc, sibling) {
                break;
            }
            next = doc.next_sibling(sibling);
            doc.append_child(p, sibling);
        }

        while let Some(&first) = doc.children(p).first() {
            if !doc.is_whitespace_text(first) {
                break;
            }
            doc.detach(first);
        }
        while let Some(&last) = doc.children(p).last() {
            if !is_whitespace_node(doc, last) {
                break;
            }
            doc.detach(last);
        }

        if let Some(parent) = doc.parent(p) {
            if doc.is_tag(parent, "p") {
                doc.rename(parent, "div");
            }
        }
    }
}

/// Collapse wrapper chains, turn text-only `<div>`s into paragraphs and wrap
/// loose phrasing content of block containers in `<p>`.
fn normalize_containers(doc: &mut Document) {
    let Some(body) = doc.body() else {
        return;
    };

    for id in doc.elements_by_tag(body, &["span"]) {
        if !doc.is_attached(id) {
            continue;
        }
        if dom_utils::has_single_tag_inside(doc, id, "span") {
            collapse_wrapper(doc, id);
        }
    }

    for id in doc.elements_by_tag(body, &["div", "section", "header", "h1", "h2", "h3", "h4", "h5", "h6"]) {
        if doc.is_attached(id) && dom_utils::is_element_without_content(doc, id) {
            doc.detach(id);
        }
    }

    for id in doc.elements_by_tag(body, &["div"]) {
        if !doc.is_attached(id) || !doc.is_tag(id, "div") {
            continue;
        }

        if dom_utils::has_single_tag_inside(doc, id, "p")
            && dom_utils::get_link_density(doc, id) < 0.25
        {
            let child = doc.element_children(id)[0];
            if has_identity(doc, id) && !has_identity(doc, child) {
                copy_identity(doc, id, child);
            }
            doc.replace(id, child);
            continue;
        }

        if dom_utils::has_single_tag_inside(doc, id, "div") {
            collapse_wrapper(doc, id);
            continue;
        }

        if !dom_utils::has_child_block_element(doc, id) {
            doc.rename(id, "p");
            continue;
        }

        wrap_phrasing_runs(doc, id);
    }

    for id in std::iter::once(body).chain(doc.elements_by_tag(body, &["section", "article", "main"])) {
        if doc.is_attached(id) && dom_utils::has_child_block_element(doc, id) {
            wrap_phrasing_runs(doc, id);
        }
    }
}

fn has_identity(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "class").is_some() || doc.attr(id, "id").is_some()
}

fn copy_identity(doc: &mut Document, from: NodeId, to: NodeId) {
    for name in ["class", "id"] {
        if let Some(value) = doc.attr(from, name).map(str::to_string) {
            doc.set_attr(to, name, &value);
        }
    }
}

/// Merge a wrapper with its single element child, keeping whichever carries
/// a class/id.
fn collapse_wrapper(doc: &mut Document, wrapper: NodeId) {
    let child = doc.element_children(wrapper)[0];
    match (has_identity(doc, wrapper), has_identity(doc, child)) {
        (false, _) => doc.replace(wrapper, child),
        (true, false) => doc.unwrap(child),
        (true, true) => {}
    }
}

/// Wrap consecutive phrasing children of `container` carrying text in `<p>`.
fn wrap_phrasing_runs(doc: &mut Document, container: NodeId) {
    let mut paragraph: Option<NodeId> = None;

    for child in doc.children(container).to_vec() {
        if dom_utils::is_phrasing_content(doc, child) {
            match paragraph {
                Some(p) => doc.append_child(p, child),
                None if is_whitespace_node(doc, child) => {}
                None => {
                    let p = doc.create_element("p");
                    doc.insert_before(child, p);
                    doc.append_child(p, child);
                    paragraph = Some(p);
                }
            }
        } else if let Some(p) = paragraph.take() {
            trim_trailing_whitespace(doc, p);
        }
    }

    if let Some(p) = paragraph {
        trim_trailing_whitespace(doc, p);
    }
}

fn trim_trailing_whitespace(doc: &mut Document, p: NodeId) {
    while let Some(&last) = doc.children(p).last() {
        if !is_whitespace_node(doc, last) {
            break;
        }
        let parent_of_p = doc.parent(p);
        doc.detach(last);
        if let Some(parent) = parent_of_p {
            if let Some(next) = doc.next_sibling(p) {
                doc.insert_before(next, last);
            } else {
                doc.append_child(parent, last);
            }
        }
    }
}

fn is_tiny_placeholder(src: &str) -> bool {
    let Some(prefix) = REGEXPS.b64_data_url.find(src) else {
        return false;
    };
    if src[..prefix.end()].to_ascii_lowercase().contains("image/svg+xml") {
        return false;
    }
    src.len() - prefix.end() < 133
}

/// Move lazily loaded image URLs into `src`/`srcset` and make them absolute.
pub fn fix_lazy_images(doc: &mut Document, base_url: Option<&Url>) {
    let Some(body) = doc.body() else {
        return;
    };

    for id in doc.elements_by_tag(body, &["img", "picture", "source", "figure"]) {
        let src = doc.attr(id, "src").map(str::to_string);
        if src.as_deref().map(is_tiny_placeholder).unwrap_or(false) {
            doc.remove_attr(id, "src");
        }

        let has_src = doc.attr(id, "src").map(|s| !s.trim().is_empty()).unwrap_or(false);
        let has_srcset = doc
            .attr(id, "srcset")
            .map(|s| !s.trim().is_empty() && s != "null")
            .unwrap_or(false);
        let looks_lazy = doc
            .attr(id, "class")
            .map(|c| c.to_ascii_lowercase().contains("lazy"))
            .unwrap_or(false);

        if (has_src || has_srcset) && !looks_lazy {
            resolve_image_attributes(doc, id, base_url);
            continue;
        }

        let mut found: Vec<(&'static str, String)> = Vec::new();
        for name in LAZY_IMAGE_ATTRIBUTES {
            if let Some(value) = doc.attr(id, name).filter(|v| !v.trim().is_empty()) {
                let target = if name.ends_with("srcset") { "srcset" } else { "src" };
                if !found.iter().any(|(t, _)| *t == target) {
                    found.push((target, value.trim().to_string()));
                }
            }
        }

        if found.is_empty() {
            for (name, value) in doc.attrs(id) {
                if matches!(name.as_str(), "src" | "srcset" | "alt") {
                    continue;
                }
                let target = if REGEXPS.lazy_image_srcset.is_match(value) {
                    "srcset"
                } else if REGEXPS.lazy_image_src.is_match(value) {
                    "src"
                } else {
                    continue;
                };
                if !found.iter().any(|(t, _)| *t == target) {
                    found.push((target, value.trim().to_string()));
                }
            }
        }

        if found.is_empty() {
            resolve_image_attributes(doc, id, base_url);
            continue;
        }

        let target_node = if doc.is_tag(id, "figure") {
            if !doc.elements_by_tag(id, &["img", "picture"]).is_empty() {
                continue;
            }
            let img = doc.create_element("img");
            doc.append_child(id, img);
            img
        } else {
            id
        };

        for (attribute, value) in found {
            doc.set_attr(target_node, attribute, &value);
        }
        resolve_image_attributes(doc, target_node, base_url);
    }
}

fn resolve_image_attributes(doc: &mut Document, id: NodeId, base_url: Option<&Url>) {
    let Some(base) = base_url else {
        return;
    };
    if let Some(src) = doc.attr(id, "src").map(str::to_string) {
        doc.set_attr(id, "src", &utils::to_absolute_uri(&src, base));
    }
    if let Some(srcset) = doc.attr(id, "srcset").map(str::to_string) {
        doc.set_attr(id, "srcset", &utils::to_absolute_srcset(&srcset, base));
    }
}
