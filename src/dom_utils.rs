//! Text metrics and structural predicates over the [`Document`] arena.

use crate::constants::{DIV_TO_P_ELEMS, PHRASING_ELEMS, REGEXPS};
use crate::dom::{Document, NodeId};
use crate::utils;

/// Text below `id`, trimmed, optionally with whitespace runs collapsed.
pub fn get_inner_text(doc: &Document, id: NodeId, normalize_spaces: bool) -> String {
    let text = doc.text_content(id);
    if normalize_spaces {
        utils::normalize_whitespace(&text)
    } else {
        text.trim().to_string()
    }
}

/// Character length of the normalized inner text.
pub fn text_length(doc: &Document, id: NodeId) -> usize {
    utils::char_count(&get_inner_text(doc, id, true))
}

/// Ratio of anchor text to all text below `id`, within `[0, 1]`.
///
/// Fragment links (`href="#..."`) only count for 30 % of their length since
/// they are usually footnotes or tables of contents rather than navigation.
/// Everything inside an anchor is link text.
pub fn get_link_density(doc: &Document, id: NodeId) -> f64 {
    let total = text_length(doc, id);
    if total == 0 {
        return 0.0;
    }

    if doc.is_tag(id, "a") || doc.has_ancestor_tag(id, "a", None) {
        return 1.0;
    }

    let link_length: f64 = doc
        .elements_by_tag(id, &["a"])
        .into_iter()
        .map(|link| {
            let coefficient = match doc.attr(link, "href") {
                Some(href) if href.trim_start().starts_with('#') && href.trim().len() > 1 => 0.3,
                _ => 1.0,
            };
            text_length(doc, link) as f64 * coefficient
        })
        .sum();

    (link_length / total as f64).clamp(0.0, 1.0)
}

/// Hidden via the `hidden` attribute, inline style or `aria-hidden`.
pub fn is_probably_visible(doc: &Document, id: NodeId) -> bool {
    if doc
        .attr(id, "style")
        .map(|style| REGEXPS.hidden_style.is_match(style))
        .unwrap_or(false)
    {
        return false;
    }

    if doc.attr(id, "hidden").is_some() {
        return false;
    }

    let aria_hidden = doc
        .attr(id, "aria-hidden")
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let fallback_image = doc
        .attr(id, "class")
        .map(|class| class.contains("fallback-image"))
        .unwrap_or(false);

    !aria_hidden || fallback_image
}

/// True if any descendant is a block-level element.
pub fn has_child_block_element(doc: &Document, id: NodeId) -> bool {
    doc.descendant_elements(id).into_iter().any(|node| {
        doc.tag(node)
            .map(|tag| DIV_TO_P_ELEMS.contains(&tag))
            .unwrap_or(false)
    })
}

/// True when `id` holds exactly one element child with `tag` and no text of its own.
pub fn has_single_tag_inside(doc: &Document, id: NodeId, tag: &str) -> bool {
    let children = doc.element_children(id);
    if children.len() != 1 || !doc.is_tag(children[0], tag) {
        return false;
    }

    !doc
        .children(id)
        .iter()
        .any(|&child| doc.text(child).map(|t| !t.trim().is_empty()).unwrap_or(false))
}

/// No text and no children other than `<br>`/`<hr>`.
pub fn is_element_without_content(doc: &Document, id: NodeId) -> bool {
    if !doc.is_element(id) || !doc.text_content(id).trim().is_empty() {
        return false;
    }

    doc.element_children(id)
        .into_iter()
        .all(|child| doc.is_tag(child, "br") || doc.is_tag(child, "hr"))
}

/// Text nodes and inline elements that may live inside a paragraph.
pub fn is_phrasing_content(doc: &Document, id: NodeId) -> bool {
    if doc.is_text(id) {
        return true;
    }

    match doc.tag(id) {
        Some(tag) if PHRASING_ELEMS.contains(&tag) && !matches!(tag, "a" | "del" | "ins") => true,
        Some("a" | "del" | "ins") => doc
            .children(id)
            .iter()
            .all(|&child| is_phrasing_content(doc, child)),
        _ => false,
    }
}

/// Length of the longest single block of text below `id`.
pub fn longest_text_block(doc: &Document, id: NodeId) -> usize {
    let mut longest = 0;
    for node in doc.descendants(id) {
        let length = match doc.tag(node) {
            Some("p" | "pre" | "blockquote" | "li" | "td") => text_length(doc, node),
            Some(_) => continue,
            None => doc
                .text(node)
                .map(|t| utils::char_count(&utils::normalize_whitespace(t)))
                .unwrap_or(0),
        };
        longest = longest.max(length);
    }
    longest
}

/// The `dir` attribute of `id` or its nearest ancestor carrying one.
pub fn get_article_direction(doc: &Document, id: NodeId) -> Option<String> {
    std::iter::once(id)
        .chain(doc.ancestors(id, None))
        .find_map(|node| doc.attr(node, "dir"))
        .map(|dir| dir.trim().to_string())
        .filter(|dir| !dir.is_empty())
}

/// Element descendants carrying `tag`.
pub fn count_tags(doc: &Document, id: NodeId, tag: &str) -> usize {
    doc.elements_by_tag(id, &[tag]).len()
}
