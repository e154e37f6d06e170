//! Cleanup of the selected article container.
//!
//! Rules run in a fixed order: structural removals first, then density based
//! ones, then link/URL fixes, and attributes are stripped last so every
//! earlier rule can still look at class and id.

use crate::constants::{
    ParseFlags, ATTRIBUTE_WHITELIST, BODY_LINK_DENSITY_LIMIT, CLEAN_CONDITIONALLY_TAGS,
    HARD_BLOCK_TAGS, LINK_DENSITY_LIMIT, LINK_DENSITY_TEXT_LIMIT, MEDIA_TAGS, REGEXPS,
    VOID_ELEMENTS,
};
use crate::dom::{Document, NodeId};
use crate::options::ReadabilityOptions;
use crate::{dom_utils, scoring, utils};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Per-attempt settings for [`prep_article`].
#[derive(Debug, Clone, Copy)]
pub struct CleanOptions<'a> {
    pub options: &'a ReadabilityOptions,
    pub base_url: Option<&'a Url>,
    pub flags: ParseFlags,
    /// The container is the whole `<body>`; density limits are relaxed.
    pub conservative: bool,
    /// Headings repeating this text are dropped.
    pub title: Option<&'a str>,
}

/// Clean `container` in place.
pub fn prep_article(doc: &mut Document, container: NodeId, clean: &CleanOptions<'_>) {
    let options = clean.options;
    let data_tables = mark_data_tables(doc, container);

    if let Some(title) = clean.title {
        remove_title_headings(doc, container, title);
    }
    let blocked = remove_hard_blocked(doc, container, options);
    let shared = remove_share_elements(doc, container, options.char_threshold);

    let mut cluttered = HashSet::new();
    if clean.flags.contains(ParseFlags::CLEAN_CONDITIONALLY) {
        clean_conditionally(doc, container, &data_tables, clean, &mut cluttered);
        remove_lone_images(doc, container, &cluttered);
    }
    clean_headers(doc, container, clean.flags);

    for h1 in doc.elements_by_tag(container, &["h1"]) {
        doc.rename(h1, "h2");
    }

    fix_javascript_links(doc, container);
    if let Some(base) = clean.base_url {
        fix_relative_uris(doc, container, base);
    }
    unwrap_single_cell_tables(doc, container);
    remove_br_before_paragraphs(doc, container);
    remove_empty_elements(doc, container);

    if !options.keep_classes {
        clean_attributes(doc, container, &options.classes_to_preserve);
    }

    if options.debug {
        debug!(
            blocked,
            shared,
            cluttered = cluttered.len(),
            "cleaned article container"
        );
    }
}

fn in_container(doc: &Document, container: NodeId, id: NodeId) -> bool {
    id != container && doc.contains(container, id)
}

/// Tables that hold data rather than layout.
pub fn mark_data_tables(doc: &Document, container: NodeId) -> HashSet<NodeId> {
    doc.elements_by_tag(container, &["table"])
        .into_iter()
        .filter(|&table| is_data_table(doc, table))
        .collect()
}

fn is_data_table(doc: &Document, table: NodeId) -> bool {
    if doc.attr(table, "role") == Some("presentation") || doc.attr(table, "datatable") == Some("0") {
        return false;
    }
    if doc.attr(table, "summary").is_some() {
        return true;
    }
    if doc
        .elements_by_tag(table, &["caption"])
        .into_iter()
        .any(|caption| !doc.children(caption).is_empty())
    {
        return true;
    }
    if !doc
        .elements_by_tag(table, &["col", "colgroup", "tfoot", "thead", "th"])
        .is_empty()
    {
        return true;
    }
    if !doc.elements_by_tag(table, &["table"]).is_empty() {
        return false;
    }

    let rows = doc.elements_by_tag(table, &["tr"]);
    let columns = rows
        .iter()
        .map(|&row| doc.elements_by_tag(row, &["td", "th"]).len())
        .max()
        .unwrap_or(0);
    rows.len() >= 10 || columns > 4 || rows.len() * columns > 10
}

fn remove_title_headings(doc: &mut Document, container: NodeId, title: &str) {
    let title = utils::normalize_whitespace(title).to_lowercase();
    if title.is_empty() {
        return;
    }
    for heading in doc.elements_by_tag(container, &["h1", "h2"]) {
        let text = dom_utils::get_inner_text(doc, heading, true).to_lowercase();
        if text == title {
            doc.detach(heading);
        }
    }
}

fn preserves_class(doc: &Document, id: NodeId, preserved: &[String]) -> bool {
    doc.attr(id, "class")
        .map(|class| {
            class
                .split_whitespace()
                .any(|name| preserved.iter().any(|keep| keep == name))
        })
        .unwrap_or(false)
}

/// Forms, embeds and widgets. Embeds pointing at an allowed video host stay.
fn remove_hard_blocked(doc: &mut Document, container: NodeId, options: &ReadabilityOptions) -> usize {
    let mut count = 0;
    for id in doc.elements_by_tag(container, HARD_BLOCK_TAGS) {
        if !in_container(doc, container, id) {
            continue;
        }
        if preserves_class(doc, id, &options.classes_to_preserve) {
            continue;
        }
        if matches!(doc.tag(id), Some("object" | "embed" | "iframe")) && is_allowed_embed(doc, id, options) {
            continue;
        }
        doc.detach(id);
        count += 1;
    }
    count
}

fn is_allowed_embed(doc: &Document, id: NodeId, options: &ReadabilityOptions) -> bool {
    if doc
        .attrs(id)
        .iter()
        .any(|(_, value)| options.is_allowed_video(value))
    {
        return true;
    }
    doc.is_tag(id, "object") && options.is_allowed_video(&doc.inner_html(id))
}

/// Share widgets below the top level of the container.
fn remove_share_elements(doc: &mut Document, container: NodeId, threshold: usize) -> usize {
    let mut count = 0;
    for child in doc.element_children(container) {
        for id in doc.descendant_elements(child) {
            if !in_container(doc, container, id) {
                continue;
            }
            if REGEXPS.share_elements.is_match(&doc.class_and_id(id))
                && dom_utils::text_length(doc, id) < threshold
            {
                doc.detach(id);
                count += 1;
            }
        }
    }
    count
}

/// Density based removal, bottom-up. Parents that lost a child are recorded
/// in `cluttered`.
fn clean_conditionally(
    doc: &mut Document,
    container: NodeId,
    data_tables: &HashSet<NodeId>,
    clean: &CleanOptions<'_>,
    cluttered: &mut HashSet<NodeId>,
) {
    let link_limit = if clean.conservative {
        BODY_LINK_DENSITY_LIMIT
    } else {
        LINK_DENSITY_LIMIT
    } + clean.options.link_density_modifier;

    let mut nodes = doc.elements_by_tag(container, CLEAN_CONDITIONALLY_TAGS);
    nodes.reverse();

    for id in nodes {
        if !in_container(doc, container, id) {
            continue;
        }
        if data_tables.contains(&id)
            || doc
                .ancestors(id, None)
                .into_iter()
                .take_while(|&ancestor| ancestor != container)
                .any(|ancestor| {
                    data_tables.contains(&ancestor)
                        || doc.is_tag(ancestor, "code")
                        || doc.is_tag(ancestor, "pre")
                })
        {
            continue;
        }

        if is_clutter(doc, id, clean, link_limit) {
            if let Some(parent) = doc.parent(id) {
                cluttered.insert(parent);
            }
            doc.detach(id);
        }
    }
}

fn is_clutter(doc: &Document, id: NodeId, clean: &CleanOptions<'_>, link_limit: f64) -> bool {
    let text_length = dom_utils::text_length(doc, id);
    let link_density = dom_utils::get_link_density(doc, id);

    if link_density > link_limit && text_length < LINK_DENSITY_TEXT_LIMIT {
        return true;
    }

    if scoring::get_class_factor(doc, id, clean.flags) < 1.0 && text_length < LINK_DENSITY_TEXT_LIMIT {
        return true;
    }

    let inputs = dom_utils::count_tags(doc, id, "input");
    let paragraphs = dom_utils::count_tags(doc, id, "p");
    inputs > 0 && inputs * 3 > paragraphs
}

fn media_count(doc: &Document, id: NodeId) -> usize {
    doc.elements_by_tag(id, MEDIA_TAGS).len()
}

/// Image-only wrappers next to removed clutter are clutter too.
///
/// Parents are visited in document order, so an outer parent removes a nested
/// one before the nested one is looked at.
fn remove_lone_images(doc: &mut Document, container: NodeId, cluttered: &HashSet<NodeId>) {
    let parents: Vec<NodeId> = std::iter::once(container)
        .chain(doc.descendant_elements(container))
        .filter(|parent| cluttered.contains(parent))
        .collect();

    for parent in parents {
        if !doc.contains(container, parent) {
            continue;
        }
        for child in doc.element_children(parent) {
            if doc.is_tag(child, "img") {
                continue;
            }
            let images = dom_utils::count_tags(doc, child, "img");
            if images == 1
                && media_count(doc, child) == 1
                && doc.text_content(child).trim().is_empty()
            {
                doc.detach(child);
            }
        }
    }
}

/// Headings whose class/id reads as clutter.
fn clean_headers(doc: &mut Document, container: NodeId, flags: ParseFlags) {
    for heading in doc.elements_by_tag(container, &["h1", "h2", "h3", "h4", "h5", "h6"]) {
        if scoring::get_class_factor(doc, heading, flags) < 1.0 {
            doc.detach(heading);
        }
    }
}

fn fix_javascript_links(doc: &mut Document, container: NodeId) {
    for link in doc.elements_by_tag(container, &["a"]) {
        let is_script = doc
            .attr(link, "href")
            .map(|href| href.trim_start().to_ascii_lowercase().starts_with("javascript:"))
            .unwrap_or(false);
        if !is_script {
            continue;
        }

        let children = doc.children(link).to_vec();
        if children.len() == 1 && doc.is_text(children[0]) {
            let text = doc.text_content(link);
            let node = doc.create_text(&text);
            doc.replace(link, node);
        } else {
            let span = doc.create_element("span");
            doc.move_children(link, span);
            doc.replace(link, span);
        }
    }
}

/// Resolve links and media sources against the page URL.
pub fn fix_relative_uris(doc: &mut Document, container: NodeId, base: &Url) {
    for id in doc.descendant_elements(container) {
        for name in ["href", "src", "poster"] {
            if let Some(value) = doc.attr(id, name).map(str::to_string) {
                doc.set_attr(id, name, &utils::to_absolute_uri(&value, base));
            }
        }
        if let Some(srcset) = doc.attr(id, "srcset").map(str::to_string) {
            doc.set_attr(id, "srcset", &utils::to_absolute_srcset(&srcset, base));
        }
    }
}

/// Layout tables with one cell become the cell's content.
fn unwrap_single_cell_tables(doc: &mut Document, container: NodeId) {
    for table in doc.elements_by_tag(container, &["table"]) {
        if !in_container(doc, container, table) {
            continue;
        }
        let rows = doc.elements_by_tag(table, &["tr"]);
        let cells = doc.elements_by_tag(table, &["td", "th"]);
        if rows.len() != 1 || cells.len() != 1 {
            continue;
        }

        let cell = cells[0];
        let inline = doc
            .children(cell)
            .iter()
            .all(|&child| dom_utils::is_phrasing_content(doc, child));
        doc.rename(cell, if inline { "p" } else { "div" });
        doc.retain_attrs(cell, |_, _| false);
        doc.replace(table, cell);
    }
}

fn remove_br_before_paragraphs(doc: &mut Document, container: NodeId) {
    for br in doc.elements_by_tag(container, &["br"]) {
        let mut next = doc.next_sibling(br);
        while let Some(sibling) = next.filter(|&s| doc.is_whitespace_text(s)) {
            next = doc.next_sibling(sibling);
        }
        if next.map(|n| doc.is_tag(n, "p")).unwrap_or(false) {
            doc.detach(br);
        }
    }
}

/// Drop elements left without text or media, innermost first.
fn remove_empty_elements(doc: &mut Document, container: NodeId) {
    let mut elements = doc.descendant_elements(container);
    elements.reverse();

    for id in elements {
        let Some(tag) = doc.tag(id) else {
            continue;
        };
        if VOID_ELEMENTS.contains(&tag) || MEDIA_TAGS.contains(&tag) || matches!(tag, "td" | "th") {
            continue;
        }
        if !doc.text_content(id).trim().is_empty() || media_count(doc, id) > 0 {
            continue;
        }
        if doc
            .descendant_elements(id)
            .into_iter()
            .any(|child| matches!(doc.tag(child), Some("td" | "th" | "hr")))
        {
            continue;
        }
        doc.detach(id);
    }
}

/// Keep whitelisted attributes and preserved class names only.
pub fn clean_attributes(doc: &mut Document, container: NodeId, preserved: &[String]) {
    for id in doc.descendant_elements(container) {
        let classes: Vec<String> = doc
            .attr(id, "class")
            .map(|class| {
                class
                    .split_whitespace()
                    .filter(|name| preserved.iter().any(|keep| keep == name))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        doc.retain_attrs(id, |name, _| ATTRIBUTE_WHITELIST.contains(&name));
        if !classes.is_empty() {
            doc.set_attr(id, "class", &classes.join(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn clean_with(html: &str, options: &ReadabilityOptions, conservative: bool, title: Option<&str>) -> String {
        let mut doc = Document::parse(html);
        let body = doc.body().unwrap();
        let base = Url::parse("https://example.com/news/story").unwrap();
        prep_article(
            &mut doc,
            body,
            &CleanOptions {
                options,
                base_url: Some(&base),
                flags: ParseFlags::all(),
                conservative,
                title,
            },
        );
        doc.inner_html(body)
    }

    fn clean(html: &str) -> String {
        clean_with(html, &ReadabilityOptions::default(), false, None)
    }

    #[test]
    fn test_hard_blocked_tags_are_removed() {
        let html = clean(
            r#"<div><p>Text</p><form><input></form><button>Go</button>
               <iframe src="https://www.youtube.com/embed/abc"></iframe>
               <iframe src="https://ads.example.net/frame"></iframe></div>"#,
        );
        assert!(!html.contains("<form"));
        assert!(!html.contains("<button"));
        assert!(html.contains("youtube.com/embed/abc"));
        assert!(!html.contains("ads.example.net"));
    }

    #[test]
    fn test_custom_video_pattern() {
        let options = ReadabilityOptions::builder()
            .allowed_video_regex(Regex::new(r"videos\.example\.org").unwrap())
            .build();
        let html = clean_with(
            r#"<p>Text</p><iframe src="https://videos.example.org/v/1"></iframe>
               <iframe src="https://www.youtube.com/embed/abc"></iframe>"#,
            &options,
            false,
            None,
        );
        assert!(html.contains("videos.example.org"));
        assert!(!html.contains("youtube"));
    }

    #[test]
    fn test_link_dense_blocks() {
        let glossary: String = (0..40)
            .map(|i| format!(r#"<a href="/term/{i}">glossary term {i}</a> "#))
            .collect();
        let html = clean(&format!(
            r#"<p>Real prose stays in place.</p>
               <p><a href="/a">Home</a> <a href="/b">About</a></p>
               <div>{glossary}</div>"#
        ));
        assert!(html.contains("Real prose"));
        assert!(!html.contains("About"));
        assert!(html.contains("glossary term 39"));
    }

    #[test]
    fn test_conservative_cleaning_tolerates_more_links() {
        let block = r#"<div>Some words <a href="/x">and a link here</a></div>"#;
        assert!(!clean(block).contains("Some words"));
        assert!(clean_with(block, &ReadabilityOptions::default(), true, None).contains("Some words"));
    }

    #[test]
    fn test_data_tables_are_exempt() {
        let html = clean(
            r#"<table><thead><tr><th>Name</th></tr></thead>
               <tbody><tr><td><a href="/a">Alpha</a></td></tr></tbody></table>"#,
        );
        assert!(html.contains("Alpha"));
    }

    #[test]
    fn test_lone_images() {
        let html = clean(
            r#"<div><div class="promo-box"><a href="/buy">Buy now</a></div>
               <div><img src="/ad.png"></div><p>Story text.</p></div>
               <figure><img src="/lead.jpg"></figure>"#,
        );
        assert!(!html.contains("ad.png"));
        assert!(html.contains("https://example.com/lead.jpg"));
    }

    #[test]
    fn test_nested_lone_images_clean_the_same_every_time() {
        let html = concat!(
            r#"<div><div class="promo"><a>Buy now</a></div>"#,
            r#"<div><div class="promo"><a>Buy this</a></div><div><img src="/i.png"></div><hr></div>"#,
            r#"<p>Story text.</p></div>"#,
        );

        for _ in 0..50 {
            assert_eq!(clean(html), "<div><p>Story text.</p></div>");
        }
    }

    #[test]
    fn test_share_blocks_are_removed() {
        let html = clean(r#"<div><p>Story text.</p><div class="share">Share this</div></div>"#);
        assert!(!html.contains("Share this"));
        assert!(html.contains("Story text."));
    }

    #[test]
    fn test_headings() {
        let html = clean_with(
            r#"<h1>My Title</h1><h1>Section</h1><h3 class="comments-title">Comments</h3><p>Body.</p>"#,
            &ReadabilityOptions::default(),
            false,
            Some("My  title"),
        );
        assert_eq!(html, "<h2>Section</h2><p>Body.</p>");
    }

    #[test]
    fn test_links_and_uris() {
        let html = clean(
            r##"<p>Plenty of ordinary prose surrounds these links in the paragraph. <a href="javascript:void(0)">Click</a> <a href="../other">rel</a> <a href="#n">n</a>
               <img src="pic.png" srcset="a.png 1x, b.png 2x"></p><video poster="/p.jpg"></video>"##,
        );
        assert!(html.contains("paragraph. Click "));
        assert!(html.contains(r#"href="https://example.com/other""#));
        assert!(html.contains(r##"href="#n""##));
        assert!(html.contains(r#"src="https://example.com/news/pic.png""#));
        assert!(html.contains("https://example.com/news/a.png 1x, https://example.com/news/b.png 2x"));
        assert!(html.contains(r#"poster="https://example.com/p.jpg""#));
    }

    #[test]
    fn test_single_cell_table_is_unwrapped() {
        let html = clean(r#"<table><tr><td>Just <b>text</b></td></tr></table>"#);
        assert_eq!(html, "<p>Just <b>text</b></p>");
    }

    #[test]
    fn test_empty_elements_are_removed() {
        let html = clean(r#"<div><p> </p><span></span><p>Keep<br></p><p><img src="/i.png"></p></div><hr>"#);
        assert_eq!(
            html,
            r#"<div><p>Keep<br></p><p><img src="https://example.com/i.png"></p></div><hr>"#
        );
    }

    #[test]
    fn test_attribute_whitelist() {
        let html = clean(
            r#"<p class="page intro" id="x" style="color:red" data-track="1"><a href="/a" title="t" onclick="x()">a link in text that is long enough</a> and more words around the link to keep it</p>"#,
        );
        assert_eq!(
            html,
            r#"<p class="page"><a href="https://example.com/a" title="t">a link in text that is long enough</a> and more words around the link to keep it</p>"#
        );
    }

    #[test]
    fn test_keep_classes_keeps_attributes() {
        let options = ReadabilityOptions::builder().keep_classes(true).build();
        let html = clean_with(r#"<p class="intro" data-x="1">Text</p>"#, &options, false, None);
        assert_eq!(html, r#"<p class="intro" data-x="1">Text</p>"#);
    }
}
