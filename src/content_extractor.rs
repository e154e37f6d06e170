//! Candidate selection and the retry driver.
//!
//! [`grab_article`] runs the prepare → score → select → clean chain on a
//! fresh copy of the document. When the cleaned container is too short it
//! switches off one heuristic (see [`ParseFlags`]) and tries again.

use crate::constants::{
    ParseFlags, BYLINE_SCAN_NODES, MINIMUM_TOP_CANDIDATES, SHARED_CANDIDATE_RATIO,
    SIBLING_SCORE_RATIO,
};
use crate::dom::{Document, NodeId};
use crate::error::{ReadabilityError, Result};
use crate::options::ReadabilityOptions;
use crate::post_processor::{self, CleanOptions};
use crate::scoring::{self, ScoreTable};
use crate::{cleaner, dom_utils, utils};
use tracing::{debug, warn};
use url::Url;

/// Heuristics dropped between attempts, in order.
const RETRY_ORDER: [ParseFlags; 3] = [
    ParseFlags::STRIP_UNLIKELYS,
    ParseFlags::WEIGHT_CLASSES,
    ParseFlags::CLEAN_CONDITIONALLY,
];

/// Outcome of a successful extraction attempt.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// The attempt's copy of the document; `container` lives in it, detached
    /// from the root.
    pub document: Document,
    /// Synthetic `<div id="readability-page-1" class="page">`.
    pub container: NodeId,
    pub byline: Option<String>,
    pub dir: Option<String>,
    /// Text of the first `<h1>` of the container before cleaning.
    pub heading_title: Option<String>,
    /// Non-link characters of the cleaned container.
    pub text_length: usize,
    pub flags: ParseFlags,
    /// Nothing outranked `<body>`, so the whole body was cleaned with the
    /// relaxed link-density limit.
    pub used_body: bool,
    /// Cleaning emptied the container and the uncleaned copy was kept.
    pub uncleaned: bool,
}

/// What the engine already knows before extraction starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionHints<'a> {
    pub base_url: Option<&'a Url>,
    /// Title from document metadata, used to drop duplicated headings.
    pub title: Option<&'a str>,
    /// Look for an author line inside the content.
    pub find_byline: bool,
}

/// Extract the article container from `pristine`, retrying with looser
/// heuristics until the cleaned text reaches `char_threshold`.
pub fn grab_article(
    pristine: &Document,
    options: &ReadabilityOptions,
    hints: ExtractionHints<'_>,
) -> Result<ExtractedContent> {
    let mut flags = ParseFlags::default();
    let mut longest = 0usize;
    let mut steps = RETRY_ORDER.iter();

    loop {
        match try_extract(pristine.clone(), options, hints, flags) {
            Some(content) if content.text_length >= options.char_threshold => {
                if options.debug {
                    debug!(
                        flags = ?flags,
                        text_length = content.text_length,
                        "extraction attempt accepted"
                    );
                }
                return Ok(content);
            }
            Some(content) => {
                if options.debug {
                    debug!(
                        flags = ?flags,
                        text_length = content.text_length,
                        threshold = options.char_threshold,
                        "extraction attempt too short"
                    );
                }
                longest = longest.max(content.text_length);
            }
            None => {
                if options.debug {
                    debug!(flags = ?flags, "extraction attempt found no body");
                }
            }
        }

        match steps.next() {
            Some(flag) => flags.remove(*flag),
            None => break,
        }
    }

    if options.debug {
        debug!(longest, "no attempt reached the character threshold");
    }
    Err(ReadabilityError::NoContent)
}

fn try_extract(
    mut document: Document,
    options: &ReadabilityOptions,
    hints: ExtractionHints<'_>,
    flags: ParseFlags,
) -> Option<ExtractedContent> {
    cleaner::prep_document(&mut document, options, hints.base_url, flags);
    let body = document.body()?;

    let scores = scoring::score_paragraphs(&document, body, options, flags);
    let (top, used_body) = select_top_candidate(&document, &scores, options, body);
    if options.debug {
        debug!(
            tag = document.tag(top).unwrap_or(""),
            score = scores.score(top),
            used_body,
            "selected top candidate"
        );
    }

    let dir = dom_utils::get_article_direction(&document, top);
    let container = build_container(&mut document, top, &scores, used_body);
    let byline = if hints.find_byline {
        take_byline(&mut document, container)
    } else {
        None
    };
    let heading_title = first_heading_text(&document, container);

    let title = hints.title.map(str::to_string).or_else(|| heading_title.clone());
    let snapshot = document.clone();
    post_processor::prep_article(
        &mut document,
        container,
        &CleanOptions {
            options,
            base_url: hints.base_url,
            flags,
            conservative: used_body,
            title: title.as_deref(),
        },
    );

    let mut uncleaned = false;
    if dom_utils::text_length(&document, container) == 0
        && dom_utils::text_length(&snapshot, container) > 0
    {
        warn!("cleaning removed the whole article, keeping the uncleaned container");
        document = snapshot;
        uncleaned = true;
    }

    document.set_attr(container, "id", "readability-page-1");
    document.set_attr(container, "class", "page");

    let text_length = effective_text_length(&document, container);
    Some(ExtractedContent {
        document,
        container,
        byline,
        dir,
        heading_title,
        text_length,
        flags,
        used_body,
        uncleaned,
    })
}

/// Text length of `id` discounted by its link density.
pub fn effective_text_length(doc: &Document, id: NodeId) -> usize {
    let length = dom_utils::text_length(doc, id) as f64;
    (length * (1.0 - dom_utils::get_link_density(doc, id))).round() as usize
}

fn adjusted_score(doc: &Document, scores: &ScoreTable, id: NodeId, modifier: f64) -> f64 {
    scores.score(id) * (1.0 - dom_utils::get_link_density(doc, id) + modifier)
}

/// Best candidates ranked by link-density adjusted score, strongest first.
///
/// Equal scores keep document order.
pub fn rank_candidates(
    doc: &Document,
    scores: &ScoreTable,
    options: &ReadabilityOptions,
) -> Vec<(NodeId, f64)> {
    let mut ranked: Vec<(NodeId, f64)> = scores
        .nodes()
        .into_iter()
        .map(|id| (id, adjusted_score(doc, scores, id, options.link_density_modifier)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(options.nb_top_candidates.max(1));
    ranked
}

/// Pick the node whose subtree best represents the article.
///
/// Returns the node and whether it is `<body>`, in which case no structural
/// signal was found and cleaning runs conservatively.
pub fn select_top_candidate(
    doc: &Document,
    scores: &ScoreTable,
    options: &ReadabilityOptions,
    body: NodeId,
) -> (NodeId, bool) {
    let ranked = rank_candidates(doc, scores, options);
    let Some(&(first, _)) = ranked.first() else {
        return (body, true);
    };
    if first == body {
        return (body, true);
    }

    let top = match promote_shared_ancestor(doc, &ranked, body) {
        Some(ancestor) => ancestor,
        None => promote_parent(doc, scores, &ranked, first, body, options.link_density_modifier),
    };
    let top = promote_single_child_parents(doc, top, body);
    (top, top == body)
}

/// Several strong candidates living under one ancestor point at that
/// ancestor as the real article.
fn promote_shared_ancestor(doc: &Document, ranked: &[(NodeId, f64)], body: NodeId) -> Option<NodeId> {
    let &(top, top_score) = ranked.first()?;
    if top_score <= 0.0 {
        return None;
    }

    let alternatives: Vec<Vec<NodeId>> = ranked[1..]
        .iter()
        .filter(|(_, score)| score / top_score >= SHARED_CANDIDATE_RATIO)
        .map(|&(id, _)| doc.ancestors(id, None))
        .collect();
    if alternatives.len() < MINIMUM_TOP_CANDIDATES {
        return None;
    }

    let mut parent = doc.parent(top);
    while let Some(current) = parent {
        if current == body || !doc.is_element(current) {
            break;
        }
        let sharing = alternatives
            .iter()
            .filter(|ancestors| ancestors.contains(&current))
            .count();
        if sharing >= MINIMUM_TOP_CANDIDATES {
            return Some(current);
        }
        parent = doc.parent(current);
    }
    None
}

/// Move up to the parent when it is not itself ranked but scores at least as well.
fn promote_parent(
    doc: &Document,
    scores: &ScoreTable,
    ranked: &[(NodeId, f64)],
    top: NodeId,
    body: NodeId,
    modifier: f64,
) -> NodeId {
    let Some(parent) = doc
        .parent(top)
        .filter(|&parent| parent != body && doc.is_element(parent))
    else {
        return top;
    };

    if !scores.contains(parent) || ranked.iter().any(|&(id, _)| id == parent) {
        return top;
    }

    if adjusted_score(doc, scores, parent, modifier) >= adjusted_score(doc, scores, top, modifier) {
        parent
    } else {
        top
    }
}

/// Climb while the candidate is the only element child of its parent.
fn promote_single_child_parents(doc: &Document, mut top: NodeId, body: NodeId) -> NodeId {
    while let Some(parent) = doc.parent(top) {
        if parent == body || !doc.is_element(parent) || doc.element_children(parent).len() != 1 {
            break;
        }
        top = parent;
    }
    top
}

/// Gather the top candidate and its qualifying siblings in a fresh `<div>`.
pub fn build_container(
    doc: &mut Document,
    top: NodeId,
    scores: &ScoreTable,
    used_body: bool,
) -> NodeId {
    let container = doc.create_element("div");
    if used_body {
        doc.move_children(top, container);
        return container;
    }

    let Some(parent) = doc.parent(top) else {
        doc.append_child(container, top);
        return container;
    };

    let threshold = scores.score(top) * SIBLING_SCORE_RATIO;
    for sibling in doc.element_children(parent) {
        if sibling == top || is_good_sibling_paragraph(doc, scores, sibling, threshold) {
            doc.append_child(container, sibling);
        }
    }
    container
}

/// Paragraph siblings join the article when they score well on their own or
/// read like a continuation of the prose.
fn is_good_sibling_paragraph(
    doc: &Document,
    scores: &ScoreTable,
    sibling: NodeId,
    threshold: f64,
) -> bool {
    if !doc.is_tag(sibling, "p") {
        return false;
    }

    if let Some(score) = scores.get(sibling) {
        if threshold > 0.0 && score >= threshold {
            return true;
        }
    }

    let text = dom_utils::get_inner_text(doc, sibling, true);
    let length = utils::char_count(&text);
    let link_density = dom_utils::get_link_density(doc, sibling);

    if length > 80 {
        link_density < 0.25
    } else {
        length > 0 && link_density == 0.0 && utils::has_sentence_end(&text)
    }
}

/// Remove and return the first author line near the top of the container.
fn take_byline(doc: &mut Document, container: NodeId) -> Option<String> {
    let nodes: Vec<NodeId> = doc
        .descendant_elements(container)
        .into_iter()
        .take(BYLINE_SCAN_NODES)
        .collect();

    for node in nodes {
        if !dom_utils::is_probably_visible(doc, node) {
            continue;
        }
        let match_string = doc.class_and_id(node);
        if !scoring::is_valid_byline(doc, node, &match_string) {
            continue;
        }
        if let Some(byline) = utils::clean_byline_text(&dom_utils::get_inner_text(doc, node, true)) {
            doc.detach(node);
            return Some(byline);
        }
    }
    None
}

fn first_heading_text(doc: &Document, container: NodeId) -> Option<String> {
    doc.elements_by_tag(container, &["h1"])
        .into_iter()
        .map(|h1| dom_utils::get_inner_text(doc, h1, true))
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence {i} adds a little more, and then some more prose to the story."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.descendant_elements(doc.root())
            .into_iter()
            .find(|&n| doc.attr(n, "id") == Some(id))
            .unwrap()
    }

    fn hints() -> ExtractionHints<'static> {
        ExtractionHints {
            find_byline: true,
            ..ExtractionHints::default()
        }
    }

    #[test]
    fn test_grab_article_picks_the_story() {
        let html = format!(
            r#"<html><body>
                <div id="menu"><a href="/">Home</a> <a href="/news">News</a></div>
                <div id="story" class="post">
                    <p>{}</p><p>{}</p><p>{}</p>
                </div>
                <div class="sidebar"><p>Sidebar links and teasers</p></div>
            </body></html>"#,
            prose(3),
            prose(3),
            prose(2)
        );
        let doc = Document::parse(&html);
        let content = grab_article(&doc, &ReadabilityOptions::default(), hints()).unwrap();

        let text = content.document.text_content(content.container);
        assert!(text.contains("Sentence 0"));
        assert!(!text.contains("Sidebar"));
        assert!(!text.contains("Home"));
        assert!(content.text_length >= 500);
        assert_eq!(content.flags, ParseFlags::all());
        assert_eq!(content.document.attr(content.container, "id"), Some("readability-page-1"));
        assert_eq!(content.document.attr(content.container, "class"), Some("page"));
    }

    #[test]
    fn test_falls_back_to_body_without_scores() {
        let doc = Document::parse("<p>short</p><p>tiny</p>");
        let body = doc.body().unwrap();
        let scores = ScoreTable::new();
        let (top, used_body) =
            select_top_candidate(&doc, &scores, &ReadabilityOptions::default(), body);
        assert_eq!(top, body);
        assert!(used_body);
    }

    #[test]
    fn test_candidates_are_ranked_by_adjusted_score() {
        let long = "x".repeat(150);
        let doc = Document::parse(&format!(
            r#"<div id="links"><p><a href="/a">{long}</a></p></div><div id="prose"><p>{long}</p></div>"#
        ));
        let body = doc.body().unwrap();
        let options = ReadabilityOptions::default();
        let scores = scoring::score_paragraphs(&doc, body, &options, ParseFlags::all());
        let ranked = rank_candidates(&doc, &scores, &options);
        assert_eq!(ranked[0].0, by_id(&doc, "prose"));
        assert!(ranked.len() <= options.nb_top_candidates);
    }

    #[test]
    fn test_sibling_paragraphs_join_the_container() {
        let long = prose(4);
        let mut doc = Document::parse(&format!(
            r#"<div id="parent">
                 <div id="main"><p>{long}</p><p>{long}</p></div>
                 <p id="tail">{}</p>
                 <p id="short">A closing thought.</p>
                 <p id="nav"><a href="/x">Next story</a></p>
                 <ul id="list"><li>one</li></ul>
               </div>"#,
            prose(2)
        ));
        let body = doc.body().unwrap();
        let scores = scoring::score_paragraphs(&doc, body, &ReadabilityOptions::default(), ParseFlags::all());
        let main = by_id(&doc, "main");
        let container = build_container(&mut doc, main, &scores, false);

        let kept: Vec<_> = doc
            .element_children(container)
            .into_iter()
            .filter_map(|id| doc.attr(id, "id").map(str::to_string))
            .collect();
        assert_eq!(kept, ["main", "tail", "short"]);
    }

    #[test]
    fn test_single_child_parent_is_promoted() {
        let doc = Document::parse(&format!(
            r#"<div id="wrap"><div id="inner"><p>{}</p></div></div><p>other</p>"#,
            prose(3)
        ));
        let body = doc.body().unwrap();
        let inner = by_id(&doc, "inner");
        assert_eq!(promote_single_child_parents(&doc, inner, body), by_id(&doc, "wrap"));
    }

    #[test]
    fn test_shared_ancestor_is_promoted() {
        let p = prose(2);
        let doc = Document::parse(&format!(
            r#"<div id="article">
                 <div id="a"><p>{p}</p></div><div id="b"><p>{p}</p></div>
                 <div id="c"><p>{p}</p></div><div id="d"><p>{p}</p></div>
               </div>"#
        ));
        let body = doc.body().unwrap();
        let options = ReadabilityOptions::builder().nb_top_candidates(10).build();
        let mut scores = ScoreTable::new();
        for (id, score) in [("a", 10.0), ("b", 9.0), ("c", 9.0), ("d", 8.0)] {
            scores.set(by_id(&doc, id), score);
        }
        let (top, used_body) = select_top_candidate(&doc, &scores, &options, body);
        assert_eq!(top, by_id(&doc, "article"));
        assert!(!used_body);
    }

    #[test]
    fn test_byline_is_taken_from_content() {
        let html = format!(
            r#"<article><p class="byline">By Jane Roe</p><p>{}</p><p>{}</p></article>"#,
            prose(4),
            prose(4)
        );
        let doc = Document::parse(&html);
        let content = grab_article(&doc, &ReadabilityOptions::default(), hints()).unwrap();
        assert_eq!(content.byline.as_deref(), Some("Jane Roe"));
        assert!(!content.document.text_content(content.container).contains("Jane Roe"));
    }

    #[test]
    fn test_retry_recovers_content_in_unlikely_wrapper() {
        let paragraphs: String = (0..8)
            .map(|i| format!("<p>Paragraph {i} is a reasonably long piece of prose that keeps going.</p>"))
            .collect();
        let doc = Document::parse(&format!(r#"<div class="social">{paragraphs}</div>"#));
        let content = grab_article(&doc, &ReadabilityOptions::default(), hints()).unwrap();
        assert!(!content.flags.contains(ParseFlags::STRIP_UNLIKELYS));
        assert!(content.document.text_content(content.container).contains("Paragraph 7"));
    }

    #[test]
    fn test_emptied_container_falls_back_to_uncleaned_copy() {
        let doc = Document::parse(&format!(
            "<html><body><form><div><p>{}</p><p>{}</p><p>{}</p></div></form></body></html>",
            prose(4),
            prose(4),
            prose(4)
        ));
        let content = grab_article(&doc, &ReadabilityOptions::default(), hints()).unwrap();

        assert!(content.uncleaned);
        assert!(!content.used_body);
        assert_eq!(content.flags, ParseFlags::all());
        assert_eq!(content.document.elements_by_tag(content.container, &["form"]).len(), 1);
        assert!(content.document.text_content(content.container).contains("Sentence 3"));
        assert_eq!(content.document.attr(content.container, "id"), Some("readability-page-1"));
    }

    #[test]
    fn test_unscored_page_cleans_body_with_relaxed_link_limit() {
        // Every block is under the scoring minimum, so no candidate exists.
        let doc = Document::parse(
            r#"<html><body>
                <p>Morning notes.</p>
                <p>The tide came in early.</p>
                <div>See <a href="/tides">tide tables</a> here</div>
                <div>Go <a href="/a">home</a> <a href="/b">to the archive</a></div>
            </body></html>"#,
        );
        let options = ReadabilityOptions::builder().char_threshold(20).build();
        let content = grab_article(&doc, &options, hints()).unwrap();
        let text = content.document.text_content(content.container);

        assert!(content.used_body);
        assert!(!content.uncleaned);
        assert_eq!(content.flags, ParseFlags::all());
        assert!(text.contains("The tide came in early."));
        // 11 of 20 characters are link text: over 0.5, under 0.75
        assert!(text.contains("tide tables"));
        assert!(!text.contains("archive"));
    }

    #[test]
    fn test_all_link_document_has_no_content() {
        let doc = Document::parse(&format!(r#"<a href="/everything"><p>{}</p></a>"#, prose(10)));
        let err = grab_article(&doc, &ReadabilityOptions::default(), hints()).unwrap_err();
        assert!(matches!(err, ReadabilityError::NoContent));
    }
}
