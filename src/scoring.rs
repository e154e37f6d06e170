//! Content scoring for paragraphs and their ancestors.
//!
//! Scores live in a [`ScoreTable`] next to the arena instead of on the nodes,
//! so the scorer is a pure function of the tree and the parse flags.

use crate::constants::{
    tag_weight, ParseFlags, MIN_CONTENT_LENGTH, NEGATIVE_CLASS_FACTOR, POSITIVE_CLASS_FACTOR,
    REGEXPS, SCORE_ANCESTOR_DEPTH,
};
use crate::dom::{Document, NodeId};
use crate::dom_utils;
use crate::options::ReadabilityOptions;
use crate::utils;
use std::collections::HashMap;
use tracing::debug;

/// Content scores keyed by node.
///
/// A node enters the table the first time the scorer visits it, starting from
/// its tag weight. Presence in the table is the "scored" flag.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    scores: HashMap<NodeId, f64>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.scores.get(&id).copied()
    }

    /// Score of `id`, zero when it was never visited.
    pub fn score(&self, id: NodeId) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.scores.contains_key(&id)
    }

    pub fn set(&mut self, id: NodeId, score: f64) {
        self.scores.insert(id, score);
    }

    pub fn add(&mut self, id: NodeId, delta: f64) {
        *self.scores.entry(id).or_insert(0.0) += delta;
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scored nodes in ascending id order, which is document order for an
    /// untouched parse.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.scores.keys().copied().collect();
        nodes.sort();
        nodes
    }
}

/// Multiplier derived from the class/id of `id`.
///
/// Positive names win over negative ones when both match. Returns `1.0`
/// when class weighting is switched off for this attempt.
pub fn get_class_factor(doc: &Document, id: NodeId, flags: ParseFlags) -> f64 {
    if !flags.contains(ParseFlags::WEIGHT_CLASSES) {
        return 1.0;
    }

    let match_string = doc.class_and_id(id);
    if match_string.trim().is_empty() {
        return 1.0;
    }

    if REGEXPS.positive.is_match(&match_string) {
        POSITIVE_CLASS_FACTOR
    } else if REGEXPS.negative.is_match(&match_string) {
        NEGATIVE_CLASS_FACTOR
    } else {
        1.0
    }
}

/// Starting score of a node, taken from the per-tag weight table.
pub fn initialize_node_score(doc: &Document, id: NodeId) -> f64 {
    doc.tag(id).map(tag_weight).unwrap_or(0.0)
}

/// Score contributed by one content-bearing node.
///
/// `None` when its text is too short or reads like comment-area boilerplate.
/// Otherwise one point, plus one per comma, plus one per hundred characters
/// up to three.
pub fn calculate_content_score(doc: &Document, id: NodeId) -> Option<f64> {
    let text = dom_utils::get_inner_text(doc, id, true);
    let length = utils::char_count(&text);
    if length < MIN_CONTENT_LENGTH || REGEXPS.boilerplate.is_match(&text) {
        return None;
    }

    let commas = utils::comma_count(&text) as f64;
    let length_bonus = ((length / 100) as f64).min(3.0);
    Some(1.0 + commas + length_bonus)
}

/// Share of a content score given to the ancestor `level` steps up
/// (0 is the parent).
pub fn ancestor_divider(level: usize) -> f64 {
    match level {
        0 => 1.0,
        1 => 2.0,
        level => 2.0 * (level - 1) as f64,
    }
}

/// Score every content-bearing node under `root` and propagate to ancestors.
pub fn score_paragraphs(
    doc: &Document,
    root: NodeId,
    options: &ReadabilityOptions,
    flags: ParseFlags,
) -> ScoreTable {
    let mut table = ScoreTable::new();
    let mut bearing = 0usize;

    for node in doc.descendant_elements(root) {
        let Some(tag) = doc.tag(node) else {
            continue;
        };
        if !options.is_tag_to_score(tag) {
            continue;
        }

        let Some(content_score) = calculate_content_score(doc, node) else {
            continue;
        };

        let ancestors: Vec<NodeId> = doc
            .ancestors(node, Some(SCORE_ANCESTOR_DEPTH))
            .into_iter()
            .filter(|&ancestor| !doc.is_tag(ancestor, "html"))
            .collect();
        if ancestors.is_empty() {
            continue;
        }

        bearing += 1;
        if !table.contains(node) {
            table.set(node, initialize_node_score(doc, node) + content_score);
        }

        for (level, ancestor) in ancestors.into_iter().enumerate() {
            if !table.contains(ancestor) {
                table.set(ancestor, initialize_node_score(doc, ancestor));
            }
            table.add(ancestor, content_score / ancestor_divider(level));
        }
    }

    for node in table.nodes() {
        let factor = get_class_factor(doc, node, flags);
        if factor != 1.0 {
            table.set(node, table.score(node) * factor);
        }
    }

    if options.debug {
        debug!(bearing, scored = table.len(), "scored content-bearing nodes");
    }

    table
}

/// Check if an element looks like an author line.
///
/// It must carry `rel="author"`, an `itemprop` mentioning author, or a
/// byline-like class/id, and hold between 1 and 99 characters of text.
pub fn is_valid_byline(doc: &Document, id: NodeId, match_string: &str) -> bool {
    let rel = doc.attr(id, "rel").unwrap_or("");
    let itemprop = doc.attr(id, "itemprop").unwrap_or("");
    let byline_length = utils::char_count(&dom_utils::get_inner_text(doc, id, true));

    (rel == "author" || itemprop.contains("author") || REGEXPS.byline.is_match(match_string))
        && byline_length > 0
        && byline_length < 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.descendant_elements(doc.root())
            .into_iter()
            .find(|&n| doc.attr(n, "id") == Some(id))
            .unwrap()
    }

    #[test]
    fn test_get_class_factor() {
        let doc = Document::parse(
            r#"<div id="a" class="article content">x</div>
               <div id="b" class="sidebar">x</div>
               <div id="c" class="post-comments">x</div>
               <div id="d">x</div>"#,
        );
        let flags = ParseFlags::WEIGHT_CLASSES;
        assert_eq!(get_class_factor(&doc, by_id(&doc, "a"), flags), 1.25);
        assert_eq!(get_class_factor(&doc, by_id(&doc, "b"), flags), 0.8);
        assert_eq!(get_class_factor(&doc, by_id(&doc, "c"), flags), 1.25);
        assert_eq!(get_class_factor(&doc, by_id(&doc, "d"), flags), 1.0);
        assert_eq!(
            get_class_factor(&doc, by_id(&doc, "b"), ParseFlags::STRIP_UNLIKELYS),
            1.0
        );
    }

    #[test]
    fn test_initialize_node_score() {
        let doc = Document::parse("<div id=d><ul id=u><li id=l>x</li></ul></div><h1 id=h>t</h1>");
        assert_eq!(initialize_node_score(&doc, by_id(&doc, "d")), 5.0);
        assert_eq!(initialize_node_score(&doc, by_id(&doc, "u")), -3.0);
        assert_eq!(initialize_node_score(&doc, by_id(&doc, "l")), -3.0);
        assert_eq!(initialize_node_score(&doc, by_id(&doc, "h")), -5.0);
    }

    #[test]
    fn test_calculate_content_score() {
        let text = format!("{}, and more, and more", "a".repeat(230));
        let doc = Document::parse(&format!("<p id=p>{text}</p><p id=s>Short</p>"));
        assert_eq!(calculate_content_score(&doc, by_id(&doc, "p")), Some(1.0 + 2.0 + 2.0));
        assert_eq!(calculate_content_score(&doc, by_id(&doc, "s")), None);
    }

    #[test]
    fn test_length_bonus_is_capped() {
        let doc = Document::parse(&format!("<p id=p>{}</p>", "word ".repeat(200)));
        assert_eq!(calculate_content_score(&doc, by_id(&doc, "p")), Some(4.0));
    }

    #[test]
    fn test_boilerplate_is_not_content() {
        let doc = Document::parse("<p id=p>Leave a comment below and tell us what you think</p>");
        assert_eq!(calculate_content_score(&doc, by_id(&doc, "p")), None);
    }

    #[test]
    fn test_ancestor_dividers() {
        assert_eq!(ancestor_divider(0), 1.0);
        assert_eq!(ancestor_divider(1), 2.0);
        assert_eq!(ancestor_divider(2), 2.0);
        assert_eq!(ancestor_divider(3), 4.0);
        assert_eq!(ancestor_divider(4), 6.0);
    }

    #[test]
    fn test_score_propagation() {
        // 150 chars, no commas: content score 1 + 1 = 2
        let text = "x".repeat(150);
        let doc = Document::parse(&format!(
            "<article id=s><div id=outer><div id=inner><p id=p>{text}</p></div></div></article>"
        ));
        let body = doc.body().unwrap();
        let table = score_paragraphs(&doc, body, &ReadabilityOptions::default(), ParseFlags::empty());

        assert_eq!(table.get(by_id(&doc, "p")), Some(2.0));
        assert_eq!(table.get(by_id(&doc, "inner")), Some(5.0 + 2.0));
        assert_eq!(table.get(by_id(&doc, "outer")), Some(5.0 + 1.0));
        assert_eq!(table.get(by_id(&doc, "s")), Some(0.0 + 1.0));
        assert_eq!(table.get(body), Some(0.5));
        assert!(!table.contains(doc.document_element().unwrap()));
    }

    #[test]
    fn test_ancestor_initialized_once() {
        let text = "y".repeat(150);
        let doc = Document::parse(&format!("<div id=d><p>{text}</p><p>{text}</p></div>"));
        let body = doc.body().unwrap();
        let table = score_paragraphs(&doc, body, &ReadabilityOptions::default(), ParseFlags::empty());
        assert_eq!(table.get(by_id(&doc, "d")), Some(5.0 + 2.0 + 2.0));
    }

    #[test]
    fn test_class_factor_scales_accumulated_score() {
        let text = "z".repeat(150);
        let doc = Document::parse(&format!(
            r#"<div id=good class="entry-content"><p>{text}</p></div>
               <div id=bad class="widget"><p>{text}</p></div>"#
        ));
        let body = doc.body().unwrap();
        let table = score_paragraphs(&doc, body, &ReadabilityOptions::default(), ParseFlags::all());
        assert_eq!(table.get(by_id(&doc, "good")), Some(7.0 * 1.25));
        assert!((table.score(by_id(&doc, "bad")) - 7.0 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_is_valid_byline() {
        let doc = Document::parse(
            r#"<span id=a rel="author">Jane Doe</span>
               <div id=b class="byline">By John</div>
               <div id=c class="byline"></div>
               <p id=d>Not an author</p>"#,
        );
        for (id, expected) in [("a", true), ("b", true), ("c", false), ("d", false)] {
            let node = by_id(&doc, id);
            assert_eq!(is_valid_byline(&doc, node, &doc.class_and_id(node)), expected, "{id}");
        }
    }
}
