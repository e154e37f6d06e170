//! Quick readability check without full parsing.
//!
//! This module provides the [`is_probably_readerable`] function, which performs
//! a fast pre-flight check to determine if a document is likely to have extractable
//! article content without doing a full parse.
//!
//! ## Use Case
//!
//! Use this function to quickly filter out pages that are unlikely to contain article
//! content, saving the cost of a full parse:
//!
//! ```rust
//! use readable_core::{is_probably_readerable, Readability};
//!
//! let html = "<html>...</html>";
//!
//! // Quick check first
//! if is_probably_readerable(html, None) {
//!     // Do full parse
//!     let readability = Readability::new(html, None, None).unwrap();
//!     if let Ok(article) = readability.parse() {
//!         println!("Article extracted!");
//!     }
//! } else {
//!     println!("Not an article page, skipping parse");
//! }
//! ```
//!
//! ## Performance
//!
//! The check never mutates the tree and never scores ancestors. It only sums
//! the text length of visible paragraph-like nodes until a threshold is met.

use crate::cleaner;
use crate::constants::MIN_CONTENT_LENGTH;
use crate::dom::{Document, NodeId};
use crate::options::ReadabilityOptions;
use crate::{dom_utils, utils};
use std::io::Read;

/// Options for the readability pre-flight check.
///
/// Controls the thresholds used by [`is_probably_readerable`] to determine
/// if a document is likely to be parseable.
///
/// ## Example
///
/// ```rust
/// use readable_core::{is_probably_readerable, ReaderableOptions};
///
/// let html = "<html>...</html>";
///
/// let options = ReaderableOptions {
///     min_content_length: 50,
///     min_score: 300.0,
///     ..ReaderableOptions::default()
/// };
///
/// let is_readerable = is_probably_readerable(html, Some(options));
/// ```
#[derive(Debug, Clone)]
pub struct ReaderableOptions {
    /// Minimum text length for a node to count at all.
    ///
    /// Default: `25`
    pub min_content_length: usize,

    /// Characters of qualifying text needed to call the page readerable.
    ///
    /// Default: `140.0`
    pub min_score: f64,

    /// Stop after looking at this many elements and report the page as
    /// readerable. `0` scans the whole document.
    ///
    /// Default: `0`
    pub max_nodes_to_scan: usize,
}

impl Default for ReaderableOptions {
    fn default() -> Self {
        Self {
            min_content_length: MIN_CONTENT_LENGTH,
            min_score: 140.0,
            max_nodes_to_scan: 0,
        }
    }
}

impl ReaderableOptions {
    /// Thresholds matching a full parse with `options`.
    ///
    /// A parse accepts articles of `char_threshold` characters, so the
    /// precheck never asks for more than that.
    pub fn for_parse(options: &ReadabilityOptions) -> Self {
        let defaults = Self::default();
        Self {
            min_content_length: defaults.min_content_length.min(options.char_threshold),
            min_score: defaults.min_score.min(options.char_threshold as f64),
            ..defaults
        }
    }
}

/// Quick check to determine if a document is likely to be readerable.
///
/// This function performs a fast analysis to predict whether full article extraction
/// is likely to succeed, without doing the expensive full parse. It looks for basic
/// content signals like paragraphs with sufficient text.
///
/// ## Arguments
///
/// * `html` - The HTML document to check
/// * `options` - Optional custom thresholds (uses defaults if `None`)
///
/// ## Returns
///
/// `true` if the document likely contains extractable article content, `false` otherwise.
///
/// ## Example
///
/// ```rust
/// use readable_core::is_probably_readerable;
///
/// let article_html = r#"
///     <html><body>
///         <article>
///             <p>This is a substantial paragraph with enough content to indicate
///             that this page likely contains article text that can be extracted.</p>
///             <p>Here's another paragraph with more content to increase the score.</p>
///         </article>
///     </body></html>
/// "#;
///
/// assert!(is_probably_readerable(article_html, None));
///
/// let non_article_html = "<html><body><p>Short</p></body></html>";
/// assert!(!is_probably_readerable(non_article_html, None));
/// ```
///
/// ## Algorithm
///
/// Every visible `<p>`, `<pre>`, `<article>` (when it has no paragraphs of
/// its own) and `<div>` holding `<br>` line breaks is a candidate. Candidates
/// with a clutter-like class/id, or nested in a list item, are skipped. The
/// normalized text length of each remaining candidate of at least
/// `min_content_length` characters is added to the score, and the function
/// returns `true` as soon as the score reaches `min_score`.
pub fn is_probably_readerable(html: &str, options: Option<ReaderableOptions>) -> bool {
    let document = Document::parse(html);
    is_document_readerable(&document, &options.unwrap_or_default())
}

/// [`is_probably_readerable`] over a byte stream.
///
/// A read error ends the input: whatever arrived before it is checked.
/// Invalid UTF-8 sequences are replaced rather than rejected.
///
/// ```rust
/// use readable_core::is_probably_readerable_from_reader;
///
/// let html = "<html><body><p>Short</p></body></html>";
/// assert!(!is_probably_readerable_from_reader(html.as_bytes(), None));
/// ```
pub fn is_probably_readerable_from_reader<R: Read>(
    mut reader: R,
    options: Option<ReaderableOptions>,
) -> bool {
    let mut bytes = Vec::new();
    // read_to_end keeps the bytes read before a failure
    let _ = reader.read_to_end(&mut bytes);
    is_probably_readerable(&String::from_utf8_lossy(&bytes), options)
}

/// [`is_probably_readerable`] over an already parsed document.
pub fn is_document_readerable(doc: &Document, options: &ReaderableOptions) -> bool {
    let mut score = 0.0;

    for (scanned, node) in doc.descendant_elements(doc.root()).into_iter().enumerate() {
        if options.max_nodes_to_scan > 0 && scanned >= options.max_nodes_to_scan {
            return true;
        }

        if !is_candidate(doc, node) {
            continue;
        }
        if !dom_utils::is_probably_visible(doc, node) || cleaner::is_unlikely_candidate(doc, node) {
            continue;
        }
        if doc.is_tag(node, "p") && doc.has_ancestor_tag(node, "li", None) {
            continue;
        }

        let text_length = utils::char_count(&dom_utils::get_inner_text(doc, node, true));
        if text_length < options.min_content_length {
            continue;
        }

        score += text_length as f64;
        if score >= options.min_score {
            return true;
        }
    }

    false
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("p" | "pre") => true,
        Some("article") => doc.elements_by_tag(node, &["p", "pre"]).is_empty(),
        Some("div") => doc
            .element_children(node)
            .into_iter()
            .any(|child| doc.is_tag(child, "br")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_probably_readerable() {
        let html = r#"
            <html>
                <body>
                    <article>
                        <p>This is a long enough paragraph that should make the content readerable.
                        It has sufficient content to pass the minimum threshold check.</p>
                        <p>Another paragraph with more content to increase the score.</p>
                    </article>
                </body>
            </html>
        "#;

        assert!(is_probably_readerable(html, None));
    }

    #[test]
    fn test_not_readerable() {
        let html = r#"
            <html>
                <body>
                    <p>Short</p>
                </body>
            </html>
        "#;

        assert!(!is_probably_readerable(html, None));
    }

    #[test]
    fn test_navigation_only_page_is_not_readerable() {
        let html = r#"
            <html><body>
                <nav><a href="/">Home</a> <a href="/about">About us</a> <a href="/blog">Blog</a></nav>
                <footer><p>Copyright 2024 Example</p><p>All rights reserved.</p></footer>
            </body></html>
        "#;

        assert!(!is_probably_readerable(html, None));
    }

    #[test]
    fn test_hidden_and_unlikely_text_is_ignored() {
        let long = "Plenty of words that would otherwise count as real content. ".repeat(4);
        let html = format!(
            r#"<p style="display:none">{long}</p><p class="sidebar">{long}</p><ul><li><p>{long}</p></li></ul>"#
        );

        assert!(!is_probably_readerable(&html, None));
    }

    #[test]
    fn test_text_adds_up_across_paragraphs() {
        let para = "A paragraph of exactly fifty characters, near enough.";
        let html = format!("<p>{para}</p><p>{para}</p><p>{para}</p>");

        assert!(is_probably_readerable(&html, None));
        let strict = ReaderableOptions {
            min_score: 500.0,
            ..ReaderableOptions::default()
        };
        assert!(!is_probably_readerable(&html, Some(strict)));
    }

    #[test]
    fn test_thresholds_follow_parse_options() {
        assert_eq!(
            ReaderableOptions::for_parse(&ReadabilityOptions::default()).min_score,
            140.0
        );

        let options = ReadabilityOptions::builder().char_threshold(50).build();
        let relaxed = ReaderableOptions::for_parse(&options);
        assert_eq!(relaxed.min_score, 50.0);
        assert_eq!(relaxed.min_content_length, MIN_CONTENT_LENGTH);

        let html = format!("<p>{}</p>", "w".repeat(60));
        assert!(!is_probably_readerable(&html, None));
        assert!(is_probably_readerable(&html, Some(relaxed)));
    }

    struct FailingAfter<'a> {
        data: &'a [u8],
    }

    impl Read for FailingAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "gone"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_reader_variant() {
        let long = "Plenty of words that would otherwise count as real content. ".repeat(4);
        let html = format!("<article><p>{long}</p></article>");

        assert!(is_probably_readerable_from_reader(html.as_bytes(), None));
        assert!(!is_probably_readerable_from_reader(&b"<p>Short</p>"[..], None));

        // The stream breaks after the paragraph; the text read so far still counts.
        let partial = FailingAfter {
            data: html.as_bytes(),
        };
        assert!(is_probably_readerable_from_reader(partial, None));
    }

    #[test]
    fn test_scan_budget() {
        let html = "<div></div><div></div><div></div><p>Short</p>";
        let options = ReaderableOptions {
            max_nodes_to_scan: 2,
            ..ReaderableOptions::default()
        };

        assert!(is_probably_readerable(html, Some(options)));
    }
}
