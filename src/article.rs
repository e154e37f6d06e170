//! Article data structure representing the parsed output.
//!
//! This module defines the [`Article`] struct, which contains all extracted content
//! and metadata from a successfully parsed web page.
//!
//! ## Example
//!
//! ```rust,no_run
//! use readable_core::{Readability, ReadabilityOptions};
//!
//! let html = r#"<html><body><article><h1>My Article</h1><p>Content...</p></article></body></html>"#;
//! let readability = Readability::new(html, Some("https://example.com"), None).unwrap();
//!
//! if let Ok(article) = readability.parse() {
//!     // Access article fields
//!     println!("Title: {:?}", article.title);
//!     println!("Length: {} characters", article.length);
//!     println!("Author: {:?}", article.byline);
//!
//!     // Get cleaned HTML content
//!     if let Some(content) = article.content {
//!         println!("HTML: {}", content);
//!     }
//!
//!     // Or get plain text
//!     if let Some(text) = article.text_content {
//!         println!("Text: {}", text);
//!     }
//! }
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Represents a successfully parsed article with extracted content and metadata.
///
/// The `Article` struct contains all the extracted information from a web page,
/// including the main content (both HTML and plain text), metadata (title, author,
/// publish date), and other article properties.
///
/// ## Fields
///
/// Metadata fields are optional because not all web pages carry them; a
/// missing field is `None`, never a placeholder string. The `length` field is
/// always present and counts the characters of `text_content`.
///
/// ## Serialization
///
/// This struct implements `Serialize` and `Deserialize` from serde, making it
/// easy to save articles to JSON or other formats:
///
/// ```rust,no_run
/// use readable_core::{Readability, Article};
/// # let html = "<html></html>";
/// # let readability = Readability::new(html, None, None).unwrap();
///
/// if let Ok(article) = readability.parse() {
///     let json = serde_json::to_string_pretty(&article).unwrap();
///     println!("{}", json);
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// The article title extracted from metadata or the document.
    ///
    /// The `<title>` tag is preferred, with a trailing site name split off at a
    /// ` | `, ` - ` or ` — ` separator when enough words remain. Without one, the
    /// first `<h1>` of the extracted content is used, then JSON-LD, OpenGraph and
    /// Twitter Card titles.
    pub title: Option<String>,

    /// Cleaned HTML content of the article.
    ///
    /// This contains the main article content with:
    /// - Ads and navigation removed
    /// - Unwanted elements filtered out
    /// - Relative URLs converted to absolute
    /// - Empty elements cleaned up
    ///
    /// The content is wrapped in `<div id="readability-page-1" class="page">`.
    pub content: Option<String>,

    /// Plain text content with all HTML tags removed.
    ///
    /// This is the text-only version of the article content,
    /// useful for previews, search indexing, or analysis.
    pub text_content: Option<String>,

    /// Length of the article in characters.
    ///
    /// This is the character count of the plain text content,
    /// useful for reading time estimation or content validation.
    pub length: usize,

    /// Article description or short excerpt.
    ///
    /// The excerpt is taken from JSON-LD or the description meta tags (including
    /// OpenGraph and Twitter). As a fallback, the first paragraph of the extracted
    /// article content is used, cut to 300 characters at a word boundary.
    pub excerpt: Option<String>,

    /// Author name(s).
    ///
    /// Meta author tags and JSON-LD author data are checked first. If neither is
    /// available, the first visible element near the top of the content with
    /// `rel="author"`, `itemprop="author"` or a byline-like class/id is used.
    /// Multiple JSON-LD authors are separated by commas.
    pub byline: Option<String>,

    /// Text direction hint: "ltr" (left-to-right), "rtl" (right-to-left), or "auto".
    ///
    /// Taken from the nearest `dir` attribute on the content container or its
    /// ancestors, up to the `<html>` element.
    pub dir: Option<String>,

    /// Name of the website or publication.
    ///
    /// The site name is extracted from the OpenGraph `og:site_name` tag or the JSON-LD
    /// publisher name field.
    pub site_name: Option<String>,

    /// Lead image URL from `og:image`, `twitter:image` or JSON-LD, made absolute.
    pub image: Option<String>,

    /// Favicon URL from the largest `<link rel="icon">`, made absolute.
    pub favicon: Option<String>,

    /// Language code of the content (e.g., "en", "es", "fr").
    ///
    /// Extracted from the `lang` attribute on the `<html>` element or
    /// `Content-Language` meta tag.
    pub lang: Option<String>,

    /// Publication timestamp.
    ///
    /// Taken from the JSON-LD `datePublished` field, the `article:published_time`
    /// meta tag or a `<time datetime>` element. Values that do not parse as a
    /// date are dropped rather than reported.
    pub published_time: Option<DateTime<FixedOffset>>,
}

impl Article {
    pub fn new() -> Self {
        Self::default()
    }
}
