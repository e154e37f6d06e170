//! Main Readability struct and parse implementation.
//!
//! This module contains the primary [`Readability`] struct which orchestrates
//! the entire article extraction pipeline.
//!
//! ## Example
//!
//! ```rust,no_run
//! use readable_core::{Readability, ReadabilityOptions};
//!
//! let html = std::fs::read_to_string("article.html").unwrap();
//! let url = "https://example.com/article";
//!
//! let readability = Readability::new(&html, Some(url), None)?;
//!
//! match readability.parse() {
//!     Ok(article) => {
//!         println!("Title: {:?}", article.title);
//!         println!("Author: {:?}", article.byline);
//!         println!("Content length: {} chars", article.length);
//!
//!         if let Some(content) = article.content {
//!             std::fs::write("output.html", content)?;
//!         }
//!     }
//!     Err(err) => eprintln!("no article: {err}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{
    article::Article,
    constants::{EXCERPT_MAX_CHARS, LINK_DENSITY_LIMIT, MIN_CONTENT_LENGTH},
    content_extractor::{grab_article, ExtractedContent, ExtractionHints},
    dom::Document,
    dom_utils,
    error::{ReadabilityError, Result},
    metadata::{get_article_metadata, get_json_ld, Metadata},
    options::ReadabilityOptions,
    readerable::{is_document_readerable, ReaderableOptions},
    utils,
};
use scraper::Html;
use std::io::Read;
use tracing::debug;
use url::Url;

/// The main Readability parser.
///
/// This struct is the primary interface for extracting article content from HTML documents.
///
/// ## Lifecycle
///
/// The typical usage pattern starts by constructing a `Readability` instance with
/// [`Readability::new()`], then calling [`parse()`](Readability::parse) to extract the content.
/// The result is an [`Article`] containing the extracted content and metadata, or a
/// [`ReadabilityError`] saying why there is none.
///
/// Parsing consumes the instance. Every stage works on its own copy of the
/// document, so two instances built from the same input produce the same article.
///
/// ## Example
///
/// ```rust,no_run
/// use readable_core::{Readability, ReadabilityOptions};
///
/// let html = r#"
///     <html>
///     <head><title>Article Title</title></head>
///     <body>
///         <article>
///             <h1>Article Title</h1>
///             <p>First paragraph of content...</p>
///             <p>Second paragraph of content...</p>
///         </article>
///     </body>
///     </html>
/// "#;
///
/// let readability = Readability::new(html, None, None)?;
///
/// if readability.is_readable() {
///     let article = readability.parse()?;
///     println!("Success! Extracted {} characters", article.length);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ## With Custom Options
///
/// ```rust,no_run
/// use readable_core::{Readability, ReadabilityOptions};
///
/// let html = "<html>...</html>";
///
/// let options = ReadabilityOptions::builder()
///     .char_threshold(300)
///     .debug(true)
///     .build();
///
/// let readability = Readability::new(html, None, Some(options))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Readability {
    /// Original HTML string, re-read by the metadata selectors
    html: String,

    /// Pristine arena tree; extraction attempts clone it
    document: Document,

    /// Base URL for resolving relative links
    base_url: Option<Url>,

    /// Configuration options
    options: ReadabilityOptions,
}

impl Readability {
    /// Create a new Readability instance
    ///
    /// # Arguments
    /// * `html` - The HTML content to parse
    /// * `url` - Optional base URL for resolving relative links
    /// * `options` - Optional configuration options
    ///
    /// # Errors
    /// [`ReadabilityError::InvalidUrl`] when `url` is not an absolute URL and
    /// [`ReadabilityError::Unparseable`] when there is no markup at all.
    pub fn new(html: &str, url: Option<&str>, options: Option<ReadabilityOptions>) -> Result<Self> {
        let base_url = url
            .map(|u| Url::parse(u.trim()).map_err(|_| ReadabilityError::InvalidUrl(u.to_string())))
            .transpose()?;

        if html.trim().is_empty() {
            return Err(ReadabilityError::Unparseable("empty document".to_string()));
        }

        Ok(Self {
            html: html.to_string(),
            document: Document::parse(html),
            base_url,
            options: options.unwrap_or_default(),
        })
    }

    /// Create a new instance from a byte stream.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn from_reader<R: Read>(
        mut reader: R,
        url: Option<&str>,
        options: Option<ReadabilityOptions>,
    ) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ReadabilityError::Unparseable(e.to_string()))?;
        Self::new(&String::from_utf8_lossy(&bytes), url, options)
    }

    /// Quick pre-flight check on the untouched document.
    ///
    /// Thresholds come from [`ReaderableOptions::for_parse`], so a page this
    /// rejects is one [`parse`](Readability::parse) rejects too. With default
    /// options it gives the same answer as
    /// [`is_probably_readerable`](crate::is_probably_readerable). Never
    /// modifies the document.
    pub fn is_readable(&self) -> bool {
        self.is_readable_with(&ReaderableOptions::for_parse(&self.options))
    }

    /// [`is_readable`](Readability::is_readable) with explicit thresholds.
    pub fn is_readable_with(&self, options: &ReaderableOptions) -> bool {
        let readable = is_document_readerable(&self.document, options);
        if self.options.debug {
            debug!(readable, min_score = options.min_score, "precheck finished");
        }
        readable
    }

    /// Parse the document and extract article content
    ///
    /// # Errors
    /// - [`ReadabilityError::MaxElementsExceeded`] when the document is larger
    ///   than `max_elems_to_parse`
    /// - [`ReadabilityError::NotReadable`] when the pre-flight check fails
    /// - [`ReadabilityError::NoContent`] when no attempt yields enough text
    pub fn parse(self) -> Result<Article> {
        if self.options.max_elems_to_parse > 0 {
            let count = self.document.count_elements(self.document.root());
            if count > self.options.max_elems_to_parse {
                return Err(ReadabilityError::MaxElementsExceeded(count));
            }
        }

        if !self.is_readable() {
            return Err(ReadabilityError::NotReadable);
        }

        let metadata = self.extract_metadata();
        if self.options.debug {
            debug!(
                title = ?metadata.title,
                byline = ?metadata.byline,
                "metadata extracted"
            );
        }

        let hints = ExtractionHints {
            base_url: self.base_url.as_ref(),
            title: metadata.title.as_deref(),
            find_byline: metadata.byline.is_none(),
        };
        let extracted = grab_article(&self.document, &self.options, hints)?;
        if self.options.debug {
            debug!(
                flags = ?extracted.flags,
                text_length = extracted.text_length,
                used_body = extracted.used_body,
                uncleaned = extracted.uncleaned,
                "article extracted"
            );
        }

        Ok(build_article(metadata, extracted))
    }

    fn extract_metadata(&self) -> Metadata {
        let html = Html::parse_document(&self.html);
        let json_ld = if self.options.disable_json_ld {
            Metadata::default()
        } else {
            get_json_ld(&html)
        };
        get_article_metadata(&html, json_ld, self.base_url.as_ref())
    }
}

fn build_article(metadata: Metadata, extracted: ExtractedContent) -> Article {
    let ExtractedContent {
        document,
        container,
        byline,
        dir,
        heading_title,
        ..
    } = extracted;

    let text_content = document.text_content(container).trim().to_string();
    let excerpt = metadata
        .excerpt
        .or_else(|| first_paragraph_excerpt(&document, container));

    Article {
        title: metadata.title.or(heading_title).or(metadata.meta_title),
        content: Some(document.outer_html(container)),
        length: utils::char_count(&text_content),
        text_content: Some(text_content),
        excerpt,
        byline: metadata.byline.or(byline),
        dir,
        site_name: metadata.site_name,
        image: metadata.image,
        favicon: metadata.favicon,
        lang: metadata.lang,
        published_time: metadata.published_time,
    }
}

/// First prose paragraph of the cleaned content, cut at a word boundary.
fn first_paragraph_excerpt(doc: &Document, container: crate::dom::NodeId) -> Option<String> {
    doc.elements_by_tag(container, &["p"])
        .into_iter()
        .filter(|&p| dom_utils::get_link_density(doc, p) <= LINK_DENSITY_LIMIT)
        .map(|p| dom_utils::get_inner_text(doc, p, true))
        .find(|text| utils::char_count(text) >= MIN_CONTENT_LENGTH)
        .map(|text| utils::truncate_text(&text, EXCERPT_MAX_CHARS))
}
