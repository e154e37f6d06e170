//! # readable-core
//!
//! Heuristic extraction of the readable article body and its metadata from
//! HTML documents.
//!
//! ## Overview
//!
//! readable-core finds the main article content of an HTML page and strips the
//! clutter around it: advertisements, navigation, share widgets, comment forms
//! and the like. It also collects metadata such as the title, author (byline),
//! excerpt, site name, lead image, favicon, language and publish date.
//!
//! ## Key Features
//!
//! - **Content Extraction**: scores paragraphs and picks the container that holds the article
//! - **Metadata Extraction**: title, author, description, site name, image, favicon, language and publish date
//! - **JSON-LD Support**: parses schema.org structured data
//! - **Retries**: loosens its heuristics step by step on pages that defeat the first attempt
//! - **Pre-flight Check**: cheap test of whether a page is worth parsing
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use readable_core::{Readability, ReadabilityOptions};
//!
//! let html = r#"<html><body><article><h1>Title</h1><p>Content...</p></article></body></html>"#;
//! let url = "https://example.com/article";
//!
//! let options = ReadabilityOptions::default();
//! let readability = Readability::new(html, Some(url), Some(options)).unwrap();
//!
//! if let Ok(article) = readability.parse() {
//!     println!("Title: {:?}", article.title);
//!     println!("Content: {:?}", article.content);
//!     println!("Author: {:?}", article.byline);
//! }
//! ```
//!
//! ## Advanced Usage
//!
//! ### Custom Options
//!
//! ```rust,no_run
//! use readable_core::{Readability, ReadabilityOptions};
//!
//! let html = "<html>...</html>";
//!
//! let options = ReadabilityOptions::builder()
//!     .char_threshold(300)
//!     .nb_top_candidates(10)
//!     .keep_classes(true)
//!     .build();
//!
//! let readability = Readability::new(html, None, Some(options)).unwrap();
//! let article = readability.parse();
//! ```
//!
//! ### Pre-flight Check
//!
//! Use [`is_probably_readerable`] to quickly check if a document is likely to be parseable
//! before doing the full parse:
//!
//! ```rust,no_run
//! use readable_core::is_probably_readerable;
//!
//! let html = "<html>...</html>";
//!
//! if is_probably_readerable(html, None) {
//!     // Proceed with full parsing
//! } else {
//!     // Skip parsing or use alternative strategy
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use readable_core::{Readability, ReadabilityError};
//!
//! let html = "<html>...</html>";
//! let url = "not a valid url";
//!
//! match Readability::new(html, Some(url), None).and_then(Readability::parse) {
//!     Ok(article) => println!("Success! {} characters", article.length),
//!     Err(ReadabilityError::InvalidUrl(url)) => eprintln!("Invalid URL: {}", url),
//!     Err(ReadabilityError::NotReadable) => eprintln!("Not an article page"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! With [`ReadabilityOptions::debug`] set, every stage emits `tracing` events.
//! The crate never installs a subscriber; wire one up in the application.
//!
//! ## Algorithm
//!
//! The extraction algorithm works in several phases. First, scripts, styles,
//! hidden nodes and obvious clutter are removed and the markup is normalized.
//! Then paragraph-like nodes are scored and their scores flow up to their
//! ancestors. The best-scoring ancestor is chosen, promoted when its
//! neighbours suggest a better common container, and joined by related
//! siblings. Finally the container is cleaned of link farms, forms and empty
//! elements. When the result is too short the whole process starts again
//! from the original tree with fewer heuristics enabled.

mod article;
mod cleaner;
mod constants;
mod content_extractor;
mod dom;
mod dom_utils;
mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
mod metadata;
mod options;
mod post_processor;
mod readability;
mod readerable;
mod scoring;
mod utils;

// Public exports
pub use article::Article;
pub use error::{ReadabilityError, Result};
pub use options::{ReadabilityOptions, ReadabilityOptionsBuilder};
pub use readability::Readability;
pub use readerable::{is_probably_readerable, is_probably_readerable_from_reader, ReaderableOptions};
pub use utils::to_absolute_uri;
