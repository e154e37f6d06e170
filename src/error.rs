//! Error types for the readability library.

use thiserror::Error;

/// Result type alias for readability operations
pub type Result<T> = std::result::Result<T, ReadabilityError>;

/// Errors that can occur while reading a page or extracting its article.
///
/// Metadata gaps (missing title, byline, ...) are never reported here; they
/// surface as empty fields on [`Article`](crate::Article).
#[derive(Error, Debug)]
pub enum ReadabilityError {
    /// The base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Fetching the page failed or timed out
    #[error("Failed to fetch the page: {message}")]
    FetchFailed {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The pre-flight check rejected the document
    #[error("The page is not readable")]
    NotReadable,

    /// Input could not be interpreted as an HTML document
    #[error("Failed to parse HTML: {0}")]
    Unparseable(String),

    /// The document has more elements than `max_elems_to_parse` allows
    #[error("Maximum element limit exceeded: {0}")]
    MaxElementsExceeded(usize),

    /// Extraction finished but no container reached `char_threshold`
    #[error("No article content found in document")]
    NoContent,
}

impl ReadabilityError {
    /// Builds a [`ReadabilityError::FetchFailed`] from any underlying cause.
    pub fn fetch<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::FetchFailed {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// True for failures that mean the input itself could not be handled as a DOM.
    pub fn is_unparseable(&self) -> bool {
        matches!(self, Self::Unparseable(_) | Self::MaxElementsExceeded(_))
    }
}
