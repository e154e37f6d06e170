//! Fetch a page over HTTP and extract its article.
//!
//! Only compiled with the `fetch` feature. The engine itself never performs
//! I/O; this wrapper buffers the response body and hands it over.
//!
//! ```rust,no_run
//! use readable_core::fetch;
//!
//! match fetch::from_url("https://example.com/story", None) {
//!     Ok(article) => println!("{:?}", article.title),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

use crate::error::{ReadabilityError, Result};
use crate::options::ReadabilityOptions;
use crate::{Article, Readability};
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("readable-core/", env!("CARGO_PKG_VERSION"));

/// Download `url` and parse it.
///
/// The request is bounded by [`ReadabilityOptions::timeout`]. The page must
/// pass the pre-flight check before the full parse runs.
///
/// # Errors
/// - [`ReadabilityError::InvalidUrl`] when `url` does not parse
/// - [`ReadabilityError::FetchFailed`] on network errors, timeouts and
///   non-success status codes
/// - [`ReadabilityError::NotReadable`] when the page fails the pre-flight check
/// - anything [`Readability::parse`] reports
pub fn from_url(url: &str, options: Option<ReadabilityOptions>) -> Result<Article> {
    let parsed = Url::parse(url.trim()).map_err(|_| ReadabilityError::InvalidUrl(url.to_string()))?;
    let options = options.unwrap_or_default();

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(options.timeout)
        .build()
        .map_err(|e| ReadabilityError::fetch("could not build HTTP client", e))?;

    let response = client
        .get(parsed.clone())
        .send()
        .map_err(|e| ReadabilityError::fetch(format!("request to {parsed} failed"), e))?
        .error_for_status()
        .map_err(|e| ReadabilityError::fetch(format!("{parsed} answered with an error status"), e))?;

    // Redirects change the base for relative links
    let final_url = response.url().to_string();
    let body = response
        .text()
        .map_err(|e| ReadabilityError::fetch(format!("reading the body of {parsed} failed"), e))?;

    if options.debug {
        debug!(url = %final_url, bytes = body.len(), "page fetched");
    }

    let readability = Readability::new(&body, Some(&final_url), Some(options))?;
    if !readability.is_readable() {
        return Err(ReadabilityError::NotReadable);
    }
    readability.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected_before_fetching() {
        let result = from_url("not a url", None);
        assert!(matches!(result, Err(ReadabilityError::InvalidUrl(_))));
    }

    #[test]
    fn test_unreachable_host_is_a_fetch_failure() {
        let options = ReadabilityOptions::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build();
        let result = from_url("http://127.0.0.1:9/", Some(options));
        assert!(matches!(result, Err(ReadabilityError::FetchFailed { .. })));
    }
}
