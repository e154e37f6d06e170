//! URI resolution and small string helpers.

use crate::constants::REGEXPS;
use url::Url;

/// Check whether `text` parses as an absolute URL.
pub fn is_url(text: &str) -> bool {
    Url::parse(text.trim()).is_ok()
}

/// Resolve `uri` against `base`.
///
/// Fragment-only references and already absolute URLs come back unchanged;
/// everything else is joined onto the base. Unresolvable input is returned
/// as-is rather than dropped.
///
/// ```rust
/// use readable_core::to_absolute_uri;
/// use url::Url;
///
/// let base = Url::parse("https://a.com/x/y").unwrap();
/// assert_eq!(to_absolute_uri("/p", &base), "https://a.com/p");
/// assert_eq!(to_absolute_uri("#frag", &base), "#frag");
/// ```
pub fn to_absolute_uri(uri: &str, base: &Url) -> String {
    let uri = uri.trim();
    if uri.is_empty() || uri.starts_with('#') {
        return uri.to_string();
    }

    if Url::parse(uri).is_ok() {
        return uri.to_string();
    }

    base.join(uri)
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| uri.to_string())
}

/// Resolve every candidate of a `srcset` list, keeping the descriptors.
pub fn to_absolute_srcset(srcset: &str, base: &Url) -> String {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(2, char::is_whitespace);
            let url = parts.next().unwrap_or("");
            match parts.next() {
                Some(descriptor) => format!("{} {}", to_absolute_uri(url, base), descriptor.trim()),
                None => to_absolute_uri(url, base),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn comma_count(text: &str) -> usize {
    REGEXPS.commas.find_iter(text).count()
}

/// Collapse whitespace runs to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    REGEXPS.normalize.replace_all(text.trim(), " ").into_owned()
}

/// Decode the handful of entities that survive in attribute values and JSON-LD.
pub fn unescape_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';').filter(|&end| end <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };

        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Truncate to `max_len` characters, breaking at the last word boundary.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if char_count(text) <= max_len {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_len).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) => truncated[..last_space].trim().to_string(),
        None => truncated.trim().to_string(),
    }
}

/// Strip "By" prefixes and separators around an author line.
pub fn clean_byline_text(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    let mut cleaned = normalized.as_str();
    for prefix in ["By ", "by ", "BY ", "Written by ", "written by "] {
        if let Some(stripped) = cleaned.strip_prefix(prefix) {
            cleaned = stripped;
            break;
        }
    }
    let cleaned = cleaned.trim_matches(|c: char| c.is_whitespace() || matches!(c, '|' | '-' | '–' | '—' | ','));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// True when text ends like the end of a sentence.
pub fn has_sentence_end(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            match chars.peek() {
                Some(next) if next.is_whitespace() => return true,
                None => return true,
                _ => {}
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_to_absolute_uri() {
        let page = base("https://a.com/x/y");
        assert_eq!(to_absolute_uri("#frag", &page), "#frag");
        assert_eq!(to_absolute_uri("/p", &page), "https://a.com/p");
        assert_eq!(to_absolute_uri("z.png", &page), "https://a.com/x/z.png");
        assert_eq!(
            to_absolute_uri("https://b.com/z", &base("https://a.com")),
            "https://b.com/z"
        );
        assert_eq!(to_absolute_uri("data:image/png;base64,AAA", &page), "data:image/png;base64,AAA");
        assert_eq!(to_absolute_uri("", &page), "");
    }

    #[test]
    fn test_to_absolute_srcset() {
        let page = base("https://x.com/a/");
        assert_eq!(
            to_absolute_srcset("small.jpg 480w, /big.jpg 1080w", &page),
            "https://x.com/a/small.jpg 480w, https://x.com/big.jpg 1080w"
        );
    }

    #[test]
    fn test_text_metrics() {
        assert_eq!(word_count("  one two\tthree \n"), 3);
        assert_eq!(char_count("héllo"), 5);
        assert_eq!(comma_count("a, b, c"), 2);
        assert_eq!(normalize_whitespace("  a \n\n b  "), "a b");
    }

    #[test]
    fn test_unescape_html_entities() {
        assert_eq!(unescape_html_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(unescape_html_entities("&#8220;hi&#x201D;"), "\u{201C}hi\u{201D}");
        assert_eq!(unescape_html_entities("a & b"), "a & b");
        assert_eq!(unescape_html_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("one two three four", 10), "one two");
    }

    #[test]
    fn test_clean_byline_text() {
        assert_eq!(clean_byline_text("By  Jane Doe |"), Some("Jane Doe".to_string()));
        assert_eq!(clean_byline_text(" - "), None);
    }

    #[test]
    fn test_has_sentence_end() {
        assert!(has_sentence_end("It ended."));
        assert!(has_sentence_end("First. Second"));
        assert!(!has_sentence_end("version 1.2 notes"));
    }
}
