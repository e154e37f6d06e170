//! Metadata extraction from HTML documents (JSON-LD, meta tags, etc.).

use crate::constants::REGEXPS;
use crate::utils;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Metadata extracted from the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Cleaned text of the `<title>` element.
    pub title: Option<String>,
    /// Title declared by JSON-LD, Open Graph, Dublin Core or Twitter tags.
    pub meta_title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<DateTime<FixedOffset>>,
    pub lang: Option<String>,
    pub image: Option<String>,
    pub favicon: Option<String>,
}

static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("script[type='application/ld+json']"));
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("title"));
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h1, h2"));
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h1"));
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("html"));
static ICON_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("link[rel][href]"));
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static LANGUAGE_META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    selector("meta[http-equiv='Content-Language'], meta[http-equiv='content-language'], meta[name='lang'], meta[name='language']")
});

static PROPERTY_PATTERN: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(
        r"(?i)\s*(article|dc|dcterm|og|twitter)\s*:\s*(author|creator|description|published_time|title|site_name|image)\s*",
    )
    .expect("static metadata regex must compile")
});

static NAME_PATTERN: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(
        r"(?i)^\s*(?:(?:article|dc|dcterm|og|twitter|parsely|weibo:(?:article|webpage))\s*[-\.:]\s*)?(author|author_name|creator|pub-date|description|title|site_name|image)\s*$",
    )
    .expect("static metadata regex must compile")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static metadata selector must parse")
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn has_article_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => REGEXPS.json_ld_article_types.is_match(kind),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| REGEXPS.json_ld_article_types.is_match(kind)),
        _ => false,
    }
}

fn has_schema_context(value: &Value) -> bool {
    match value.get("@context") {
        Some(Value::String(context)) => REGEXPS.schema_org_context.is_match(context),
        Some(Value::Object(context)) => context
            .get("@vocab")
            .and_then(Value::as_str)
            .map(|vocab| REGEXPS.schema_org_context.is_match(vocab))
            .unwrap_or(false),
        _ => false,
    }
}

/// The first schema.org article object of a JSON-LD block.
fn find_article_object(parsed: Value) -> Option<Value> {
    let parsed = match parsed {
        Value::Array(items) => items.into_iter().find(has_article_type)?,
        other => other,
    };

    if !has_schema_context(&parsed) {
        return None;
    }

    if parsed.get("@type").is_none() {
        return parsed
            .get("@graph")
            .and_then(Value::as_array)
            .and_then(|graph| graph.iter().find(|item| has_article_type(item)).cloned());
    }

    has_article_type(&parsed).then_some(parsed)
}

fn author_names(author: &Value) -> Option<String> {
    let names: Vec<String> = match author {
        Value::String(name) => vec![name.trim().to_string()],
        Value::Object(_) => author
            .get("name")
            .and_then(Value::as_str)
            .map(|name| vec![name.trim().to_string()])
            .unwrap_or_default(),
        Value::Array(authors) => authors
            .iter()
            .filter_map(|a| a.as_str().or_else(|| a.get("name").and_then(Value::as_str)))
            .map(|name| name.trim().to_string())
            .collect(),
        _ => Vec::new(),
    };

    let names: Vec<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn image_url(image: &Value) -> Option<String> {
    match image {
        Value::String(url) => non_empty(url),
        Value::Object(_) => image.get("url").and_then(Value::as_str).and_then(non_empty),
        Value::Array(images) => images.iter().find_map(image_url),
        _ => None,
    }
}

/// Extract JSON-LD structured data from document
///
/// Looks for <script type="application/ld+json"> tags and parses them for article metadata.
/// Supports Schema.org Article types, including objects nested in `@graph`.
/// The title lands in [`Metadata::meta_title`].
pub fn get_json_ld(document: &Html) -> Metadata {
    let mut metadata = Metadata::default();

    for script in document.select(&JSON_LD_SELECTOR) {
        let content = element_text(&script);
        let content = content
            .trim()
            .trim_start_matches("<![CDATA[")
            .trim_end_matches("]]>")
            .trim();

        let Ok(parsed) = serde_json::from_str::<Value>(content) else {
            continue;
        };
        let Some(article) = find_article_object(parsed) else {
            continue;
        };

        // "name" is sometimes the publisher; prefer "headline" then
        let name = article.get("name").and_then(Value::as_str).map(str::trim);
        let headline = article.get("headline").and_then(Value::as_str).map(str::trim);
        let publisher_name = article
            .get("publisher")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::trim);

        if metadata.meta_title.is_none() {
            metadata.meta_title = match (name, headline) {
                (Some(name), Some(headline)) if Some(name) == publisher_name => non_empty(headline),
                (Some(name), _) => non_empty(name),
                (None, Some(headline)) => non_empty(headline),
                (None, None) => None,
            };
        }

        if metadata.byline.is_none() {
            metadata.byline = article.get("author").and_then(author_names);
        }

        if metadata.excerpt.is_none() {
            metadata.excerpt = article
                .get("description")
                .and_then(Value::as_str)
                .and_then(non_empty);
        }

        if metadata.site_name.is_none() {
            metadata.site_name = publisher_name.and_then(non_empty);
        }

        if metadata.published_time.is_none() {
            metadata.published_time = article
                .get("datePublished")
                .and_then(Value::as_str)
                .and_then(parse_date);
        }

        if metadata.image.is_none() {
            metadata.image = article.get("image").and_then(image_url);
        }
    }

    metadata
}

/// Collect `<meta>` values keyed by normalized property or name.
fn collect_meta_values(document: &Html) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = HashMap::new();

    for meta in document.select(&META_SELECTOR) {
        let Some(content) = meta.value().attr("content").and_then(non_empty) else {
            continue;
        };

        let mut matched = false;
        if let Some(property) = meta.value().attr("property") {
            // "dc:creator twitter:site_name" declares both at once
            for prop in property.split_whitespace() {
                if let Some(found) = PROPERTY_PATTERN.find(prop) {
                    let key = found.as_str().to_lowercase().replace(char::is_whitespace, "");
                    values.insert(key, content.clone());
                    matched = true;
                }
            }
        }

        if !matched {
            if let Some(name) = meta.value().attr("name") {
                if NAME_PATTERN.is_match(name) {
                    let key = name
                        .to_lowercase()
                        .replace(char::is_whitespace, "")
                        .replace('.', ":");
                    values.insert(key, content);
                }
            }
        }
    }

    values
}

fn first_value(values: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| values.get(*key)).cloned()
}

/// Extract article metadata from meta tags
///
/// Supports OpenGraph, Twitter Cards, Dublin Core, `article:*` and `parsely-*`
/// tags. JSON-LD values in `json_ld` take precedence over meta tags. URLs are
/// resolved against `base_url` when one is known.
pub fn get_article_metadata(document: &Html, json_ld: Metadata, base_url: Option<&Url>) -> Metadata {
    let values = collect_meta_values(document);

    let mut metadata = Metadata {
        title: extract_title_from_document(document),
        ..Metadata::default()
    };

    metadata.meta_title = json_ld.meta_title.or_else(|| {
        first_value(
            &values,
            &[
                "dc:title",
                "dcterm:title",
                "og:title",
                "weibo:article:title",
                "weibo:webpage:title",
                "title",
                "twitter:title",
                "parsely-title",
            ],
        )
    });

    let article_author = first_value(&values, &["article:author", "article:author_name"])
        .filter(|author| !utils::is_url(author));
    metadata.byline = json_ld
        .byline
        .or_else(|| first_value(&values, &["dc:creator", "dcterm:creator", "author", "parsely-author"]))
        .or(article_author);

    metadata.excerpt = json_ld.excerpt.or_else(|| {
        first_value(
            &values,
            &[
                "dc:description",
                "dcterm:description",
                "og:description",
                "weibo:article:description",
                "weibo:webpage:description",
                "description",
                "twitter:description",
            ],
        )
    });

    metadata.site_name = json_ld.site_name.or_else(|| values.get("og:site_name").cloned());

    metadata.published_time = json_ld
        .published_time
        .or_else(|| {
            first_value(&values, &["article:published_time", "parsely-pub-date"])
                .as_deref()
                .and_then(parse_date)
        })
        .or_else(|| {
            document
                .select(&TIME_SELECTOR)
                .filter_map(|time| time.value().attr("datetime"))
                .find_map(parse_date)
        });

    metadata.image = first_value(&values, &["og:image", "twitter:image"]).or(json_ld.image);
    metadata.favicon = extract_favicon(document);
    metadata.lang = extract_language_from_document(document);

    metadata.title = metadata.title.map(|t| utils::unescape_html_entities(&t));
    metadata.meta_title = metadata.meta_title.map(|t| utils::unescape_html_entities(&t));
    metadata.byline = metadata
        .byline
        .map(|b| utils::unescape_html_entities(&b))
        .and_then(|b| utils::clean_byline_text(&b));
    metadata.excerpt = metadata
        .excerpt
        .map(|e| utils::unescape_html_entities(&e))
        .and_then(|e| non_empty(&e));
    metadata.site_name = metadata
        .site_name
        .map(|s| utils::unescape_html_entities(&s));

    if let Some(base) = base_url {
        metadata.image = metadata.image.map(|image| utils::to_absolute_uri(&image, base));
        metadata.favicon = metadata.favicon.map(|icon| utils::to_absolute_uri(&icon, base));
    }

    metadata
}

/// Parse a publication date in any of the formats seen in the wild.
///
/// RFC 3339 and RFC 2822 keep their offset; zone-less timestamps and plain
/// dates are taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date);
    }

    let utc = |naive: NaiveDateTime| Utc.from_utc_datetime(&naive).fixed_offset();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(utc(naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(utc)
}

/// Largest declared `sizes` wins; links without sizes rank lowest.
fn extract_favicon(document: &Html) -> Option<String> {
    document
        .select(&ICON_SELECTOR)
        .filter(|link| {
            link.value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|token| token.eq_ignore_ascii_case("icon")))
                .unwrap_or(false)
        })
        .filter_map(|link| {
            let href = non_empty(link.value().attr("href")?)?;
            let size = link
                .value()
                .attr("sizes")
                .map(icon_size)
                .unwrap_or(0);
            Some((size, href))
        })
        .fold(None, |best: Option<(u32, String)>, (size, href)| match best {
            Some((best_size, _)) if best_size >= size => best,
            _ => Some((size, href)),
        })
        .map(|(_, href)| href)
}

fn icon_size(sizes: &str) -> u32 {
    sizes
        .split_whitespace()
        .filter_map(|size| {
            let (width, height) = size.split_once(['x', 'X'])?;
            Some(width.parse::<u32>().ok()?.max(height.parse::<u32>().ok()?))
        })
        .max()
        .unwrap_or(0)
}

/// Extract the document language.
///
/// Sources, in order:
/// 1. `lang` attribute on `<html>`
/// 2. Content-Language meta tag
/// 3. `<meta name="language">`
fn extract_language_from_document(document: &Html) -> Option<String> {
    if let Some(lang) = document
        .select(&HTML_SELECTOR)
        .next()
        .and_then(|html| html.value().attr("lang"))
        .and_then(non_empty)
    {
        return Some(lang);
    }

    document
        .select(&LANGUAGE_META_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(non_empty)
}

/// Extract and clean the title from the document's <title> tag
///
/// A trailing or leading site name is split off at a separator as long as
/// at least three words remain. Otherwise the original title is kept.
pub fn extract_title_from_document(document: &Html) -> Option<String> {
    let title_elem = document.select(&TITLE_SELECTOR).next()?;
    let orig_title = utils::normalize_whitespace(&element_text(&title_elem));
    if orig_title.is_empty() {
        return None;
    }

    let mut cur_title = orig_title.clone();
    let separators: Vec<_> = REGEXPS.title_separator.find_iter(&orig_title).collect();

    if let (Some(first), Some(last)) = (separators.first(), separators.last()) {
        cur_title = orig_title[..last.start()].trim().to_string();
        if utils::word_count(&cur_title) < 3 {
            cur_title = orig_title[first.end()..].trim().to_string();
        }
        if utils::word_count(&cur_title) < 3 {
            cur_title = orig_title.clone();
        }
    } else if cur_title.contains(": ") {
        let has_matching_heading = document
            .select(&HEADING_SELECTOR)
            .any(|h| utils::normalize_whitespace(&element_text(&h)) == orig_title);

        if !has_matching_heading {
            if let Some(last_colon) = orig_title.rfind(':') {
                let after_last = orig_title[last_colon + 1..].trim().to_string();
                if utils::word_count(&after_last) >= 3 {
                    cur_title = after_last;
                } else if let Some(first_colon) = orig_title.find(':') {
                    if utils::word_count(&orig_title[..first_colon]) <= 5 {
                        cur_title = orig_title[first_colon + 1..].trim().to_string();
                    }
                }
            }
        }
    } else if utils::char_count(&cur_title) > 150 || utils::char_count(&cur_title) < 15 {
        let h1s: Vec<_> = document.select(&H1_SELECTOR).collect();
        if h1s.len() == 1 {
            let heading = utils::normalize_whitespace(&element_text(&h1s[0]));
            if !heading.is_empty() {
                cur_title = heading;
            }
        }
    }

    non_empty(&cur_title)
}
