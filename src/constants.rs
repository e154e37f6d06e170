//! Regular expressions, tag tables and parse flags shared across the pipeline.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;

bitflags! {
    /// Heuristics that the retry driver switches off one at a time when an
    /// attempt produces too little content.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParseFlags: u8 {
        /// Drop nodes whose class/id/tag look like clutter before scoring.
        const STRIP_UNLIKELYS = 0b0000_0001;
        /// Scale scores by the class/id heuristic.
        const WEIGHT_CLASSES = 0b0000_0010;
        /// Run density/ratio based removal in the content cleaner.
        const CLEAN_CONDITIONALLY = 0b0000_0100;
    }
}

impl Default for ParseFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Compiled regular expressions used by the heuristics.
pub struct Regexps {
    pub unlikely_candidates: Regex,
    pub ok_maybe_its_a_candidate: Regex,
    pub positive: Regex,
    pub negative: Regex,
    pub byline: Regex,
    pub commas: Regex,
    pub normalize: Regex,
    pub videos: Regex,
    pub share_elements: Regex,
    pub hidden_style: Regex,
    pub boilerplate: Regex,
    pub lazy_image_src: Regex,
    pub lazy_image_srcset: Regex,
    pub b64_data_url: Regex,
    pub title_separator: Regex,
    pub json_ld_article_types: Regex,
    pub schema_org_context: Regex,
}

pub static REGEXPS: Lazy<Regexps> = Lazy::new(|| Regexps {
    unlikely_candidates: compile(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote|\bnav\b|navbar|\bad\b",
    ),
    ok_maybe_its_a_candidate: compile(r"(?i)and|article|body|column|content|main|mathjax|shadow"),
    positive: compile(r"(?i)article|body|content|entry|hentry|h-entry|main|post|text|blog|story"),
    negative: compile(
        r"(?i)comment|sidebar|footer|widget|\bnav\b|navbar|-ad-|\bad\b|banner|combx|com-|contact|masthead|outbrain|promo|related|share|shoutbox|sponsor|shopping|tags|hidden|^hid$",
    ),
    byline: compile(r"(?i)byline|author|dateline|writtenby|p-author"),
    commas: compile(r"\x{002C}|\x{060C}|\x{FE50}|\x{FE10}|\x{FE11}|\x{2E41}|\x{2E34}|\x{2E32}|\x{FF0C}"),
    normalize: compile(r"\s{2,}"),
    videos: compile(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq|bilibili|live\.bilibili)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    ),
    share_elements: compile(r"(?i)(\b|_)(share|sharedaddy)(\b|_)"),
    hidden_style: compile(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden"),
    boilerplate: compile(
        r"(?i)^\s*(leave a (comment|reply)|post a comment|add a comment|loading comments|comments are closed|you must be logged in to post a comment)",
    ),
    lazy_image_src: compile(r"(?i)^\s*\S+\.(jpg|jpeg|png|webp|gif|avif)\S*\s*$"),
    lazy_image_srcset: compile(r"(?i)\.(jpg|jpeg|png|webp|gif|avif)\S*\s+\d"),
    b64_data_url: compile(r"(?i)^data:\s*([^\s;,]+)\s*;\s*base64\s*,"),
    title_separator: compile(r"\s(\||-|–|—|\\|/|>|»)\s"),
    json_ld_article_types: compile(
        r"^(Article|AdvertiserContentArticle|NewsArticle|AnalysisNewsArticle|AskPublicNewsArticle|BackgroundNewsArticle|OpinionNewsArticle|ReportageNewsArticle|ReviewNewsArticle|Report|SatiricalArticle|ScholarlyArticle|MedicalScholarlyArticle|SocialMediaPosting|BlogPosting|LiveBlogPosting|DiscussionForumPosting|TechArticle|APIReference|WebPage)$",
    ),
    schema_org_context: compile(r"^https?://schema\.org/?$"),
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static readability regex must compile")
}

/// Tags whose text is scored when no override is configured.
pub const DEFAULT_TAGS_TO_SCORE: &[&str] = &["section", "h2", "h3", "h4", "h5", "h6", "p", "td", "pre"];

/// Minimum inner-text length for a node to count as content-bearing.
pub const MIN_CONTENT_LENGTH: usize = 25;

/// How many ancestors receive a share of a paragraph's score.
pub const SCORE_ANCESTOR_DEPTH: usize = 5;

/// Class/id multipliers applied to accumulated scores.
pub const POSITIVE_CLASS_FACTOR: f64 = 1.25;
pub const NEGATIVE_CLASS_FACTOR: f64 = 0.8;

/// Sibling paragraphs need this fraction of the top candidate's score.
pub const SIBLING_SCORE_RATIO: f64 = 0.2;

/// Strong alternatives needed before their shared ancestor replaces the top
/// candidate, and the fraction of the top score that counts as strong.
pub const MINIMUM_TOP_CANDIDATES: usize = 3;
pub const SHARED_CANDIDATE_RATIO: f64 = 0.75;

/// Link density above which the cleaner removes a short block.
pub const LINK_DENSITY_LIMIT: f64 = 0.5;
/// Same limit when the container had to fall back to `<body>`.
pub const BODY_LINK_DENSITY_LIMIT: f64 = 0.75;
/// Blocks with at least this much text survive the link density rule.
pub const LINK_DENSITY_TEXT_LIMIT: usize = 500;

/// Longest excerpt derived from content, in characters.
pub const EXCERPT_MAX_CHARS: usize = 300;

/// A node kept despite an unlikely class/id must hold one text block this long.
pub const UNLIKELY_TEXT_BLOCK_LENGTH: usize = 140;

/// Per-tag starting weights for scored nodes.
pub const TAG_WEIGHTS: &[(&str, f64)] = &[
    ("div", 5.0),
    ("pre", 3.0),
    ("blockquote", 3.0),
    ("table", 3.0),
    ("td", 3.0),
    ("address", -3.0),
    ("form", -3.0),
    ("ol", -3.0),
    ("ul", -3.0),
    ("dl", -3.0),
    ("dd", -3.0),
    ("dt", -3.0),
    ("li", -3.0),
    ("h1", -5.0),
    ("h2", -5.0),
    ("h3", -5.0),
    ("h4", -5.0),
    ("h5", -5.0),
    ("h6", -5.0),
    ("th", -5.0),
];

/// Children that stop a `<div>` from being treated as a paragraph.
pub const DIV_TO_P_ELEMS: &[&str] = &[
    "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "section", "article",
    "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "footer", "aside", "nav",
    "main", "hr",
];

pub const PHRASING_ELEMS: &[&str] = &[
    "a", "abbr", "audio", "b", "bdo", "br", "button", "canvas", "cite", "code", "data",
    "datalist", "del", "dfn", "em", "embed", "font", "i", "iframe", "img", "input", "ins", "kbd",
    "label", "map", "mark", "math", "meter", "object", "output", "progress", "q", "ruby", "s",
    "samp", "select", "small", "span", "strong", "sub", "sup", "textarea", "time", "u", "var",
    "wbr",
];

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Subtrees with no readable content of their own.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "link"];

pub const UNLIKELY_ROLES: &[&str] = &[
    "menu",
    "menubar",
    "complementary",
    "navigation",
    "alert",
    "alertdialog",
    "dialog",
];

/// Tags whose class/id alone marks them as clutter.
pub const UNLIKELY_TAGS: &[&str] = &["nav", "aside", "footer"];

/// Always removed from content, unless allowed by configuration.
pub const HARD_BLOCK_TAGS: &[&str] = &[
    "form", "fieldset", "object", "embed", "iframe", "input", "textarea", "select", "button",
    "link",
];

/// Candidates for density based removal in the cleaner.
pub const CLEAN_CONDITIONALLY_TAGS: &[&str] = &["table", "ul", "ol", "div", "section", "p", "aside"];

/// Elements that count as content even without text.
pub const MEDIA_TAGS: &[&str] = &[
    "img", "picture", "video", "audio", "iframe", "embed", "object", "svg", "canvas", "math",
    "source",
];

/// Attributes that survive the final attribute pass.
pub const ATTRIBUTE_WHITELIST: &[&str] = &[
    "href", "src", "srcset", "alt", "title", "colspan", "rowspan", "width", "height", "datetime",
    "poster", "allowfullscreen", "dir", "lang",
];

/// Attributes that may hold a lazily loaded image URL.
pub const LAZY_IMAGE_ATTRIBUTES: &[&str] = &[
    "data-src",
    "data-original",
    "data-lazy-src",
    "data-url",
    "data-hi-res-src",
    "data-srcset",
    "data-lazy-srcset",
];

/// Byline search covers this many element descendants of the container.
pub const BYLINE_SCAN_NODES: usize = 40;

pub fn tag_weight(tag: &str) -> f64 {
    TAG_WEIGHTS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, weight)| *weight)
        .unwrap_or(0.0)
}
