//! Regression harness over a directory of recorded pages.
//!
//! Each case lives in `tests/test-pages/<name>/` with a `source.html` and an
//! `expected-metadata.json`. The layout matches the fixture set published with
//! Firefox Reader View, so that set can be dropped in as is. The tests are
//! ignored by default because the fixtures are not checked in.

use readable_core::{is_probably_readerable, Article, Readability, ReadabilityError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Expected metadata of a recorded page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedMetadata {
    title: Option<String>,
    byline: Option<String>,
    dir: Option<String>,
    lang: Option<String>,
    excerpt: Option<String>,
    site_name: Option<String>,
    #[serde(default)]
    readerable: bool,
}

struct TestCase {
    name: String,
    source_html: String,
    expected: ExpectedMetadata,
}

impl TestCase {
    fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("Invalid test case name")?
            .to_string();

        let source_html = fs::read_to_string(path.join("source.html"))?;
        let expected: ExpectedMetadata =
            serde_json::from_str(&fs::read_to_string(path.join("expected-metadata.json"))?)?;

        Ok(TestCase {
            name,
            source_html,
            expected,
        })
    }

    fn parse(&self) -> readable_core::Result<Article> {
        Readability::new(&self.source_html, Some("http://fakehost/test/page.html"), None)?.parse()
    }
}

fn test_pages_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test-pages")
}

fn load_test_cases() -> Vec<TestCase> {
    let Ok(entries) = fs::read_dir(test_pages_dir()) else {
        eprintln!("Warning: no fixtures under {:?}", test_pages_dir());
        return vec![];
    };

    let mut test_cases: Vec<TestCase> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| match TestCase::load(&entry.path()) {
            Ok(test_case) => Some(test_case),
            Err(e) => {
                eprintln!("Failed to load test case {:?}: {}", entry.path(), e);
                None
            }
        })
        .collect();

    test_cases.sort_by(|a, b| a.name.cmp(&b.name));
    test_cases
}

/// Compare two optional strings modulo whitespace
fn strings_match(actual: &Option<String>, expected: &Option<String>) -> bool {
    let normalize = |s: &String| s.split_whitespace().collect::<Vec<_>>().join(" ");
    match (actual, expected) {
        (None, None) => true,
        (Some(a), Some(e)) => normalize(a) == normalize(e),
        _ => false,
    }
}

fn metadata_mismatches(article: &Article, expected: &ExpectedMetadata) -> Vec<String> {
    let fields = [
        ("title", &article.title, &expected.title),
        ("byline", &article.byline, &expected.byline),
        ("excerpt", &article.excerpt, &expected.excerpt),
        ("site name", &article.site_name, &expected.site_name),
        ("dir", &article.dir, &expected.dir),
        ("lang", &article.lang, &expected.lang),
    ];

    fields
        .into_iter()
        .filter(|(_, actual, expected)| !strings_match(actual, expected))
        .map(|(field, actual, expected)| format!("  - {field}: expected {expected:?}, got {actual:?}"))
        .collect()
}

#[test]
#[ignore]
fn test_pages_metadata() {
    let test_cases = load_test_cases();
    if test_cases.is_empty() {
        println!("No test cases found. Skipping.");
        return;
    }

    let mut failures = Vec::new();
    for test_case in &test_cases {
        match test_case.parse() {
            Ok(article) => {
                let mismatches = metadata_mismatches(&article, &test_case.expected);
                if mismatches.is_empty() {
                    println!("ok   {}", test_case.name);
                } else {
                    println!("FAIL {}: metadata mismatch\n{}", test_case.name, mismatches.join("\n"));
                    failures.push(test_case.name.clone());
                }
            }
            Err(ReadabilityError::NotReadable) if !test_case.expected.readerable => {
                println!("ok   {} (not readable)", test_case.name);
            }
            Err(e) => {
                println!("FAIL {}: {}", test_case.name, e);
                failures.push(test_case.name.clone());
            }
        }
    }

    let passed = test_cases.len() - failures.len();
    println!(
        "\nResults: {} passed, {} failed ({:.1}%)",
        passed,
        failures.len(),
        passed as f64 / test_cases.len() as f64 * 100.0
    );
}

#[test]
#[ignore]
fn test_pages_readerable_flag() {
    let test_cases = load_test_cases();

    let wrong: Vec<&str> = test_cases
        .iter()
        .filter(|tc| is_probably_readerable(&tc.source_html, None) != tc.expected.readerable)
        .map(|tc| tc.name.as_str())
        .collect();

    println!("readerable flag differs for {} of {} pages", wrong.len(), test_cases.len());
    for name in wrong {
        println!("  - {name}");
    }
}

#[test]
#[ignore]
fn test_pages_are_deterministic() {
    for test_case in load_test_cases() {
        let first = test_case.parse().ok();
        let second = test_case.parse().ok();
        assert_eq!(first, second, "{} parsed differently twice", test_case.name);
    }
}

#[test]
#[ignore]
fn test_single_case_debug() {
    let test_name = std::env::var("TEST_PAGE").unwrap_or_else(|_| "replace-brs".to_string());
    let test_dir = test_pages_dir().join(&test_name);
    if !test_dir.exists() {
        println!("Test case '{}' not found", test_name);
        return;
    }

    let test_case = TestCase::load(&test_dir).expect("Failed to load test case");
    println!("Expected metadata:\n{:#?}\n", test_case.expected);

    match test_case.parse() {
        Ok(article) => {
            println!("Title: {:?}", article.title);
            println!("Byline: {:?}", article.byline);
            println!("Excerpt: {:?}", article.excerpt);
            println!("Site Name: {:?}", article.site_name);
            println!("Length: {}", article.length);
            if let Some(content) = article.content {
                println!("\nContent preview:\n{}", content.chars().take(500).collect::<String>());
            }
        }
        Err(e) => println!("No article extracted: {e}"),
    }
}
