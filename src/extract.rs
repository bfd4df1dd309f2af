//! Readability extraction plus the metadata and text shaping around it.
//!
//! The boilerplate removal itself is `dom_smoothie`'s; this module only
//! decides what to ask it for and fills metadata gaps from the page's own
//! `<meta>` tags.

use chrono::{DateTime, Local, NaiveDate};
use dom_smoothie::{Config as ReadabilityConfig, Readability};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::debug;
use crate::config::Config;
use crate::error::{AppError, Result};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to parse built-in selector")
}

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![selector(r#"meta[property="og:title"]"#), selector("head > title")]
});
static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        selector(r#"meta[name="author"]"#),
        selector(r#"meta[property="article:author"]"#),
    ]
});
static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        selector(r#"meta[property="article:published_time"]"#),
        selector(r#"meta[name="date"]"#),
        selector(r#"meta[itemprop="datePublished"]"#),
        selector("time[datetime]"),
    ]
});
static DESCRIPTION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        selector(r#"meta[name="description"]"#),
        selector(r#"meta[property="og:description"]"#),
    ]
});
static SITENAME_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| vec![selector(r#"meta[property="og:site_name"]"#)]);
static CATEGORY_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| vec![selector(r#"meta[property="article:section"]"#)]);
static TAG_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        selector(r#"meta[property="article:tag"]"#),
        selector(r#"meta[name="keywords"]"#),
    ]
});
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("html[lang]"));

/// Article text and metadata for one page.
///
/// Unknown metadata serializes as `null` so consumers always see the same
/// keys. Key names follow trafilatura's JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: Option<String>,
    pub author: Option<String>,
    pub hostname: Option<String>,
    pub date: Option<String>,
    pub excerpt: Option<String>,
    #[serde(rename = "source-hostname")]
    pub source_hostname: Option<String>,
    /// `;`-separated, as trafilatura joins them.
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub language: Option<String>,
    pub image: Option<String>,
    pub source: String,
    pub text: String,
    pub raw_text: String,
    pub filedate: String,
}

/// Metadata read straight from the page markup.
#[derive(Debug, Default, PartialEq)]
struct PageMeta {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    description: Option<String>,
    sitename: Option<String>,
    categories: Option<String>,
    tags: Option<String>,
    language: Option<String>,
}

/// Runs readability over `html` and assembles the result.
///
/// Returns [`AppError::NoContent`] when the extractor finds no text.
pub fn extract_document(html: &str, page_url: &Url, config: &Config) -> Result<Document> {
    let cfg = ReadabilityConfig {
        max_elements_to_parse: config.max_elements,
        ..Default::default()
    };

    let mut readability = Readability::new(html, Some(page_url.as_str()), Some(cfg))
        .map_err(|e| AppError::ParseError(e.to_string()))?;
    let article = readability
        .parse()
        .map_err(|e| AppError::ParseError(e.to_string()))?;

    let text = format_text(&article.text_content);
    if text.is_empty() {
        return Err(AppError::NoContent);
    }
    debug!(chars = text.len(), "readability produced article text");

    let page = page_metadata(html);

    Ok(Document {
        title: non_empty(Some(article.title)).or(page.title),
        author: non_empty(article.byline).or(page.author),
        hostname: page_url.host_str().map(str::to_owned),
        date: non_empty(article.published_time)
            .or(page.date)
            .as_deref()
            .and_then(normalize_date),
        excerpt: non_empty(article.excerpt).or(page.description),
        source_hostname: non_empty(article.site_name).or(page.sitename),
        categories: page.categories,
        tags: page.tags,
        language: non_empty(article.lang).or(page.language),
        image: non_empty(article.image),
        source: page_url.to_string(),
        raw_text: collapse_whitespace(&text),
        text,
        filedate: Local::now().format("%Y-%m-%d").to_string(),
    })
}

/// Trims every line and drops the blank ones.
pub fn format_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(trimmed);
        }
    }

    result
}

/// Flattens text onto one line with single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduces a publication timestamp to `YYYY-MM-DD`, or `None` if it cannot
/// be read as a date.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.format("%Y-%m-%d").to_string());
    }

    let prefix = raw.get(..10)?;
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(prefix, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn page_metadata(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    PageMeta {
        title: first_match(&document, &TITLE_SELECTORS),
        author: first_match(&document, &AUTHOR_SELECTORS),
        date: first_match(&document, &DATE_SELECTORS),
        description: first_match(&document, &DESCRIPTION_SELECTORS),
        sitename: first_match(&document, &SITENAME_SELECTORS),
        categories: all_matches(&document, &CATEGORY_SELECTORS),
        tags: all_matches(&document, &TAG_SELECTORS),
        language: document
            .select(&HTML_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(str::to_owned)
            .and_then(|lang| non_empty(Some(lang))),
    }
}

/// First non-empty value across `selectors`, in order. Meta-like elements
/// yield their `content`/`datetime` attribute, everything else its text.
fn first_match(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        document.select(sel).find_map(|el| {
            let value = el
                .value()
                .attr("content")
                .or_else(|| el.value().attr("datetime"))
                .map(str::to_owned)
                .unwrap_or_else(|| el.text().collect::<String>());
            non_empty(Some(value))
        })
    })
}

/// Every value of the first selector that yields any, joined with `;`.
/// Comma-separated values such as `keywords` are split first.
fn all_matches(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        let values: Vec<String> = document
            .select(sel)
            .filter_map(|el| el.value().attr("content"))
            .flat_map(|content| content.split(','))
            .filter_map(|value| non_empty(Some(value.to_string())))
            .collect();
        (!values.is_empty()).then(|| values.join(";"))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}
