//! Thread page parsing.
//!
//! Turns a `showthread.php` page into [`Post`] records and reads the thread's
//! page count from the pagination control.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::models::Post;

static POST_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[id^="post"]"#).expect("Invalid selector"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".author").expect("Invalid selector"));
static POST_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".postdate").expect("Invalid selector"));
static POST_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".postbody").expect("Invalid selector"));
static PAGES: Lazy<Selector> = Lazy::new(|| Selector::parse(".pages").expect("Invalid selector"));

/// "Oct 22, 2025 10:30", optionally with seconds or a full month name.
static DATE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]{3,9}\.?\s+\d{1,2},\s*\d{4}\s+\d{1,2}:\d{2}(?::\d{2})?")
        .expect("Invalid date regex")
});
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid number regex"));

const POST_ID_PREFIX: &str = "post";

const DATE_FORMATS: &[&str] = &["%B %d, %Y %H:%M", "%B %d, %Y %H:%M:%S"];

/// Posts found on one thread page plus the thread's total page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPage {
    pub posts: Vec<Post>,
    pub page_count: u32,
}

/// Parse a thread page into posts and the total page count.
#[must_use]
pub fn extract(html: &str) -> ThreadPage {
    let document = Html::parse_document(html);
    ThreadPage {
        posts: parse_posts(&document),
        page_count: parse_page_count(&document),
    }
}

/// Parse only the posts of a page.
#[must_use]
pub fn posts_for_page(html: &str) -> Vec<Post> {
    parse_posts(&Html::parse_document(html))
}

/// Parse only the total page count. Pages without pagination count as 1.
#[must_use]
pub fn page_count(html: &str) -> u32 {
    parse_page_count(&Html::parse_document(html))
}

/// Parse a forum timestamp such as `Oct 22, 2025 10:30`.
///
/// Leading or trailing noise (the `#` and `?` links next to the date) is
/// ignored.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let found = DATE_TEXT.find(text)?;
    let normalized = found
        .as_str()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
}

fn parse_posts(document: &Html) -> Vec<Post> {
    document
        .select(&POST_CONTAINER)
        .filter_map(|container| {
            let id = post_id(&container)?;
            parse_post(&container, id)
        })
        .collect()
}

/// Numeric id of a post container, `None` for other `post*` ids like `postbody`.
fn post_id(container: &ElementRef) -> Option<String> {
    let id = container.value().id()?.strip_prefix(POST_ID_PREFIX)?;
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then(|| id.to_string())
}

fn parse_post(container: &ElementRef, id: String) -> Option<Post> {
    let Some(author) = first_text(container, &AUTHOR).filter(|a| !a.is_empty()) else {
        warn!(post_id = %id, "Skipping post without author");
        return None;
    };

    let Some(date_text) = first_text(container, &POST_DATE) else {
        warn!(post_id = %id, "Skipping post without date");
        return None;
    };
    let Some(timestamp) = parse_timestamp(&date_text) else {
        warn!(post_id = %id, date = %date_text, "Skipping post with unparseable date");
        return None;
    };

    let Some(text) = first_text(container, &POST_BODY) else {
        warn!(post_id = %id, "Skipping post without body");
        return None;
    };

    Some(Post {
        id,
        author,
        text,
        timestamp,
    })
}

fn first_text(container: &ElementRef, selector: &Selector) -> Option<String> {
    container
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn parse_page_count(document: &Html) -> u32 {
    document
        .select(&PAGES)
        .next()
        .and_then(|pages| {
            let text = pages.text().collect::<Vec<_>>().join(" ");
            NUMBER
                .find_iter(&text)
                .filter_map(|m| m.as_str().parse::<u32>().ok())
                .max()
        })
        .unwrap_or(1)
        .max(1)
}
