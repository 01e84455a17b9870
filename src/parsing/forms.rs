//! Form field lookups for the reply and edit pages.
//!
//! Lookups never fail: a missing field yields an empty string and the server
//! decides what to do with the resulting submission.

use scraper::{Html, Selector};

/// Value of the first `<input name="...">` in the page, or `""`.
#[must_use]
pub fn input_value(html: &str, name: &str) -> String {
    let document = Html::parse_document(html);
    let Some(selector) = named_selector("input", name) else {
        return String::new();
    };

    document
        .select(&selector)
        .find_map(|element| element.value().attr("value"))
        .unwrap_or_default()
        .to_string()
}

/// Full text of the first `<textarea name="...">` in the page, or `""`.
///
/// Line breaks inside the textarea are preserved.
#[must_use]
pub fn textarea_value(html: &str, name: &str) -> String {
    let document = Html::parse_document(html);
    let Some(selector) = named_selector("textarea", name) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default()
}

/// Anti-forgery tokens embedded in the reply form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormTokens {
    pub form_key: String,
    pub form_cookie: String,
}

impl FormTokens {
    /// Read `formkey` and `form_cookie` from a reply form page.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        Self {
            form_key: input_value(html, "formkey"),
            form_cookie: input_value(html, "form_cookie"),
        }
    }
}

fn named_selector(tag: &str, name: &str) -> Option<Selector> {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    Selector::parse(&format!(r#"{tag}[name="{escaped}"]"#)).ok()
}
