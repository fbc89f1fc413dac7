pub mod fetch;
pub mod live;
pub mod snapshot;

use crate::error::PriceError;
use crate::price::rules::{SelectorRule, Strategy};
use serde::Deserialize;
use std::time::Duration;

/// Text read from one matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Rendered text; empty for visually hidden elements.
    #[serde(default)]
    pub text: String,
    pub text_content: Option<String>,
    pub inner_html: Option<String>,
}

impl Element {
    /// Visible text, falling back to the text content attribute.
    pub fn read_text(&self) -> String {
        let text = self.text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
        self.text_content
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }

    /// Like `read_text`, with the element's HTML as a last resort.
    pub fn read_text_or_html(&self) -> String {
        let text = self.read_text();
        if !text.is_empty() {
            return text;
        }
        self.inner_html
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

/// A rendered document the resolver can query. Implementations only read.
///
/// Every method reports provider faults as `Err`; a rule that matches nothing
/// is `Ok(None)` or an empty list.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Whether rules of this strategy can match anything here at all.
    fn supports(&self, _strategy: Strategy) -> bool {
        true
    }

    /// First element matching `rule`, waiting up to `timeout` for it to appear.
    async fn find_first(
        &self,
        rule: &SelectorRule,
        timeout: Duration,
    ) -> Result<Option<Element>, PriceError>;

    /// Every element currently matching `rule`. XPath rules yield at most one.
    async fn find_all(&self, rule: &SelectorRule) -> Result<Vec<Element>, PriceError>;

    /// Full document markup.
    async fn raw_source(&self) -> Result<String, PriceError>;
}

/// Check if markup is Amazon's robot check instead of a product page.
pub fn is_robot_check(html: &str) -> bool {
    html.contains("/errors/validateCaptcha")
        || html.contains("<title>Robot Check</title>")
        || html.contains("api-services-support@amazon.com")
}

/// Short label for a product URL: the ASIN when present, else "page".
pub fn product_label(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return "page".to_string();
    };
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    segments
        .windows(2)
        .find(|pair| pair[0] == "dp" || pair[0] == "product")
        .map(|pair| pair[1].to_string())
        .filter(|asin| asin.len() == 10 && asin.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "page".to_string())
}

/// Dump HTML to the temp dir for debugging when debug level is enabled.
pub fn debug_dump_html(html: &str, label: &str) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let dump_path = std::env::temp_dir().join(format!("price_probe_{}.html", label));
        match std::fs::write(&dump_path, html) {
            Ok(()) => tracing::debug!("Dumped HTML to {}", dump_path.display()),
            Err(e) => tracing::debug!("Could not dump HTML to {}: {}", dump_path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_text_falls_back_to_text_content() {
        let el = Element {
            text: "  ".into(),
            text_content: Some(" 59,99 € ".into()),
            inner_html: None,
        };
        assert_eq!(el.read_text(), "59,99 €");
    }

    #[test]
    fn read_text_or_html_uses_html_last() {
        let el = Element {
            text: String::new(),
            text_content: Some(String::new()),
            inner_html: Some("<span>79,99€</span>".into()),
        };
        assert_eq!(el.read_text(), "");
        assert_eq!(el.read_text_or_html(), "<span>79,99€</span>");
    }

    #[test]
    fn element_deserializes_from_lookup_json() {
        let json = r#"{"text":"","textContent":"12,00 €","innerHtml":"12,00 €"}"#;
        let el: Element = serde_json::from_str(json).unwrap();
        assert_eq!(el.text_content.as_deref(), Some("12,00 €"));
        assert_eq!(el.read_text(), "12,00 €");
    }

    #[test]
    fn product_label_extracts_asin() {
        assert_eq!(
            product_label("https://www.amazon.fr/dp/B0DCBB2YTR?th=1"),
            "B0DCBB2YTR"
        );
        assert_eq!(
            product_label("https://www.amazon.com/Some-Item/dp/B08N5WRWNW/ref=sr_1_1"),
            "B08N5WRWNW"
        );
        assert_eq!(
            product_label("https://www.amazon.de/gp/product/B07XJ8C8F5"),
            "B07XJ8C8F5"
        );
        assert_eq!(product_label("https://www.amazon.fr/"), "page");
        assert_eq!(product_label("not a url"), "page");
    }

    #[test]
    fn robot_check_is_detected() {
        let html = r#"<form method="get" action="/errors/validateCaptcha">"#;
        assert!(is_robot_check(html));
        assert!(!is_robot_check("<title>Amazon.fr : casque</title>"));
    }
}
