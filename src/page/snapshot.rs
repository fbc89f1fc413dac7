use super::{Element, PageSource};
use crate::error::PriceError;
use crate::price::rules::{SelectorRule, Strategy};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Static HTML parsed with `scraper`. Nothing appears later, so lookups never wait.
pub struct HtmlSnapshot {
    source: String,
    doc: Html,
}

impl HtmlSnapshot {
    pub fn parse(html: impl Into<String>) -> Self {
        let source = html.into();
        let doc = Html::parse_document(&source);
        Self { source, doc }
    }

    fn selector_for(rule: &SelectorRule) -> Option<Selector> {
        let css = match rule.strategy {
            Strategy::Css => rule.locator.to_string(),
            Strategy::ClassName => format!("[class~=\"{}\"]", rule.locator),
            Strategy::ElementId => format!("[id=\"{}\"]", rule.locator),
            Strategy::XPath => return None,
        };
        let selector = match Selector::parse(&css) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::debug!("Skipping unparsable selector {}: {:?}", css, e);
                None
            }
        };
        selector
    }

    fn element(el: ElementRef<'_>) -> Element {
        let text: String = el.text().collect();
        Element {
            text: text.clone(),
            text_content: Some(text),
            inner_html: Some(el.inner_html()),
        }
    }
}

impl PageSource for HtmlSnapshot {
    /// No XPath engine over static HTML.
    fn supports(&self, strategy: Strategy) -> bool {
        strategy != Strategy::XPath
    }

    async fn find_first(
        &self,
        rule: &SelectorRule,
        _timeout: Duration,
    ) -> Result<Option<Element>, PriceError> {
        let Some(sel) = Self::selector_for(rule) else {
            return Ok(None);
        };
        Ok(self.doc.select(&sel).next().map(Self::element))
    }

    async fn find_all(&self, rule: &SelectorRule) -> Result<Vec<Element>, PriceError> {
        let Some(sel) = Self::selector_for(rule) else {
            return Ok(Vec::new());
        };
        Ok(self.doc.select(&sel).map(Self::element).collect())
    }

    async fn raw_source(&self) -> Result<String, PriceError> {
        Ok(self.source.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <div id="priceblock_ourprice">24,90 €</div>
        <span class="a-price a-text-price"><span class="a-offscreen">31,00 €</span></span>
        <span class="a-price"><span class="a-offscreen">24,90 €</span></span>
    "#;

    #[tokio::test]
    async fn class_rule_matches_one_of_several_classes() {
        let page = HtmlSnapshot::parse(HTML);
        let found = page
            .find_first(&SelectorRule::class("a-text-price"), Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.read_text(), "31,00 €");
    }

    #[tokio::test]
    async fn id_rule_matches_element_id() {
        let page = HtmlSnapshot::parse(HTML);
        let found = page
            .find_first(&SelectorRule::id("priceblock_ourprice"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(found.map(|el| el.read_text()).as_deref(), Some("24,90 €"));
    }

    #[tokio::test]
    async fn find_all_keeps_document_order() {
        let page = HtmlSnapshot::parse(HTML);
        let all = page
            .find_all(&SelectorRule::css(".a-price .a-offscreen"))
            .await
            .unwrap();
        let texts: Vec<String> = all.iter().map(Element::read_text).collect();
        assert_eq!(texts, vec!["31,00 €", "24,90 €"]);
    }

    #[tokio::test]
    async fn xpath_and_broken_selectors_find_nothing() {
        let page = HtmlSnapshot::parse(HTML);
        let xpath = SelectorRule::xpath("//span[@class='a-offscreen']");
        assert!(page.find_first(&xpath, Duration::ZERO).await.unwrap().is_none());
        assert!(page.find_all(&SelectorRule::css("span[")).await.unwrap().is_empty());
    }

    #[test]
    fn xpath_is_the_only_unsupported_strategy() {
        let page = HtmlSnapshot::parse(HTML);
        assert!(page.supports(Strategy::ClassName));
        assert!(page.supports(Strategy::Css));
        assert!(page.supports(Strategy::ElementId));
        assert!(!page.supports(Strategy::XPath));
    }

    #[tokio::test]
    async fn class_and_id_selectors_are_built_from_the_locator() {
        let page = HtmlSnapshot::parse(r#"<b class="a b-c" id="x-1">ok</b>"#);
        let by_class = page
            .find_all(&SelectorRule::class("b-c"))
            .await
            .unwrap();
        let by_id = page
            .find_first(&SelectorRule::id("x-1"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_id.map(|el| el.read_text()).as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn raw_source_is_the_original_markup() {
        let page = HtmlSnapshot::parse(HTML);
        assert_eq!(page.raw_source().await.unwrap(), HTML);
    }
}
