//! Selector rules for Amazon product pages.
//!
//! Each list is probed in order and the first satisfying rule wins. Update the
//! locators here when Amazon changes its markup.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ClassName,
    Css,
    ElementId,
    XPath,
}

impl Strategy {
    /// Name understood by the in-page lookup script.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::ClassName => "class",
            Strategy::Css => "css",
            Strategy::ElementId => "id",
            Strategy::XPath => "xpath",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorRule {
    pub strategy: Strategy,
    pub locator: &'static str,
    /// Class holding the cents part when the locator only yields the whole part.
    pub fraction_class: Option<&'static str>,
}

impl SelectorRule {
    pub const fn class(name: &'static str) -> Self {
        Self::new(Strategy::ClassName, name)
    }

    pub const fn css(selector: &'static str) -> Self {
        Self::new(Strategy::Css, selector)
    }

    pub const fn id(id: &'static str) -> Self {
        Self::new(Strategy::ElementId, id)
    }

    pub const fn xpath(expr: &'static str) -> Self {
        Self::new(Strategy::XPath, expr)
    }

    pub const fn with_fraction(mut self, class: &'static str) -> Self {
        self.fraction_class = Some(class);
        self
    }

    const fn new(strategy: Strategy, locator: &'static str) -> Self {
        Self {
            strategy,
            locator,
            fraction_class: None,
        }
    }
}

impl fmt::Display for SelectorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.strategy.as_str(), self.locator)
    }
}

/// The three ordered rule lists plus the generic offscreen price locator.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub current_price: &'static [SelectorRule],
    pub original_price: &'static [SelectorRule],
    pub discount: &'static [SelectorRule],
    pub offscreen_price: SelectorRule,
}

/// Class of the currency symbol next to a whole/fraction price pair.
pub const PRICE_SYMBOL_CLASS: &str = "a-price-symbol";

impl RuleSet {
    pub const AMAZON: RuleSet = RuleSet {
        current_price: CURRENT_PRICE_RULES,
        original_price: ORIGINAL_PRICE_RULES,
        discount: DISCOUNT_RULES,
        offscreen_price: SelectorRule::css(".a-offscreen"),
    };
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::AMAZON
    }
}

const CURRENT_PRICE_RULES: &[SelectorRule] = &[
    SelectorRule::class("a-price-whole").with_fraction("a-price-fraction"),
    SelectorRule::css(".a-price .a-offscreen"),
    SelectorRule::id("priceblock_ourprice"),
    SelectorRule::id("priceblock_dealprice"),
    SelectorRule::css("span.a-price span.a-offscreen"),
    SelectorRule::xpath("//span[contains(@class, 'a-price')]//span[@class='a-offscreen']"),
    SelectorRule::css("#corePrice_feature_div .a-price .a-offscreen"),
    SelectorRule::css("#apex_desktop .a-price .a-offscreen"),
];

// Struck-through and "recommended" price containers, most specific first.
const ORIGINAL_PRICE_RULES: &[SelectorRule] = &[
    SelectorRule::css("#corePriceDisplay_desktop_feature_div .basisPrice .a-offscreen"),
    SelectorRule::css(".basisPrice .a-offscreen"),
    SelectorRule::css(
        "#corePrice_feature_div span.a-price.a-text-price[data-a-strike='true'] .a-offscreen",
    ),
    SelectorRule::css("span.a-price.a-text-price[data-a-strike='true'] .a-offscreen"),
    SelectorRule::css(".a-price[data-a-strike='true'] .a-offscreen"),
    SelectorRule::css("span[data-a-strike='true'] .a-offscreen"),
    SelectorRule::css("#corePriceDisplay_desktop_feature_div .a-text-price .a-offscreen"),
    SelectorRule::css("#apex_desktop .a-text-price .a-offscreen"),
    SelectorRule::css(".a-text-price .a-offscreen"),
    SelectorRule::css(".a-text-price span[aria-hidden='true']"),
    SelectorRule::css("#listPrice"),
    SelectorRule::css("#priceblock_listprice"),
    SelectorRule::css(".priceBlockStrikePriceString"),
    SelectorRule::css(".a-text-strike"),
    SelectorRule::xpath(
        "//span[contains(text(), 'Prix conseillé')]/following::span[@class='a-offscreen'][1]",
    ),
    SelectorRule::xpath(
        "//span[contains(text(), 'Ancien prix')]/following::span[@class='a-offscreen'][1]",
    ),
    SelectorRule::xpath(
        "//span[contains(text(), 'List Price')]/following::span[@class='a-offscreen'][1]",
    ),
    SelectorRule::xpath("//*[contains(@class, 'basisPrice')]//span[@class='a-offscreen']"),
];

const DISCOUNT_RULES: &[SelectorRule] = &[
    SelectorRule::css("#corePriceDisplay_desktop_feature_div .savingsPercentage"),
    SelectorRule::css("#apex_desktop .savingsPercentage"),
    SelectorRule::css(".savingsPercentage"),
    SelectorRule::css(".reinventPriceSavingsPercentageMargin"),
    SelectorRule::css("#regularprice_savings .a-color-price"),
    SelectorRule::css("#dealprice_savings .a-color-price"),
    SelectorRule::css("#savingsPercentage"),
    SelectorRule::css(".a-badge-label-inner .a-badge-text"),
    SelectorRule::css(".a-color-price.a-size-large"),
    SelectorRule::xpath("//span[contains(text(), '%') and contains(text(), '-')]"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_price_rules_follow_legacy_priority() {
        let rules = RuleSet::AMAZON.current_price;
        assert_eq!(rules.len(), 8);
        assert_eq!(rules[0].strategy, Strategy::ClassName);
        assert_eq!(rules[0].fraction_class, Some("a-price-fraction"));
        assert_eq!(rules[2], SelectorRule::id("priceblock_ourprice"));
        assert_eq!(rules[3], SelectorRule::id("priceblock_dealprice"));
        assert_eq!(rules[5].strategy, Strategy::XPath);
        assert!(rules[6].locator.starts_with("#corePrice_feature_div"));
        assert!(rules[7].locator.starts_with("#apex_desktop"));
    }

    #[test]
    fn only_the_whole_price_rule_has_a_fraction() {
        let with_fraction = RuleSet::AMAZON
            .current_price
            .iter()
            .filter(|rule| rule.fraction_class.is_some())
            .count();
        assert_eq!(with_fraction, 1);
    }

    #[test]
    fn original_and_discount_rules_avoid_legacy_strategies() {
        let rules = RuleSet::AMAZON
            .original_price
            .iter()
            .chain(RuleSet::AMAZON.discount);
        for rule in rules {
            assert!(
                matches!(rule.strategy, Strategy::Css | Strategy::XPath),
                "unexpected strategy for {}",
                rule
            );
        }
    }

    #[test]
    fn rule_display_names_strategy_and_locator() {
        assert_eq!(
            SelectorRule::id("priceblock_ourprice").to_string(),
            "id `priceblock_ourprice`"
        );
    }
}
