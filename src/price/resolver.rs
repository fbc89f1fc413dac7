//! Price resolution over a rendered product page.
//!
//! Rule lists are probed in order with early exit. Missing elements and
//! unparsable text only leave fields empty; a fault in the page source aborts
//! the run and degrades the result to all-absent.

use super::diagnostics::{note, Diagnostic, Diagnostics, Field};
use super::normalize::{
    detect_currency, find_price_in_source, join_whole_and_fraction, looks_like_discount,
    parse_amount, parse_discount_percent,
};
use super::rules::{RuleSet, SelectorRule, PRICE_SYMBOL_CLASS};
use crate::error::PriceError;
use crate::model::{Currency, PriceResult, Resolution};
use crate::page::PageSource;
use std::time::Duration;

const OFFSCREEN_TRACE_LIMIT: usize = 10;

/// Raw text recovered for each field, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub current_price: Option<String>,
    pub original_price: Option<String>,
    pub discount: Option<String>,
}

pub struct PriceResolver {
    rules: RuleSet,
    lookup_timeout: Duration,
    default_currency: Currency,
}

impl PriceResolver {
    pub fn new(rules: RuleSet, lookup_timeout: Duration, default_currency: Currency) -> Self {
        Self {
            rules,
            lookup_timeout,
            default_currency,
        }
    }

    pub async fn resolve<P: PageSource>(
        &self,
        page: &P,
        diagnostics: &mut dyn Diagnostics,
    ) -> Resolution {
        match self.extract(page, diagnostics).await {
            Ok(raw) => Resolution::resolved(self.assemble(&raw, diagnostics)),
            Err(e) => {
                tracing::warn!("Price resolution aborted: {}", e);
                Resolution::failed(e)
            }
        }
    }

    /// Steps 1-5: collect raw text for every field.
    pub async fn extract<P: PageSource>(
        &self,
        page: &P,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<RawFields, PriceError> {
        if diagnostics.enabled() {
            self.trace_offscreen_prices(page, diagnostics).await?;
        }

        let mut current_price = self.find_current_price(page, diagnostics).await?;
        let mut original_price = self
            .find_original_price(page, current_price.as_deref(), diagnostics)
            .await?;
        let discount = self.find_discount(page, diagnostics).await?;

        if discount.is_some() && original_price.is_none() {
            original_price = self
                .widen_original_search(page, current_price.as_deref(), diagnostics)
                .await?;
        }

        if current_price.is_none() {
            let source = page.raw_source().await?;
            current_price = find_price_in_source(&source);
            note(diagnostics, || Diagnostic::SourceFallback {
                text: current_price.clone(),
            });
        }

        Ok(RawFields {
            current_price,
            original_price,
            discount,
        })
    }

    async fn trace_offscreen_prices<P: PageSource>(
        &self,
        page: &P,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<(), PriceError> {
        let elements = page.find_all(&self.rules.offscreen_price).await?;
        for (index, el) in elements.iter().take(OFFSCREEN_TRACE_LIMIT).enumerate() {
            diagnostics.record(Diagnostic::OffscreenPrice {
                index,
                text: el.read_text(),
            });
        }
        Ok(())
    }

    async fn find_current_price<P: PageSource>(
        &self,
        page: &P,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Option<String>, PriceError> {
        for rule in self.rules.current_price {
            if unsupported(page, rule, diagnostics) {
                continue;
            }
            let Some(el) = page.find_first(rule, self.lookup_timeout).await? else {
                continue;
            };
            let mut text = el.read_text();
            if text.is_empty() {
                continue;
            }
            if let Some(fraction_class) = rule.fraction_class {
                text = self.with_fraction(page, &text, fraction_class).await?;
            }

            tracing::debug!("Current price found with {}", rule);
            note(diagnostics, || Diagnostic::CurrentPriceMatched {
                rule: rule.to_string(),
                text: text.clone(),
            });
            return Ok(Some(text));
        }
        Ok(None)
    }

    async fn with_fraction<P: PageSource>(
        &self,
        page: &P,
        whole: &str,
        fraction_class: &'static str,
    ) -> Result<String, PriceError> {
        let fraction = page
            .find_first(&SelectorRule::class(fraction_class), Duration::ZERO)
            .await?
            .map(|el| el.read_text())
            .unwrap_or_default();
        let symbol = page
            .find_first(&SelectorRule::class(PRICE_SYMBOL_CLASS), Duration::ZERO)
            .await?
            .map(|el| el.read_text());
        Ok(join_whole_and_fraction(whole, &fraction, symbol.as_deref()))
    }

    async fn find_original_price<P: PageSource>(
        &self,
        page: &P,
        current_raw: Option<&str>,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Option<String>, PriceError> {
        for rule in self.rules.original_price {
            if unsupported(page, rule, diagnostics) {
                continue;
            }
            let elements = page.find_all(rule).await?;
            note(diagnostics, || Diagnostic::OriginalRuleAttempt {
                rule: rule.to_string(),
                matches: elements.len(),
            });

            for el in &elements {
                let text = el.read_text_or_html();
                if text.is_empty() {
                    note(diagnostics, || Diagnostic::OriginalCandidate {
                        text: text.clone(),
                        accepted: false,
                        reason: "empty",
                    });
                    continue;
                }
                if echoes_current(&text, current_raw) {
                    note(diagnostics, || Diagnostic::OriginalCandidate {
                        text: text.clone(),
                        accepted: false,
                        reason: "same as current price",
                    });
                    continue;
                }

                tracing::debug!("Original price found with {}", rule);
                note(diagnostics, || Diagnostic::OriginalCandidate {
                    text: text.clone(),
                    accepted: true,
                    reason: "differs from current price",
                });
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    async fn find_discount<P: PageSource>(
        &self,
        page: &P,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Option<String>, PriceError> {
        for rule in self.rules.discount {
            if unsupported(page, rule, diagnostics) {
                continue;
            }
            let Some(el) = page.find_first(rule, Duration::ZERO).await? else {
                continue;
            };
            let text = el.read_text();
            if !looks_like_discount(&text) {
                note(diagnostics, || Diagnostic::DiscountRejected {
                    rule: rule.to_string(),
                    text: text.clone(),
                });
                continue;
            }

            tracing::debug!("Discount found with {}", rule);
            note(diagnostics, || Diagnostic::DiscountMatched {
                rule: rule.to_string(),
                text: text.clone(),
            });
            return Ok(Some(text));
        }
        Ok(None)
    }

    /// Any offscreen element carrying the currency symbol that is not the
    /// current price itself.
    async fn widen_original_search<P: PageSource>(
        &self,
        page: &P,
        current_raw: Option<&str>,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Option<String>, PriceError> {
        let symbol = current_raw
            .and_then(detect_currency)
            .unwrap_or(self.default_currency)
            .symbol();

        let priced: Vec<String> = page
            .find_all(&self.rules.offscreen_price)
            .await?
            .iter()
            .map(|el| el.read_text())
            .filter(|text| text.contains(symbol))
            .collect();
        note(diagnostics, || Diagnostic::WidenedSearch {
            candidates: priced.len(),
        });

        Ok(priced
            .into_iter()
            .find(|text| !echoes_current(text, current_raw)))
    }

    /// Steps 6-7: normalize each raw field and build the result.
    pub fn assemble(&self, raw: &RawFields, diagnostics: &mut dyn Diagnostics) -> PriceResult {
        let current_price = raw
            .current_price
            .as_deref()
            .and_then(|text| amount_or_note(text, Field::CurrentPrice, diagnostics));

        let currency = current_price.map(|_| {
            raw.current_price
                .as_deref()
                .and_then(detect_currency)
                .unwrap_or(self.default_currency)
        });

        let original_price = raw
            .original_price
            .as_deref()
            .and_then(|text| amount_or_note(text, Field::OriginalPrice, diagnostics))
            .filter(|original| current_price.is_some_and(|current| *original > current));

        let discount_percent = raw.discount.as_deref().and_then(|text| {
            let percent = parse_discount_percent(text);
            if percent.is_none() {
                note(diagnostics, || Diagnostic::Unparsable {
                    field: Field::Discount,
                    raw: text.to_string(),
                });
            }
            percent
        });

        PriceResult {
            current_price,
            currency,
            original_price,
            discount_percent,
        }
    }
}

/// Repeats the current price, verbatim or as the same amount. The whole/fraction
/// rule rebuilds its text, so its own offscreen copy differs only in format.
fn echoes_current(text: &str, current_raw: Option<&str>) -> bool {
    let Some(current) = current_raw else {
        return false;
    };
    text == current
        || parse_amount(text).is_some_and(|amount| parse_amount(current) == Some(amount))
}

fn unsupported<P: PageSource>(
    page: &P,
    rule: &SelectorRule,
    diagnostics: &mut dyn Diagnostics,
) -> bool {
    if page.supports(rule.strategy) {
        return false;
    }
    note(diagnostics, || Diagnostic::RuleSkipped {
        rule: rule.to_string(),
    });
    true
}

fn amount_or_note(text: &str, field: Field, diagnostics: &mut dyn Diagnostics) -> Option<f64> {
    let amount = parse_amount(text);
    if amount.is_none() {
        tracing::debug!("Unparsable {} text: {:?}", field, text);
        note(diagnostics, || Diagnostic::Unparsable {
            field,
            raw: text.to_string(),
        });
    }
    amount
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
