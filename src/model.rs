use crate::error::PriceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Euro,
    #[serde(rename = "USD")]
    UsDollar,
    #[serde(rename = "GBP")]
    BritishPound,
}

impl Currency {
    /// Markers recognised in price text, in detection priority order.
    pub const MARKERS: &'static [(&'static str, Currency)] = &[
        ("€", Currency::Euro),
        ("EUR", Currency::Euro),
        ("$", Currency::UsDollar),
        ("USD", Currency::UsDollar),
        ("£", Currency::BritishPound),
        ("GBP", Currency::BritishPound),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Euro => "€",
            Currency::UsDollar => "$",
            Currency::BritishPound => "£",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Euro => "EUR",
            Currency::UsDollar => "USD",
            Currency::BritishPound => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Currency::MARKERS
            .iter()
            .find(|(marker, _)| marker.eq_ignore_ascii_case(s))
            .map(|(_, currency)| *currency)
            .ok_or_else(|| {
                PriceError::Config(format!(
                    "Unknown currency '{}'. Supported: EUR, USD, GBP",
                    s
                ))
            })
    }
}

/// Structured outcome of one price lookup. Built once, never updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceResult {
    pub current_price: Option<f64>,
    pub currency: Option<Currency>,
    pub original_price: Option<f64>,
    pub discount_percent: Option<u32>,
}

impl PriceResult {
    pub fn is_success(&self) -> bool {
        self.current_price.is_some()
    }

    pub fn on_promotion(&self) -> bool {
        match (self.original_price, self.current_price) {
            (Some(original), Some(current)) => original > current,
            _ => false,
        }
    }
}

/// A `PriceResult` plus the provider fault that degraded it, if any.
#[derive(Debug, Default)]
pub struct Resolution {
    pub result: PriceResult,
    pub failure: Option<PriceError>,
}

impl Resolution {
    pub fn resolved(result: PriceResult) -> Self {
        Self {
            result,
            failure: None,
        }
    }

    pub fn failed(error: PriceError) -> Self {
        Self {
            result: PriceResult::default(),
            failure: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.result.is_success()
    }
}
