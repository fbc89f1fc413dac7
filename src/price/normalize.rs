use crate::model::Currency;
use regex::Regex;
use std::sync::LazyLock;

// Amount next to a euro marker, in either order. Anything price-shaped in the
// markup qualifies, so review counts or shipping fees can be picked up too.
static SOURCE_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+[,.]\d+\s*€|€\s*\d+[,.]\d+|\d+[,.]\d+\s*EUR").expect("valid price pattern")
});

/// First currency marker found in `text`, scanning markers in priority order.
pub fn detect_currency(text: &str) -> Option<Currency> {
    Currency::MARKERS
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, currency)| *currency)
}

/// Parse an amount by keeping digits, commas and periods, then reading the
/// first comma as the decimal separator.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.replacen(',', ".", 1).parse().ok()
}

pub fn normalize_price(text: &str) -> (Option<f64>, Option<Currency>) {
    (parse_amount(text), detect_currency(text))
}

/// First run of digits in a discount label such as "-25 %".
pub fn parse_discount_percent(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Discount labels carry both a percent sign and a minus sign; ratings and
/// other percentages do not.
pub fn looks_like_discount(text: &str) -> bool {
    text.contains('%') && (text.contains('-') || text.contains('\u{2212}'))
}

/// Last-resort scan of the raw markup for anything shaped like a euro price.
pub fn find_price_in_source(html: &str) -> Option<String> {
    SOURCE_PRICE.find(html).map(|m| m.as_str().to_string())
}

/// Build a raw price from the whole/fraction pair Amazon renders separately,
/// e.g. "59," + "99" → "59.99".
pub fn join_whole_and_fraction(whole: &str, fraction: &str, symbol: Option<&str>) -> String {
    let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    let fraction_digits: String = fraction.chars().filter(char::is_ascii_digit).collect();

    let mut joined = if fraction_digits.is_empty() {
        whole_digits
    } else {
        format!("{}.{}", whole_digits, fraction_digits)
    };
    if let Some(symbol) = symbol.map(str::trim).filter(|s| !s.is_empty()) {
        joined.push_str(symbol);
    }
    joined
}
