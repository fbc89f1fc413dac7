use crate::error::FailureKind;
use crate::model::{Currency, PriceResult, Resolution};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    succeeded: bool,
    on_promotion: bool,
    #[serde(flatten)]
    result: &'a PriceResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn format_report(url: &str, resolution: &Resolution) -> String {
    let mut out = String::new();
    out.push_str(&format!("## Price for {}\n\n", url));

    let result = &resolution.result;
    let Some(current) = result.current_price else {
        out.push_str(&format_failure(resolution));
        return out;
    };
    let currency = result.currency.unwrap_or(Currency::Euro);

    out.push_str(&format!(
        "- **Current price:** {} ({})\n",
        format_amount(current, currency),
        currency.code()
    ));
    if let Some(original) = result.original_price {
        out.push_str(&format!(
            "- **Original price:** ~~{}~~\n",
            format_amount(original, currency)
        ));
    }
    if let Some(percent) = result.discount_percent {
        out.push_str(&format!("- **Discount:** -{}%\n", percent));
    }

    if result.on_promotion() {
        if let Some(original) = result.original_price {
            out.push_str(&format!(
                "\n**On promotion:** save {}\n",
                format_amount(original - current, currency)
            ));
        }
    }
    out
}

pub fn format_json(url: &str, resolution: &Resolution) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        url,
        succeeded: resolution.succeeded(),
        on_promotion: resolution.result.on_promotion(),
        result: &resolution.result,
        error: resolution.failure.as_ref().map(|e| e.to_string()),
    };
    serde_json::to_string_pretty(&report)
}

fn format_failure(resolution: &Resolution) -> String {
    let mut out = String::new();
    match &resolution.failure {
        Some(e) => out.push_str(&format!("Could not read the page: {}\n", e)),
        None => out.push_str("No price found on this page.\n"),
    }

    out.push_str("\nHints:\n");
    for hint in hints(resolution.failure.as_ref().map(|e| e.kind())) {
        out.push_str(&format!("- {}\n", hint));
    }
    out
}

fn hints(kind: Option<FailureKind>) -> &'static [&'static str] {
    match kind {
        Some(FailureKind::Blocked) => &[
            "Amazon answered with a robot check instead of the product page",
            "Wait a few minutes before trying again, or retry with --headed",
        ],
        Some(FailureKind::BrowserUnavailable) => &[
            "Check that Chrome or Chromium is installed",
            "Point PRICE_PROBE_BROWSER_PATH at a Chrome binary",
            "Or try --no-browser to fetch the page over plain HTTP",
        ],
        Some(FailureKind::Network) => &[
            "Check the URL and your network connection",
            "The page may have taken too long to load",
        ],
        Some(FailureKind::PageLost) => &["The browser stopped responding while reading the page"],
        Some(FailureKind::Usage) | Some(FailureKind::Other) => &["Run with --debug for details"],
        None => &[
            "The item may no longer exist or be unavailable",
            "Amazon may be blocking automated access",
            "Run with --debug to list every price element on the page",
        ],
    }
}

/// Amount with its currency, e.g. "59,99 €", "$59.99", "£59.99".
pub fn format_amount(amount: f64, currency: Currency) -> String {
    match currency {
        Currency::Euro => format!("{:.2} €", amount).replace('.', ","),
        Currency::UsDollar | Currency::BritishPound => {
            format!("{}{:.2}", currency.symbol(), amount)
        }
    }
}

/// Success iff a current price was resolved.
pub fn exit_code(resolution: &Resolution) -> ExitCode {
    if resolution.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriceError;

    fn promo() -> Resolution {
        Resolution::resolved(PriceResult {
            current_price: Some(59.99),
            currency: Some(Currency::Euro),
            original_price: Some(79.99),
            discount_percent: Some(25),
        })
    }

    #[test]
    fn amounts_use_local_formatting() {
        assert_eq!(format_amount(59.99, Currency::Euro), "59,99 €");
        assert_eq!(format_amount(12.5, Currency::UsDollar), "$12.50");
        assert_eq!(format_amount(7.0, Currency::BritishPound), "£7.00");
    }

    #[test]
    fn promotion_report_lists_all_fields() {
        let report = format_report("https://www.amazon.fr/dp/B0DCBB2YTR", &promo());
        assert!(report.contains("- **Current price:** 59,99 €"));
        assert!(report.contains("- **Original price:** ~~79,99 €~~"));
        assert!(report.contains("- **Discount:** -25%"));
        assert!(report.contains("**On promotion:** save 20,00 €"));
    }

    #[test]
    fn plain_price_has_no_banner() {
        let resolution = Resolution::resolved(PriceResult {
            current_price: Some(19.99),
            currency: Some(Currency::UsDollar),
            ..PriceResult::default()
        });
        let report = format_report("https://www.amazon.com/dp/B08N5WRWNW", &resolution);
        assert!(report.contains("- **Current price:** $19.99"));
        assert!(!report.contains("On promotion"));
    }

    #[test]
    fn blocked_page_gets_robot_check_hints() {
        let resolution = Resolution::failed(PriceError::Blocked("captcha".into()));
        let report = format_report("https://www.amazon.fr/dp/B0DCBB2YTR", &resolution);
        assert!(report.contains("Could not read the page"));
        assert!(report.contains("robot check"));
    }

    #[test]
    fn missing_price_gets_generic_hints() {
        let resolution = Resolution::resolved(PriceResult::default());
        let report = format_report("https://www.amazon.fr/dp/B0DCBB2YTR", &resolution);
        assert!(report.contains("No price found"));
        assert!(report.contains("no longer exist"));
    }

    #[test]
    fn exit_code_follows_current_price() {
        let code = |r: &Resolution| format!("{:?}", exit_code(r));
        assert_eq!(code(&promo()), format!("{:?}", ExitCode::SUCCESS));
        let failed = Resolution::failed(PriceError::Navigation("timeout".into()));
        assert_eq!(code(&failed), format!("{:?}", ExitCode::FAILURE));
    }

    #[test]
    fn json_report_flattens_the_result() {
        let json = format_json("https://www.amazon.fr/dp/B0DCBB2YTR", &promo()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["succeeded"], true);
        assert_eq!(value["on_promotion"], true);
        assert_eq!(value["current_price"], 59.99);
        assert_eq!(value["currency"], "EUR");
        assert_eq!(value["discount_percent"], 25);
        assert!(value.get("error").is_none());
    }
}
