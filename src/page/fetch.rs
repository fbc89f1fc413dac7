//! Plain HTTP fetch for pages that carry their price without JavaScript.

use super::is_robot_check;
use super::snapshot::HtmlSnapshot;
use crate::config::AppConfig;
use crate::error::PriceError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

fn browser_headers(config: &AppConfig) -> Result<HeaderMap, PriceError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(&config.user_agent)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, PriceError> {
    HeaderValue::from_str(value)
        .map_err(|e| PriceError::Config(format!("Invalid header value '{}': {}", value, e)))
}

pub async fn fetch_page(url: &str, config: &AppConfig) -> Result<HtmlSnapshot, PriceError> {
    let client = reqwest::Client::builder()
        .default_headers(browser_headers(config)?)
        .timeout(FETCH_TIMEOUT)
        .build()?;

    tracing::info!("Fetching: {}", url);
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if is_robot_check(&html) {
        return Err(PriceError::Blocked(url.to_string()));
    }

    tracing::debug!("Fetched {} bytes", html.len());
    Ok(HtmlSnapshot::parse(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_configured_identity() {
        let config = AppConfig::defaults();
        let headers = browser_headers(&config).unwrap();
        assert_eq!(headers[USER_AGENT], config.user_agent.as_str());
        assert_eq!(headers[ACCEPT_LANGUAGE], config.accept_language.as_str());
        assert_eq!(headers[CONNECTION], "keep-alive");
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut config = AppConfig::defaults();
        config.user_agent = "bad\nagent".to_string();
        assert!(matches!(browser_headers(&config), Err(PriceError::Config(_))));
    }
}
