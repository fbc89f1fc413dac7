use super::{is_robot_check, Element, PageSource};
use crate::error::PriceError;
use crate::price::rules::SelectorRule;
use chromiumoxide::Page;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const READY_STATE_CHECKS: u32 = 20;

// Returns a JSON array of {text, textContent, innerHtml}. Bad locators yield
// an empty array rather than a script error.
const LOOKUP_SCRIPT: &str = r#"
    (function(strategy, locator, all) {
        var nodes = [];
        try {
            if (strategy === 'xpath') {
                var hit = document.evaluate(locator, document, null,
                    XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
                if (hit) nodes.push(hit);
            } else if (strategy === 'id') {
                var byId = document.getElementById(locator);
                if (byId) nodes.push(byId);
            } else if (strategy === 'class') {
                nodes = Array.prototype.slice.call(document.getElementsByClassName(locator));
            } else {
                nodes = Array.prototype.slice.call(document.querySelectorAll(locator));
            }
        } catch (e) {
            return '[]';
        }
        if (!all) nodes = nodes.slice(0, 1);
        return JSON.stringify(nodes.map(function(n) {
            return {
                text: n.innerText || '',
                textContent: n.textContent,
                innerHtml: n.innerHTML || null
            };
        }));
    })
"#;

/// A product page rendered by Chrome.
pub struct LivePage {
    page: Page,
}

impl LivePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn lookup(&self, rule: &SelectorRule, all: bool) -> Result<Vec<Element>, PriceError> {
        let script = format!(
            "{}({}, {}, {})",
            LOOKUP_SCRIPT,
            serde_json::to_string(rule.strategy.as_str())?,
            serde_json::to_string(rule.locator)?,
            all
        );

        let json = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PriceError::PageLost(format!("Lookup of {} failed: {}", rule, e)))?
            .into_value::<String>()
            .map_err(|e| PriceError::PageLost(format!("Lookup of {} returned nothing: {}", rule, e)))?;

        Ok(serde_json::from_str(&json)?)
    }
}

impl PageSource for LivePage {
    async fn find_first(
        &self,
        rule: &SelectorRule,
        timeout: Duration,
    ) -> Result<Option<Element>, PriceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.lookup(rule, false).await?.into_iter().next() {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(&self, rule: &SelectorRule) -> Result<Vec<Element>, PriceError> {
        self.lookup(rule, true).await
    }

    async fn raw_source(&self) -> Result<String, PriceError> {
        self.page
            .content()
            .await
            .map_err(|e| PriceError::PageLost(format!("Failed to get page content: {}", e)))
    }
}

pub struct Navigator {
    settle_delay: Duration,
}

impl Navigator {
    pub fn new(settle_delay_ms: u64) -> Self {
        Self {
            settle_delay: Duration::from_millis(settle_delay_ms),
        }
    }

    pub async fn navigate(&self, page: &Page, url: &str) -> Result<String, PriceError> {
        tracing::info!("Navigating to: {}", url);

        page.goto(url)
            .await
            .map_err(|e| PriceError::Navigation(format!("Failed to navigate to {}: {}", url, e)))?;

        // Fixed settle delay for scripts that fill in prices after load
        tokio::time::sleep(self.settle_delay).await;

        for _ in 0..READY_STATE_CHECKS {
            let ready = page
                .evaluate("document.readyState")
                .await
                .ok()
                .and_then(|v| v.into_value::<String>().ok())
                .unwrap_or_default();
            if ready == "complete" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| PriceError::Navigation(format!("Failed to get page content: {}", e)))?;

        if is_robot_check(&html) {
            return Err(PriceError::Blocked(url.to_string()));
        }

        Ok(html)
    }

    pub async fn navigate_with_retry(
        &self,
        page: &Page,
        url: &str,
        max_retries: u32,
    ) -> Result<String, PriceError> {
        let mut attempt = 1;
        loop {
            match self.navigate(page, url).await {
                Ok(html) => return Ok(html),
                // Robot checks are not retried
                Err(e @ PriceError::Blocked(_)) => return Err(e),
                Err(e) if attempt > max_retries => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Navigation attempt {}/{} failed: {}",
                        attempt,
                        max_retries + 1,
                        e
                    );
                    let backoff = Duration::from_secs(2u64.pow(attempt - 1));
                    tracing::info!("Retrying in {:?}...", backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
