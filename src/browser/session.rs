use crate::config::AppConfig;
use crate::error::PriceError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Profile of the running session, for teardown from the Ctrl+C handler.
static ACTIVE_PROFILE: Mutex<Option<PathBuf>> = Mutex::new(None);

pub struct BrowserSession {
    browser: Browser,
    handle: tokio::task::JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    pub async fn launch(chrome_path: PathBuf, config: &AppConfig) -> Result<Self, PriceError> {
        // Unique profile per run so a stale SingletonLock never blocks launch
        let user_data_dir = std::env::temp_dir().join(format!(
            "price-probe-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        ));
        std::fs::create_dir_all(&user_data_dir).map_err(|e| {
            PriceError::BrowserLaunch(format!(
                "Failed to create user data dir {}: {}",
                user_data_dir.display(),
                e
            ))
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(user_data_dir.clone())
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", config.user_agent))
            .arg(format!("--lang={}", config.browser_lang()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--window-size=1920,1080")
            .viewport(None);

        if config.headed {
            builder = builder.with_head();
        } else {
            builder = builder.arg("--headless=new");
        }

        let browser_config = builder.build().map_err(PriceError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PriceError::BrowserLaunch(format!("{}", e)))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("Browser event: {:?}", event);
            }
        });
        track_profile(Some(user_data_dir.clone()));

        Ok(BrowserSession {
            browser,
            handle,
            user_data_dir,
        })
    }

    pub async fn new_page(&self) -> Result<Page, PriceError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| PriceError::BrowserLaunch(format!("Failed to create page: {}", e)))?;

        let hide_webdriver = AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER);
        if let Err(e) = page.evaluate_on_new_document(hide_webdriver).await {
            tracing::debug!("Could not install webdriver override: {}", e);
        }

        Ok(page)
    }

    /// Shut the browser down and remove its temporary profile. Consumes the
    /// session, so it runs at most once.
    pub async fn close(mut self) -> Result<(), PriceError> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| PriceError::BrowserLaunch(format!("Failed to close browser: {}", e)));
        let _ = self.browser.wait().await;
        self.handle.abort();

        track_profile(None);
        remove_profile(&self.user_data_dir).await;
        closed
    }
}

fn track_profile(dir: Option<PathBuf>) {
    if let Ok(mut active) = ACTIVE_PROFILE.lock() {
        *active = dir;
    }
}

/// Remove the running session's profile without waiting for the browser.
/// Called on interrupt, where the async `close` cannot run.
pub fn discard_active_profile() {
    let Some(dir) = ACTIVE_PROFILE.lock().ok().and_then(|mut active| active.take()) else {
        return;
    };
    if let Err(e) = std::fs::remove_dir_all(&dir) {
        tracing::debug!("Could not remove profile {}: {}", dir.display(), e);
    }
}

async fn remove_profile(dir: &Path) {
    if !dir.exists() {
        return;
    }
    for attempt in 1..=3 {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => return,
            Err(e) if attempt < 3 => {
                tracing::debug!(
                    "Cleanup attempt {}/3 for {}: {}, retrying...",
                    attempt,
                    dir.display(),
                    e
                );
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(_) => {
                tracing::debug!(
                    "Could not clean up temp dir {}, will be cleaned by OS",
                    dir.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_profile_deletes_directory_tree() {
        let dir = std::env::temp_dir().join(format!("price-probe-test-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("Default")).unwrap();
        std::fs::write(dir.join("Default").join("Preferences"), "{}").unwrap();

        remove_profile(&dir).await;

        assert!(!dir.exists());
    }

    #[test]
    fn interrupt_discards_the_tracked_profile_once() {
        let dir = std::env::temp_dir().join(format!(
            "price-probe-interrupt-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(dir.join("Default")).unwrap();
        track_profile(Some(dir.clone()));

        discard_active_profile();
        assert!(!dir.exists());

        std::fs::create_dir_all(&dir).unwrap();
        discard_active_profile();
        assert!(dir.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn remove_profile_ignores_missing_directory() {
        remove_profile(Path::new("/nonexistent/price-probe-profile")).await;
    }
}
