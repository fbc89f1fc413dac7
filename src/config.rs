use crate::error::PriceError;
use crate::model::Currency;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_currency: Currency,
    pub settle_delay_ms: u64,
    pub lookup_timeout_ms: u64,
    pub retries: u32,
    pub user_agent: String,
    pub accept_language: String,
    pub headed: bool,
    pub debug: bool,
    pub use_browser: bool,
    pub browser_path: Option<PathBuf>,
    pub data_dir: PathBuf,
}

/// Values passed on the command line; `None` defers to env, file, then defaults.
#[derive(Debug, Default)]
pub struct Overrides {
    pub currency: Option<String>,
    pub settle_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub headed: bool,
    pub debug: bool,
    pub no_browser: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: ConfigDefaults,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigDefaults {
    currency: Option<String>,
    browser_path: Option<String>,
    settle_ms: Option<u64>,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    user_agent: Option<String>,
    accept_language: Option<String>,
}

impl AppConfig {
    pub fn load(overrides: Overrides) -> Result<Self, PriceError> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("price-probe");
        let file_config = load_config_file(&config_dir);
        Self::resolve(overrides, file_config.defaults, |key| std::env::var(key).ok())
    }

    // Priority: CLI flags → env vars → config file → defaults
    fn resolve(
        overrides: Overrides,
        file: ConfigDefaults,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PriceError> {
        let base = Self::defaults();

        let default_currency = match overrides
            .currency
            .or_else(|| env("PRICE_PROBE_CURRENCY"))
            .or(file.currency)
        {
            Some(raw) => raw.parse()?,
            None => base.default_currency,
        };

        let browser_path = env("PRICE_PROBE_BROWSER_PATH")
            .or(file.browser_path)
            .map(PathBuf::from);

        let user_agent = env("PRICE_PROBE_USER_AGENT")
            .or(file.user_agent)
            .unwrap_or(base.user_agent);

        let lookup_timeout_ms = overrides
            .timeout_ms
            .or(file.timeout_ms)
            .unwrap_or(base.lookup_timeout_ms);
        if lookup_timeout_ms == 0 {
            return Err(PriceError::Config(
                "Lookup timeout must be at least 1 ms".to_string(),
            ));
        }

        Ok(AppConfig {
            default_currency,
            settle_delay_ms: overrides
                .settle_ms
                .or(file.settle_ms)
                .unwrap_or(base.settle_delay_ms),
            lookup_timeout_ms,
            retries: file.retries.unwrap_or(base.retries),
            user_agent,
            accept_language: file.accept_language.unwrap_or(base.accept_language),
            headed: overrides.headed,
            debug: overrides.debug,
            use_browser: !overrides.no_browser,
            browser_path,
            data_dir: base.data_dir,
        })
    }

    pub fn defaults() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("price-probe");

        AppConfig {
            default_currency: Currency::Euro,
            settle_delay_ms: 3000,
            lookup_timeout_ms: 5000,
            retries: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            headed: false,
            debug: false,
            use_browser: true,
            browser_path: None,
            data_dir,
        }
    }

    /// First language tag of the Accept-Language value, for Chrome's `--lang`.
    pub fn browser_lang(&self) -> &str {
        self.accept_language
            .split([',', ';'])
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("en-US")
    }
}

fn load_config_file(config_dir: &Path) -> ConfigFile {
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        return ConfigFile::default();
    }
    match std::fs::read_to_string(&config_path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
            ConfigFile::default()
        }),
        Err(_) => ConfigFile::default(),
    }
}
