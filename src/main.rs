mod browser;
mod cli;
mod config;
mod error;
mod model;
mod output;
mod page;
mod price;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use clap::Parser;
use cli::Cli;
use config::{AppConfig, Overrides};

use crate::browser::session::BrowserSession;
use crate::error::PriceError;
use crate::model::Resolution;
use crate::page::live::{LivePage, Navigator};
use crate::page::PageSource;
use crate::price::{Diagnostics, PriceResolver, RuleSet, Silent, TraceLog};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "price_probe=debug"
    } else {
        "price_probe=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(raw_url) = cli.target_url() else {
        eprintln!("Error: no product URL given\n");
        eprintln!("Usage:\n  price-probe <URL>\n  price-probe --url <URL>");
        return Ok(ExitCode::FAILURE);
    };
    let url = match validate_url(raw_url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = AppConfig::load(Overrides {
        currency: cli.currency.clone(),
        settle_ms: cli.settle,
        timeout_ms: cli.timeout,
        headed: cli.headed,
        debug: cli.debug,
        no_browser: cli.no_browser,
    })
    .context("Failed to load configuration")?;

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted.");
        browser::session::discard_active_profile();
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    if !cli.json {
        eprintln!("Loading {} ...", url);
    }

    let resolution = if config.use_browser {
        check_in_browser(&config, &url).await
    } else {
        check_over_http(&config, &url).await
    };

    if cli.json {
        let json = output::format_json(&url, &resolution).context("Failed to encode result")?;
        println!("{}", json);
    } else {
        print!("{}", output::format_report(&url, &resolution));
    }

    Ok(output::exit_code(&resolution))
}

fn validate_url(input: &str) -> Result<String, PriceError> {
    let parsed = url::Url::parse(input)
        .map_err(|e| PriceError::Usage(format!("Invalid URL '{}': {}", input, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PriceError::Usage(format!(
            "Unsupported URL scheme '{}'. Use an http(s) product URL",
            parsed.scheme()
        )));
    }

    let is_amazon = parsed
        .host_str()
        .is_some_and(|host| host.to_ascii_lowercase().contains("amazon"));
    if !is_amazon {
        eprintln!("Warning: this does not look like an Amazon URL: {}", input);
    }

    Ok(parsed.to_string())
}

/// Render the page in Chrome and resolve against the live DOM. The browser is
/// closed on every path once it has launched.
async fn check_in_browser(config: &AppConfig, url: &str) -> Resolution {
    let session = match launch_browser(config).await {
        Ok(session) => session,
        Err(e) => return Resolution::failed(e),
    };

    let resolution = match session.new_page().await {
        Ok(page) => resolve_live(config, url, page).await,
        Err(e) => Resolution::failed(e),
    };

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    resolution
}

async fn launch_browser(config: &AppConfig) -> Result<BrowserSession, PriceError> {
    let chrome_path =
        browser::resolve::resolve_chrome(config.browser_path.as_ref(), &config.data_dir).await?;
    BrowserSession::launch(chrome_path, config).await
}

async fn resolve_live(config: &AppConfig, url: &str, page: Page) -> Resolution {
    let navigator = Navigator::new(config.settle_delay_ms);
    let html = match navigator
        .navigate_with_retry(&page, url, config.retries)
        .await
    {
        Ok(html) => html,
        Err(e) => return Resolution::failed(e),
    };
    crate::page::debug_dump_html(&html, &crate::page::product_label(url));

    resolve(config, &LivePage::new(page)).await
}

async fn check_over_http(config: &AppConfig, url: &str) -> Resolution {
    match page::fetch::fetch_page(url, config).await {
        Ok(snapshot) => {
            if let Ok(html) = snapshot.raw_source().await {
                crate::page::debug_dump_html(&html, &crate::page::product_label(url));
            }
            resolve(config, &snapshot).await
        }
        Err(e) => Resolution::failed(e),
    }
}

async fn resolve<P: PageSource>(config: &AppConfig, page: &P) -> Resolution {
    let resolver = PriceResolver::new(
        RuleSet::AMAZON,
        Duration::from_millis(config.lookup_timeout_ms),
        config.default_currency,
    );
    let mut sink: Box<dyn Diagnostics> = if config.debug {
        Box::new(TraceLog)
    } else {
        Box::new(Silent)
    };
    resolver.resolve(page, sink.as_mut()).await
}
