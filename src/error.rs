use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Chrome download failed: {0}")]
    ChromeDownload(String),

    #[error("Browser navigation failed: {0}")]
    Navigation(String),

    #[error("Blocked by a robot check: {0}")]
    Blocked(String),

    #[error("Lost the page while reading it: {0}")]
    PageLost(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse grouping used by the shell to pick advisory messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Blocked,
    BrowserUnavailable,
    Network,
    PageLost,
    Usage,
    Other,
}

impl PriceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PriceError::Blocked(_) => FailureKind::Blocked,
            PriceError::BrowserLaunch(_) | PriceError::ChromeDownload(_) => {
                FailureKind::BrowserUnavailable
            }
            PriceError::Navigation(_) | PriceError::Network(_) => FailureKind::Network,
            PriceError::PageLost(_) => FailureKind::PageLost,
            PriceError::Usage(_) | PriceError::Config(_) => FailureKind::Usage,
            PriceError::Io(_) | PriceError::Json(_) => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_groups_browser_failures() {
        assert_eq!(
            PriceError::ChromeDownload("no zip".into()).kind(),
            FailureKind::BrowserUnavailable
        );
        assert_eq!(
            PriceError::BrowserLaunch("exit 1".into()).kind(),
            FailureKind::BrowserUnavailable
        );
    }

    #[test]
    fn kind_separates_blocked_from_network() {
        assert_eq!(PriceError::Blocked("captcha".into()).kind(), FailureKind::Blocked);
        assert_eq!(PriceError::Navigation("dns".into()).kind(), FailureKind::Network);
    }
}
