use crate::error::PriceError;
use std::path::{Path, PathBuf};

/// Resolves the Chrome binary path. Priority:
/// 1. User-configured path (from config)
/// 2. System-installed Chrome or Chromium
/// 3. Previously downloaded Chrome for Testing
/// 4. Auto-download Chrome for Testing
pub async fn resolve_chrome(
    user_path: Option<&PathBuf>,
    data_dir: &Path,
) -> Result<PathBuf, PriceError> {
    if let Some(path) = user_path {
        if path.exists() {
            tracing::info!("Using user-configured browser: {}", path.display());
            return Ok(path.clone());
        }
        tracing::warn!(
            "User-configured browser path does not exist: {}",
            path.display()
        );
    }

    if let Some(path) = detect_system_chrome() {
        tracing::info!("Using system Chrome: {}", path.display());
        return Ok(path);
    }

    let downloaded = downloaded_chrome_path(data_dir);
    if downloaded.exists() {
        tracing::info!("Using downloaded Chrome: {}", downloaded.display());
        return Ok(downloaded);
    }

    tracing::info!("No Chrome found. Downloading Chrome for Testing...");
    super::download::download_chrome(data_dir).await
}

fn system_candidates() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    }
}

fn detect_system_chrome() -> Option<PathBuf> {
    if let Some(found) = system_candidates()
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    {
        return Some(found);
    }

    #[cfg(unix)]
    {
        for name in ["google-chrome", "chromium"] {
            let Ok(output) = std::process::Command::new("which").arg(name).output() else {
                continue;
            };
            let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if output.status.success() && !path_str.is_empty() {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}

pub fn downloaded_chrome_path(data_dir: &Path) -> PathBuf {
    let chrome_dir = data_dir.join("chrome");
    if cfg!(target_os = "macos") {
        chrome_dir
            .join("Google Chrome for Testing.app")
            .join("Contents")
            .join("MacOS")
            .join("Google Chrome for Testing")
    } else if cfg!(target_os = "windows") {
        chrome_dir.join("chrome.exe")
    } else {
        chrome_dir.join("chrome")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloaded_path_lives_under_data_dir() {
        let data_dir = Path::new("/tmp/price-probe-data");
        let path = downloaded_chrome_path(data_dir);
        assert!(path.starts_with("/tmp/price-probe-data/chrome"));
    }

    #[tokio::test]
    async fn existing_user_path_wins() {
        let exe = std::env::current_exe().unwrap();
        let resolved = resolve_chrome(Some(&exe), Path::new("/nonexistent"))
            .await
            .unwrap();
        assert_eq!(resolved, exe);
    }
}
