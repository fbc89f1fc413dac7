use crate::error::PriceError;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

const CHROME_VERSIONS_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/last-known-good-versions-with-downloads.json";

#[derive(Debug, Deserialize)]
struct VersionIndex {
    channels: Channels,
}

#[derive(Debug, Deserialize)]
struct Channels {
    #[serde(rename = "Stable")]
    stable: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    version: String,
    downloads: Downloads,
}

#[derive(Debug, Deserialize)]
struct Downloads {
    #[serde(default)]
    chrome: Vec<PlatformDownload>,
}

#[derive(Debug, Deserialize)]
struct PlatformDownload {
    platform: String,
    url: String,
}

pub async fn download_chrome(data_dir: &Path) -> Result<PathBuf, PriceError> {
    let chrome_dir = data_dir.join("chrome");
    std::fs::create_dir_all(&chrome_dir)
        .map_err(|e| PriceError::ChromeDownload(format!("Failed to create dir: {}", e)))?;

    eprintln!("Looking up the current Chrome for Testing build...");
    let index: VersionIndex = reqwest::get(CHROME_VERSIONS_URL)
        .await
        .map_err(|e| PriceError::ChromeDownload(format!("Failed to fetch versions: {}", e)))?
        .json()
        .await
        .map_err(|e| PriceError::ChromeDownload(format!("Failed to parse versions: {}", e)))?;
    let download_url = select_download(&index, platform())?;

    eprintln!(
        "Downloading Chrome for Testing {}...",
        index.channels.stable.version
    );
    let bytes = reqwest::get(&download_url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| PriceError::ChromeDownload(format!("Download failed: {}", e)))?
        .bytes()
        .await
        .map_err(|e| PriceError::ChromeDownload(format!("Failed to read response: {}", e)))?;

    eprintln!("Extracting Chrome...");
    extract_zip(&bytes, &chrome_dir)?;

    let binary = super::resolve::downloaded_chrome_path(data_dir);
    if !binary.exists() {
        return Err(PriceError::ChromeDownload(format!(
            "Chrome binary not found after extraction at: {}",
            binary.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| PriceError::ChromeDownload(format!("Failed to set permissions: {}", e)))?;
    }

    eprintln!("Chrome for Testing installed at: {}", binary.display());
    Ok(binary)
}

fn select_download(index: &VersionIndex, platform: &str) -> Result<String, PriceError> {
    index
        .channels
        .stable
        .downloads
        .chrome
        .iter()
        .find(|d| d.platform == platform)
        .map(|d| d.url.clone())
        .ok_or_else(|| {
            PriceError::ChromeDownload(format!("No download found for platform: {}", platform))
        })
}

fn platform() -> &'static str {
    if cfg!(target_os = "macos") {
        if cfg!(target_arch = "aarch64") {
            "mac-arm64"
        } else {
            "mac-x64"
        }
    } else if cfg!(all(target_os = "windows", target_arch = "x86")) {
        "win32"
    } else if cfg!(target_os = "windows") {
        "win64"
    } else {
        "linux64"
    }
}

/// Path of a zip entry with its top-level directory removed, e.g.
/// "chrome-linux64/chrome" → "chrome".
fn strip_top_dir(name: &str) -> Option<&str> {
    name.split_once('/')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
}

fn extract_zip(data: &[u8], dest: &Path) -> Result<(), PriceError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))
        .map_err(|e| PriceError::ChromeDownload(format!("Failed to open zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| PriceError::ChromeDownload(format!("Failed to read zip entry: {}", e)))?;

        let Some(stripped) = strip_top_dir(file.name()).map(PathBuf::from) else {
            continue;
        };
        let out_path = dest.join(stripped);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| {
            PriceError::ChromeDownload(format!("Failed to read file from zip: {}", e))
        })?;
        std::fs::write(&out_path, &buf)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                let _ = std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{
        "timestamp": "2026-10-01T00:00:00.000Z",
        "channels": {
            "Stable": {
                "channel": "Stable",
                "version": "141.0.7390.54",
                "downloads": {
                    "chrome": [
                        {"platform": "linux64", "url": "https://example.test/linux64.zip"},
                        {"platform": "mac-arm64", "url": "https://example.test/mac-arm64.zip"}
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn select_download_matches_platform() {
        let index: VersionIndex = serde_json::from_str(INDEX).unwrap();
        assert_eq!(
            select_download(&index, "mac-arm64").unwrap(),
            "https://example.test/mac-arm64.zip"
        );
        assert!(matches!(
            select_download(&index, "win64"),
            Err(PriceError::ChromeDownload(_))
        ));
    }

    #[test]
    fn strip_top_dir_drops_archive_root() {
        assert_eq!(strip_top_dir("chrome-linux64/chrome"), Some("chrome"));
        assert_eq!(strip_top_dir("chrome-linux64/locales/fr.pak"), Some("locales/fr.pak"));
        assert_eq!(strip_top_dir("chrome-linux64/"), None);
        assert_eq!(strip_top_dir("README"), None);
    }
}
