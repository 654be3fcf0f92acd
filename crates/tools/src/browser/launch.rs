//! Locating, starting and stopping a Chromium-family browser with remote
//! debugging enabled.

use pinpoint_core::{BrowserConfig, Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEngine {
    Chrome,
    Edge,
}

impl BrowserEngine {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "edge" | "msedge" => Ok(Self::Edge),
            other => Err(Error::Config(format!(
                "unsupported browser engine '{}' (expected chrome or edge)",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        }
    }

    fn candidates(&self) -> Vec<&'static str> {
        match self {
            Self::Chrome => {
                if cfg!(target_os = "macos") {
                    vec![
                        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                        "/Applications/Chromium.app/Contents/MacOS/Chromium",
                    ]
                } else if cfg!(target_os = "linux") {
                    vec![
                        "google-chrome",
                        "google-chrome-stable",
                        "chromium",
                        "chromium-browser",
                        "/usr/bin/google-chrome",
                        "/usr/bin/chromium",
                    ]
                } else {
                    vec![
                        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                    ]
                }
            }
            Self::Edge => {
                if cfg!(target_os = "macos") {
                    vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
                } else if cfg!(target_os = "linux") {
                    vec!["microsoft-edge", "microsoft-edge-stable", "/usr/bin/microsoft-edge"]
                } else {
                    vec![
                        r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                        r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
                    ]
                }
            }
        }
    }
}

/// The configured binary when set, otherwise the first known install found
/// on disk or PATH.
pub fn find_browser_binary(engine: BrowserEngine, configured: Option<&str>) -> Option<String> {
    if let Some(path) = configured.map(str::trim).filter(|p| !p.is_empty()) {
        if Path::new(path).exists() || which::which(path).is_ok() {
            return Some(path.to_string());
        }
        return None;
    }
    for candidate in engine.candidates() {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

pub fn build_browser_args(
    debug_port: u16,
    user_data_dir: &Path,
    config: &BrowserConfig,
) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--password-store=basic".to_string(),
        format!(
            "--window-size={},{}",
            config.window_width, config.window_height
        ),
    ];
    if !config.headed {
        args.push("--headless=new".to_string());
    }
    args.push("about:blank".to_string());
    args
}

/// A running browser and its throwaway profile.
pub struct BrowserProcess {
    pub engine: BrowserEngine,
    pub debug_port: u16,
    pub profile_dir: PathBuf,
    child: Child,
}

impl BrowserProcess {
    pub async fn spawn(config: &BrowserConfig, profile_dir: PathBuf) -> Result<Self> {
        let engine = BrowserEngine::parse(&config.engine)?;
        let binary = find_browser_binary(engine, config.binary.as_deref()).ok_or_else(|| {
            Error::Browser(format!(
                "{} not found; install it or set browser.binary in the config",
                engine.name()
            ))
        })?;

        std::fs::create_dir_all(&profile_dir)?;
        let debug_port = find_free_port().await?;
        let args = build_browser_args(debug_port, &profile_dir, config);

        info!(
            browser = engine.name(),
            port = debug_port,
            headed = config.headed,
            "Launching browser"
        );
        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Browser(format!("failed to start {}: {}", binary, e)))?;

        Ok(Self {
            engine,
            debug_port,
            profile_dir,
            child,
        })
    }

    /// Page-target WebSocket URL once the debugging endpoint answers.
    pub async fn page_ws_url(&self, timeout: Duration) -> Result<String> {
        wait_for_cdp_ready(self.debug_port, timeout).await?;
        get_page_ws_url(self.debug_port).await
    }

    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("Browser process already gone: {}", e);
        }
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            debug!(dir = %self.profile_dir.display(), "Profile cleanup skipped: {}", e);
        }
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

async fn wait_for_cdp_ready(port: u16, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    let url = format!("http://127.0.0.1:{}/json/version", port);
    loop {
        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if body.get("webSocketDebuggerUrl").is_some() {
                    return Ok(());
                }
            }
        }
        if start.elapsed() > timeout {
            return Err(Error::Browser(format!(
                "DevTools endpoint not ready after {}s on port {}",
                timeout.as_secs(),
                port
            )));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// The first target of type "page" from `/json/list`. The target may take a
/// moment to appear after the browser answers.
async fn get_page_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/list", port);
    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        let Ok(resp) = reqwest::get(&url).await else {
            continue;
        };
        let Ok(targets) = resp.json::<Vec<Value>>().await else {
            continue;
        };
        let found = targets
            .iter()
            .filter(|t| t.get("type").and_then(Value::as_str) == Some("page"))
            .find_map(|t| t.get("webSocketDebuggerUrl").and_then(Value::as_str));
        if let Some(ws_url) = found {
            return Ok(ws_url.to_string());
        }
    }
    Err(Error::Browser("no page target found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse() {
        assert_eq!(BrowserEngine::parse("Chrome").unwrap(), BrowserEngine::Chrome);
        assert_eq!(BrowserEngine::parse("msedge").unwrap(), BrowserEngine::Edge);
        assert!(matches!(BrowserEngine::parse("firefox"), Err(Error::Config(_))));
    }

    #[test]
    fn test_args_follow_config() {
        let mut config = BrowserConfig::default();
        let dir = Path::new("/tmp/profile");
        let args = build_browser_args(9333, dir, &config);
        assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
        assert!(args.contains(&"--window-size=1280,800".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert_eq!(args.last().map(String::as_str), Some("about:blank"));

        config.headed = false;
        let args = build_browser_args(9333, dir, &config);
        assert!(args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn test_configured_binary_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, "").unwrap();
        let fake = fake.to_string_lossy().to_string();
        assert_eq!(
            find_browser_binary(BrowserEngine::Chrome, Some(&fake)),
            Some(fake.clone())
        );
        let missing = dir.path().join("nope").to_string_lossy().to_string();
        assert_eq!(find_browser_binary(BrowserEngine::Chrome, Some(&missing)), None);
    }
}
