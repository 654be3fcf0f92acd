use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths::Paths;
use crate::types::DeviceProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// "chrome" or "edge".
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Explicit browser executable; discovered on PATH when unset.
    #[serde(default)]
    pub binary: Option<String>,
    /// The operator interacts with the page, so sessions are visible by default.
    #[serde(default = "default_headed")]
    pub headed: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
    /// When false, launching while a session is open is a conflict instead of
    /// closing the old session first.
    #[serde(default = "default_replace_existing_session")]
    pub replace_existing_session: bool,
}

fn default_engine() -> String {
    "chrome".to_string()
}

fn default_headed() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_navigation_timeout_ms() -> u64 {
    10_000
}

fn default_launch_timeout_secs() -> u64 {
    15
}

fn default_replace_existing_session() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            binary: None,
            headed: default_headed(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            launch_timeout_secs: default_launch_timeout_secs(),
            replace_existing_session: default_replace_existing_session(),
        }
    }
}

/// Highlight overlay colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub border: String,
    pub background: String,
}

impl Palette {
    pub fn exploring() -> Self {
        Self {
            border: "#3b82f6".to_string(),
            background: "rgba(59, 130, 246, 0.12)".to_string(),
        }
    }

    pub fn locked() -> Self {
        Self {
            border: "#ef4444".to_string(),
            background: "rgba(239, 68, 68, 0.16)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorConfig {
    #[serde(default = "Palette::exploring")]
    pub exploring_palette: Palette,
    #[serde(default = "Palette::locked")]
    pub locked_palette: Palette,
    /// Lifetime of the post-submit success notice.
    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,
    /// Delay between a submit and the highlight/panel teardown.
    #[serde(default = "default_unlock_delay_ms")]
    pub unlock_delay_ms: u64,
    #[serde(default = "default_text_preview_chars")]
    pub text_preview_chars: usize,
    #[serde(default = "default_dialog_width")]
    pub dialog_width: f64,
    #[serde(default = "default_dialog_height")]
    pub dialog_height: f64,
    /// Horizontal distance between the locked element and the dialog.
    #[serde(default = "default_dialog_gap")]
    pub dialog_gap: f64,
    /// Minimum distance kept between the dialog and the viewport edges.
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f64,
    /// Window-frame allowance added to a requested content size.
    #[serde(default = "default_chrome_width")]
    pub chrome_width: u32,
    #[serde(default = "default_chrome_height")]
    pub chrome_height: u32,
    /// Computed-style properties captured into the selection record. Empty captures all.
    #[serde(default = "default_captured_styles")]
    pub captured_styles: Vec<String>,
    /// Extra device profiles appended to the built-in catalog.
    #[serde(default)]
    pub devices: Vec<DeviceProfile>,
}

fn default_notice_ms() -> u64 {
    2000
}

fn default_unlock_delay_ms() -> u64 {
    1500
}

fn default_text_preview_chars() -> usize {
    50
}

fn default_dialog_width() -> f64 {
    320.0
}

fn default_dialog_height() -> f64 {
    200.0
}

fn default_dialog_gap() -> f64 {
    12.0
}

fn default_edge_margin() -> f64 {
    8.0
}

fn default_chrome_width() -> u32 {
    16
}

fn default_chrome_height() -> u32 {
    88
}

fn default_captured_styles() -> Vec<String> {
    [
        "display",
        "position",
        "width",
        "height",
        "margin",
        "padding",
        "color",
        "background-color",
        "font-family",
        "font-size",
        "font-weight",
        "line-height",
        "text-align",
        "border",
        "border-radius",
        "box-shadow",
        "opacity",
        "visibility",
        "z-index",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            exploring_palette: Palette::exploring(),
            locked_palette: Palette::locked(),
            notice_ms: default_notice_ms(),
            unlock_delay_ms: default_unlock_delay_ms(),
            text_preview_chars: default_text_preview_chars(),
            dialog_width: default_dialog_width(),
            dialog_height: default_dialog_height(),
            dialog_gap: default_dialog_gap(),
            edge_margin: default_edge_margin(),
            chrome_width: default_chrome_width(),
            chrome_height: default_chrome_height(),
            captured_styles: default_captured_styles(),
            devices: Vec::new(),
        }
    }
}

impl InspectorConfig {
    /// Built-in catalog followed by configured extras.
    pub fn device_catalog(&self) -> Vec<DeviceProfile> {
        let mut devices = DeviceProfile::catalog();
        for extra in &self.devices {
            if DeviceProfile::find(&devices, &extra.name).is_none() {
                devices.push(extra.clone());
            }
        }
        devices
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub inspector: InspectorConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.browser.engine.to_lowercase().as_str() {
            "chrome" | "chromium" | "edge" | "msedge" => {}
            other => {
                return Err(Error::Config(format!(
                    "unsupported browser engine '{}' (expected chrome or edge)",
                    other
                )))
            }
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(Error::Config("window size must be positive".to_string()));
        }
        if let Some(bad) = self
            .inspector
            .devices
            .iter()
            .find(|d| d.width == 0 || d.height == 0)
        {
            return Err(Error::Config(format!(
                "device '{}' must have a positive width and height",
                bad.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "browser": { "headed": false } }"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert!(!cfg.browser.headed);
        assert_eq!(cfg.browser.engine, "chrome");
        assert!(cfg.browser.replace_existing_session);
        assert_eq!(cfg.inspector.notice_ms, 2000);
        assert_eq!(cfg.inspector.locked_palette, Palette::locked());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path().to_path_buf());
        let mut cfg = Config::default();
        cfg.browser.window_width = 1024;
        cfg.inspector.devices.push(DeviceProfile::new("Kiosk", 1080, 1920));
        cfg.save(&paths.config_file()).unwrap();

        let loaded = Config::load_or_default(&paths).unwrap();
        assert_eq!(loaded.browser.window_width, 1024);
        assert!(DeviceProfile::find(&loaded.inspector.device_catalog(), "kiosk").is_some());
    }

    #[test]
    fn test_rejects_unknown_engine() {
        let raw = r#"{ "browser": { "engine": "netscape" } }"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_extra_device_does_not_shadow_builtin() {
        let mut inspector = InspectorConfig::default();
        inspector.devices.push(DeviceProfile::new("iPhone SE", 1, 1));
        let catalog = inspector.device_catalog();
        let se = DeviceProfile::find(&catalog, "iPhone SE").unwrap();
        assert_eq!(se.width, 375);
        assert_eq!(catalog.len(), DeviceProfile::catalog().len());
    }
}
