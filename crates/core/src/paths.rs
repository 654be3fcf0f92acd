use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".pinpoint"))
            .unwrap_or_else(|| PathBuf::from(".pinpoint"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Chrome user-data-dir root; each launch gets its own subdirectory.
    pub fn browser_dir(&self) -> PathBuf {
        self.base.join("browser")
    }

    pub fn browser_profile_dir(&self, session_id: &str) -> PathBuf {
        let safe = session_id.replace([':', '/', '\\'], "_");
        self.browser_dir().join(safe)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
