//! In-memory browser backed by [`SimulatedPage`].
//!
//! Pages come from a fixed site map (or `data:text/html,` URLs). Nothing is
//! rendered, so screenshots are plain-text descriptions of the page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use pinpoint_core::{
    BrowserConfig, Error, InspectorConfig, MutationOutcome, MutationRequest, Result, Screenshot,
    SelectionSlot, Size,
};
use pinpoint_engine::{Effect, ResizePlan, SimulatedPage};
use tokio::sync::Mutex;
use tracing::debug;

use super::{BrowserLauncher, PageBackend};

pub type SharedPage = Arc<Mutex<SimulatedPage>>;

const DATA_HTML_PREFIX: &str = "data:text/html,";

pub struct SimulatedLauncher {
    sites: Arc<HashMap<String, String>>,
    inspector: InspectorConfig,
    last_page: std::sync::Mutex<Option<SharedPage>>,
    launches: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl Default for SimulatedLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLauncher {
    pub fn new() -> Self {
        Self {
            sites: Arc::new(HashMap::new()),
            inspector: InspectorConfig::default(),
            last_page: std::sync::Mutex::new(None),
            launches: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_site(mut self, url: &str, html: &str) -> Self {
        Arc::make_mut(&mut self.sites).insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_inspector(mut self, inspector: InspectorConfig) -> Self {
        self.inspector = inspector;
        self
    }

    /// Page of the most recent launch, for driving operator input.
    pub fn last_page(&self) -> Option<SharedPage> {
        self.last_page.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Browsers launched and not yet closed.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for SimulatedLauncher {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn launch(&self, config: &BrowserConfig, session_id: &str) -> Result<Box<dyn PageBackend>> {
        let viewport = Size::new(config.window_width, config.window_height);
        let page = Arc::new(Mutex::new(SimulatedPage::new(
            "",
            viewport,
            self.inspector.clone(),
        )));
        if let Ok(mut last) = self.last_page.lock() {
            *last = Some(page.clone());
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!(session = session_id, "Simulated browser launched");

        Ok(Box::new(SimulatedBackend {
            page,
            sites: self.sites.clone(),
            live: self.live.clone(),
            closed: false,
        }))
    }
}

pub struct SimulatedBackend {
    page: SharedPage,
    sites: Arc<HashMap<String, String>>,
    live: Arc<AtomicUsize>,
    closed: bool,
}

impl SimulatedBackend {
    fn resolve(&self, url: &str) -> Result<String> {
        if let Some(html) = url.strip_prefix(DATA_HTML_PREFIX) {
            return Ok(html.to_string());
        }
        if url == "about:blank" {
            return Ok(String::new());
        }
        self.sites
            .get(url)
            .or_else(|| self.sites.get(url.trim_end_matches('/')))
            .cloned()
            .ok_or_else(|| Error::Browser(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Browser("browser has been closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageBackend for SimulatedBackend {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        let html = self.resolve(url)?;
        self.page.lock().await.navigate(&html);
        Ok(())
    }

    async fn inject(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.page.lock().await.inject();
        Ok(())
    }

    async fn read_slot(&mut self) -> Result<SelectionSlot> {
        self.ensure_open()?;
        Ok(self.page.lock().await.slot().clone())
    }

    async fn apply_mutation(&mut self, request: &MutationRequest) -> Result<MutationOutcome> {
        self.ensure_open()?;
        Ok(self.page.lock().await.apply_mutation(request))
    }

    async fn resize(&mut self, plan: &ResizePlan) -> Result<()> {
        self.ensure_open()?;
        self.page.lock().await.apply_all(vec![
            Effect::ResizeWindow {
                content: plan.content,
                window: plan.window,
            },
            Effect::SetSizeInputs {
                width: plan.content.width,
                height: plan.content.height,
            },
        ]);
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Screenshot> {
        self.ensure_open()?;
        let text = self.page.lock().await.render_text();
        Ok(Screenshot {
            mime_type: "text/plain".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(text.as_bytes()),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        if !self.closed {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_data_url_and_unknown_site() {
        let launcher = SimulatedLauncher::new();
        let mut backend = launcher
            .launch(&BrowserConfig::default(), "s1")
            .await
            .unwrap();
        backend
            .navigate("data:text/html,<p id=\"x\">hi</p>")
            .await
            .unwrap();
        let page = launcher.last_page().unwrap();
        assert!(page.lock().await.query_selector("#x").is_some());

        assert!(matches!(
            backend.navigate("http://missing.test/").await,
            Err(Error::Browser(_))
        ));
    }

    #[tokio::test]
    async fn test_screenshot_is_text() {
        let launcher = SimulatedLauncher::new();
        let mut backend = launcher
            .launch(&BrowserConfig::default(), "s1")
            .await
            .unwrap();
        let shot = backend.screenshot().await.unwrap();
        assert_eq!(shot.mime_type, "text/plain");
        let text = base64::engine::general_purpose::STANDARD
            .decode(shot.data)
            .unwrap();
        assert!(String::from_utf8(text).unwrap().starts_with("viewport 1280x800"));
    }

    #[tokio::test]
    async fn test_closed_backend_fails_and_drop_releases() {
        let launcher = SimulatedLauncher::new();
        let mut backend = launcher
            .launch(&BrowserConfig::default(), "s1")
            .await
            .unwrap();
        backend.close().await.unwrap();
        backend.close().await.unwrap();
        assert_eq!(launcher.live_count(), 0);
        assert!(matches!(backend.read_slot().await, Err(Error::Browser(_))));

        let other = launcher
            .launch(&BrowserConfig::default(), "s2")
            .await
            .unwrap();
        assert_eq!(launcher.live_count(), 1);
        drop(other);
        assert_eq!(launcher.live_count(), 0);
    }
}
