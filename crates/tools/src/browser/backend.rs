//! [`PageBackend`] over a real Chromium-family browser.

use async_trait::async_trait;
use pinpoint_core::{
    BrowserConfig, Error, InspectorConfig, MutationOutcome, MutationRequest, Paths, Result,
    Screenshot, SelectionSlot,
};
use pinpoint_engine::ResizePlan;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::bridge::Bridge;
use super::cdp::CdpClient;
use super::launch::BrowserProcess;
use super::shim::{self, READ_SLOT_JS};
use crate::driver::{BrowserLauncher, PageBackend, POLL_INTERVAL};

pub struct ChromeLauncher {
    paths: Paths,
    inspector: InspectorConfig,
}

impl ChromeLauncher {
    pub fn new(paths: Paths, inspector: InspectorConfig) -> Self {
        Self { paths, inspector }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn launch(&self, config: &BrowserConfig, session_id: &str) -> Result<Box<dyn PageBackend>> {
        let profile_dir = self.paths.browser_profile_dir(session_id);
        let mut process = BrowserProcess::spawn(config, profile_dir).await?;

        let connected = async {
            let ws_url = process
                .page_ws_url(Duration::from_secs(config.launch_timeout_secs))
                .await?;
            let cdp = Arc::new(CdpClient::connect(&ws_url).await?);
            cdp.enable_domain("Page").await?;
            cdp.enable_domain("Runtime").await?;
            let bridge = Bridge::start(cdp.clone(), &self.inspector, config.headed).await?;
            Ok::<_, Error>((cdp, bridge))
        }
        .await;

        let (cdp, bridge) = match connected {
            Ok(parts) => parts,
            Err(e) => {
                process.kill().await;
                return Err(e);
            }
        };
        info!(session = session_id, port = process.debug_port, "DevTools connection established");

        Ok(Box::new(CdpBackend {
            process,
            cdp,
            bridge,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
        }))
    }
}

pub struct CdpBackend {
    process: BrowserProcess,
    cdp: Arc<CdpClient>,
    bridge: Bridge,
    navigation_timeout: Duration,
}

impl CdpBackend {
    fn ensure_connected(&self) -> Result<()> {
        if self.cdp.is_connected() {
            Ok(())
        } else {
            Err(Error::Browser("browser disconnected".to_string()))
        }
    }
}

#[async_trait]
impl PageBackend for CdpBackend {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_connected()?;
        self.cdp.navigate(url, self.navigation_timeout).await
    }

    async fn inject(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.bridge.inject().await
    }

    async fn read_slot(&mut self) -> Result<SelectionSlot> {
        self.ensure_connected()?;
        let value = self.cdp.evaluate(READ_SLOT_JS).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn apply_mutation(&mut self, request: &MutationRequest) -> Result<MutationOutcome> {
        self.ensure_connected()?;
        let value = self.cdp.evaluate(&shim::mutation_js(request)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn resize(&mut self, plan: &ResizePlan) -> Result<()> {
        self.ensure_connected()?;
        self.bridge.resize(plan).await
    }

    async fn screenshot(&mut self) -> Result<Screenshot> {
        self.ensure_connected()?;
        let data = self.cdp.screenshot_png().await?;
        Ok(Screenshot {
            mime_type: "image/png".to_string(),
            data,
        })
    }

    /// Woken by commit notifications from the page, with polling as a
    /// fallback when a notification is lost.
    async fn wait_for_commit(&mut self, after: u64, timeout: Duration) -> Result<SelectionSlot> {
        let mut commits = self.bridge.commits();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let slot = self.read_slot().await?;
            if slot.seq > after && slot.record.is_some() {
                return Ok(slot);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "no annotation was submitted within {}s",
                    timeout.as_secs()
                )));
            }
            tokio::select! {
                changed = commits.changed() => {
                    if changed.is_err() {
                        tokio::time::sleep(POLL_INTERVAL).await;
                    }
                }
                _ = tokio::time::sleep(POLL_INTERVAL * 5) => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.cdp.close_browser().await {
            debug!("Browser.close failed (may already be gone): {}", e);
        }
        self.process.kill().await;
        Ok(())
    }
}
