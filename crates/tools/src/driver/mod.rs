//! Host coordination driver.
//!
//! Owns the single browser/page session (`launch → use → close`), runs the
//! injection bootstrap, reads the committed selection record out of the page,
//! and applies mutations back onto it. Page access goes through
//! [`PageBackend`], so the same driver runs against a live browser or the
//! in-memory simulated page.

pub mod simulated;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pinpoint_core::{
    BrowserConfig, Config, DeviceProfile, Error, MutationOutcome, MutationRequest, Result,
    Screenshot, SelectionRecord, SelectionSlot,
};
use pinpoint_engine::{ResizePlan, ViewportSizer};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Interval used by backends that cannot push a commit signal.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One page inside one browser process.
#[async_trait]
pub trait PageBackend: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Run the injection bootstrap in the current page.
    async fn inject(&mut self) -> Result<()>;

    /// Read `seq` and `record` together in one call.
    async fn read_slot(&mut self) -> Result<SelectionSlot>;

    async fn apply_mutation(&mut self, request: &MutationRequest) -> Result<MutationOutcome>;

    async fn resize(&mut self, plan: &ResizePlan) -> Result<()>;

    async fn screenshot(&mut self) -> Result<Screenshot>;

    /// Resolve once a commit newer than `after` is in the slot.
    async fn wait_for_commit(&mut self, after: u64, timeout: Duration) -> Result<SelectionSlot> {
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
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) -> Result<()>;
}

/// Starts browser processes and hands back a page.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    fn name(&self) -> &str;

    async fn launch(&self, config: &BrowserConfig, session_id: &str) -> Result<Box<dyn PageBackend>>;
}

pub struct Session {
    pub id: String,
    pub url: String,
    pub opened_at: DateTime<Utc>,
    pub injected: bool,
    backend: Box<dyn PageBackend>,
}

/// Serializable view of the open session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub url: String,
    pub opened_at: DateTime<Utc>,
    pub injected: bool,
}

pub type DriverHandle = Arc<Mutex<Driver>>;

pub struct Driver {
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
    sizer: ViewportSizer,
    session: Option<Session>,
}

impl Driver {
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let sizer = ViewportSizer::new(&config.inspector);
        Self {
            config,
            launcher,
            sizer,
            session: None,
        }
    }

    pub fn into_handle(self) -> DriverHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn launcher_name(&self) -> &str {
        self.launcher.name()
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session.as_ref().map(|s| SessionInfo {
            id: s.id.clone(),
            url: s.url.clone(),
            opened_at: s.opened_at,
            injected: s.injected,
        })
    }

    pub fn devices(&self) -> &[DeviceProfile] {
        self.sizer.devices()
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(Error::NoSession)
    }

    /// A browser failure mid-call leaves nothing worth keeping; drop the
    /// session so the next launch starts clean.
    async fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(Error::Browser(reason)) = &result {
            warn!(reason = %reason, "Browser failure, closing session");
            self.close_session().await;
        }
        result
    }

    pub async fn launch_session(&mut self, url: Option<&str>) -> Result<Screenshot> {
        let url = normalize_url(url)?;

        if let Some(existing) = &self.session {
            if !self.config.browser.replace_existing_session {
                return Err(Error::SessionConflict(existing.url.clone()));
            }
            info!(session = %existing.id, "Replacing open browser session");
            self.close_session().await;
        }

        let id = uuid::Uuid::new_v4().to_string();
        info!(session = %id, url = %url, launcher = self.launcher.name(), "Launching browser session");
        let mut backend = self.launcher.launch(&self.config.browser, &id).await?;

        if let Err(e) = backend.navigate(&url).await {
            warn!(url = %url, error = %e, "Navigation failed, closing partial session");
            if let Err(close_err) = backend.close().await {
                debug!(error = %close_err, "Close after failed navigation also failed");
            }
            return Err(e);
        }

        self.session = Some(Session {
            id,
            url,
            opened_at: Utc::now(),
            injected: false,
            backend,
        });
        self.screenshot().await
    }

    pub async fn inject_engine(&mut self) -> Result<Screenshot> {
        let session = self.session_mut()?;
        let result = session.backend.inject().await;
        if result.is_ok() {
            session.injected = true;
            info!(session = %session.id, "Inspection enabled");
        }
        self.settle(result).await?;
        self.screenshot().await
    }

    pub async fn read_selection_record(&mut self) -> Result<SelectionRecord> {
        let session = self.session_mut()?;
        let result = session.backend.read_slot().await;
        let slot = self.settle(result).await?;
        slot.record.ok_or(Error::NoSelection)
    }

    /// Block until the operator submits a new annotation. Enables inspection
    /// first when it is not yet active in the page.
    pub async fn wait_for_selection(&mut self, timeout: Duration) -> Result<SelectionRecord> {
        let injected = self.session_mut()?.injected;
        if !injected {
            self.inject_engine().await?;
        }
        let result = self.session_mut()?.backend.read_slot().await;
        let current = self.settle(result).await?.seq;
        debug!(after = current, timeout_ms = timeout.as_millis() as u64, "Waiting for selection commit");
        let result = self
            .session_mut()?
            .backend
            .wait_for_commit(current, timeout)
            .await;
        let slot = self.settle(result).await?;
        slot.record.ok_or(Error::NoSelection)
    }

    pub async fn apply_mutation(
        &mut self,
        request: &MutationRequest,
    ) -> Result<(MutationOutcome, Screenshot)> {
        self.session_mut()?;
        if request.selector.trim().is_empty() {
            return Err(Error::Validation("selector must not be empty".to_string()));
        }
        if !request.has_changes() {
            return Err(Error::Validation(
                "provide css and/or html to apply".to_string(),
            ));
        }

        let result = self.session_mut()?.backend.read_slot().await;
        let slot = self.settle(result).await?;
        if slot.record.is_none() {
            return Err(Error::NoSelection);
        }

        let result = self.session_mut()?.backend.apply_mutation(request).await;
        let outcome = self.settle(result).await?;
        if !outcome.matched {
            warn!(selector = %request.selector, "Selector no longer matches any element");
        }
        let shot = self.screenshot().await?;
        Ok((outcome, shot))
    }

    pub async fn resize_viewport(&mut self, width: u32, height: u32) -> Result<(ResizePlan, Screenshot)> {
        self.session_mut()?;
        let plan = self.sizer.plan(width, height).ok_or_else(|| {
            Error::Validation("width and height must be positive integers".to_string())
        })?;
        let result = self.session_mut()?.backend.resize(&plan).await;
        self.settle(result).await?;
        info!(width, height, "Viewport resized");
        let shot = self.screenshot().await?;
        Ok((plan, shot))
    }

    pub async fn resize_to_device(&mut self, name: &str) -> Result<(DeviceProfile, ResizePlan, Screenshot)> {
        let device = self
            .sizer
            .device(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("device '{}'", name)))?;
        let (plan, shot) = self.resize_viewport(device.width, device.height).await?;
        Ok((device, plan, shot))
    }

    pub async fn screenshot(&mut self) -> Result<Screenshot> {
        let result = self.session_mut()?.backend.screenshot().await;
        self.settle(result).await
    }

    /// Idempotent. Returns whether a session was actually closed.
    pub async fn close_session(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                if let Err(e) = session.backend.close().await {
                    warn!(session = %session.id, error = %e, "Error while closing browser");
                }
                info!(session = %session.id, "Browser session closed");
                true
            }
            None => false,
        }
    }
}

/// Trim, default a missing scheme to `http://`, and validate.
pub fn normalize_url(raw: Option<&str>) -> Result<String> {
    let raw = raw
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Validation("url is required".to_string()))?;

    // `localhost:3000` parses as scheme "localhost"; only trust a scheme
    // followed by "//" or one of the opaque ones.
    let has_scheme = raw.contains("://")
        || ["about:", "data:", "file:"]
            .iter()
            .any(|p| raw.to_ascii_lowercase().starts_with(p));
    let candidate = if has_scheme {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    url::Url::parse(&candidate)
        .map(|_| candidate.clone())
        .map_err(|e| Error::Validation(format!("invalid url '{}': {}", raw, e)))
}
