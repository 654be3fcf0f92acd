//! Connects the engine to a live page.
//!
//! The shim reports DOM events through a DevTools binding; a background task
//! feeds them to the [`Engine`] and renders the returned effects back into the
//! page (or onto the window, for resizes).

use pinpoint_core::{InspectorConfig, Result};
use pinpoint_engine::{Effect, Engine, ResizePlan};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use super::cdp::CdpClient;
use super::shim::{self, ShimMessage, BINDING_NAME};

pub struct Bridge {
    cdp: Arc<CdpClient>,
    engine: Arc<Mutex<Engine>>,
    headed: bool,
    commits: watch::Receiver<u64>,
    task: tokio::task::JoinHandle<()>,
}

impl Bridge {
    pub async fn start(cdp: Arc<CdpClient>, config: &InspectorConfig, headed: bool) -> Result<Self> {
        cdp.add_binding(BINDING_NAME).await?;
        let calls = cdp.subscribe_event("Runtime.bindingCalled").await;
        let navigations = cdp.subscribe_event("Page.frameNavigated").await;

        let engine = Arc::new(Mutex::new(Engine::new(config)));
        let (commit_tx, commits) = watch::channel(0u64);

        let task = tokio::spawn(run_loop(
            cdp.clone(),
            engine.clone(),
            headed,
            calls,
            navigations,
            commit_tx,
        ));

        Ok(Self {
            cdp,
            engine,
            headed,
            commits,
            task,
        })
    }

    /// Install the shim and run the bootstrap. Repeating it replaces the
    /// previous instance.
    pub async fn inject(&self) -> Result<()> {
        self.cdp.evaluate(&shim::install_script()).await?;
        let effects = self.engine.lock().await.bootstrap();
        render(&self.cdp, self.headed, effects).await?;
        info!("Engine injected into page");
        Ok(())
    }

    pub async fn resize(&self, plan: &ResizePlan) -> Result<()> {
        let sizer = self.engine.lock().await.sizer().clone();
        let effects = sizer.resize(plan.content.width, plan.content.height);
        render(&self.cdp, self.headed, effects).await
    }

    pub fn commits(&self) -> watch::Receiver<u64> {
        self.commits.clone()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_loop(
    cdp: Arc<CdpClient>,
    engine: Arc<Mutex<Engine>>,
    headed: bool,
    mut calls: mpsc::Receiver<Value>,
    mut navigations: mpsc::Receiver<Value>,
    commits: watch::Sender<u64>,
) {
    loop {
        tokio::select! {
            call = calls.recv() => {
                let Some(call) = call else { break };
                if call.get("name").and_then(Value::as_str) != Some(BINDING_NAME) {
                    continue;
                }
                let payload = call.get("payload").and_then(Value::as_str).unwrap_or_default();
                let message = match shim::parse_message(payload) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                };
                match message {
                    ShimMessage::Input { input } => {
                        let effects = engine.lock().await.handle(input);
                        if let Err(e) = render(&cdp, headed, effects).await {
                            warn!(error = %e, "Failed to render engine effects");
                        }
                    }
                    ShimMessage::Committed { seq } => {
                        debug!(seq, "Selection committed in page");
                        let _ = commits.send(seq);
                    }
                    ShimMessage::Ready => debug!("Page shim ready"),
                    ShimMessage::Error { message } => warn!(message = %message, "Page shim error"),
                }
            }
            nav = navigations.recv() => {
                let Some(nav) = nav else { break };
                // Child frames report a parentId; only the main frame replaces the page.
                if nav.pointer("/frame/parentId").is_some() {
                    continue;
                }
                engine.lock().await.reset();
                let _ = commits.send(0);
                debug!("Main frame navigated; engine reset");
            }
        }
    }
    debug!("Bridge loop finished");
}

/// Window-level effects go to the browser, everything else into the page.
async fn render(cdp: &CdpClient, headed: bool, effects: Vec<Effect>) -> Result<()> {
    let (window, page): (Vec<Effect>, Vec<Effect>) =
        effects.into_iter().partition(Effect::is_window_level);

    for effect in window {
        if let Effect::ResizeWindow { content, window } = effect {
            resize_window(cdp, headed, content.width, content.height, window.width, window.height)
                .await?;
        }
    }

    if !page.is_empty() {
        let applied = cdp.evaluate(&shim::apply_effects_js(&page)?).await?;
        if applied != Value::Bool(true) {
            debug!("Shim not present; {} effects dropped", page.len());
        }
    }
    Ok(())
}

async fn resize_window(
    cdp: &CdpClient,
    headed: bool,
    content_width: u32,
    content_height: u32,
    window_width: u32,
    window_height: u32,
) -> Result<()> {
    if headed {
        let resized = match cdp.window_for_target().await {
            Ok(id) => cdp.set_window_size(id, window_width, window_height).await,
            Err(e) => Err(e),
        };
        match resized {
            Ok(()) => return Ok(()),
            Err(e) => debug!(error = %e, "Window bounds unavailable, overriding metrics"),
        }
    }
    cdp.set_device_metrics(content_width, content_height).await
}
