//! Chrome DevTools Protocol client over a page WebSocket.
//!
//! A writer task owns the sink, a reader task routes responses to their
//! pending command and events to subscribers. Every failure surfaces as
//! [`Error::Browser`].

use pinpoint_core::{Error, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;
type Listeners = Arc<Mutex<HashMap<String, Vec<mpsc::Sender<Value>>>>>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CdpClient {
    ws_tx: mpsc::Sender<String>,
    pending: Pending,
    next_id: AtomicU64,
    listeners: Listeners,
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| Error::Browser(format!("cannot connect to {}: {}", ws_url, e)))?;
        let (mut sink, mut stream) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(256);
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let listeners: Listeners = Arc::new(Mutex::new(HashMap::new()));

        let writer = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(msg)).await {
                    error!("CDP WebSocket write error: {}", e);
                    break;
                }
            }
        });

        let reader_pending = pending.clone();
        let reader_listeners = listeners.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => {
                        debug!("CDP WebSocket closed by browser");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("CDP WebSocket read error: {}", e);
                        break;
                    }
                };
                let Ok(val) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                if let Some(id) = val.get("id").and_then(Value::as_u64) {
                    if let Some(tx) = reader_pending.lock().await.remove(&id) {
                        let _ = tx.send(val);
                    }
                } else if let Some(method) = val.get("method").and_then(Value::as_str) {
                    let mut listeners = reader_listeners.lock().await;
                    if let Some(senders) = listeners.get_mut(method) {
                        let params = val.get("params").cloned().unwrap_or(Value::Null);
                        senders.retain(|tx| !tx.is_closed());
                        for tx in senders.iter() {
                            let _ = tx.try_send(params.clone());
                        }
                    }
                }
            }
            // Fail whatever is still waiting instead of letting it time out.
            reader_pending.lock().await.clear();
            reader_listeners.lock().await.clear();
        });

        Ok(Self {
            ws_tx,
            pending,
            next_id: AtomicU64::new(1),
            listeners,
            reader,
            writer,
        })
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let msg = json!({ "id": id, "method": method, "params": params });

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if self.ws_tx.send(msg.to_string()).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(Error::Browser("DevTools connection is closed".to_string()));
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(response)) => match response.get("error") {
                Some(error) => Err(Error::Browser(format!("{} failed: {}", method, error))),
                None => Ok(response.get("result").cloned().unwrap_or(Value::Null)),
            },
            Ok(Err(_)) => Err(Error::Browser("DevTools connection is closed".to_string())),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::Browser(format!(
                    "{} timed out after {}s",
                    method,
                    COMMAND_TIMEOUT.as_secs()
                )))
            }
        }
    }

    /// Receiver of event params for `method`, e.g. `Runtime.bindingCalled`.
    pub async fn subscribe_event(&self, method: &str) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel(64);
        self.listeners
            .lock()
            .await
            .entry(method.to_string())
            .or_default()
            .push(tx);
        rx
    }

    pub async fn enable_domain(&self, domain: &str) -> Result<()> {
        self.send_command(&format!("{}.enable", domain), json!({}))
            .await?;
        Ok(())
    }

    /// Navigate and wait for the load event, bounded by `timeout`.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let mut loaded = self.subscribe_event("Page.loadEventFired").await;
        let result = self
            .send_command("Page.navigate", json!({ "url": url }))
            .await?;
        if let Some(reason) = result.get("errorText").and_then(Value::as_str) {
            return Err(Error::Browser(format!("{} at {}", reason, url)));
        }
        if tokio::time::timeout(timeout, loaded.recv()).await.is_err() {
            // Slow subresources do not make the page unusable.
            warn!(url = %url, "Load event not seen within {}ms", timeout.as_millis());
        }
        Ok(())
    }

    /// Evaluate `expression` and return its JSON value. Exceptions thrown by
    /// the page become errors.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("script threw");
            return Err(Error::Browser(format!("page script failed: {}", text)));
        }
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    /// Expose `window.<name>(payload)` to the page; calls arrive as
    /// `Runtime.bindingCalled` events. Survives navigation.
    pub async fn add_binding(&self, name: &str) -> Result<()> {
        self.send_command("Runtime.addBinding", json!({ "name": name }))
            .await?;
        Ok(())
    }

    pub async fn screenshot_png(&self) -> Result<String> {
        let result = self
            .send_command("Page.captureScreenshot", json!({ "format": "png" }))
            .await?;
        result
            .get("data")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Browser("no screenshot data returned".to_string()))
    }

    pub async fn window_for_target(&self) -> Result<i64> {
        let result = self
            .send_command("Browser.getWindowForTarget", json!({}))
            .await?;
        result
            .get("windowId")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Browser("no windowId for page target".to_string()))
    }

    pub async fn set_window_size(&self, window_id: i64, width: u32, height: u32) -> Result<()> {
        self.send_command(
            "Browser.setWindowBounds",
            json!({
                "windowId": window_id,
                "bounds": { "width": width, "height": height, "windowState": "normal" },
            }),
        )
        .await?;
        Ok(())
    }

    /// Content-size override for headless windows, which ignore window bounds.
    pub async fn set_device_metrics(&self, width: u32, height: u32) -> Result<()> {
        self.send_command(
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn close_browser(&self) -> Result<()> {
        self.send_command("Browser.close", json!({})).await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
