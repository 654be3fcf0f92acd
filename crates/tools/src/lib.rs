pub mod browser;
pub mod driver;
pub mod inspect;
pub mod mcp;
pub mod page;
pub mod registry;
pub mod viewport;

use async_trait::async_trait;
use pinpoint_core::{Result, Screenshot};
use serde_json::{json, Value};

pub use driver::{BrowserLauncher, Driver, DriverHandle, PageBackend};
pub use registry::ToolRegistry;

/// Shared state handed to every tool call.
#[derive(Clone)]
pub struct ToolContext {
    pub driver: DriverHandle,
}

impl ToolContext {
    pub fn new(driver: DriverHandle) -> Self {
        Self { driver }
    }
}

pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;
    fn validate(&self, params: &Value) -> Result<()>;
    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value>;
}

/// Tool result shape: human-readable `text`, optionally a `screenshot` for
/// visual confirmation, and any structured fields merged alongside.
pub fn tool_output(text: impl Into<String>, screenshot: Option<Screenshot>) -> Value {
    let mut out = json!({ "text": text.into() });
    if let Some(shot) = screenshot {
        out["screenshot"] = json!({ "mimeType": shot.mime_type, "data": shot.data });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_output_shape() {
        let plain = tool_output("closed", None);
        assert_eq!(plain["text"], "closed");
        assert!(plain.get("screenshot").is_none());

        let shot = Screenshot {
            mime_type: "image/png".into(),
            data: "AAAA".into(),
        };
        let out = tool_output("ok", Some(shot));
        assert_eq!(out["screenshot"]["mimeType"], "image/png");
        assert_eq!(out["screenshot"]["data"], "AAAA");
    }
}
