//! Session lifecycle tools: `launch_browser`, `close_browser`, `take_screenshot`.

use async_trait::async_trait;
use pinpoint_core::{Error, Result};
use serde_json::{json, Value};

use crate::{tool_output, Tool, ToolContext, ToolSchema};

pub struct LaunchBrowserTool;

#[async_trait]
impl Tool for LaunchBrowserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "launch_browser",
            description: "Open a browser window on the given URL so the operator can point at elements. \
                Replaces any browser opened earlier. URLs without a scheme get http://.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Page to open, e.g. http://localhost:3000"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        match params.get("url").and_then(Value::as_str) {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(Error::Validation("Missing required parameter: url".to_string())),
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let url = params.get("url").and_then(Value::as_str);
        let mut driver = ctx.driver.lock().await;
        let shot = driver.launch_session(url).await?;
        let info = driver.session_info();
        let opened = info.as_ref().map(|s| s.url.as_str()).unwrap_or_default();
        let mut out = tool_output(
            format!(
                "Opened {}. Call enable_inspection to let the operator select an element.",
                opened
            ),
            Some(shot),
        );
        if let Some(info) = info {
            out["session"] = serde_json::to_value(info)?;
        }
        Ok(out)
    }
}

pub struct CloseBrowserTool;

#[async_trait]
impl Tool for CloseBrowserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_browser",
            description: "Close the browser window. Safe to call when nothing is open.",
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let closed = ctx.driver.lock().await.close_session().await;
        let text = if closed {
            "Browser closed."
        } else {
            "No browser was open."
        };
        Ok(tool_output(text, None))
    }
}

pub struct TakeScreenshotTool;

#[async_trait]
impl Tool for TakeScreenshotTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "take_screenshot",
            description: "Capture the current page as the operator sees it.",
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let shot = ctx.driver.lock().await.screenshot().await?;
        Ok(tool_output("Current page.", Some(shot)))
    }
}
