//! Responsive-testing tools: `resize_viewport` and `list_devices`.

use async_trait::async_trait;
use pinpoint_core::{Error, Result};
use serde_json::{json, Value};

use crate::{tool_output, Tool, ToolContext, ToolSchema};

pub struct ResizeViewportTool;

enum ResizeTarget {
    Device(String),
    Size(u32, u32),
}

fn dimension(params: &Value, key: &str) -> Result<Option<u32>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .filter(|n| *n > 0 && *n <= u32::MAX as u64)
            .map(|n| Some(n as u32))
            .ok_or_else(|| Error::Validation(format!("{} must be a positive integer", key))),
    }
}

impl ResizeViewportTool {
    fn target(params: &Value) -> Result<ResizeTarget> {
        if let Some(device) = params
            .get("device")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            return Ok(ResizeTarget::Device(device.to_string()));
        }
        match (dimension(params, "width")?, dimension(params, "height")?) {
            (Some(w), Some(h)) => Ok(ResizeTarget::Size(w, h)),
            _ => Err(Error::Validation(
                "Provide a device name or both width and height".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Tool for ResizeViewportTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "resize_viewport",
            description: "Resize the page's visible area to a device from list_devices or to an \
                explicit width × height in CSS pixels.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "device": { "type": "string", "description": "Device name, e.g. \"Pixel 7\"" },
                    "width": { "type": "integer", "description": "Content width in pixels" },
                    "height": { "type": "integer", "description": "Content height in pixels" }
                }
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        Self::target(params).map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let mut driver = ctx.driver.lock().await;
        let (label, plan, shot) = match Self::target(&params)? {
            ResizeTarget::Device(name) => {
                let (device, plan, shot) = driver.resize_to_device(&name).await?;
                (device.name, plan, shot)
            }
            ResizeTarget::Size(w, h) => {
                let (plan, shot) = driver.resize_viewport(w, h).await?;
                ("custom".to_string(), plan, shot)
            }
        };
        let mut out = tool_output(
            format!(
                "Viewport set to {}×{} ({}).",
                plan.content.width, plan.content.height, label
            ),
            Some(shot),
        );
        out["viewport"] = json!({ "width": plan.content.width, "height": plan.content.height });
        Ok(out)
    }
}

pub struct ListDevicesTool;

#[async_trait]
impl Tool for ListDevicesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_devices",
            description: "List the device sizes resize_viewport accepts by name.",
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let driver = ctx.driver.lock().await;
        let devices = driver.devices();
        let text = devices
            .iter()
            .map(|d| format!("{}: {}×{}", d.name, d.width, d.height))
            .collect::<Vec<_>>()
            .join("\n");
        let mut out = tool_output(text, None);
        out["devices"] = serde_json::to_value(devices)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::simulated::SimulatedLauncher;
    use crate::page::LaunchBrowserTool;
    use crate::Driver;
    use pinpoint_core::Config;
    use std::sync::Arc;

    fn ctx() -> ToolContext {
        let launcher = SimulatedLauncher::new().with_site("http://app.test/", "<p>hi</p>");
        ToolContext::new(Driver::new(Config::default(), Arc::new(launcher)).into_handle())
    }

    #[test]
    fn test_resize_validation() {
        assert!(ResizeViewportTool.validate(&json!({})).is_err());
        assert!(ResizeViewportTool.validate(&json!({"width": 800})).is_err());
        assert!(ResizeViewportTool.validate(&json!({"width": 0, "height": 600})).is_err());
        assert!(ResizeViewportTool.validate(&json!({"width": -3, "height": 600})).is_err());
        assert!(ResizeViewportTool.validate(&json!({"width": 800, "height": 600})).is_ok());
        assert!(ResizeViewportTool.validate(&json!({"device": "Laptop"})).is_ok());
    }

    #[tokio::test]
    async fn test_list_devices_without_session() {
        let out = ListDevicesTool.execute(ctx(), json!({})).await.unwrap();
        let devices = out["devices"].as_array().unwrap();
        assert!(devices.iter().any(|d| d["name"] == "iPhone SE" && d["width"] == 375));
        assert!(out["text"].as_str().unwrap().contains("Desktop HD"));
    }

    #[tokio::test]
    async fn test_resize_by_device_and_size() {
        let ctx = ctx();
        assert!(matches!(
            ResizeViewportTool
                .execute(ctx.clone(), json!({"width": 800, "height": 600}))
                .await,
            Err(Error::NoSession)
        ));

        LaunchBrowserTool
            .execute(ctx.clone(), json!({"url": "http://app.test/"}))
            .await
            .unwrap();
        let out = ResizeViewportTool
            .execute(ctx.clone(), json!({"device": "ipad mini"}))
            .await
            .unwrap();
        assert_eq!(out["viewport"]["width"], 768);
        assert!(out["text"].as_str().unwrap().contains("iPad Mini"));

        let out = ResizeViewportTool
            .execute(ctx.clone(), json!({"width": 500, "height": 700}))
            .await
            .unwrap();
        assert_eq!(out["viewport"]["height"], 700);

        assert!(matches!(
            ResizeViewportTool.execute(ctx, json!({"device": "toaster"})).await,
            Err(Error::NotFound(_))
        ));
    }
}
