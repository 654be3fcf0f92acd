//! Selection tools: enable the in-page engine, read what the operator picked,
//! and apply changes back to it.

use async_trait::async_trait;
use pinpoint_core::{Error, MutationRequest, Result, SelectionRecord};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::{tool_output, Tool, ToolContext, ToolSchema};

const DEFAULT_WAIT_SECS: u64 = 300;
const MAX_WAIT_SECS: u64 = 3600;

fn record_output(record: &SelectionRecord) -> Result<Value> {
    let pretty = serde_json::to_string_pretty(record)?;
    let mut out = tool_output(pretty, None);
    out["record"] = serde_json::to_value(record)?;
    Ok(out)
}

pub struct EnableInspectionTool;

#[async_trait]
impl Tool for EnableInspectionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "enable_inspection",
            description: "Install the element picker in the open page. The operator turns it on \
                with the Inspect button, clicks an element to lock it, clicks it again to describe \
                the change, and submits. Re-running it resets the picker.",
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let shot = ctx.driver.lock().await.inject_engine().await?;
        Ok(tool_output(
            "Inspection enabled. Ask the operator to pick an element and submit a note, \
             then call get_selected_element or wait_for_selection.",
            Some(shot),
        ))
    }
}

pub struct GetSelectedElementTool;

#[async_trait]
impl Tool for GetSelectedElementTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_selected_element",
            description: "Return the element the operator last submitted: selector, outer HTML, \
                computed styles and their note.",
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let record = ctx.driver.lock().await.read_selection_record().await?;
        record_output(&record)
    }
}

pub struct WaitForSelectionTool;

#[async_trait]
impl Tool for WaitForSelectionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "wait_for_selection",
            description: "Block until the operator submits a new annotation, enabling inspection \
                first if needed. Returns the same record as get_selected_element.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "timeout_secs": {
                        "type": "integer",
                        "description": "Give up after this many seconds (default 300)"
                    }
                }
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        match params.get("timeout_secs") {
            None | Some(Value::Null) => Ok(()),
            Some(v) => match v.as_u64() {
                Some(secs) if (1..=MAX_WAIT_SECS).contains(&secs) => Ok(()),
                _ => Err(Error::Validation(format!(
                    "timeout_secs must be an integer between 1 and {}",
                    MAX_WAIT_SECS
                ))),
            },
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let secs = params
            .get("timeout_secs")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_WAIT_SECS);
        let record = ctx
            .driver
            .lock()
            .await
            .wait_for_selection(Duration::from_secs(secs))
            .await?;
        record_output(&record)
    }
}

pub struct ModifyElementTool;

impl ModifyElementTool {
    fn request(params: &Value) -> Result<MutationRequest> {
        let selector = params
            .get("selector")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Validation("Missing required parameter: selector".to_string()))?;

        let css = match params.get("css") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => {
                let mut css = BTreeMap::new();
                for (key, value) in map {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => {
                            return Err(Error::Validation(format!(
                                "css value for '{}' must be a string",
                                key
                            )))
                        }
                    };
                    css.insert(key.clone(), value);
                }
                Some(css)
            }
            Some(_) => {
                return Err(Error::Validation(
                    "css must be an object of property → value".to_string(),
                ))
            }
        };

        let html = match params.get("html") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(Error::Validation("html must be a string".to_string())),
        };

        let request = MutationRequest {
            selector: selector.to_string(),
            css,
            html,
        };
        if !request.has_changes() {
            return Err(Error::Validation(
                "Provide css and/or html to apply".to_string(),
            ));
        }
        Ok(request)
    }
}

#[async_trait]
impl Tool for ModifyElementTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "modify_element",
            description: "Preview a change on the live page. `html` replaces the element's outer \
                HTML; `css` then sets inline styles on whatever the selector matches. Requires a \
                prior selection. Changes are not saved to source files.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "selector": {
                        "type": "string",
                        "description": "CSS selector, usually the one from get_selected_element"
                    },
                    "css": {
                        "type": "object",
                        "description": "Style properties to set, camelCase or kebab-case",
                        "additionalProperties": { "type": "string" }
                    },
                    "html": {
                        "type": "string",
                        "description": "Replacement outer HTML"
                    }
                },
                "required": ["selector"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        Self::request(params).map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let request = Self::request(&params)?;
        let (outcome, shot) = ctx.driver.lock().await.apply_mutation(&request).await?;
        let text = if !outcome.matched {
            format!(
                "Nothing matches {} anymore; the page was left unchanged.",
                request.selector
            )
        } else {
            let mut applied = Vec::new();
            if outcome.html_applied {
                applied.push("html");
            }
            if outcome.css_applied {
                applied.push("css");
            }
            if applied.is_empty() {
                format!("Matched {} but nothing could be applied.", request.selector)
            } else {
                format!("Applied {} to {}.", applied.join(" and "), request.selector)
            }
        };
        let mut out = tool_output(text, Some(shot));
        out["outcome"] = serde_json::to_value(outcome)?;
        Ok(out)
    }
}
