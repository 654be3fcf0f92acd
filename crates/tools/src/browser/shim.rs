//! Page-side script and the messages it exchanges with the driver.

use pinpoint_core::{css_property_name, Error, MutationRequest, Result};
use pinpoint_engine::{Effect, Input};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Name of the DevTools binding the shim reports through.
pub const BINDING_NAME: &str = "__pinpointEmit";

const SHIM_SOURCE: &str = include_str!("shim.js");

/// Reads `{seq, record}` in one evaluation. A page without the shim reads as
/// an empty slot.
pub const READ_SLOT_JS: &str =
    "(window.__pinpoint ? window.__pinpoint.readSlot() : { seq: 0, record: null })";

/// Applies a mutation using only standard DOM calls, so it works whether or
/// not the shim is present.
const MUTATION_JS: &str = r#"((req) => {
  const out = { matched: false, css_applied: false, html_applied: false };
  const find = () => {
    try {
      return document.querySelector(req.selector);
    } catch (_) {
      return null;
    }
  };
  if (typeof req.html === "string") {
    const el = find();
    if (el) {
      out.matched = true;
      if (el.parentNode && el.parentNode !== document) {
        el.outerHTML = req.html;
        out.html_applied = true;
      }
    }
  }
  const entries = Object.entries(req.css || {});
  if (entries.length) {
    const el = find();
    if (el) {
      out.matched = true;
      for (const [name, value] of entries) {
        if (value === "") el.style.removeProperty(name);
        else el.style.setProperty(name, value);
      }
      out.css_applied = true;
    }
  }
  return out;
})"#;

/// What the shim sends through the binding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShimMessage {
    Input { input: Input },
    Committed { seq: u64 },
    Ready,
    Error { message: String },
}

pub fn parse_message(payload: &str) -> Result<ShimMessage> {
    serde_json::from_str(payload)
        .map_err(|e| Error::Browser(format!("malformed message from page: {}", e)))
}

pub fn install_script() -> String {
    SHIM_SOURCE.replace("__PINPOINT_BINDING__", BINDING_NAME)
}

pub fn apply_effects_js(effects: &[Effect]) -> Result<String> {
    let payload = serde_json::to_string(effects)?;
    Ok(format!(
        "(window.__pinpoint ? (window.__pinpoint.apply({}), true) : false)",
        payload
    ))
}

pub fn mutation_js(request: &MutationRequest) -> Result<String> {
    let css: BTreeMap<String, String> = request
        .css
        .iter()
        .flatten()
        .map(|(k, v)| (css_property_name(k), v.trim().to_string()))
        .collect();
    let payload = json!({
        "selector": request.selector,
        "html": request.html,
        "css": css,
    });
    Ok(format!("{}({})", MUTATION_JS, serde_json::to_string(&payload)?))
}
