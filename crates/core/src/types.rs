use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Geometry ─────────────────────────────────────────────────────────────────

/// Viewport-relative rectangle in CSS pixels (the shape of `getBoundingClientRect()`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ─── Device profiles ──────────────────────────────────────────────────────────

/// A named content size used for responsive testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl DeviceProfile {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Built-in catalog shown in the device picker.
    pub fn catalog() -> Vec<DeviceProfile> {
        vec![
            Self::new("iPhone SE", 375, 667),
            Self::new("iPhone 14 Pro", 393, 852),
            Self::new("Pixel 7", 412, 915),
            Self::new("Galaxy S20", 360, 800),
            Self::new("iPad Mini", 768, 1024),
            Self::new("iPad Pro 12.9", 1024, 1366),
            Self::new("Laptop", 1366, 768),
            Self::new("Desktop HD", 1920, 1080),
        ]
    }

    /// Case-insensitive lookup by name.
    pub fn find<'a>(devices: &'a [DeviceProfile], name: &str) -> Option<&'a DeviceProfile> {
        let needle = name.trim();
        devices.iter().find(|d| d.name.eq_ignore_ascii_case(needle))
    }
}

// ─── Selection record ─────────────────────────────────────────────────────────

/// Snapshot committed by a successful annotation submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub selector: String,
    /// outerHTML at commit time.
    pub html: String,
    /// Computed style property name → value at commit time.
    #[serde(default)]
    pub css: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The page-global slot the engine writes and the driver reads.
///
/// `seq` counts commits since the last injection; it is read together with
/// `record` so a reader never observes a record without its commit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionSlot {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub record: Option<SelectionRecord>,
}

impl SelectionSlot {
    pub fn is_committed(&self) -> bool {
        self.seq > 0 && self.record.is_some()
    }
}

// ─── Mutations ────────────────────────────────────────────────────────────────

/// Operator-supplied change applied to whatever currently matches `selector`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationRequest {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MutationRequest {
    pub fn has_changes(&self) -> bool {
        self.css.as_ref().map(|c| !c.is_empty()).unwrap_or(false) || self.html.is_some()
    }
}

/// What an applied mutation actually touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub matched: bool,
    pub css_applied: bool,
    pub html_applied: bool,
}

/// Convert a camelCase style key (`backgroundColor`) to its CSS property name
/// (`background-color`). Kebab-case and custom properties pass through.
pub fn css_property_name(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("--") {
        return key.to_string();
    }
    if key.contains('-') {
        return key.to_ascii_lowercase();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ─── Screenshots ──────────────────────────────────────────────────────────────

/// Rendered page image returned alongside state-changing driver calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_lookup_case_insensitive() {
        let catalog = DeviceProfile::catalog();
        let d = DeviceProfile::find(&catalog, "  iphone se ").unwrap();
        assert_eq!((d.width, d.height), (375, 667));
        assert!(DeviceProfile::find(&catalog, "Nokia 3310").is_none());
    }

    #[test]
    fn test_css_property_name() {
        assert_eq!(css_property_name("backgroundColor"), "background-color");
        assert_eq!(css_property_name("color"), "color");
        assert_eq!(css_property_name("font-size"), "font-size");
        assert_eq!(css_property_name("--brand-Color"), "--brand-Color");
    }

    #[test]
    fn test_slot_committed() {
        let mut slot = SelectionSlot::default();
        assert!(!slot.is_committed());
        slot.seq = 1;
        slot.record = Some(SelectionRecord {
            selector: "#go".into(),
            html: "<button id=\"go\">Go</button>".into(),
            css: BTreeMap::new(),
            message: Some("make this red".into()),
        });
        assert!(slot.is_committed());
    }

    #[test]
    fn test_mutation_request_deserializes_partial() {
        let req: MutationRequest =
            serde_json::from_str(r##"{"selector":"#go","css":{"color":"red"}}"##).unwrap();
        assert_eq!(req.selector, "#go");
        assert!(req.html.is_none());
        assert!(req.has_changes());

        let empty: MutationRequest = serde_json::from_str(r##"{"selector":"#go"}"##).unwrap();
        assert!(!empty.has_changes());
    }
}
