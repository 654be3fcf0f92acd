use pinpoint_core::{DeviceProfile, Palette, Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::event::NodeHandle;
use crate::surface::Surface;

/// Slot a deferred effect batch occupies. Scheduling into a slot replaces
/// whatever was pending there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferKey {
    /// Removal of the success notice.
    Notice,
    /// Teardown of the highlight and panel after a submit.
    Unlock,
}

/// A render or storage command for the host, in the order it must be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Effect {
    /// Remove every node carrying the surface's well-known id.
    RemoveSurface { surface: Surface },
    CreateSurface {
        surface: Surface,
        z_index: i64,
        visible: bool,
    },
    /// Reposition the single highlight overlay and make it visible.
    ShowHighlight {
        rect: Rect,
        palette: Palette,
        locked: bool,
    },
    /// Make a surface invisible without destroying it.
    HideSurface { surface: Surface },
    SetPanel { lines: Vec<String>, locked: bool },
    /// Show the annotation dialog with an empty draft.
    OpenDialog {
        position: Point,
        width: f64,
        height: f64,
        heading: String,
    },
    CloseDialog,
    ShowNotice { text: String },
    SetToggle { active: bool },
    /// Gate for the host's page listeners: inert while false.
    SetListening { active: bool },
    /// Snapshot the element behind `handle` into the selection slot.
    CommitRecord {
        handle: NodeHandle,
        selector: String,
        message: String,
        /// Computed-style properties to capture; empty captures all.
        styles: Vec<String>,
    },
    ClearRecord,
    ResizeWindow { content: Size, window: Size },
    SetSizeInputs { width: u32, height: u32 },
    SetDevices { devices: Vec<DeviceProfile> },
    /// Apply `effects` after `delay_ms`, fire-and-forget. Replaces any batch
    /// still pending under the same key.
    Defer {
        key: DeferKey,
        delay_ms: u64,
        effects: Vec<Effect>,
    },
    /// Drop the batch pending under `key`, if any.
    CancelDeferred { key: DeferKey },
}

impl Effect {
    pub fn hide(surface: Surface) -> Self {
        Effect::HideSurface { surface }
    }

    /// Effects the host window manager (not the page) must perform.
    pub fn is_window_level(&self) -> bool {
        matches!(self, Effect::ResizeWindow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_wire_format() {
        let effect = Effect::HideSurface { surface: Surface::Highlight };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["op"], "hide_surface");
        assert_eq!(json["surface"], "highlight");

        let deferred = Effect::Defer {
            key: DeferKey::Unlock,
            delay_ms: 1500,
            effects: vec![Effect::CloseDialog],
        };
        let json = serde_json::to_value(&deferred).unwrap();
        assert_eq!(json["key"], "unlock");
        assert_eq!(json["effects"][0]["op"], "close_dialog");

        let cancel = serde_json::to_value(Effect::CancelDeferred { key: DeferKey::Notice }).unwrap();
        assert_eq!(cancel["op"], "cancel_deferred");
        assert_eq!(cancel["key"], "notice");
    }
}
