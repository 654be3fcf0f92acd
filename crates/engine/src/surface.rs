use serde::{Deserialize, Serialize};

/// The engine's own UI surfaces. Each exists at most once per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Highlight,
    Panel,
    DevicePicker,
    Notice,
    Dialog,
    Toggle,
}

// Stacking order: page content < highlight < informational panels < dialog < toggle.
const Z_BASE: i64 = 2_147_483_000;

impl Surface {
    /// Creation order; also the order surfaces are torn down.
    pub const ALL: [Surface; 6] = [
        Surface::Highlight,
        Surface::Panel,
        Surface::DevicePicker,
        Surface::Notice,
        Surface::Dialog,
        Surface::Toggle,
    ];

    /// Well-known DOM id used to find (and remove) a previously injected instance.
    pub fn dom_id(self) -> &'static str {
        match self {
            Surface::Highlight => "pinpoint-highlight",
            Surface::Panel => "pinpoint-panel",
            Surface::DevicePicker => "pinpoint-devices",
            Surface::Notice => "pinpoint-notice",
            Surface::Dialog => "pinpoint-dialog",
            Surface::Toggle => "pinpoint-toggle",
        }
    }

    pub fn from_dom_id(id: &str) -> Option<Surface> {
        Surface::ALL.iter().copied().find(|s| s.dom_id() == id)
    }

    pub fn z_index(self) -> i64 {
        match self {
            Surface::Highlight => Z_BASE,
            Surface::Panel | Surface::DevicePicker | Surface::Notice => Z_BASE + 100,
            Surface::Dialog => Z_BASE + 200,
            Surface::Toggle => Z_BASE + 300,
        }
    }

    /// Visible right after injection.
    pub fn visible_on_install(self) -> bool {
        matches!(self, Surface::Toggle | Surface::DevicePicker)
    }

    /// Overlay-only surfaces let pointer events fall through to the page.
    pub fn passes_pointer_events(self) -> bool {
        matches!(self, Surface::Highlight | Surface::Notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_order_is_strict() {
        assert!(Surface::Highlight.z_index() < Surface::Panel.z_index());
        assert!(Surface::Panel.z_index() < Surface::Dialog.z_index());
        assert!(Surface::DevicePicker.z_index() < Surface::Dialog.z_index());
        assert!(Surface::Dialog.z_index() < Surface::Toggle.z_index());
    }

    #[test]
    fn test_dom_ids_are_unique_and_reversible() {
        for surface in Surface::ALL {
            assert_eq!(Surface::from_dom_id(surface.dom_id()), Some(surface));
        }
        let mut ids: Vec<_> = Surface::ALL.iter().map(|s| s.dom_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), Surface::ALL.len());
        assert_eq!(Surface::from_dom_id("main"), None);
    }
}
