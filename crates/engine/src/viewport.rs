use pinpoint_core::{DeviceProfile, InspectorConfig, Size};
use serde::{Deserialize, Serialize};

use crate::effect::Effect;

/// Requested content size and the window size that accommodates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizePlan {
    pub content: Size,
    pub window: Size,
}

/// Resizes the hosting window independently of selection state.
#[derive(Debug, Clone)]
pub struct ViewportSizer {
    chrome: Size,
    devices: Vec<DeviceProfile>,
}

impl ViewportSizer {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            chrome: Size::new(config.chrome_width, config.chrome_height),
            devices: config.device_catalog(),
        }
    }

    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    pub fn device(&self, name: &str) -> Option<&DeviceProfile> {
        DeviceProfile::find(&self.devices, name)
    }

    /// `None` unless both dimensions are positive.
    pub fn plan(&self, width: u32, height: u32) -> Option<ResizePlan> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(ResizePlan {
            content: Size::new(width, height),
            window: Size::new(
                width.saturating_add(self.chrome.width),
                height.saturating_add(self.chrome.height),
            ),
        })
    }

    pub fn resize(&self, width: u32, height: u32) -> Vec<Effect> {
        match self.plan(width, height) {
            Some(plan) => vec![
                Effect::ResizeWindow {
                    content: plan.content,
                    window: plan.window,
                },
                Effect::SetSizeInputs { width, height },
            ],
            None => Vec::new(),
        }
    }

    pub fn resize_to_device(&self, name: &str) -> Vec<Effect> {
        match self.device(name) {
            Some(device) => self.resize(device.width, device.height),
            None => Vec::new(),
        }
    }

    /// Custom pair typed by the operator; anything but two positive integers is ignored.
    pub fn resize_custom(&self, width: &str, height: &str) -> Vec<Effect> {
        match (parse_dimension(width), parse_dimension(height)) {
            (Some(w), Some(h)) => self.resize(w, h),
            _ => Vec::new(),
        }
    }
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizer() -> ViewportSizer {
        ViewportSizer::new(&InspectorConfig::default())
    }

    #[test]
    fn test_resize_adds_chrome_allowance() {
        let effects = sizer().resize(375, 667);
        assert_eq!(
            effects,
            vec![
                Effect::ResizeWindow {
                    content: Size::new(375, 667),
                    window: Size::new(375 + 16, 667 + 88),
                },
                Effect::SetSizeInputs { width: 375, height: 667 },
            ]
        );
    }

    #[test]
    fn test_device_is_shorthand_for_resize() {
        let s = sizer();
        assert_eq!(s.resize_to_device("pixel 7"), s.resize(412, 915));
        assert!(s.resize_to_device("unknown phone").is_empty());
    }

    #[test]
    fn test_invalid_custom_pair_is_noop() {
        let s = sizer();
        assert!(s.resize_custom("abc", "600").is_empty());
        assert!(s.resize_custom("0", "600").is_empty());
        assert!(s.resize_custom("-5", "600").is_empty());
        assert!(s.resize_custom("800", "").is_empty());
        assert_eq!(s.resize_custom(" 800 ", "600"), s.resize(800, 600));
    }
}
