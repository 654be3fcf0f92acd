use pinpoint_core::{InspectorConfig, Palette};

use crate::effect::Effect;
use crate::event::ElementSnapshot;
use crate::surface::Surface;

/// Drives the single highlight overlay.
#[derive(Debug, Clone)]
pub struct HighlightRenderer {
    exploring: Palette,
    locked: Palette,
    visible: bool,
}

impl HighlightRenderer {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            exploring: config.exploring_palette.clone(),
            locked: config.locked_palette.clone(),
            visible: false,
        }
    }

    pub fn show(&mut self, target: &ElementSnapshot, locked: bool) -> Effect {
        self.visible = true;
        let palette = if locked { &self.locked } else { &self.exploring };
        Effect::ShowHighlight {
            rect: target.rect,
            palette: palette.clone(),
            locked,
        }
    }

    /// `None` when the overlay is already hidden.
    pub fn hide(&mut self) -> Option<Effect> {
        if !self.visible {
            return None;
        }
        self.visible = false;
        Some(Effect::hide(Surface::Highlight))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn reset(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_core::Rect;

    fn target() -> ElementSnapshot {
        ElementSnapshot {
            handle: 1,
            tag: "div".into(),
            id: None,
            classes: vec![],
            text: String::new(),
            rect: Rect::new(5.0, 6.0, 70.0, 80.0),
            path: vec![],
        }
    }

    #[test]
    fn test_show_matches_rect_and_palette() {
        let config = InspectorConfig::default();
        let mut renderer = HighlightRenderer::new(&config);
        match renderer.show(&target(), true) {
            Effect::ShowHighlight { rect, palette, locked } => {
                assert_eq!(rect, Rect::new(5.0, 6.0, 70.0, 80.0));
                assert_eq!(palette, config.locked_palette);
                assert!(locked);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(renderer.is_visible());
    }

    #[test]
    fn test_hide_is_idempotent() {
        let mut renderer = HighlightRenderer::new(&InspectorConfig::default());
        assert_eq!(renderer.hide(), None);
        renderer.show(&target(), false);
        assert_eq!(renderer.hide(), Some(Effect::hide(Surface::Highlight)));
        assert_eq!(renderer.hide(), None);
    }
}
