use pinpoint_core::{InspectorConfig, Point, Rect, Size};

use crate::effect::Effect;
use crate::machine::Target;

/// Modal capturing the operator's message for the locked element.
#[derive(Debug, Clone)]
pub struct AnnotationDialog {
    width: f64,
    height: f64,
    gap: f64,
    margin: f64,
    open: bool,
}

impl AnnotationDialog {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            width: config.dialog_width,
            height: config.dialog_height,
            gap: config.dialog_gap,
            margin: config.edge_margin,
            open: false,
        }
    }

    /// Right of the anchor when it fits, otherwise left; clamped into the
    /// viewport, top edge aligned with the anchor's top.
    pub fn placement(&self, anchor: Rect, viewport: Size) -> Point {
        let vw = viewport.width as f64;
        let vh = viewport.height as f64;

        let room_right = vw - anchor.right() - self.gap - self.margin;
        let x = if room_right >= self.width {
            anchor.right() + self.gap
        } else {
            anchor.x - self.gap - self.width
        };

        Point {
            x: clamp(x, self.margin, vw - self.width - self.margin),
            y: clamp(anchor.y, self.margin, vh - self.height - self.margin),
        }
    }

    pub fn open(&mut self, target: &Target, viewport: Size) -> Effect {
        self.open = true;
        Effect::OpenDialog {
            position: self.placement(target.element.rect, viewport),
            width: self.width,
            height: self.height,
            heading: format!("Annotate {}", target.selector),
        }
    }

    /// `None` when the dialog is not open.
    pub fn close(&mut self) -> Option<Effect> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(Effect::CloseDialog)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn reset(&mut self) {
        self.open = false;
    }

    /// Trimmed message, or `None` when blank.
    pub fn accept(text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

// Lower bound wins when the viewport is smaller than the dialog.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> AnnotationDialog {
        AnnotationDialog::new(&InspectorConfig::default())
    }

    #[test]
    fn test_places_right_when_room() {
        let d = dialog();
        let p = d.placement(Rect::new(100.0, 50.0, 80.0, 30.0), Size::new(1280, 800));
        assert_eq!(p.x, 180.0 + 12.0);
        assert_eq!(p.y, 50.0);
    }

    #[test]
    fn test_places_left_when_no_room() {
        let d = dialog();
        let p = d.placement(Rect::new(900.0, 50.0, 80.0, 30.0), Size::new(1000, 800));
        assert_eq!(p.x, 900.0 - 12.0 - 320.0);
    }

    #[test]
    fn test_clamps_into_viewport() {
        let d = dialog();
        // Too close to the left edge for a left placement, too low for the height.
        let p = d.placement(Rect::new(20.0, 700.0, 560.0, 30.0), Size::new(600, 800));
        assert_eq!(p.x, 8.0);
        assert_eq!(p.y, 800.0 - 200.0 - 8.0);

        let tiny = d.placement(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(100, 100));
        assert_eq!(tiny, Point { x: 8.0, y: 8.0 });
    }

    #[test]
    fn test_accept_requires_text() {
        assert_eq!(AnnotationDialog::accept("   \n\t"), None);
        assert_eq!(AnnotationDialog::accept(""), None);
        assert_eq!(
            AnnotationDialog::accept("  make this red \n"),
            Some("make this red".to_string())
        );
    }
}
