use pinpoint_core::InspectorConfig;

use crate::effect::Effect;
use crate::event::ElementSnapshot;
use crate::machine::Target;
use crate::surface::Surface;

pub const HOVER_HINT: &str = "Click to select";
pub const LOCKED_HINT: &str = "Click it again to annotate, or click elsewhere to deselect";
pub const ARMED_HINT: &str = "Hover over any element";

/// Text summary of the current target, recomputed on every transition.
#[derive(Debug, Clone)]
pub struct InfoPanel {
    preview_chars: usize,
}

impl InfoPanel {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            preview_chars: config.text_preview_chars,
        }
    }

    pub fn armed(&self) -> Effect {
        Effect::SetPanel {
            lines: vec!["Selection mode on".to_string(), ARMED_HINT.to_string()],
            locked: false,
        }
    }

    pub fn hovering(&self, target: &Target) -> Effect {
        let mut lines = vec![
            describe(&target.element),
            format!("Selector: {}", target.selector),
        ];
        let preview = self.preview(&target.element.text);
        if !preview.is_empty() {
            lines.push(format!("Text: {}", preview));
        }
        lines.push(HOVER_HINT.to_string());
        Effect::SetPanel {
            lines,
            locked: false,
        }
    }

    pub fn locked(&self, target: &Target) -> Effect {
        Effect::SetPanel {
            lines: vec![
                format!("Selected: {}", describe(&target.element)),
                format!("Selector: {}", target.selector),
                LOCKED_HINT.to_string(),
            ],
            locked: true,
        }
    }

    pub fn hide(&self) -> Effect {
        Effect::hide(Surface::Panel)
    }

    fn preview(&self, text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= self.preview_chars {
            return collapsed;
        }
        let mut cut: String = collapsed.chars().take(self.preview_chars).collect();
        cut.push('…');
        cut
    }
}

/// `tag #id .class1.class2`
pub fn describe(element: &ElementSnapshot) -> String {
    let mut out = element.tag.to_ascii_lowercase();
    if let Some(id) = element.id_attr() {
        out.push_str(" #");
        out.push_str(id);
    }
    let classes: Vec<&str> = element.class_list().collect();
    if !classes.is_empty() {
        out.push_str(" .");
        out.push_str(&classes.join("."));
    }
    out
}
