use pinpoint_core::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::surface::Surface;

/// Host-assigned opaque reference to a live node. Only meaningful within one
/// injection of one page.
pub type NodeHandle = u64;

/// One level of an element's ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub handle: NodeHandle,
    pub tag: String,
    /// 1-based position among the parent's element children with the same tag.
    pub same_tag_index: usize,
    /// Number of the parent's element children with the same tag.
    pub same_tag_count: usize,
}

/// Facts about a page element captured by the host at event time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub handle: NodeHandle,
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Text content, whitespace-collapsed. Hosts may pre-truncate it.
    #[serde(default)]
    pub text: String,
    pub rect: Rect,
    /// The element itself first, then each ancestor up to the document element.
    #[serde(default)]
    pub path: Vec<PathSegment>,
}

impl ElementSnapshot {
    /// True when `handle` is this element or one of its ancestors.
    pub fn is_within(&self, handle: NodeHandle) -> bool {
        self.handle == handle || self.path.iter().any(|seg| seg.handle == handle)
    }

    pub fn id_attr(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.trim()).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Set when the event landed on one of the engine's own surfaces.
    #[serde(default)]
    pub surface: Option<Surface>,
    #[serde(default)]
    pub element: Option<ElementSnapshot>,
    pub viewport: Size,
}

impl PointerEvent {
    pub fn on_element(element: ElementSnapshot, viewport: Size) -> Self {
        Self {
            surface: None,
            element: Some(element),
            viewport,
        }
    }

    pub fn on_surface(surface: Surface, viewport: Size) -> Self {
        Self {
            surface: Some(surface),
            element: None,
            viewport,
        }
    }
}

/// Everything the engine reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    PointerMove(PointerEvent),
    Click(PointerEvent),
    DialogSubmit { text: String },
    DialogCancel,
    PickDevice { name: String },
    CustomSize { width: String, height: String },
}

/// Where a pointer event landed, decided once per event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventTarget<'a> {
    Control,
    Panel,
    Dialog,
    Picker,
    PageElement(&'a ElementSnapshot),
    Nothing,
}

pub fn classify(event: &PointerEvent) -> EventTarget<'_> {
    match event.surface {
        Some(Surface::Toggle) => EventTarget::Control,
        Some(Surface::Panel) | Some(Surface::Notice) | Some(Surface::Highlight) => {
            EventTarget::Panel
        }
        Some(Surface::Dialog) => EventTarget::Dialog,
        Some(Surface::DevicePicker) => EventTarget::Picker,
        None => match &event.element {
            Some(element) => EventTarget::PageElement(element),
            None => EventTarget::Nothing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> ElementSnapshot {
        ElementSnapshot {
            handle: 7,
            tag: "button".into(),
            id: Some("go".into()),
            classes: vec![],
            text: "Go".into(),
            rect: Rect::new(10.0, 10.0, 80.0, 30.0),
            path: vec![
                PathSegment { handle: 7, tag: "button".into(), same_tag_index: 1, same_tag_count: 1 },
                PathSegment { handle: 3, tag: "body".into(), same_tag_index: 1, same_tag_count: 1 },
                PathSegment { handle: 1, tag: "html".into(), same_tag_index: 1, same_tag_count: 1 },
            ],
        }
    }

    #[test]
    fn test_surface_wins_over_element() {
        let mut ev = PointerEvent::on_element(button(), Size::new(800, 600));
        ev.surface = Some(Surface::Dialog);
        assert_eq!(classify(&ev), EventTarget::Dialog);

        ev.surface = Some(Surface::Toggle);
        assert_eq!(classify(&ev), EventTarget::Control);
    }

    #[test]
    fn test_page_element_and_nothing() {
        let ev = PointerEvent::on_element(button(), Size::new(800, 600));
        assert!(matches!(classify(&ev), EventTarget::PageElement(el) if el.handle == 7));

        let empty = PointerEvent { surface: None, element: None, viewport: Size::new(1, 1) };
        assert_eq!(classify(&empty), EventTarget::Nothing);
    }

    #[test]
    fn test_is_within_checks_ancestry() {
        let el = button();
        assert!(el.is_within(7));
        assert!(el.is_within(3));
        assert!(!el.is_within(99));
    }

    #[test]
    fn test_input_wire_format() {
        let raw = r#"{"type":"click","surface":"toggle","viewport":{"width":800,"height":600}}"#;
        let input: Input = serde_json::from_str(raw).unwrap();
        match input {
            Input::Click(ev) => assert_eq!(ev.surface, Some(Surface::Toggle)),
            other => panic!("unexpected {:?}", other),
        }

        let submit: Input =
            serde_json::from_str(r#"{"type":"dialog_submit","text":"make this red"}"#).unwrap();
        assert_eq!(submit, Input::DialogSubmit { text: "make this red".into() });
    }
}
