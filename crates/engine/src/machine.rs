use pinpoint_core::InspectorConfig;
use tracing::debug;

use crate::bootstrap;
use crate::dialog::AnnotationDialog;
use crate::effect::{DeferKey, Effect};
use crate::event::{classify, ElementSnapshot, EventTarget, Input, PointerEvent};
use crate::highlight::HighlightRenderer;
use crate::panel::InfoPanel;
use crate::selector::synthesize;
use crate::surface::Surface;
use crate::viewport::ViewportSizer;

/// A page element together with the selector synthesized for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub element: ElementSnapshot,
    pub selector: String,
}

impl Target {
    pub fn new(element: ElementSnapshot) -> Self {
        let selector = synthesize(&element);
        Self { element, selector }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Hovering(Option<Target>),
    Locked(Target),
    DialogOpen(Target),
}

impl SelectionState {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionState::Idle => "idle",
            SelectionState::Hovering(_) => "hovering",
            SelectionState::Locked(_) => "locked",
            SelectionState::DialogOpen(_) => "dialog_open",
        }
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            SelectionState::Idle => None,
            SelectionState::Hovering(target) => target.as_ref(),
            SelectionState::Locked(target) | SelectionState::DialogOpen(target) => Some(target),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SelectionState::Idle)
    }
}

/// The selection and annotation engine for one injected page.
///
/// Inputs arrive one at a time from the host; every call returns the effects
/// the host must apply, in order. The engine never touches a live node.
#[derive(Debug, Clone)]
pub struct Engine {
    state: SelectionState,
    highlight: HighlightRenderer,
    panel: InfoPanel,
    dialog: AnnotationDialog,
    sizer: ViewportSizer,
    notice_ms: u64,
    unlock_delay_ms: u64,
    captured_styles: Vec<String>,
    commits: u64,
}

impl Engine {
    pub fn new(config: &InspectorConfig) -> Self {
        Self {
            state: SelectionState::Idle,
            highlight: HighlightRenderer::new(config),
            panel: InfoPanel::new(config),
            dialog: AnnotationDialog::new(config),
            sizer: ViewportSizer::new(config),
            notice_ms: config.notice_ms,
            unlock_delay_ms: config.unlock_delay_ms,
            captured_styles: config.captured_styles.clone(),
            commits: 0,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn sizer(&self) -> &ViewportSizer {
        &self.sizer
    }

    /// Records committed since the last bootstrap.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Forget all selection state without emitting anything. Used when the
    /// page the handles belonged to has gone away.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
        self.highlight.reset();
        self.dialog.reset();
        self.commits = 0;
    }

    /// Install (or reinstall) every surface and return to `Idle`.
    pub fn bootstrap(&mut self) -> Vec<Effect> {
        self.reset();
        debug!(devices = self.sizer.devices().len(), "Bootstrapping inspector surfaces");
        bootstrap::install(self.sizer.devices())
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let before = self.state.name();
        let effects = match input {
            Input::PointerMove(event) => self.on_move(&event),
            Input::Click(event) => self.on_click(&event),
            Input::DialogSubmit { text } => self.on_submit(&text),
            Input::DialogCancel => self.on_cancel(),
            Input::PickDevice { name } => self.sizer.resize_to_device(&name),
            Input::CustomSize { width, height } => self.sizer.resize_custom(&width, &height),
        };
        let after = self.state.name();
        if before != after {
            debug!(from = before, to = after, effects = effects.len(), "Selection state changed");
        }
        effects
    }

    fn on_move(&mut self, event: &PointerEvent) -> Vec<Effect> {
        if !matches!(self.state, SelectionState::Hovering(_)) {
            return Vec::new();
        }
        match classify(event) {
            EventTarget::PageElement(element) => {
                if self.state.target().map(|t| t.element.handle) == Some(element.handle) {
                    return Vec::new();
                }
                let target = Target::new(element.clone());
                let effects = vec![
                    self.highlight.show(&target.element, false),
                    self.panel.hovering(&target),
                ];
                self.state = SelectionState::Hovering(Some(target));
                effects
            }
            EventTarget::Nothing => {
                if self.state.target().is_none() {
                    return Vec::new();
                }
                self.state = SelectionState::Hovering(None);
                let mut effects: Vec<Effect> = self.highlight.hide().into_iter().collect();
                effects.push(self.panel.armed());
                effects
            }
            // Moves over our own surfaces leave the page target alone.
            _ => Vec::new(),
        }
    }

    fn on_click(&mut self, event: &PointerEvent) -> Vec<Effect> {
        let target = classify(event);
        if target == EventTarget::Control {
            return if self.state.is_active() {
                self.toggle_off()
            } else {
                self.toggle_on()
            };
        }

        let element = match target {
            EventTarget::PageElement(element) => element,
            _ => return Vec::new(),
        };

        match std::mem::take(&mut self.state) {
            SelectionState::Idle => Vec::new(),
            SelectionState::Hovering(_) => self.lock(Target::new(element.clone())),
            SelectionState::Locked(locked) => {
                if element.is_within(locked.element.handle) {
                    let effect = self.dialog.open(&locked, event.viewport);
                    self.state = SelectionState::DialogOpen(locked);
                    vec![effect]
                } else {
                    let next = Target::new(element.clone());
                    let effects = vec![
                        self.highlight.show(&next.element, false),
                        self.panel.hovering(&next),
                    ];
                    self.state = SelectionState::Hovering(Some(next));
                    effects
                }
            }
            // The dialog is modal; page clicks behind it do nothing.
            state @ SelectionState::DialogOpen(_) => {
                self.state = state;
                Vec::new()
            }
        }
    }

    fn lock(&mut self, target: Target) -> Vec<Effect> {
        let effects = vec![
            self.highlight.show(&target.element, true),
            self.panel.locked(&target),
        ];
        self.state = SelectionState::Locked(target);
        effects
    }

    fn toggle_on(&mut self) -> Vec<Effect> {
        self.state = SelectionState::Hovering(None);
        vec![
            // A teardown left over from the last submit must not hide the
            // highlight of this session.
            Effect::CancelDeferred { key: DeferKey::Unlock },
            Effect::SetToggle { active: true },
            Effect::SetListening { active: true },
            self.panel.armed(),
        ]
    }

    fn toggle_off(&mut self) -> Vec<Effect> {
        self.state = SelectionState::Idle;
        let mut effects: Vec<Effect> = self.dialog.close().into_iter().collect();
        effects.extend(self.highlight.hide());
        effects.push(self.panel.hide());
        effects.push(Effect::SetToggle { active: false });
        effects.push(Effect::SetListening { active: false });
        effects
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        let target = match &self.state {
            SelectionState::DialogOpen(target) => target.clone(),
            _ => return Vec::new(),
        };
        let mut effects: Vec<Effect> = self.dialog.close().into_iter().collect();
        effects.push(self.panel.locked(&target));
        self.state = SelectionState::Locked(target);
        effects
    }

    fn on_submit(&mut self, text: &str) -> Vec<Effect> {
        let target = match &self.state {
            SelectionState::DialogOpen(target) => target.clone(),
            _ => return Vec::new(),
        };
        let message = match AnnotationDialog::accept(text) {
            Some(message) => message,
            None => return Vec::new(),
        };

        self.commits += 1;
        self.state = SelectionState::Idle;
        self.highlight.reset();
        debug!(selector = %target.selector, seq = self.commits, "Committing selection record");

        let mut effects = vec![Effect::CommitRecord {
            handle: target.element.handle,
            selector: target.selector.clone(),
            message,
            styles: self.captured_styles.clone(),
        }];
        effects.extend(self.dialog.close());
        effects.push(Effect::ShowNotice {
            text: format!("Sent {} to the agent", target.selector),
        });
        effects.push(Effect::Defer {
            key: DeferKey::Notice,
            delay_ms: self.notice_ms,
            effects: vec![Effect::hide(Surface::Notice)],
        });
        effects.push(Effect::SetToggle { active: false });
        effects.push(Effect::SetListening { active: false });
        effects.push(Effect::Defer {
            key: DeferKey::Unlock,
            delay_ms: self.unlock_delay_ms,
            effects: vec![Effect::hide(Surface::Highlight), Effect::hide(Surface::Panel)],
        });
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PathSegment;
    use pinpoint_core::{Rect, Size};

    const DEFAULT_VIEWPORT: Size = Size {
        width: 1280,
        height: 800,
    };

    fn seg(handle: u64, tag: &str) -> PathSegment {
        PathSegment {
            handle,
            tag: tag.into(),
            same_tag_index: 1,
            same_tag_count: 1,
        }
    }

    fn button() -> ElementSnapshot {
        ElementSnapshot {
            handle: 10,
            tag: "button".into(),
            id: Some("go".into()),
            classes: vec![],
            text: "Go".into(),
            rect: Rect::new(100.0, 40.0, 80.0, 30.0),
            path: vec![seg(10, "button"), seg(2, "body"), seg(1, "html")],
        }
    }

    fn button_label() -> ElementSnapshot {
        ElementSnapshot {
            handle: 11,
            tag: "span".into(),
            id: None,
            classes: vec!["label".into()],
            text: "Go".into(),
            rect: Rect::new(110.0, 45.0, 20.0, 20.0),
            path: vec![seg(11, "span"), seg(10, "button"), seg(2, "body"), seg(1, "html")],
        }
    }

    fn heading() -> ElementSnapshot {
        ElementSnapshot {
            handle: 20,
            tag: "h1".into(),
            id: None,
            classes: vec![],
            text: "Title".into(),
            rect: Rect::new(0.0, 0.0, 400.0, 40.0),
            path: vec![seg(20, "h1"), seg(2, "body"), seg(1, "html")],
        }
    }

    fn move_to(el: ElementSnapshot) -> Input {
        Input::PointerMove(PointerEvent::on_element(el, DEFAULT_VIEWPORT))
    }

    fn click(el: ElementSnapshot) -> Input {
        Input::Click(PointerEvent::on_element(el, DEFAULT_VIEWPORT))
    }

    fn click_surface(surface: Surface) -> Input {
        Input::Click(PointerEvent::on_surface(surface, DEFAULT_VIEWPORT))
    }

    fn engine() -> Engine {
        let mut engine = Engine::new(&InspectorConfig::default());
        engine.bootstrap();
        engine
    }

    fn locked_engine() -> Engine {
        let mut e = engine();
        e.handle(click_surface(Surface::Toggle));
        e.handle(move_to(button()));
        e.handle(click(button()));
        e
    }

    #[test]
    fn test_idle_is_inert() {
        let mut e = engine();
        assert!(e.handle(move_to(button())).is_empty());
        assert!(e.handle(click(button())).is_empty());
        assert_eq!(e.state(), &SelectionState::Idle);
    }

    #[test]
    fn test_toggle_on_waits_for_first_move() {
        let mut e = engine();
        let effects = e.handle(click_surface(Surface::Toggle));
        assert_eq!(e.state(), &SelectionState::Hovering(None));
        assert!(effects.contains(&Effect::SetListening { active: true }));
        assert!(effects.contains(&Effect::SetToggle { active: true }));
    }

    #[test]
    fn test_hover_updates_highlight_and_panel() {
        let mut e = engine();
        e.handle(click_surface(Surface::Toggle));
        let effects = e.handle(move_to(button()));
        assert!(matches!(effects[0], Effect::ShowHighlight { locked: false, .. }));
        assert!(matches!(effects[1], Effect::SetPanel { locked: false, .. }));
        assert_eq!(e.state().target().map(|t| t.selector.as_str()), Some("#go"));

        // Same element again is not a transition.
        assert!(e.handle(move_to(button())).is_empty());
    }

    #[test]
    fn test_moves_over_surfaces_keep_target() {
        let mut e = engine();
        e.handle(click_surface(Surface::Toggle));
        e.handle(move_to(button()));
        let effects = e.handle(Input::PointerMove(PointerEvent::on_surface(
            Surface::Panel,
            DEFAULT_VIEWPORT,
        )));
        assert!(effects.is_empty());
        assert_eq!(e.state().target().map(|t| t.element.handle), Some(10));
    }

    #[test]
    fn test_click_locks_with_locked_palette() {
        let mut e = engine();
        e.handle(click_surface(Surface::Toggle));
        e.handle(move_to(button()));
        let effects = e.handle(click(button()));
        assert!(matches!(e.state(), SelectionState::Locked(t) if t.selector == "#go"));
        match &effects[0] {
            Effect::ShowHighlight { palette, locked, .. } => {
                assert!(*locked);
                assert_eq!(*palette, InspectorConfig::default().locked_palette);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &effects[1] {
            Effect::SetPanel { lines, locked } => {
                assert!(*locked);
                assert_eq!(lines[0], "Selected: button #go");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_locked_ignores_moves() {
        let mut e = locked_engine();
        assert!(e.handle(move_to(heading())).is_empty());
        assert!(matches!(e.state(), SelectionState::Locked(_)));
    }

    #[test]
    fn test_click_inside_locked_opens_dialog_to_the_right() {
        let mut e = locked_engine();
        let effects = e.handle(click(button_label()));
        assert!(matches!(e.state(), SelectionState::DialogOpen(t) if t.selector == "#go"));
        match &effects[0] {
            Effect::OpenDialog { position, .. } => {
                assert_eq!(position.x, 180.0 + 12.0);
                assert_eq!(position.y, 40.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_click_outside_locked_unlocks_to_new_target() {
        let mut e = locked_engine();
        let effects = e.handle(click(heading()));
        assert!(matches!(e.state(), SelectionState::Hovering(Some(t)) if t.element.handle == 20));
        assert!(matches!(effects[0], Effect::ShowHighlight { locked: false, .. }));
    }

    #[test]
    fn test_dialog_ignores_page_clicks_and_blank_submit() {
        let mut e = locked_engine();
        e.handle(click(button()));
        assert!(e.handle(click(heading())).is_empty());
        assert!(e.handle(Input::DialogSubmit { text: "  \n ".into() }).is_empty());
        assert!(matches!(e.state(), SelectionState::DialogOpen(_)));
        assert_eq!(e.commits(), 0);
    }

    #[test]
    fn test_cancel_returns_to_locked() {
        let mut e = locked_engine();
        e.handle(click(button()));
        let effects = e.handle(Input::DialogCancel);
        assert_eq!(effects[0], Effect::CloseDialog);
        assert!(matches!(effects[1], Effect::SetPanel { locked: true, .. }));
        assert!(matches!(e.state(), SelectionState::Locked(t) if t.selector == "#go"));
    }

    #[test]
    fn test_submit_commits_and_returns_to_idle() {
        let mut e = locked_engine();
        e.handle(click(button()));
        let effects = e.handle(Input::DialogSubmit { text: " make this red ".into() });
        assert_eq!(e.state(), &SelectionState::Idle);
        assert_eq!(e.commits(), 1);
        match &effects[0] {
            Effect::CommitRecord { handle, selector, message, .. } => {
                assert_eq!(*handle, 10);
                assert_eq!(selector, "#go");
                assert_eq!(message, "make this red");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(effects.contains(&Effect::CloseDialog));
        assert!(effects.contains(&Effect::SetListening { active: false }));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Defer { key: DeferKey::Unlock, delay_ms: 1500, effects }
                if effects.contains(&Effect::hide(Surface::Highlight))
        )));
    }

    #[test]
    fn test_toggle_on_cancels_pending_unlock() {
        let mut e = locked_engine();
        e.handle(click(button()));
        e.handle(Input::DialogSubmit { text: "bigger".into() });
        let effects = e.handle(click_surface(Surface::Toggle));
        assert_eq!(effects[0], Effect::CancelDeferred { key: DeferKey::Unlock });
        assert!(!effects.contains(&Effect::CancelDeferred { key: DeferKey::Notice }));
    }

    #[test]
    fn test_toggle_off_from_any_state() {
        let mut e = locked_engine();
        e.handle(click(button()));
        let effects = e.handle(click_surface(Surface::Toggle));
        assert_eq!(e.state(), &SelectionState::Idle);
        assert_eq!(effects[0], Effect::CloseDialog);
        assert!(effects.contains(&Effect::hide(Surface::Highlight)));
        assert!(effects.contains(&Effect::hide(Surface::Panel)));
    }

    #[test]
    fn test_surface_clicks_never_reach_dialog() {
        let surfaces = [
            Surface::Toggle,
            Surface::Panel,
            Surface::Dialog,
            Surface::DevicePicker,
            Surface::Notice,
            Surface::Highlight,
        ];
        let mut e = engine();
        // Walk every pair of surface clicks from Idle.
        for a in surfaces {
            for b in surfaces {
                e.bootstrap();
                e.handle(click_surface(a));
                e.handle(click_surface(b));
                assert!(!matches!(e.state(), SelectionState::DialogOpen(_)));
                assert!(!matches!(e.state(), SelectionState::Locked(_)));
            }
        }
    }

    #[test]
    fn test_bootstrap_resets_to_idle() {
        let mut e = locked_engine();
        let effects = e.bootstrap();
        assert_eq!(e.state(), &SelectionState::Idle);
        assert!(effects.contains(&Effect::ClearRecord));
    }

    #[test]
    fn test_viewport_inputs_in_any_state() {
        let mut e = locked_engine();
        let effects = e.handle(Input::PickDevice { name: "iPhone SE".into() });
        assert_eq!(effects[1], Effect::SetSizeInputs { width: 375, height: 667 });
        assert!(matches!(e.state(), SelectionState::Locked(_)));

        let bad = e.handle(Input::CustomSize { width: "wide".into(), height: "600".into() });
        assert!(bad.is_empty());
    }
}
