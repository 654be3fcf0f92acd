//! In-memory page host.
//!
//! `SimulatedPage` plays the browser's part for the engine: it owns a
//! [`Document`], turns pointer interactions on nodes into [`Input`]s, applies
//! the resulting [`Effect`]s to real surface nodes inside the document, keeps
//! the selection slot, and runs deferred effects on a manual clock.

use pinpoint_core::{
    DeviceProfile, InspectorConfig, MutationOutcome, MutationRequest, Point, SelectionRecord,
    SelectionSlot, Size,
};
use tracing::{debug, warn};

use crate::dom::{Document, NodeId};
use crate::effect::{DeferKey, Effect};
use crate::event::{Input, PointerEvent};
use crate::machine::{Engine, SelectionState};
use crate::surface::Surface;

/// What the dialog surface currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogView {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub heading: String,
}

#[derive(Debug, Clone)]
struct Timer {
    key: DeferKey,
    due_ms: u64,
    order: u64,
    effects: Vec<Effect>,
}

#[derive(Debug)]
pub struct SimulatedPage {
    doc: Document,
    viewport: Size,
    window: Size,
    config: InspectorConfig,
    engine: Option<Engine>,
    slot: SelectionSlot,
    listening: bool,
    toggle_active: bool,
    size_inputs: Option<(u32, u32)>,
    devices: Vec<DeviceProfile>,
    dialog: Option<DialogView>,
    clock_ms: u64,
    timers: Vec<Timer>,
    timer_order: u64,
}

impl SimulatedPage {
    pub fn new(html: &str, viewport: Size, config: InspectorConfig) -> Self {
        let window = Size::new(
            viewport.width.saturating_add(config.chrome_width),
            viewport.height.saturating_add(config.chrome_height),
        );
        Self {
            doc: Document::parse(html),
            viewport,
            window,
            config,
            engine: None,
            slot: SelectionSlot::default(),
            listening: false,
            toggle_active: false,
            size_inputs: None,
            devices: Vec::new(),
            dialog: None,
            clock_ms: 0,
            timers: Vec::new(),
            timer_order: 0,
        }
    }

    /// Load a new document. Everything tied to the previous page lifetime is
    /// gone, including the engine and the selection slot.
    pub fn navigate(&mut self, html: &str) {
        self.doc = Document::parse(html);
        self.engine = None;
        self.slot = SelectionSlot::default();
        self.listening = false;
        self.toggle_active = false;
        self.size_inputs = None;
        self.devices.clear();
        self.dialog = None;
        self.timers.clear();
    }

    /// Run the injection bootstrap. Safe to call repeatedly.
    pub fn inject(&mut self) {
        // Timers of a previous instance point at nodes that are about to go.
        self.timers.clear();
        let mut engine = Engine::new(&self.config);
        let effects = engine.bootstrap();
        self.engine = Some(engine);
        self.apply_all(effects);
    }

    pub fn is_injected(&self) -> bool {
        self.engine.is_some()
    }

    pub fn state(&self) -> Option<&SelectionState> {
        self.engine.as_ref().map(Engine::state)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn window_size(&self) -> Size {
        self.window
    }

    pub fn size_inputs(&self) -> Option<(u32, u32)> {
        self.size_inputs
    }

    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    pub fn slot(&self) -> &SelectionSlot {
        &self.slot
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_toggle_active(&self) -> bool {
        self.toggle_active
    }

    pub fn dialog(&self) -> Option<&DialogView> {
        self.dialog.as_ref()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.doc.query_selector(selector).ok().flatten()
    }

    // ── Surfaces ───────────────────────────────────────────────────────────

    /// Number of live nodes carrying the surface's well-known id.
    pub fn surface_count(&self, surface: Surface) -> usize {
        self.doc
            .elements()
            .into_iter()
            .filter(|n| self.doc.attr(*n, "id") == Some(surface.dom_id()))
            .count()
    }

    pub fn surface_node(&self, surface: Surface) -> Option<NodeId> {
        self.doc.get_element_by_id(surface.dom_id())
    }

    pub fn is_surface_visible(&self, surface: Surface) -> bool {
        self.surface_node(surface)
            .and_then(|n| self.doc.style_property(n, "display"))
            .map(|d| d != "none")
            .unwrap_or(false)
    }

    pub fn surface_text(&self, surface: Surface) -> String {
        self.surface_node(surface)
            .map(|n| self.doc.text_content(n))
            .unwrap_or_default()
    }

    pub fn panel_lines(&self) -> Vec<String> {
        self.surface_text(Surface::Panel)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn notice(&self) -> Option<String> {
        if self.is_surface_visible(Surface::Notice) {
            Some(self.surface_text(Surface::Notice))
        } else {
            None
        }
    }

    fn surface_of(&self, node: NodeId) -> Option<Surface> {
        Surface::ALL.iter().copied().find(|s| {
            self.surface_node(*s)
                .map(|root| self.doc.contains(root, node))
                .unwrap_or(false)
        })
    }

    // ── Interaction ────────────────────────────────────────────────────────

    fn pointer_event(&self, node: NodeId) -> Option<PointerEvent> {
        match self.surface_of(node) {
            Some(surface) if surface.passes_pointer_events() => None,
            Some(surface) => Some(PointerEvent::on_surface(surface, self.viewport)),
            None => self
                .doc
                .snapshot(node, self.viewport.width as f64)
                .map(|snap| PointerEvent::on_element(snap, self.viewport)),
        }
    }

    /// Pointer moves onto `node`. Page listeners are inert until selection
    /// mode is switched on.
    pub fn hover(&mut self, node: NodeId) {
        if !self.listening {
            return;
        }
        if let Some(event) = self.pointer_event(node) {
            self.dispatch(Input::PointerMove(event));
        }
    }

    pub fn click(&mut self, node: NodeId) {
        let event = match self.pointer_event(node) {
            Some(event) => event,
            None => return,
        };
        // Surfaces have their own handlers; the page listener is gated.
        if event.surface.is_none() && !self.listening {
            return;
        }
        self.dispatch(Input::Click(event));
    }

    pub fn click_surface(&mut self, surface: Surface) {
        if self.surface_node(surface).is_none() {
            return;
        }
        self.dispatch(Input::Click(PointerEvent::on_surface(surface, self.viewport)));
    }

    pub fn toggle(&mut self) {
        self.click_surface(Surface::Toggle);
    }

    pub fn submit(&mut self, text: &str) {
        self.dispatch(Input::DialogSubmit {
            text: text.to_string(),
        });
    }

    pub fn cancel(&mut self) {
        self.dispatch(Input::DialogCancel);
    }

    pub fn pick_device(&mut self, name: &str) {
        self.dispatch(Input::PickDevice {
            name: name.to_string(),
        });
    }

    pub fn custom_size(&mut self, width: &str, height: &str) {
        self.dispatch(Input::CustomSize {
            width: width.to_string(),
            height: height.to_string(),
        });
    }

    /// Hand an input to the engine and apply what comes back. No-op before injection.
    pub fn dispatch(&mut self, input: Input) {
        let effects = match self.engine.as_mut() {
            Some(engine) => engine.handle(input),
            None => return,
        };
        self.apply_all(effects);
    }

    /// Move the clock forward, firing deferred effects as they come due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.clock_ms.saturating_add(ms);
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= target)
                .min_by_key(|(_, t)| (t.due_ms, t.order))
                .map(|(i, _)| i);
            let index = match next {
                Some(index) => index,
                None => break,
            };
            let timer = self.timers.remove(index);
            self.clock_ms = timer.due_ms;
            self.apply_all(timer.effects);
        }
        self.clock_ms = target;
    }

    /// Keys of the deferred batches still waiting, soonest first.
    pub fn pending_timers(&self) -> Vec<DeferKey> {
        let mut pending: Vec<&Timer> = self.timers.iter().collect();
        pending.sort_by_key(|t| (t.due_ms, t.order));
        pending.into_iter().map(|t| t.key).collect()
    }

    /// Drop the batch pending under `key`. Returns whether one was pending.
    pub fn cancel_deferred(&mut self, key: DeferKey) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.key != key);
        self.timers.len() != before
    }

    // ── Effects ────────────────────────────────────────────────────────────

    pub fn apply_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::RemoveSurface { surface } => {
                while let Some(node) = self.surface_node(surface) {
                    self.doc.detach(node);
                }
            }
            Effect::CreateSurface {
                surface,
                z_index,
                visible,
            } => self.create_surface(surface, z_index, visible),
            Effect::ShowHighlight {
                rect,
                palette,
                locked,
            } => {
                if let Some(node) = self.surface_node(Surface::Highlight) {
                    let d = &mut self.doc;
                    d.set_style_property(node, "left", &format!("{}px", rect.x));
                    d.set_style_property(node, "top", &format!("{}px", rect.y));
                    d.set_style_property(node, "width", &format!("{}px", rect.width));
                    d.set_style_property(node, "height", &format!("{}px", rect.height));
                    d.set_style_property(node, "border-color", &palette.border);
                    d.set_style_property(node, "background", &palette.background);
                    d.set_attr(node, "data-locked", if locked { "true" } else { "false" });
                    d.set_style_property(node, "display", "block");
                }
            }
            Effect::HideSurface { surface } => {
                if surface == Surface::Dialog {
                    self.dialog = None;
                }
                self.set_visible(surface, false);
            }
            Effect::SetPanel { lines, locked } => {
                if let Some(node) = self.surface_node(Surface::Panel) {
                    self.doc.set_text(node, &lines.join("\n"));
                    self.doc
                        .set_attr(node, "data-locked", if locked { "true" } else { "false" });
                }
                self.set_visible(Surface::Panel, true);
            }
            Effect::OpenDialog {
                position,
                width,
                height,
                heading,
            } => {
                if let Some(node) = self.surface_node(Surface::Dialog) {
                    self.doc.set_text(node, &heading);
                    self.doc
                        .set_style_property(node, "left", &format!("{}px", position.x));
                    self.doc
                        .set_style_property(node, "top", &format!("{}px", position.y));
                }
                self.set_visible(Surface::Dialog, true);
                self.dialog = Some(DialogView {
                    position,
                    width,
                    height,
                    heading,
                });
            }
            Effect::CloseDialog => {
                self.dialog = None;
                self.set_visible(Surface::Dialog, false);
            }
            Effect::ShowNotice { text } => {
                if let Some(node) = self.surface_node(Surface::Notice) {
                    self.doc.set_text(node, &text);
                }
                self.set_visible(Surface::Notice, true);
            }
            Effect::SetToggle { active } => {
                self.toggle_active = active;
                if let Some(node) = self.surface_node(Surface::Toggle) {
                    self.doc
                        .set_attr(node, "data-active", if active { "true" } else { "false" });
                }
            }
            Effect::SetListening { active } => self.listening = active,
            Effect::CommitRecord {
                handle,
                selector,
                message,
                styles,
            } => self.commit(handle as NodeId, selector, message, &styles),
            Effect::ClearRecord => self.slot = SelectionSlot::default(),
            Effect::ResizeWindow { content, window } => {
                debug!(width = content.width, height = content.height, "Resizing simulated window");
                self.viewport = content;
                self.window = window;
            }
            Effect::SetSizeInputs { width, height } => self.size_inputs = Some((width, height)),
            Effect::SetDevices { devices } => {
                if let Some(node) = self.surface_node(Surface::DevicePicker) {
                    let listing = devices
                        .iter()
                        .map(|d| format!("{} ({}x{})", d.name, d.width, d.height))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.doc.set_text(node, &listing);
                }
                self.devices = devices;
            }
            Effect::Defer { key, delay_ms, effects } => {
                self.cancel_deferred(key);
                self.timer_order += 1;
                self.timers.push(Timer {
                    key,
                    due_ms: self.clock_ms.saturating_add(delay_ms),
                    order: self.timer_order,
                    effects,
                });
            }
            Effect::CancelDeferred { key } => {
                if self.cancel_deferred(key) {
                    debug!(?key, "Cancelled deferred effects");
                }
            }
        }
    }

    fn create_surface(&mut self, surface: Surface, z_index: i64, visible: bool) {
        let parent = match self.doc.body().or_else(|| self.doc.document_element()) {
            Some(parent) => parent,
            None => return,
        };
        let mut style = format!(
            "position: fixed; z-index: {}; display: {};",
            z_index,
            if visible { "block" } else { "none" }
        );
        if surface.passes_pointer_events() {
            style.push_str(" pointer-events: none;");
        }
        let node = self.doc.create_element(
            "div",
            &[
                ("id", surface.dom_id()),
                ("data-pinpoint", "surface"),
                ("style", &style),
            ],
        );
        self.doc.append_child(parent, node);
    }

    fn set_visible(&mut self, surface: Surface, visible: bool) {
        if let Some(node) = self.surface_node(surface) {
            self.doc
                .set_style_property(node, "display", if visible { "block" } else { "none" });
        }
    }

    fn commit(&mut self, node: NodeId, selector: String, message: String, styles: &[String]) {
        if !self.doc.is_attached(node) || !self.doc.is_element(node) {
            warn!(selector = %selector, "Selected element is gone; nothing committed");
            return;
        }
        let record = SelectionRecord {
            html: self.doc.outer_html(node),
            css: self
                .doc
                .computed_style(node, styles, self.viewport.width as f64),
            selector,
            message: Some(message),
        };
        self.slot = SelectionSlot {
            seq: self.slot.seq + 1,
            record: Some(record),
        };
    }

    // ── Host-side mutation ─────────────────────────────────────────────────

    /// Apply a mutation through the page's own query. `html` replaces the
    /// element first; `css` then lands on whatever the selector resolves to.
    /// A selector that resolves to nothing leaves the page untouched.
    pub fn apply_mutation(&mut self, request: &MutationRequest) -> MutationOutcome {
        let mut outcome = MutationOutcome::default();

        if let Some(html) = &request.html {
            if let Some(node) = self.query_selector(&request.selector) {
                outcome.matched = true;
                outcome.html_applied = self.doc.replace_outer_html(node, html).is_some();
            }
        }

        if let Some(css) = request.css.as_ref().filter(|c| !c.is_empty()) {
            if let Some(node) = self.query_selector(&request.selector) {
                outcome.matched = true;
                for (key, value) in css {
                    self.doc.set_style_property(node, key, value);
                }
                outcome.css_applied = true;
            }
        }

        debug!(
            selector = %request.selector,
            matched = outcome.matched,
            css = outcome.css_applied,
            html = outcome.html_applied,
            "Applied mutation"
        );
        outcome
    }

    /// Plain-text rendering of what the page currently shows, for hosts that
    /// cannot produce pixels.
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "viewport {}x{} | state {}",
            self.viewport.width,
            self.viewport.height,
            self.state().map(SelectionState::name).unwrap_or("not injected")
        );
        for surface in Surface::ALL {
            if self.is_surface_visible(surface) {
                out.push_str(&format!("\n[{}] {}", surface.dom_id(), self.surface_text(surface)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;
    use pinpoint_core::Rect;
    use std::collections::BTreeMap;

    const PAGE: &str = r#"<html><head></head><body>
        <h1>Shop</h1>
        <div class="card">
          <button id="go">Go <span class="label">now</span></button>
        </div>
        <p>Footer</p>
    </body></html>"#;

    fn page() -> SimulatedPage {
        SimulatedPage::new(PAGE, Size::new(1280, 800), InspectorConfig::default())
    }

    fn node(page: &SimulatedPage, selector: &str) -> NodeId {
        page.query_selector(selector).unwrap()
    }

    fn select_go(page: &mut SimulatedPage, message: &str) {
        let go = node(page, "#go");
        page.toggle();
        page.hover(go);
        page.click(go);
        page.click(go);
        page.submit(message);
    }

    #[test]
    fn test_injection_is_idempotent() {
        let mut page = page();
        for _ in 0..3 {
            page.inject();
        }
        for surface in Surface::ALL {
            assert_eq!(page.surface_count(surface), 1, "{:?}", surface);
        }
        assert_eq!(page.state(), Some(&SelectionState::Idle));
    }

    #[test]
    fn test_injection_removes_stale_instances() {
        let stale = r#"<html><body><div id="pinpoint-panel"></div><p>x</p><div id="pinpoint-panel"></div></body></html>"#;
        let mut page = SimulatedPage::new(stale, Size::new(800, 600), InspectorConfig::default());
        page.inject();
        assert_eq!(page.surface_count(Surface::Panel), 1);
    }

    #[test]
    fn test_reinjection_resets_selection_and_slot() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "first");
        assert!(page.slot().is_committed());

        let go = node(&page, "#go");
        page.toggle();
        page.hover(go);
        page.click(go);
        page.inject();
        assert_eq!(page.state(), Some(&SelectionState::Idle));
        assert_eq!(page.slot(), &SelectionSlot::default());
        assert!(!page.is_listening());
    }

    #[test]
    fn test_listeners_inert_until_toggle() {
        let mut page = page();
        page.inject();
        let go = node(&page, "#go");
        page.hover(go);
        page.click(go);
        assert_eq!(page.state(), Some(&SelectionState::Idle));
        assert!(!page.is_surface_visible(Surface::Highlight));
    }

    #[test]
    fn test_selection_scenario() {
        let mut page = page();
        page.inject();
        let go = node(&page, "#go");
        page.document_mut().set_rect(go, Rect::new(100.0, 40.0, 80.0, 30.0));

        page.toggle();
        page.hover(go);
        page.click(go);
        assert!(matches!(page.state(), Some(SelectionState::Locked(_))));
        let highlight = page.surface_node(Surface::Highlight).unwrap();
        assert_eq!(page.document().attr(highlight, "data-locked"), Some("true"));
        assert_eq!(
            page.document().style_property(highlight, "border-color").as_deref(),
            Some("#ef4444")
        );
        assert_eq!(page.panel_lines()[0], "Selected: button #go");

        // Second click on a descendant of the locked button.
        let label = node(&page, "span.label");
        page.click(label);
        let dialog = page.dialog().cloned().unwrap();
        assert_eq!(dialog.position, Point { x: 180.0 + 12.0, y: 40.0 });

        page.submit("make this red");
        assert_eq!(page.state(), Some(&SelectionState::Idle));
        let record = page.slot().record.clone().unwrap();
        assert_eq!(record.selector, "#go");
        assert_eq!(record.message.as_deref(), Some("make this red"));
        assert!(record.html.starts_with("<button id=\"go\">"));
        assert_eq!(record.css.get("display").map(String::as_str), Some("inline"));
        assert_eq!(page.slot().seq, 1);
        assert!(page.dialog().is_none());
        assert!(page.notice().is_some());
        // Same highlight node throughout.
        assert_eq!(page.surface_node(Surface::Highlight), Some(highlight));
    }

    #[test]
    fn test_deferred_teardown_after_submit() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "hello");
        assert!(page.is_surface_visible(Surface::Highlight));

        page.advance(1500);
        assert!(!page.is_surface_visible(Surface::Highlight));
        assert!(!page.is_surface_visible(Surface::Panel));
        assert!(page.notice().is_some());

        page.advance(500);
        assert!(page.notice().is_none());
    }

    #[test]
    fn test_reselecting_before_unlock_delay_keeps_highlight() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "hello");
        page.advance(100);

        let h1 = node(&page, "h1");
        page.toggle();
        assert_eq!(page.pending_timers(), vec![DeferKey::Notice]);
        page.hover(h1);
        page.advance(1500);
        assert!(matches!(page.state(), Some(SelectionState::Hovering(Some(_)))));
        assert!(page.is_surface_visible(Surface::Highlight));
        assert!(page.is_surface_visible(Surface::Panel));

        page.hover(h1);
        page.advance(400);
        assert!(page.notice().is_none());
        assert!(page.is_surface_visible(Surface::Highlight));
        assert!(page.pending_timers().is_empty());
    }

    #[test]
    fn test_second_notice_gets_its_full_duration() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "one");
        page.advance(1000);
        select_go(&mut page, "two");
        let notices = page
            .pending_timers()
            .into_iter()
            .filter(|k| *k == DeferKey::Notice)
            .count();
        assert_eq!(notices, 1);

        // The first notice timer would have fired at 2000ms.
        page.advance(1200);
        assert!(page.notice().is_some());
        page.advance(800);
        assert!(page.notice().is_none());
    }

    #[test]
    fn test_cancel_deferred_reports_pending() {
        let mut page = page();
        page.inject();
        assert!(!page.cancel_deferred(DeferKey::Unlock));
        select_go(&mut page, "hello");
        assert!(page.cancel_deferred(DeferKey::Unlock));
        page.advance(1500);
        assert!(page.is_surface_visible(Surface::Highlight));
    }

    #[test]
    fn test_blank_submit_keeps_dialog_open() {
        let mut page = page();
        page.inject();
        let go = node(&page, "#go");
        page.toggle();
        page.hover(go);
        page.click(go);
        page.click(go);
        page.submit("   ");
        assert!(matches!(page.state(), Some(SelectionState::DialogOpen(_))));
        assert!(page.dialog().is_some());
        assert_eq!(page.slot().seq, 0);
    }

    #[test]
    fn test_cancel_restores_locked_hint() {
        let mut page = page();
        page.inject();
        let go = node(&page, "#go");
        page.toggle();
        page.hover(go);
        page.click(go);
        page.click(go);
        page.cancel();
        assert!(matches!(page.state(), Some(SelectionState::Locked(_))));
        assert!(!page.is_surface_visible(Surface::Dialog));
        assert_eq!(
            page.panel_lines().last().map(String::as_str),
            Some(crate::panel::LOCKED_HINT)
        );
    }

    #[test]
    fn test_surface_clicks_do_not_select() {
        let mut page = page();
        page.inject();
        page.toggle();
        let panel = page.surface_node(Surface::Panel).unwrap();
        page.click(panel);
        page.click_surface(Surface::DevicePicker);
        assert_eq!(page.state(), Some(&SelectionState::Hovering(None)));
    }

    #[test]
    fn test_mutation_css_only() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "make this red");
        let before = page.document().outer_html(node(&page, "#go"));

        let mut css = BTreeMap::new();
        css.insert("color".to_string(), "red".to_string());
        let outcome = page.apply_mutation(&MutationRequest {
            selector: "#go".into(),
            css: Some(css),
            html: None,
        });
        assert_eq!(
            outcome,
            MutationOutcome { matched: true, css_applied: true, html_applied: false }
        );
        let go = node(&page, "#go");
        assert_eq!(page.document().style_property(go, "color").as_deref(), Some("red"));
        assert_eq!(page.document().text_content(go), "Go now");
        assert_ne!(before, page.document().outer_html(go));
    }

    #[test]
    fn test_mutation_html_then_css() {
        let mut page = page();
        page.inject();
        let mut css = BTreeMap::new();
        css.insert("fontWeight".to_string(), "700".to_string());
        let outcome = page.apply_mutation(&MutationRequest {
            selector: "#go".into(),
            css: Some(css),
            html: Some(r#"<button id="go">Buy</button>"#.into()),
        });
        assert!(outcome.html_applied && outcome.css_applied);
        let go = node(&page, "#go");
        assert_eq!(page.document().text_content(go), "Buy");
        assert_eq!(
            page.document().style_property(go, "font-weight").as_deref(),
            Some("700")
        );
    }

    #[test]
    fn test_stale_selector_is_noop() {
        let mut page = page();
        page.inject();
        let before = page.document().outer_html(page.document().body().unwrap());
        let outcome = page.apply_mutation(&MutationRequest {
            selector: "#missing".into(),
            css: Some(BTreeMap::from([("color".to_string(), "red".to_string())])),
            html: Some("<p>x</p>".into()),
        });
        assert_eq!(outcome, MutationOutcome::default());
        assert_eq!(before, page.document().outer_html(page.document().body().unwrap()));
    }

    #[test]
    fn test_device_and_custom_resize() {
        let mut page = page();
        page.inject();
        page.pick_device("iPhone SE");
        assert_eq!(page.viewport(), Size::new(375, 667));
        assert_eq!(page.window_size(), Size::new(375 + 16, 667 + 88));
        assert_eq!(page.size_inputs(), Some((375, 667)));

        page.custom_size("0", "500");
        assert_eq!(page.viewport(), Size::new(375, 667));
        page.custom_size("1024", "700");
        assert_eq!(page.size_inputs(), Some((1024, 700)));
        assert!(!page.devices().is_empty());
    }

    #[test]
    fn test_navigation_clears_engine_and_slot() {
        let mut page = page();
        page.inject();
        select_go(&mut page, "x");
        page.navigate("<html><body><p>new</p></body></html>");
        assert!(!page.is_injected());
        assert_eq!(page.slot().seq, 0);
        assert_eq!(page.surface_count(Surface::Toggle), 0);
        let p = node(&page, "p");
        assert!(matches!(page.document().kind(p), Some(NodeKind::Element { .. })));
    }
}
