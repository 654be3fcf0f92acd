//! In-page selection & annotation engine.
//!
//! The engine is a deterministic state machine driven by its host:
//! - the host reduces DOM events to [`Input`]s carrying [`ElementSnapshot`]s,
//! - [`Engine::handle`] advances the [`SelectionState`] and returns [`Effect`]s,
//! - the host renders those effects (overlay, panel, dialog, notices) and owns
//!   the page-global selection slot.
//!
//! [`page::SimulatedPage`] is a complete in-memory host used for tests and
//! headless driving. The live browser host lives in `pinpoint-tools`.

pub mod bootstrap;
pub mod dialog;
pub mod dom;
pub mod effect;
pub mod event;
pub mod highlight;
pub mod machine;
pub mod page;
pub mod panel;
pub mod query;
pub mod selector;
pub mod surface;
pub mod viewport;

pub use effect::{DeferKey, Effect};
pub use event::{classify, ElementSnapshot, EventTarget, Input, NodeHandle, PathSegment, PointerEvent};
pub use dom::{Document, NodeId};
pub use machine::{Engine, SelectionState, Target};
pub use page::SimulatedPage;
pub use selector::synthesize;
pub use surface::Surface;
pub use viewport::{ResizePlan, ViewportSizer};
