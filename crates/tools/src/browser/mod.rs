//! Live browser host: launches Chrome or Edge, speaks the DevTools protocol,
//! and runs the engine against the real page through an injected shim.

pub mod backend;
pub mod bridge;
pub mod cdp;
pub mod launch;
pub mod shim;

pub use backend::{CdpBackend, ChromeLauncher};
pub use launch::{find_browser_binary, BrowserEngine};
