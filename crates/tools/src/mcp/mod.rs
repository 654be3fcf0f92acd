//! Model Context Protocol surface: the driver's tools served over stdio.

mod protocol;
pub mod server;

pub use server::McpServer;
