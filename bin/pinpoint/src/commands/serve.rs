use pinpoint_core::{Config, Paths};
use pinpoint_tools::browser::ChromeLauncher;
use pinpoint_tools::mcp::McpServer;
use pinpoint_tools::{Driver, DriverHandle, ToolContext, ToolRegistry};
use std::sync::Arc;
use tracing::info;

/// Driver over a real browser, configured from `~/.pinpoint/config.json`.
pub fn build_driver(paths: Paths, config: Config) -> DriverHandle {
    let launcher = ChromeLauncher::new(paths, config.inspector.clone());
    Driver::new(config, Arc::new(launcher)).into_handle()
}

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    config.validate()?;
    info!(
        config = %paths.config_file().display(),
        browser = %config.browser.engine,
        headed = config.browser.headed,
        "Starting tool server"
    );

    let ctx = ToolContext::new(build_driver(paths, config));
    let server = McpServer::new(ToolRegistry::with_defaults(), ctx);
    server.serve_stdio().await?;
    Ok(())
}
