use std::collections::HashMap;
use std::sync::Arc;
use pinpoint_core::{Error, Result};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{Tool, ToolContext};
use crate::inspect::{EnableInspectionTool, GetSelectedElementTool, ModifyElementTool, WaitForSelectionTool};
use crate::page::{CloseBrowserTool, LaunchBrowserTool, TakeScreenshotTool};
use crate::viewport::{ListDevicesTool, ResizeViewportTool};

#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Session lifecycle
        registry.register(Arc::new(LaunchBrowserTool));
        registry.register(Arc::new(CloseBrowserTool));
        registry.register(Arc::new(TakeScreenshotTool));

        // Selection and mutation
        registry.register(Arc::new(EnableInspectionTool));
        registry.register(Arc::new(GetSelectedElementTool));
        registry.register(Arc::new(WaitForSelectionTool));
        registry.register(Arc::new(ModifyElementTool));

        // Responsive testing
        registry.register(Arc::new(ResizeViewportTool));
        registry.register(Arc::new(ListDevicesTool));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        debug!(name = schema.name, "Registering tool");
        self.tools.insert(schema.name.to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Schemas in the tool-server listing shape, sorted by name.
    pub fn get_tool_schemas(&self) -> Vec<Value> {
        let mut names = self.tool_names();
        names.sort();
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let schema = tool.schema();
                json!({
                    "name": schema.name,
                    "description": schema.description,
                    "inputSchema": schema.parameters
                })
            })
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub async fn execute(&self, name: &str, ctx: ToolContext, params: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| {
            Error::Tool(format!("Unknown tool: {}", name))
        })?;

        if let Err(e) = tool.validate(&params) {
            warn!(tool = name, error = %e, "Tool validation failed");
            return Err(e);
        }

        debug!(tool = name, "Executing tool");
        tool.execute(ctx, params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
