//! Tool registration and dispatch.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{RagError, Result};
use crate::model::ToolDefinition;
use crate::tool::{Tool, ToolOutput};

/// A registry of tools the model may invoke.
///
/// Tools are kept in registration order so the definitions presented to the
/// model are stable across calls.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier
    /// registration.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Schemas for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters_schema(),
            })
            .collect()
    }

    /// Execute the named tool with the given arguments.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| RagError::UnknownTool { name: name.to_string() })?;
        debug!(tool = name, "dispatching tool call");
        tool.execute(args).await
    }
}
