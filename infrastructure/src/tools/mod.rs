//! Concrete tool implementations.
//!
//! The builtin tools ship with the registry and double as fixtures for
//! integration tests: the calculator exercises parameter constraints and
//! domain failures, the weather tool exercises canned lookups.

pub mod builtin;

use std::sync::Arc;

use conductor_domain::tool::{Tool, ToolError};

use crate::registry::ToolRegistry;

/// Register every builtin tool on the registry.
pub async fn register_builtin_tools(registry: &ToolRegistry) -> Result<(), ToolError> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(builtin::CalculatorTool::new()),
        Arc::new(builtin::WeatherTool::new()),
    ];
    for tool in tools {
        registry.register(tool, false).await?;
    }
    Ok(())
}
