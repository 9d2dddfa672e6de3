//! Tool Executor port
//!
//! Defines the interface through which use cases execute single tool calls.

use async_trait::async_trait;
use conductor_domain::tool::{ExecutionContext, ToolCall, ToolCallResult, ToolDefinition};

/// Port for tool execution
///
/// This port is how the application layer reaches the registry.
/// The concrete adapter (`ToolRegistry`) lives in the infrastructure layer
/// and performs the full gate sequence (existence, model compatibility,
/// permission, usage tracking) before driving the call.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Definitions of all enabled tools.
    async fn definitions(&self) -> Vec<ToolDefinition>;

    /// Names of all enabled tools.
    async fn tool_names(&self) -> Vec<String>;

    /// Whether an enabled tool with this name exists.
    async fn has_tool(&self, name: &str) -> bool {
        self.tool_names().await.iter().any(|n| n == name)
    }

    /// Execute a tool call. Failures come back inside the result, never as a
    /// panic or an `Err`.
    async fn execute(&self, call: &ToolCall, ctx: &ExecutionContext) -> ToolCallResult;
}
