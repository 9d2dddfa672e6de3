//! The contract every executable tool implements.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use super::call::{ExecutionContext, ToolOutput};
use super::definition::ToolDefinition;
use super::error::ToolError;

/// An executable tool.
///
/// Implementations own their [`ToolDefinition`] and return it by reference.
/// The call driver validates parameters against the definition before
/// `execute` runs, so implementations may assume the supplied map is
/// type-checked and has defaults filled in. Failures inside the tool body are
/// reported through [`ToolOutput::fail`], not by panicking.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// Run the tool. `params` is the effective parameter map after validation.
    async fn execute(&self, params: HashMap<String, Value>, ctx: &ExecutionContext) -> ToolOutput;

    /// Context check run before `execute`. The default requires a session id.
    fn validate_context(&self, ctx: &ExecutionContext) -> Result<(), ToolError> {
        if ctx.session_id.trim().is_empty() {
            return Err(ToolError::validation(
                &self.definition().name,
                "execution context has no session id",
            ));
        }
        Ok(())
    }

    /// Hook invoked before `execute`. Default is a no-op.
    async fn pre_execute(&self, _ctx: &ExecutionContext) {}

    /// Hook invoked after `execute`, regardless of the outcome. Default is a
    /// no-op.
    async fn post_execute(&self, _ctx: &ExecutionContext, _output: &ToolOutput) {}
}
