//! Model Capability port
//!
//! Resolves what a language model can do, tool-calling wise. The registry
//! consults this when building its model-compatibility cache, and the
//! model-switch coordinator uses it to compute tool snapshots and fallbacks.

use async_trait::async_trait;
use conductor_domain::model::ModelCapability;

/// Port for resolving model capabilities.
#[async_trait]
pub trait ModelCapabilityPort: Send + Sync {
    /// Resolve one model. `None` when the model is unknown.
    async fn resolve(&self, model_id: &str) -> Option<ModelCapability>;

    /// Every model the catalog knows about.
    async fn all_models(&self) -> Vec<ModelCapability>;

    /// Models that support tool calls.
    async fn tool_capable_models(&self) -> Vec<ModelCapability> {
        self.all_models()
            .await
            .into_iter()
            .filter(|m| m.supports_tool_calls)
            .collect()
    }
}
