//! Resolved model capability, as returned by the capability resolver port.

use serde::{Deserialize, Serialize};

/// What a language model can do, as far as tool calling is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapability {
    pub model_id: String,
    pub display_name: String,
    pub supports_tool_calls: bool,
    /// Context window in tokens.
    pub context_length: u32,
}

impl ModelCapability {
    pub fn new(
        model_id: impl Into<String>,
        display_name: impl Into<String>,
        supports_tool_calls: bool,
        context_length: u32,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            display_name: display_name.into(),
            supports_tool_calls,
            context_length,
        }
    }
}
