//! Chain execution requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::StepCondition;
use crate::tool::ToolCall;

/// How the steps of a chain are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStrategy {
    /// All steps at once, bounded by `max_concurrent`.
    Parallel,
    /// One step after another, feeding earlier results forward.
    #[default]
    Sequential,
    /// Sequential, but each step's condition decides whether it runs.
    Conditional,
    /// Topologically batched by the dependency graph.
    DependencyBased,
}

impl ChainStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStrategy::Parallel => "parallel",
            ChainStrategy::Sequential => "sequential",
            ChainStrategy::Conditional => "conditional",
            ChainStrategy::DependencyBased => "dependency_based",
        }
    }
}

/// Tunables for one chain run. Live updates merge into this for steps that
/// have not started yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Sequential only: stop at the first failed step.
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_timeout_per_tool")]
    pub timeout_per_tool: f64,
    #[serde(default = "default_retry_initial_interval")]
    pub retry_initial_interval: f64,
    #[serde(default = "default_retry_max_interval")]
    pub retry_max_interval: f64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,
    /// Model attributed to the execution context of each step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_timeout_per_tool() -> f64 {
    60.0
}

fn default_retry_initial_interval() -> f64 {
    1.0
}

fn default_retry_max_interval() -> f64 {
    10.0
}

fn default_retry_backoff() -> f64 {
    2.0
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_concurrent: default_max_concurrent(),
            timeout_per_tool: default_timeout_per_tool(),
            retry_initial_interval: default_retry_initial_interval(),
            retry_max_interval: default_retry_max_interval(),
            retry_backoff: default_retry_backoff(),
            model: None,
        }
    }
}

impl ChainConfig {
    /// Merge a JSON patch into this config. Unknown keys are ignored, known
    /// keys replace the current value.
    pub fn merge(&mut self, patch: &Value) {
        let Some(patch) = patch.as_object() else {
            return;
        };
        let mut current = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            _ => return,
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        if let Ok(merged) = serde_json::from_value(Value::Object(current)) {
            *self = merged;
        }
    }
}

/// One step of a chain: a tool call plus scheduling attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStep {
    /// Step id used by the dependency graph. Defaults to the call id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call: ToolCall,
    /// Conditional strategy only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,
}

impl ChainStep {
    pub fn new(call: ToolCall) -> Self {
        Self {
            id: None,
            call,
            condition: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// The id the dependency graph refers to.
    pub fn step_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.call.id)
    }
}

/// A full chain execution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionRequest {
    pub execution_id: String,
    pub session_id: String,
    pub steps: Vec<ChainStep>,
    #[serde(default)]
    pub strategy: ChainStrategy,
    #[serde(default)]
    pub config: ChainConfig,
    /// Wall-clock budget for the whole chain.
    #[serde(default = "default_chain_timeout")]
    pub timeout_seconds: f64,
    #[serde(default = "default_chain_retries")]
    pub max_retries: u32,
    /// step id -> ids it depends on. DependencyBased strategy only.
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<String>>,
}

fn default_chain_timeout() -> f64 {
    300.0
}

fn default_chain_retries() -> u32 {
    3
}

impl ToolExecutionRequest {
    pub fn new(session_id: impl Into<String>, strategy: ChainStrategy) -> Self {
        Self {
            execution_id: format!("exec_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            session_id: session_id.into(),
            steps: Vec::new(),
            strategy,
            config: ChainConfig::default(),
            timeout_seconds: default_chain_timeout(),
            max_retries: default_chain_retries(),
            dependencies: HashMap::new(),
        }
    }

    pub fn with_step(mut self, step: ChainStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_call(self, call: ToolCall) -> Self {
        self.with_step(ChainStep::new(call))
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_dependency(
        mut self,
        step_id: impl Into<String>,
        depends_on: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dependencies
            .insert(step_id.into(), depends_on.into_iter().map(Into::into).collect());
        self
    }

    pub fn step_ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.step_id().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strategy_serde() {
        assert_eq!(
            serde_json::to_value(ChainStrategy::DependencyBased).unwrap(),
            json!("dependency_based")
        );
        let parsed: ChainStrategy = serde_json::from_value(json!("parallel")).unwrap();
        assert_eq!(parsed, ChainStrategy::Parallel);
    }

    #[test]
    fn test_config_merge_known_keys() {
        let mut config = ChainConfig::default();
        config.merge(&json!({"fail_fast": true, "max_concurrent": 2, "bogus": 1}));
        assert!(config.fail_fast);
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout_per_tool, 60.0);
    }

    #[test]
    fn test_config_merge_ignores_non_object() {
        let mut config = ChainConfig::default();
        config.merge(&json!("nonsense"));
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_step_id_falls_back_to_call_id() {
        let call = ToolCall::new("calculator");
        let call_id = call.id.clone();
        let step = ChainStep::new(call);
        assert_eq!(step.step_id(), call_id);

        let named = ChainStep::new(ToolCall::new("calculator")).with_id("calc");
        assert_eq!(named.step_id(), "calc");
    }

    #[test]
    fn test_request_builder() {
        let request = ToolExecutionRequest::new("session-1", ChainStrategy::DependencyBased)
            .with_step(ChainStep::new(ToolCall::new("fetch")).with_id("fetch"))
            .with_step(ChainStep::new(ToolCall::new("summarize")).with_id("summarize"))
            .with_dependency("summarize", ["fetch"]);

        assert_eq!(request.step_ids(), vec!["fetch", "summarize"]);
        assert_eq!(request.dependencies["summarize"], vec!["fetch"]);
        assert!(request.execution_id.starts_with("exec_"));
    }
}
