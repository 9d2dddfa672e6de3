//! Per-session tool configuration.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool-related knobs a session can override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_true")]
    pub enable_tools: bool,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tools: usize,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_seconds: f64,
    #[serde(default = "default_max_retries")]
    pub max_tool_retries: u32,
    /// How long a tool availability entry stays fresh.
    #[serde(default = "default_cache_minutes")]
    pub cache_duration_minutes: i64,
    /// `None` means every registered tool is allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<HashSet<String>>,
    #[serde(default)]
    pub blocked_tools: HashSet<String>,
    /// Per-tool configuration overrides, opaque to the session layer.
    #[serde(default)]
    pub tool_overrides: HashMap<String, Value>,
    /// Per-tool call quotas layered on top of registry rate limits.
    #[serde(default)]
    pub rate_limits: HashMap<String, u32>,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    3
}

fn default_tool_timeout() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    2
}

fn default_cache_minutes() -> i64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enable_tools: true,
            max_concurrent_tools: default_max_concurrent(),
            tool_timeout_seconds: default_tool_timeout(),
            max_tool_retries: default_max_retries(),
            cache_duration_minutes: default_cache_minutes(),
            allowed_tools: None,
            blocked_tools: HashSet::new(),
            tool_overrides: HashMap::new(),
            rate_limits: HashMap::new(),
        }
    }
}

impl SessionConfig {
    /// Block list wins over the allow list.
    pub fn is_tool_allowed(&self, tool_name: &str) -> bool {
        if self.blocked_tools.contains(tool_name) {
            return false;
        }
        match &self.allowed_tools {
            Some(allowed) => allowed.contains(tool_name),
            None => true,
        }
    }

    pub fn tool_override(&self, tool_name: &str) -> Option<&Value> {
        self.tool_overrides.get(tool_name)
    }

    pub fn rate_limit(&self, tool_name: &str) -> Option<u32> {
        self.rate_limits.get(tool_name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.enable_tools);
        assert_eq!(config.max_concurrent_tools, 3);
        assert_eq!(config.cache_duration_minutes, 30);
        assert!(config.is_tool_allowed("anything"));
    }

    #[test]
    fn test_blocked_beats_allowed() {
        let mut config = SessionConfig::default();
        config.allowed_tools = Some(HashSet::from(["calculator".to_string()]));
        config.blocked_tools.insert("calculator".to_string());

        assert!(!config.is_tool_allowed("calculator"));
    }

    #[test]
    fn test_allow_list_is_exclusive() {
        let mut config = SessionConfig::default();
        config.allowed_tools = Some(HashSet::from(["weather".to_string()]));

        assert!(config.is_tool_allowed("weather"));
        assert!(!config.is_tool_allowed("calculator"));
    }
}
