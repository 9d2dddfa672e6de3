//! Configuration file schema.
//!
//! Every section and field is optional in the file; serde defaults fill the
//! gaps so a partial `conductor.toml` merges cleanly over the built-in
//! defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use conductor_domain::chain::ChainConfig;
use conductor_domain::model::ModelCapability;
use conductor_domain::session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub registry: FileRegistryConfig,
    #[serde(default)]
    pub session: FileSessionConfig,
    #[serde(default)]
    pub chain: FileChainConfig,
    /// Seed entries for the model capability catalog (`[[models]]`).
    #[serde(default)]
    pub models: Vec<FileModelEntry>,
}

/// `[registry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRegistryConfig {
    /// Register the builtin calculator and weather tools at startup.
    #[serde(default = "default_true")]
    pub enable_builtin_tools: bool,
    /// Path of the JSONL execution log. `None` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_log: Option<PathBuf>,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            enable_builtin_tools: true,
            execution_log: None,
        }
    }
}

/// `[session]` section. Mirrors the per-session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSessionConfig {
    #[serde(default = "default_true")]
    pub enable_tools: bool,
    #[serde(default = "default_max_concurrent_tools")]
    pub max_concurrent_tools: usize,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_seconds: f64,
    #[serde(default = "default_max_tool_retries")]
    pub max_tool_retries: u32,
    #[serde(default = "default_cache_minutes")]
    pub cache_duration_minutes: i64,
    #[serde(default)]
    pub blocked_tools: Vec<String>,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            enable_tools: true,
            max_concurrent_tools: default_max_concurrent_tools(),
            tool_timeout_seconds: default_tool_timeout(),
            max_tool_retries: default_max_tool_retries(),
            cache_duration_minutes: default_cache_minutes(),
            blocked_tools: Vec::new(),
        }
    }
}

impl FileSessionConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            enable_tools: self.enable_tools,
            max_concurrent_tools: self.max_concurrent_tools,
            tool_timeout_seconds: self.tool_timeout_seconds,
            max_tool_retries: self.max_tool_retries,
            cache_duration_minutes: self.cache_duration_minutes,
            blocked_tools: self.blocked_tools.iter().cloned().collect::<HashSet<_>>(),
            ..SessionConfig::default()
        }
    }
}

/// `[chain]` section. Defaults applied to every chain request that does not
/// carry its own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChainConfig {
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_chain_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_timeout_per_tool")]
    pub timeout_per_tool: f64,
    #[serde(default = "default_retry_initial")]
    pub retry_initial_interval: f64,
    #[serde(default = "default_retry_max")]
    pub retry_max_interval: f64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,
}

impl Default for FileChainConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_concurrent: default_chain_concurrent(),
            timeout_per_tool: default_timeout_per_tool(),
            retry_initial_interval: default_retry_initial(),
            retry_max_interval: default_retry_max(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

impl FileChainConfig {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            fail_fast: self.fail_fast,
            max_concurrent: self.max_concurrent,
            timeout_per_tool: self.timeout_per_tool,
            retry_initial_interval: self.retry_initial_interval,
            retry_max_interval: self.retry_max_interval,
            retry_backoff: self.retry_backoff,
            model: None,
        }
    }
}

/// One `[[models]]` entry seeding the capability catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModelEntry {
    pub id: String,
    /// Display name; falls back to the id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub supports_tool_calls: bool,
    #[serde(default = "default_context_length")]
    pub context_length: u32,
}

impl FileModelEntry {
    pub fn capability(&self) -> ModelCapability {
        ModelCapability::new(
            self.id.clone(),
            self.name.clone().unwrap_or_else(|| self.id.clone()),
            self.supports_tool_calls,
            self.context_length,
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_tools() -> usize {
    3
}

fn default_tool_timeout() -> f64 {
    30.0
}

fn default_max_tool_retries() -> u32 {
    2
}

fn default_cache_minutes() -> i64 {
    30
}

fn default_chain_concurrent() -> usize {
    5
}

fn default_timeout_per_tool() -> f64 {
    60.0
}

fn default_retry_initial() -> f64 {
    1.0
}

fn default_retry_max() -> f64 {
    10.0
}

fn default_retry_backoff() -> f64 {
    2.0
}

fn default_context_length() -> u32 {
    4_096
}
