//! Per-tool registry bookkeeping.
//!
//! A [`ToolRegistration`] binds a [`ToolDefinition`] to its implementation
//! and carries the mutable state the registry tracks for the tool: enabled
//! flag, usage counters, a bounded version history, per-session call
//! statistics with a sliding one-hour window, and the model-compatibility
//! cache.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use conductor_domain::tool::{RateLimit, Tool, ToolDefinition, ToolError};
use serde_json::{Value, json};

/// Oldest entries are evicted beyond this many recorded versions.
const VERSION_HISTORY_LIMIT: usize = 10;

/// One entry of the version history.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub version: String,
    pub registered_at: DateTime<Utc>,
}

/// Per-session call counters for one tool.
///
/// `hourly` holds the timestamps of calls inside the sliding one-hour
/// window; it is pruned on every read and write.
#[derive(Debug, Clone, Default)]
pub struct SessionUsage {
    pub total_calls: u32,
    hourly: VecDeque<DateTime<Utc>>,
}

impl SessionUsage {
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(1);
        while let Some(oldest) = self.hourly.front()
            && *oldest < cutoff
        {
            self.hourly.pop_front();
        }
    }

    fn record(&mut self, now: DateTime<Utc>) {
        self.total_calls += 1;
        self.hourly.push_back(now);
        self.prune(now);
    }

    fn calls_in_window(&mut self, now: DateTime<Utc>) -> u32 {
        self.prune(now);
        self.hourly.len() as u32
    }
}

/// A registered tool with its live statistics.
pub struct ToolRegistration {
    pub definition: ToolDefinition,
    pub tool: Arc<dyn Tool>,
    pub enabled: bool,
    pub registered_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: u64,
    version_history: VecDeque<VersionRecord>,
    session_usage: HashMap<String, SessionUsage>,
    model_compat: HashMap<String, bool>,
}

impl ToolRegistration {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        let definition = tool.definition().clone();
        let now = Utc::now();
        let mut registration = Self {
            definition,
            tool,
            enabled: true,
            registered_at: now,
            last_used: None,
            usage_count: 0,
            version_history: VecDeque::new(),
            session_usage: HashMap::new(),
            model_compat: HashMap::new(),
        };
        registration.push_version(now);
        registration
    }

    /// Swap the binding for a new implementation, keeping usage statistics.
    pub fn rebind(&mut self, tool: Arc<dyn Tool>) {
        self.definition = tool.definition().clone();
        self.tool = tool;
        self.model_compat.clear();
        self.push_version(Utc::now());
    }

    fn push_version(&mut self, at: DateTime<Utc>) {
        self.version_history.push_back(VersionRecord {
            version: self.definition.version.clone(),
            registered_at: at,
        });
        while self.version_history.len() > VERSION_HISTORY_LIMIT {
            self.version_history.pop_front();
        }
    }

    pub fn version_history(&self) -> impl Iterator<Item = &VersionRecord> {
        self.version_history.iter()
    }

    /// Drop one version from the history. Returns whether it was present.
    pub fn remove_version(&mut self, version: &str) -> bool {
        let before = self.version_history.len();
        self.version_history.retain(|r| r.version != version);
        self.version_history.len() < before
    }

    /// Record one call for the session and bump the global counters.
    pub fn record_use(&mut self, session_id: &str) {
        let now = Utc::now();
        self.usage_count += 1;
        self.last_used = Some(now);
        self.session_usage
            .entry(session_id.to_string())
            .or_default()
            .record(now);
    }

    /// Check the session's remaining quota and record the call in the same
    /// step. Callers hold the registration lock across both, so two
    /// concurrent calls cannot both pass an almost-spent quota.
    pub fn admit(&mut self, session_id: &str, limit: &RateLimit) -> Result<(), ToolError> {
        if let Some(max) = limit.max_calls_per_hour
            && self.hourly_calls(session_id) >= max
        {
            return Err(ToolError::permission(
                &self.definition.name,
                format!("hourly rate limit of {max} calls reached"),
            ));
        }
        if let Some(max) = limit.max_calls_per_session
            && self.session_calls(session_id) >= max
        {
            return Err(ToolError::permission(
                &self.definition.name,
                format!("session limit of {max} calls reached"),
            ));
        }
        self.record_use(session_id);
        Ok(())
    }

    /// Calls made by the session inside the sliding one-hour window.
    pub fn hourly_calls(&mut self, session_id: &str) -> u32 {
        let now = Utc::now();
        self.session_usage
            .get_mut(session_id)
            .map(|u| u.calls_in_window(now))
            .unwrap_or(0)
    }

    /// Cumulative calls made by the session.
    pub fn session_calls(&self, session_id: &str) -> u32 {
        self.session_usage
            .get(session_id)
            .map(|u| u.total_calls)
            .unwrap_or(0)
    }

    pub fn cached_compat(&self, model_id: &str) -> Option<bool> {
        self.model_compat.get(model_id).copied()
    }

    pub fn cache_compat(&mut self, model_id: &str, compatible: bool) {
        self.model_compat.insert(model_id.to_string(), compatible);
    }

    /// Detail record served by the registry's `tool_info`.
    pub fn info(&self) -> Value {
        json!({
            "name": self.definition.name,
            "description": self.definition.description,
            "version": self.definition.version,
            "parameters": self.definition.parameters,
            "timeout_seconds": self.definition.timeout_seconds,
            "enabled": self.enabled,
            "registered_at": self.registered_at.to_rfc3339(),
            "last_used": self.last_used.map(|t| t.to_rfc3339()),
            "usage_count": self.usage_count,
            "version_history": self.version_history
                .iter()
                .map(|r| r.version.clone())
                .collect::<Vec<_>>(),
            "schema": self.definition.schema(),
        })
    }
}
