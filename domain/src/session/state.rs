//! Per-session tool availability and usage state.
//!
//! Each chat session tracks which tools the current model can use, cached
//! availability with expiry, and running execution statistics. The aggregate
//! here is pure data plus transition methods; the application layer's
//! `SessionStateManager` owns locking and lookup.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::config::SessionConfig;

/// Availability of one tool within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    Available,
    Unavailable,
    Loading,
    Error,
    Cached,
    Expired,
}

/// How capable the session's model is at tool calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityLevel {
    /// No tool calling at all.
    None,
    /// Plain function calling.
    Basic,
    /// Complex parameters supported.
    Advanced,
    /// Chaining and multi-step workflows.
    Expert,
}

/// Cached availability entry for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolAvailabilityInfo {
    pub tool_name: String,
    pub state: AvailabilityState,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub success_count: u64,
    /// Exponential moving average, alpha 0.3. First sample taken directly.
    #[serde(default)]
    pub average_execution_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<DateTime<Utc>>,
}

const EMA_ALPHA: f64 = 0.3;

impl ToolAvailabilityInfo {
    pub fn new(tool_name: impl Into<String>, state: AvailabilityState) -> Self {
        Self {
            tool_name: tool_name.into(),
            state,
            last_checked: Utc::now(),
            cache_expiry: None,
            error_message: None,
            execution_count: 0,
            success_count: 0,
            average_execution_time_ms: 0.0,
            last_execution_time: None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(
            self.state,
            AvailabilityState::Available | AvailabilityState::Cached
        )
    }

    /// No expiry means never expires.
    pub fn is_expired(&self) -> bool {
        self.cache_expiry.is_some_and(|expiry| Utc::now() > expiry)
    }

    pub fn success_rate(&self) -> f64 {
        if self.execution_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.execution_count as f64 * 100.0
        }
    }

    fn record(&mut self, success: bool, execution_time_ms: f64) {
        self.execution_count += 1;
        if success {
            self.success_count += 1;
        }
        if self.execution_count == 1 {
            self.average_execution_time_ms = execution_time_ms;
        } else {
            self.average_execution_time_ms = EMA_ALPHA * execution_time_ms
                + (1.0 - EMA_ALPHA) * self.average_execution_time_ms;
        }
        self.last_execution_time = Some(Utc::now());
    }
}

/// The session model's tool-calling profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilityInfo {
    pub model_id: String,
    pub supports_tool_calls: bool,
    pub capability_level: CapabilityLevel,
    #[serde(default = "default_max_tools_per_call")]
    pub max_tools_per_call: usize,
    #[serde(default = "default_max_parallel_tools")]
    pub max_parallel_tools: usize,
    #[serde(default = "default_context_length")]
    pub context_length: u32,
}

fn default_max_tools_per_call() -> usize {
    10
}

fn default_max_parallel_tools() -> usize {
    5
}

fn default_context_length() -> u32 {
    4096
}

impl ModelCapabilityInfo {
    pub fn new(
        model_id: impl Into<String>,
        supports_tool_calls: bool,
        capability_level: CapabilityLevel,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            supports_tool_calls,
            capability_level,
            max_tools_per_call: default_max_tools_per_call(),
            max_parallel_tools: default_max_parallel_tools(),
            context_length: default_context_length(),
        }
    }

    pub fn with_context_length(mut self, context_length: u32) -> Self {
        self.context_length = context_length;
        self
    }
}

/// Complete tool state for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToolState {
    pub session_id: String,
    pub current_model: String,
    pub model_info: ModelCapabilityInfo,
    #[serde(default)]
    pub tool_availability: HashMap<String, ToolAvailabilityInfo>,
    #[serde(default)]
    pub config: SessionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_model_change: Option<DateTime<Utc>>,
    #[serde(default)]
    pub model_switch_count: u32,
    #[serde(default)]
    pub total_tool_calls: u64,
    #[serde(default)]
    pub successful_tool_calls: u64,
    #[serde(default)]
    pub failed_tool_calls: u64,
    #[serde(default)]
    pub cache_hits: u64,
    #[serde(default)]
    pub cache_misses: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionToolState {
    pub fn new(
        session_id: impl Into<String>,
        model_info: ModelCapabilityInfo,
        config: SessionConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            current_model: model_info.model_id.clone(),
            model_info,
            tool_availability: HashMap::new(),
            config,
            last_model_change: None,
            model_switch_count: 0,
            total_tool_calls: 0,
            successful_tool_calls: 0,
            failed_tool_calls: 0,
            cache_hits: 0,
            cache_misses: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Tools that are available, unexpired and allowed by the session config.
    pub fn available_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = self
            .tool_availability
            .iter()
            .filter(|(name, info)| {
                info.is_available() && !info.is_expired() && self.config.is_tool_allowed(name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        tools.sort();
        tools
    }

    pub fn tool_info(&self, tool_name: &str) -> Option<&ToolAvailabilityInfo> {
        self.tool_availability.get(tool_name)
    }

    /// Swap the session's model. Every availability entry is marked expired so
    /// compatibility gets re-resolved against the new model.
    pub fn switch_model(&mut self, model_info: ModelCapabilityInfo) {
        let now = Utc::now();
        self.current_model = model_info.model_id.clone();
        self.model_info = model_info;
        self.last_model_change = Some(now);
        self.model_switch_count += 1;
        for info in self.tool_availability.values_mut() {
            info.state = AvailabilityState::Expired;
            info.last_checked = now;
        }
        self.updated_at = now;
    }

    /// Upsert an availability entry with a fresh expiry.
    pub fn set_tool_availability(
        &mut self,
        tool_name: &str,
        available: bool,
        error_message: Option<String>,
        cache_duration: Duration,
    ) {
        let now = Utc::now();
        let info = self
            .tool_availability
            .entry(tool_name.to_string())
            .or_insert_with(|| ToolAvailabilityInfo::new(tool_name, AvailabilityState::Loading));
        info.state = if available {
            AvailabilityState::Available
        } else {
            AvailabilityState::Unavailable
        };
        info.last_checked = now;
        info.cache_expiry = Some(now + cache_duration);
        info.error_message = error_message;
        self.updated_at = now;
    }

    /// Record an execution in both the session totals and the per-tool stats.
    pub fn record_execution(&mut self, tool_name: &str, success: bool, execution_time_ms: f64) {
        self.total_tool_calls += 1;
        if success {
            self.successful_tool_calls += 1;
        } else {
            self.failed_tool_calls += 1;
        }
        if let Some(info) = self.tool_availability.get_mut(tool_name) {
            info.record(success, execution_time_ms);
        }
        self.updated_at = Utc::now();
    }

    /// Whether a tool's availability needs to be re-resolved.
    pub fn needs_refresh(&self, tool_name: &str) -> bool {
        match self.tool_availability.get(tool_name) {
            Some(info) => info.is_expired() || info.state == AvailabilityState::Error,
            None => true,
        }
    }

    pub fn mark_cache_hit(&mut self) {
        self.cache_hits += 1;
        self.updated_at = Utc::now();
    }

    pub fn mark_cache_miss(&mut self) {
        self.cache_misses += 1;
        self.updated_at = Utc::now();
    }

    /// Percentage; 0 when nothing has run yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_tool_calls == 0 {
            0.0
        } else {
            self.successful_tool_calls as f64 / self.total_tool_calls as f64 * 100.0
        }
    }

    /// Percentage; 0 when no cache lookups happened.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionToolState {
        SessionToolState::new(
            "session-1",
            ModelCapabilityInfo::new("gpt-4o", true, CapabilityLevel::Advanced),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_available_tools_filters() {
        let mut s = state();
        s.set_tool_availability("calculator", true, None, Duration::minutes(30));
        s.set_tool_availability("weather", false, Some("offline".into()), Duration::minutes(30));
        s.set_tool_availability("search", true, None, Duration::minutes(30));
        s.config.blocked_tools.insert("search".to_string());

        assert_eq!(s.available_tools(), vec!["calculator".to_string()]);
    }

    #[test]
    fn test_expired_entry_not_available() {
        let mut s = state();
        s.set_tool_availability("calculator", true, None, Duration::minutes(-1));
        assert!(s.available_tools().is_empty());
        assert!(s.needs_refresh("calculator"));
    }

    #[test]
    fn test_switch_model_expires_availability() {
        let mut s = state();
        s.set_tool_availability("calculator", true, None, Duration::minutes(30));

        s.switch_model(ModelCapabilityInfo::new(
            "claude-sonnet",
            true,
            CapabilityLevel::Expert,
        ));

        assert_eq!(s.current_model, "claude-sonnet");
        assert_eq!(s.model_switch_count, 1);
        assert!(s.last_model_change.is_some());
        assert_eq!(
            s.tool_info("calculator").unwrap().state,
            AvailabilityState::Expired
        );
        assert!(s.available_tools().is_empty());
    }

    #[test]
    fn test_record_execution_updates_counters_and_ema() {
        let mut s = state();
        s.set_tool_availability("calculator", true, None, Duration::minutes(30));

        s.record_execution("calculator", true, 100.0);
        s.record_execution("calculator", false, 200.0);

        assert_eq!(s.total_tool_calls, 2);
        assert_eq!(s.successful_tool_calls, 1);
        assert_eq!(s.failed_tool_calls, 1);
        assert_eq!(s.success_rate(), 50.0);

        let info = s.tool_info("calculator").unwrap();
        assert_eq!(info.execution_count, 2);
        assert_eq!(info.success_count, 1);
        // First sample 100, then 0.3 * 200 + 0.7 * 100 = 130.
        assert!((info.average_execution_time_ms - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_zero_when_empty() {
        let s = state();
        assert_eq!(s.success_rate(), 0.0);
        assert_eq!(s.cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_cache_hit_rate() {
        let mut s = state();
        s.mark_cache_hit();
        s.mark_cache_hit();
        s.mark_cache_miss();
        assert!((s.cache_hit_rate() - 66.666).abs() < 0.01);
    }
}
