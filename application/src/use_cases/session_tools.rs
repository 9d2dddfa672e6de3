//! Session tool state management.
//!
//! [`SessionStateManager`] owns the per-session [`SessionToolState`]
//! aggregates. Each session sits behind its own `Mutex` inside an outer
//! `RwLock`-ed map, so operations on different sessions never contend and
//! model switches are atomic with respect to availability reads of the same
//! session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use conductor_domain::session::{ModelCapabilityInfo, SessionConfig, SessionToolState};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Snapshot statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub current_model: String,
    pub supports_tool_calls: bool,
    pub available_tools: Vec<String>,
    pub total_tool_calls: u64,
    pub successful_tool_calls: u64,
    pub failed_tool_calls: u64,
    pub success_rate_percent: f64,
    pub cache_hit_rate_percent: f64,
    pub model_switch_count: u32,
}

/// Snapshot statistics over every live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_sessions: usize,
    /// Sessions touched within the last hour.
    pub active_sessions: usize,
    pub total_tool_calls: u64,
    pub total_successful_calls: u64,
    /// Percentage; 0 when nothing has run.
    pub overall_success_rate: f64,
}

/// Concurrent store of session tool states.
pub struct SessionStateManager {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionToolState>>>>,
    default_cache_duration: Duration,
}

impl Default for SessionStateManager {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SessionStateManager {
    pub fn new(default_cache_minutes: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_cache_duration: Duration::minutes(default_cache_minutes),
        }
    }

    async fn session(&self, session_id: &str) -> Option<Arc<Mutex<SessionToolState>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Create (or replace) the state for a session. A missing config gets the
    /// defaults.
    pub async fn create_state(
        &self,
        session_id: &str,
        model_info: ModelCapabilityInfo,
        config: Option<SessionConfig>,
    ) -> SessionToolState {
        let state =
            SessionToolState::new(session_id, model_info, config.unwrap_or_default());
        self.sessions.write().await.insert(
            session_id.to_string(),
            Arc::new(Mutex::new(state.clone())),
        );
        debug!(session = session_id, model = %state.current_model, "created session tool state");
        state
    }

    /// Snapshot of one session's state.
    pub async fn state(&self, session_id: &str) -> Option<SessionToolState> {
        let entry = self.session(session_id).await?;
        let state = entry.lock().await;
        Some(state.clone())
    }

    /// Swap the model for a session. Availability entries are expired inside
    /// the same lock, so no reader can observe the new model with the old
    /// compatibility snapshot.
    pub async fn update_model(
        &self,
        session_id: &str,
        model_info: ModelCapabilityInfo,
    ) -> Option<SessionToolState> {
        let entry = self.session(session_id).await?;
        let mut state = entry.lock().await;
        let old_model = state.current_model.clone();
        state.switch_model(model_info);
        info!(
            session = session_id,
            from = %old_model,
            to = %state.current_model,
            "session model updated"
        );
        Some(state.clone())
    }

    /// Upsert a tool availability entry. `cache_duration` defaults to the
    /// manager's configured duration.
    pub async fn update_tool_availability(
        &self,
        session_id: &str,
        tool_name: &str,
        available: bool,
        error_message: Option<String>,
        cache_duration: Option<Duration>,
    ) -> bool {
        let Some(entry) = self.session(session_id).await else {
            return false;
        };
        let mut state = entry.lock().await;
        state.set_tool_availability(
            tool_name,
            available,
            error_message,
            cache_duration.unwrap_or(self.default_cache_duration),
        );
        true
    }

    /// Replace a session's configuration.
    pub async fn update_config(&self, session_id: &str, config: SessionConfig) -> bool {
        let Some(entry) = self.session(session_id).await else {
            return false;
        };
        let mut state = entry.lock().await;
        state.config = config;
        state.updated_at = Utc::now();
        true
    }

    pub async fn get_available_tools(&self, session_id: &str) -> Vec<String> {
        match self.session(session_id).await {
            Some(entry) => entry.lock().await.available_tools(),
            None => Vec::new(),
        }
    }

    pub async fn record_execution(
        &self,
        session_id: &str,
        tool_name: &str,
        success: bool,
        execution_time_ms: f64,
    ) -> bool {
        let Some(entry) = self.session(session_id).await else {
            return false;
        };
        let mut state = entry.lock().await;
        state.record_execution(tool_name, success, execution_time_ms);
        true
    }

    pub async fn mark_cache_hit(&self, session_id: &str) {
        if let Some(entry) = self.session(session_id).await {
            entry.lock().await.mark_cache_hit();
        }
    }

    pub async fn mark_cache_miss(&self, session_id: &str) {
        if let Some(entry) = self.session(session_id).await {
            entry.lock().await.mark_cache_miss();
        }
    }

    pub async fn session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let entry = self.session(session_id).await?;
        let state = entry.lock().await;
        Some(SessionStats {
            session_id: state.session_id.clone(),
            current_model: state.current_model.clone(),
            supports_tool_calls: state.model_info.supports_tool_calls,
            available_tools: state.available_tools(),
            total_tool_calls: state.total_tool_calls,
            successful_tool_calls: state.successful_tool_calls,
            failed_tool_calls: state.failed_tool_calls,
            success_rate_percent: state.success_rate(),
            cache_hit_rate_percent: state.cache_hit_rate(),
            model_switch_count: state.model_switch_count,
        })
    }

    pub async fn aggregate_stats(&self) -> AggregateStats {
        let sessions = self.sessions.read().await;
        let cutoff = Utc::now() - Duration::hours(1);

        let mut total_tool_calls = 0;
        let mut total_successful_calls = 0;
        let mut active_sessions = 0;
        for entry in sessions.values() {
            let state = entry.lock().await;
            total_tool_calls += state.total_tool_calls;
            total_successful_calls += state.successful_tool_calls;
            if state.updated_at > cutoff {
                active_sessions += 1;
            }
        }

        let overall_success_rate = if total_tool_calls == 0 {
            0.0
        } else {
            total_successful_calls as f64 / total_tool_calls as f64 * 100.0
        };

        AggregateStats {
            total_sessions: sessions.len(),
            active_sessions,
            total_tool_calls,
            total_successful_calls,
            overall_success_rate,
        }
    }

    /// Drop sessions untouched for longer than `max_age_hours`. Returns how
    /// many were removed.
    pub async fn cleanup_expired(&self, max_age_hours: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, entry) in sessions.iter() {
            let state = entry.lock().await;
            if state.updated_at < cutoff {
                expired.push(id.clone());
            }
        }
        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            info!(removed = expired.len(), "cleaned up expired session states");
        }
        expired.len()
    }

    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}
