//! Model-switch coordination.
//!
//! Chat sessions can change their language model mid-conversation. The
//! [`ModelSwitchCoordinator`] keeps a per-session snapshot of which tools the
//! active model can use, recomputes it on every switch, and records the diff
//! as a [`ModelChangeEvent`] in an append-only history.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use conductor_domain::model::ModelCapability;
use conductor_domain::session::AvailabilityState;
use conductor_domain::tool::{ToolError, ToolErrorKind};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::ports::{ModelCapabilityPort, ToolExecutorPort};

/// Diff produced by one model switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChangeEvent {
    pub session_id: String,
    pub old_model: String,
    pub new_model: String,
    pub tools_added: Vec<String>,
    pub tools_removed: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ModelChangeEvent {
    /// `added = after - before`, `removed = before - after`, both sorted.
    pub fn diff(
        session_id: &str,
        old_model: &str,
        new_model: &str,
        before: &BTreeSet<String>,
        after: &BTreeSet<String>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            old_model: old_model.to_string(),
            new_model: new_model.to_string(),
            tools_added: after.difference(before).cloned().collect(),
            tools_removed: before.difference(after).cloned().collect(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of validating a tool call against a session's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolCallValidation {
    Ok,
    SessionNotRegistered,
    UnknownTool,
    /// The tool exists but the session's current model cannot use it.
    UnavailableForModel { model_id: String },
}

impl ToolCallValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, ToolCallValidation::Ok)
    }

    pub fn reason(&self) -> String {
        match self {
            ToolCallValidation::Ok => "ok".to_string(),
            ToolCallValidation::SessionNotRegistered => "session not registered".to_string(),
            ToolCallValidation::UnknownTool => "tool not registered".to_string(),
            ToolCallValidation::UnavailableForModel { model_id } => {
                format!("tool unavailable for model '{model_id}'")
            }
        }
    }
}

#[derive(Debug, Clone)]
struct SessionSnapshot {
    model_id: String,
    available_tools: BTreeSet<String>,
}

/// Coordinates per-session tool availability across model switches.
pub struct ModelSwitchCoordinator {
    capabilities: Arc<dyn ModelCapabilityPort>,
    executor: Arc<dyn ToolExecutorPort>,
    sessions: RwLock<HashMap<String, SessionSnapshot>>,
    history: RwLock<Vec<ModelChangeEvent>>,
}

impl ModelSwitchCoordinator {
    pub fn new(
        capabilities: Arc<dyn ModelCapabilityPort>,
        executor: Arc<dyn ToolExecutorPort>,
    ) -> Self {
        Self {
            capabilities,
            executor,
            sessions: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Tools the model can use right now: every enabled tool when the model
    /// supports tool calls, otherwise none.
    async fn snapshot_for(&self, model: &ModelCapability) -> BTreeSet<String> {
        if !model.supports_tool_calls {
            return BTreeSet::new();
        }
        self.executor.tool_names().await.into_iter().collect()
    }

    async fn resolve_model(&self, model_id: &str) -> Result<ModelCapability, ToolError> {
        self.capabilities.resolve(model_id).await.ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::NotFound,
                format!("Model '{model_id}' not found in capability catalog"),
            )
        })
    }

    /// Register a session and compute its initial tool snapshot.
    pub async fn register_session(
        &self,
        session_id: &str,
        model_id: &str,
    ) -> Result<Vec<String>, ToolError> {
        let model = self.resolve_model(model_id).await?;
        let available_tools = self.snapshot_for(&model).await;
        let tools: Vec<String> = available_tools.iter().cloned().collect();

        self.sessions.write().await.insert(
            session_id.to_string(),
            SessionSnapshot {
                model_id: model_id.to_string(),
                available_tools,
            },
        );
        debug!(
            session = session_id,
            model = model_id,
            tools = tools.len(),
            "session registered"
        );
        Ok(tools)
    }

    /// Switch a session to a new model: recompute the snapshot, record the
    /// diff and atomically swap model + tool set.
    pub async fn switch_model(
        &self,
        session_id: &str,
        new_model_id: &str,
    ) -> Result<ModelChangeEvent, ToolError> {
        let model = self.resolve_model(new_model_id).await?;
        let after = self.snapshot_for(&model).await;

        let mut sessions = self.sessions.write().await;
        let snapshot = sessions.get_mut(session_id).ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::NotFound,
                format!("Session '{session_id}' is not registered"),
            )
        })?;

        let event = ModelChangeEvent::diff(
            session_id,
            &snapshot.model_id,
            new_model_id,
            &snapshot.available_tools,
            &after,
        );
        snapshot.model_id = new_model_id.to_string();
        snapshot.available_tools = after;
        drop(sessions);

        info!(
            session = session_id,
            from = %event.old_model,
            to = %event.new_model,
            added = event.tools_added.len(),
            removed = event.tools_removed.len(),
            "session model switched"
        );
        self.history.write().await.push(event.clone());
        Ok(event)
    }

    /// Four-way validation of a prospective tool call.
    pub async fn validate_tool_call(&self, session_id: &str, tool_name: &str) -> ToolCallValidation {
        let sessions = self.sessions.read().await;
        let Some(snapshot) = sessions.get(session_id) else {
            return ToolCallValidation::SessionNotRegistered;
        };
        if snapshot.available_tools.contains(tool_name) {
            return ToolCallValidation::Ok;
        }
        let model_id = snapshot.model_id.clone();
        drop(sessions);

        if self.executor.has_tool(tool_name).await {
            ToolCallValidation::UnavailableForModel { model_id }
        } else {
            ToolCallValidation::UnknownTool
        }
    }

    /// Availability of every enabled tool under every known model. Uniform
    /// per model: a tool-capable model can use all enabled tools.
    pub async fn compatibility_matrix(
        &self,
    ) -> HashMap<String, HashMap<String, AvailabilityState>> {
        let tools = self.executor.tool_names().await;
        let mut matrix = HashMap::new();
        for model in self.capabilities.all_models().await {
            let state = if model.supports_tool_calls {
                AvailabilityState::Available
            } else {
                AvailabilityState::Unavailable
            };
            matrix.insert(
                model.model_id,
                tools.iter().map(|t| (t.clone(), state)).collect(),
            );
        }
        matrix
    }

    /// Tool-capable models other than `current_model`, largest context first.
    pub async fn fallback_models(&self, current_model: &str) -> Vec<ModelCapability> {
        let mut models: Vec<ModelCapability> = self
            .capabilities
            .tool_capable_models()
            .await
            .into_iter()
            .filter(|m| m.model_id != current_model)
            .collect();
        models.sort_by(|a, b| b.context_length.cmp(&a.context_length));
        models
    }

    /// Suggest a switch target when the session's current tool set does not
    /// cover `required_tools`. `None` when already covered or when the
    /// session is unknown.
    pub async fn suggest_switch(
        &self,
        session_id: &str,
        required_tools: &[String],
    ) -> Option<ModelCapability> {
        let sessions = self.sessions.read().await;
        let snapshot = sessions.get(session_id)?;
        if required_tools
            .iter()
            .all(|t| snapshot.available_tools.contains(t))
        {
            return None;
        }
        let current = snapshot.model_id.clone();
        drop(sessions);

        self.fallback_models(&current).await.into_iter().next()
    }

    /// The session's current tool snapshot.
    pub async fn available_tools(&self, session_id: &str) -> Option<Vec<String>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|s| s.available_tools.iter().cloned().collect())
    }

    /// Change history, optionally filtered to one session.
    pub async fn history(&self, session_id: Option<&str>) -> Vec<ModelChangeEvent> {
        let history = self.history.read().await;
        match session_id {
            Some(id) => history.iter().filter(|e| e.session_id == id).cloned().collect(),
            None => history.clone(),
        }
    }

    pub async fn cleanup_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}
