//! Service facade.
//!
//! [`ToolService`] is the single entry point the request-handling layer talks
//! to: single calls, chain submissions with live handles, session lifecycle
//! and model switches. One instance is constructed explicitly at startup and
//! injected wherever it is needed; there is no global state.

use std::collections::HashMap;
use std::sync::Arc;

use conductor_domain::chain::ToolExecutionRequest;
use conductor_domain::model::ModelCapability;
use conductor_domain::session::{AvailabilityState, CapabilityLevel, ModelCapabilityInfo};
use conductor_domain::tool::{ExecutionContext, ToolCall, ToolCallResult, ToolError};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ports::{
    DurableExecutionPort, ExecutionEvent, ExecutionLogger, ModelCapabilityPort, ToolExecutorPort,
};
use crate::use_cases::execute_chain::{
    ChainExecution, ChainOrchestrator, ChainOutcome, ChainStatusSnapshot,
};
use crate::use_cases::model_switch::{ModelChangeEvent, ModelSwitchCoordinator};
use crate::use_cases::session_tools::SessionStateManager;

/// Coarse capability classification by model id, used to seed session state.
pub fn capability_level_for(capability: &ModelCapability) -> CapabilityLevel {
    if !capability.supports_tool_calls {
        return CapabilityLevel::None;
    }
    let id = capability.model_id.to_lowercase();
    if id.contains("claude") || id.contains("gemini") {
        CapabilityLevel::Expert
    } else if id.contains("gpt-4") || id.contains("advanced") {
        CapabilityLevel::Advanced
    } else {
        CapabilityLevel::Basic
    }
}

fn model_info_for(capability: &ModelCapability) -> ModelCapabilityInfo {
    ModelCapabilityInfo::new(
        &capability.model_id,
        capability.supports_tool_calls,
        capability_level_for(capability),
    )
    .with_context_length(capability.context_length)
}

/// Facade over the registry, the session store, the model-switch coordinator
/// and the chain orchestrator.
pub struct ToolService {
    executor: Arc<dyn ToolExecutorPort>,
    capabilities: Arc<dyn ModelCapabilityPort>,
    logger: Arc<dyn ExecutionLogger>,
    coordinator: ModelSwitchCoordinator,
    sessions: SessionStateManager,
    orchestrator: Arc<ChainOrchestrator>,
    chains: RwLock<HashMap<String, ChainExecution>>,
    /// Shared with spawned runs, which write the final outcome here.
    outcomes: Arc<RwLock<HashMap<String, ChainOutcome>>>,
}

impl ToolService {
    pub fn new(
        executor: Arc<dyn ToolExecutorPort>,
        capabilities: Arc<dyn ModelCapabilityPort>,
        durable: Arc<dyn DurableExecutionPort>,
        logger: Arc<dyn ExecutionLogger>,
    ) -> Self {
        let coordinator =
            ModelSwitchCoordinator::new(Arc::clone(&capabilities), Arc::clone(&executor));
        let orchestrator = Arc::new(ChainOrchestrator::new(
            Arc::clone(&executor),
            durable,
            Arc::clone(&logger),
        ));
        Self {
            executor,
            capabilities,
            logger,
            coordinator,
            sessions: SessionStateManager::default(),
            orchestrator,
            chains: RwLock::new(HashMap::new()),
            outcomes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a session: snapshot its tool set and seed the session state.
    pub async fn register_session(
        &self,
        session_id: &str,
        model_id: &str,
    ) -> Result<Vec<String>, ToolError> {
        let tools = self.coordinator.register_session(session_id, model_id).await?;

        // register_session succeeded, so the model resolves.
        if let Some(capability) = self.capabilities.resolve(model_id).await {
            self.sessions
                .create_state(session_id, model_info_for(&capability), None)
                .await;
            for tool in &tools {
                self.sessions
                    .update_tool_availability(session_id, tool, true, None, None)
                    .await;
            }
        }
        Ok(tools)
    }

    /// Execute one call and record it in the session statistics.
    pub async fn submit_call(&self, call: &ToolCall, ctx: &ExecutionContext) -> ToolCallResult {
        let result = self.executor.execute(call, ctx).await;
        self.sessions
            .record_execution(
                &ctx.session_id,
                &call.tool_name,
                result.is_success(),
                result.execution_time_ms,
            )
            .await;
        self.logger.log(ExecutionEvent::new(
            "call_finished",
            json!({
                "call_id": result.call_id,
                "tool": result.tool_name,
                "session_id": ctx.session_id,
                "status": result.status.as_str(),
                "execution_time_ms": result.execution_time_ms,
            }),
        ));
        result
    }

    /// Submit a chain. The run is spawned in the background; the returned
    /// handle supports status/results queries, cancellation and live config
    /// updates while it is in flight.
    pub async fn submit_chain(&self, request: ToolExecutionRequest) -> ChainExecution {
        let handle = ChainExecution::new(request.execution_id.clone(), request.config.clone());
        self.chains
            .write()
            .await
            .insert(request.execution_id.clone(), handle.clone());
        debug!(execution = %request.execution_id, "chain submitted");

        let orchestrator = Arc::clone(&self.orchestrator);
        let run_handle = handle.clone();
        let outcomes = Arc::clone(&self.outcomes);
        tokio::spawn(async move {
            let outcome = orchestrator.execute(request, run_handle).await;
            outcomes
                .write()
                .await
                .insert(outcome.execution_id.clone(), outcome);
        });

        handle
    }

    /// Cooperatively cancel a chain. Returns false for unknown ids.
    pub async fn cancel_chain(&self, execution_id: &str) -> bool {
        match self.chains.read().await.get(execution_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn chain_status(&self, execution_id: &str) -> Option<ChainStatusSnapshot> {
        let handle = self.chains.read().await.get(execution_id).cloned()?;
        Some(handle.status().await)
    }

    pub async fn chain_results(&self, execution_id: &str) -> Option<Vec<ToolCallResult>> {
        let handle = self.chains.read().await.get(execution_id).cloned()?;
        Some(handle.results().await)
    }

    /// Final outcome of a finished chain, when available.
    pub async fn chain_outcome(&self, execution_id: &str) -> Option<ChainOutcome> {
        self.outcomes.read().await.get(execution_id).cloned()
    }

    /// Tools available to a session under its current model.
    pub async fn available_tools(&self, session_id: &str) -> Vec<String> {
        self.coordinator
            .available_tools(session_id)
            .await
            .unwrap_or_default()
    }

    /// Switch a session's model and propagate the change into session state.
    pub async fn switch_model(
        &self,
        session_id: &str,
        new_model_id: &str,
    ) -> Result<ModelChangeEvent, ToolError> {
        let event = self.coordinator.switch_model(session_id, new_model_id).await?;

        if let Some(capability) = self.capabilities.resolve(new_model_id).await {
            self.sessions
                .update_model(session_id, model_info_for(&capability))
                .await;
            for tool in &event.tools_added {
                self.sessions
                    .update_tool_availability(session_id, tool, true, None, None)
                    .await;
            }
        }
        self.logger.log(ExecutionEvent::new(
            "model_switched",
            json!({
                "session_id": session_id,
                "old_model": event.old_model,
                "new_model": event.new_model,
                "tools_added": event.tools_added,
                "tools_removed": event.tools_removed,
            }),
        ));
        Ok(event)
    }

    pub async fn compatibility_matrix(
        &self,
    ) -> HashMap<String, HashMap<String, AvailabilityState>> {
        self.coordinator.compatibility_matrix().await
    }

    pub fn sessions(&self) -> &SessionStateManager {
        &self.sessions
    }

    pub fn coordinator(&self) -> &ModelSwitchCoordinator {
        &self.coordinator
    }

    /// Drop bookkeeping for a session.
    pub async fn cleanup_session(&self, session_id: &str) {
        self.coordinator.cleanup_session(session_id).await;
        self.sessions.remove_session(session_id).await;
    }
}
