//! Central tool registry.
//!
//! The [`ToolRegistry`] owns every registered tool and implements
//! [`ToolExecutorPort`]. Each execution passes a gate sequence before the
//! call driver runs:
//!
//! 1. existence — the tool must be registered and enabled
//! 2. model compatibility — declared requirements against the capability catalog
//! 3. permission — level, roles, allowed models
//! 4. quota admission — rate-limit check and usage record under one lock
//!
//! Gate failures surface as typed errors inside the returned
//! [`ToolCallResult`], never as panics.
//!
//! Registrations live as `Arc<Mutex<ToolRegistration>>` entries under an
//! outer `RwLock<HashMap>`: mutations of one tool serialize on its own lock
//! while unrelated tools stay independent. Static permission outcomes are
//! cached per (session, tool, role, model); rate-limit denials are
//! time-dependent and never cached.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use conductor_application::ports::{ModelCapabilityPort, ToolExecutorPort};
use conductor_application::use_cases::call_tool::run_tool_call;
use conductor_domain::tool::{
    ExecutionContext, PermissionLevel, PermissionSpec, Tool, ToolCall, ToolCallResult,
    ToolDefinition, ToolError,
};
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::registration::ToolRegistration;

/// Role assumed when the execution context does not carry one.
const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PermissionKey {
    session: String,
    tool: String,
    role: String,
    model: String,
}

/// Central registry for tool registration, gating, and execution.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<Mutex<ToolRegistration>>>>,
    capabilities: Arc<dyn ModelCapabilityPort>,
    /// Static permission outcomes: `None` = allowed, `Some(reason)` = denied.
    permission_cache: RwLock<HashMap<PermissionKey, Option<String>>>,
}

impl ToolRegistry {
    pub fn new(capabilities: Arc<dyn ModelCapabilityPort>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            capabilities,
            permission_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool.
    ///
    /// The definition is validated first. Re-registering the same name and
    /// version without `force_update` is a no-op that preserves existing
    /// statistics; a different version (or `force_update`) replaces the
    /// binding and appends to the version history.
    pub async fn register(&self, tool: Arc<dyn Tool>, force_update: bool) -> Result<(), ToolError> {
        let definition = tool.definition().clone();
        definition.validate()?;

        let mut tools = self.tools.write().await;
        if let Some(existing) = tools.get(&definition.name) {
            let mut registration = existing.lock().await;
            if registration.definition.version == definition.version && !force_update {
                warn!(
                    tool = %definition.name,
                    version = %definition.version,
                    "tool already registered at this version, skipping"
                );
                return Ok(());
            }
            info!(
                tool = %definition.name,
                from = %registration.definition.version,
                to = %definition.version,
                "replacing tool registration"
            );
            registration.rebind(tool);
        } else {
            info!(tool = %definition.name, version = %definition.version, "registered tool");
            tools.insert(
                definition.name.clone(),
                Arc::new(Mutex::new(ToolRegistration::new(tool))),
            );
        }
        drop(tools);

        self.clear_permission_cache_for(&definition.name).await;
        Ok(())
    }

    /// Remove a tool, or one entry of its version history.
    ///
    /// `version = None` removes the binding entirely. `Some(version)` only
    /// drops that history entry, keeping the current binding in place.
    pub async fn unregister(&self, name: &str, version: Option<&str>) -> Result<(), ToolError> {
        match version {
            None => {
                let removed = self.tools.write().await.remove(name);
                if removed.is_none() {
                    return Err(ToolError::not_found(name));
                }
                info!(tool = name, "unregistered tool");
            }
            Some(version) => {
                let registration = self.entry(name).await?;
                let mut registration = registration.lock().await;
                if !registration.remove_version(version) {
                    return Err(ToolError::configuration(
                        name,
                        format!("version '{version}' is not in the history"),
                    ));
                }
                info!(tool = name, version, "removed version history entry");
            }
        }
        self.clear_permission_cache_for(name).await;
        Ok(())
    }

    pub async fn enable(&self, name: &str) -> Result<(), ToolError> {
        self.set_enabled(name, true).await
    }

    pub async fn disable(&self, name: &str) -> Result<(), ToolError> {
        self.set_enabled(name, false).await
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ToolError> {
        let registration = self.entry(name).await?;
        registration.lock().await.enabled = enabled;
        info!(tool = name, enabled, "toggled tool");
        Ok(())
    }

    /// Look up a registration regardless of its enabled flag.
    async fn entry(&self, name: &str) -> Result<Arc<Mutex<ToolRegistration>>, ToolError> {
        self.tools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Look up a registration, failing for disabled tools as well.
    async fn enabled_entry(&self, name: &str) -> Result<Arc<Mutex<ToolRegistration>>, ToolError> {
        let registration = self.entry(name).await?;
        if !registration.lock().await.enabled {
            return Err(ToolError::not_found(name));
        }
        Ok(registration)
    }

    /// Provider-facing function-call schemas of all enabled tools.
    pub async fn schemas(&self) -> Vec<Value> {
        let mut schemas = Vec::new();
        for registration in self.tools.read().await.values() {
            let registration = registration.lock().await;
            if registration.enabled {
                schemas.push(registration.definition.schema());
            }
        }
        schemas
    }

    /// Detail record for one tool, enabled or not.
    pub async fn tool_info(&self, name: &str) -> Result<Value, ToolError> {
        let registration = self.entry(name).await?;
        let info = registration.lock().await.info();
        Ok(info)
    }

    /// Registry-wide summary.
    pub async fn status(&self) -> Value {
        let tools = self.tools.read().await;
        let mut enabled = 0usize;
        let mut total_usage = 0u64;
        let mut by_tool = serde_json::Map::new();
        for (name, registration) in tools.iter() {
            let registration = registration.lock().await;
            if registration.enabled {
                enabled += 1;
            }
            total_usage += registration.usage_count;
            by_tool.insert(name.clone(), Value::Bool(registration.enabled));
        }
        json!({
            "total_tools": tools.len(),
            "enabled_tools": enabled,
            "disabled_tools": tools.len() - enabled,
            "total_usage_count": total_usage,
            "tools": by_tool,
        })
    }

    /// Whether the tool's declared model requirements are satisfied by the
    /// model. Results are cached per tool; unknown models are incompatible
    /// and left uncached so a later catalog update can change the answer.
    pub async fn is_model_compatible(&self, name: &str, model_id: &str) -> Result<bool, ToolError> {
        let registration = self.entry(name).await?;

        if let Some(cached) = registration.lock().await.cached_compat(model_id) {
            return Ok(cached);
        }

        let Some(capability) = self.capabilities.resolve(model_id).await else {
            debug!(tool = name, model = model_id, "unknown model, treating as incompatible");
            return Ok(false);
        };

        let mut registration = registration.lock().await;
        let compatible = registration
            .definition
            .metadata
            .model_requirements
            .satisfied_by(&capability);
        registration.cache_compat(model_id, compatible);
        Ok(compatible)
    }

    /// Evaluate the tool's permission spec for one caller.
    ///
    /// Check order: level, denied roles, restricted allow list, allowed
    /// models, hourly rate window, session quota. This is a read-only view;
    /// the execute pipeline reserves quota through
    /// [`ToolRegistration::admit`] instead so the check and the usage record
    /// share one lock acquisition.
    pub async fn check_permission(
        &self,
        name: &str,
        session_id: &str,
        role: &str,
        model_id: &str,
    ) -> Result<(), ToolError> {
        let registration = self.entry(name).await?;
        let spec = registration.lock().await.definition.permissions.clone();
        self.check_static_permission(name, session_id, role, model_id, &spec)
            .await?;

        // Rate limits are evaluated live on every call.
        if spec.rate_limit.is_unlimited() {
            return Ok(());
        }
        let mut registration = registration.lock().await;
        if let Some(max) = spec.rate_limit.max_calls_per_hour
            && registration.hourly_calls(session_id) >= max
        {
            return Err(ToolError::permission(
                name,
                format!("hourly rate limit of {max} calls reached"),
            ));
        }
        if let Some(max) = spec.rate_limit.max_calls_per_session
            && registration.session_calls(session_id) >= max
        {
            return Err(ToolError::permission(
                name,
                format!("session limit of {max} calls reached"),
            ));
        }
        Ok(())
    }

    /// Time-independent permission checks, cached per caller key.
    async fn check_static_permission(
        &self,
        name: &str,
        session_id: &str,
        role: &str,
        model_id: &str,
        spec: &PermissionSpec,
    ) -> Result<(), ToolError> {
        let key = PermissionKey {
            session: session_id.to_string(),
            tool: name.to_string(),
            role: role.to_string(),
            model: model_id.to_string(),
        };

        let cached = self.permission_cache.read().await.get(&key).cloned();
        let denial = match cached {
            Some(denial) => denial,
            None => {
                let denial = if spec.level == PermissionLevel::Disabled {
                    Some("tool is disabled by policy".to_string())
                } else if spec.denied_roles.iter().any(|r| r == role) {
                    Some(format!("role '{role}' is denied"))
                } else if spec.level == PermissionLevel::Restricted
                    && !spec.allowed_roles.iter().any(|r| r == role)
                {
                    Some(format!("role '{role}' is not in the allow list"))
                } else if !spec.model_allowed(model_id) {
                    Some(format!("model '{model_id}' may not invoke this tool"))
                } else {
                    None
                };
                self.permission_cache
                    .write()
                    .await
                    .insert(key, denial.clone());
                denial
            }
        };
        match denial {
            Some(reason) => Err(ToolError::permission(name, reason)),
            None => Ok(()),
        }
    }

    async fn clear_permission_cache_for(&self, name: &str) {
        self.permission_cache
            .write()
            .await
            .retain(|key, _| key.tool != name);
    }

    fn role_of(ctx: &ExecutionContext) -> &str {
        ctx.metadata
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ROLE)
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    async fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::new();
        for registration in self.tools.read().await.values() {
            let registration = registration.lock().await;
            if registration.enabled {
                definitions.push(registration.definition.clone());
            }
        }
        definitions
    }

    async fn tool_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, registration) in self.tools.read().await.iter() {
            if registration.lock().await.enabled {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    async fn execute(&self, call: &ToolCall, ctx: &ExecutionContext) -> ToolCallResult {
        let registration = match self.enabled_entry(&call.tool_name).await {
            Ok(registration) => registration,
            Err(error) => return ToolCallResult::failed(call, error, 0.0),
        };

        match self.is_model_compatible(&call.tool_name, &ctx.model_id).await {
            Ok(true) => {}
            Ok(false) => {
                let error = ToolError::permission(
                    &call.tool_name,
                    format!("model '{}' does not meet the tool's requirements", ctx.model_id),
                );
                return ToolCallResult::failed(call, error, 0.0);
            }
            Err(error) => return ToolCallResult::failed(call, error, 0.0),
        }

        let role = Self::role_of(ctx);
        let spec = registration.lock().await.definition.permissions.clone();
        if let Err(error) = self
            .check_static_permission(&call.tool_name, &ctx.session_id, role, &ctx.model_id, &spec)
            .await
        {
            return ToolCallResult::failed(call, error, 0.0);
        }

        // Quota check and usage recording happen in one lock acquisition so
        // concurrent calls cannot both pass an almost-spent quota; the lock
        // is released for the duration of the execution.
        let tool = {
            let mut registration = registration.lock().await;
            match registration.admit(&ctx.session_id, &spec.rate_limit) {
                Ok(()) => Arc::clone(&registration.tool),
                Err(error) => return ToolCallResult::failed(call, error, 0.0),
            }
        };

        let result = run_tool_call(tool.as_ref(), call, ctx).await;
        debug!(
            tool = %call.tool_name,
            call_id = %call.id,
            status = %result.status,
            "tool call finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ModelCatalog;
    use crate::tools::builtin::CalculatorTool;
    use conductor_domain::model::ModelCapability;
    use conductor_domain::tool::{
        ModelRequirements, PermissionSpec, RateLimit, ToolErrorKind, ToolOutput,
    };
    use serde_json::json;

    struct FixtureTool {
        definition: ToolDefinition,
    }

    impl FixtureTool {
        fn new(name: &str) -> Self {
            Self {
                definition: ToolDefinition::new(name, "Test fixture"),
            }
        }

        fn with_permissions(mut self, permissions: PermissionSpec) -> Self {
            self.definition = self.definition.with_permissions(permissions);
            self
        }

        fn with_version(mut self, version: &str) -> Self {
            self.definition = self.definition.with_version(version);
            self
        }

        fn with_requirements(mut self, requirements: ModelRequirements) -> Self {
            self.definition = self.definition.with_model_requirements(requirements);
            self
        }
    }

    #[async_trait]
    impl Tool for FixtureTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(
            &self,
            _params: HashMap<String, Value>,
            _ctx: &ExecutionContext,
        ) -> ToolOutput {
            ToolOutput::ok(json!("done"))
        }
    }

    fn catalog() -> Arc<ModelCatalog> {
        Arc::new(ModelCatalog::with_models([
            ModelCapability::new("gpt-4o", "GPT-4o", true, 128_000),
            ModelCapability::new("tiny-chat", "Tiny Chat", false, 4_096),
        ]))
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(catalog())
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("session-1", "gpt-4o")
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let registry = registry();
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();
        registry
            .register(Arc::new(FixtureTool::new("beta")), false)
            .await
            .unwrap();

        assert_eq!(registry.tool_names().await, vec!["alpha", "beta"]);
        assert!(registry.has_tool("alpha").await);
        assert_eq!(registry.definitions().await.len(), 2);
        assert_eq!(registry.schemas().await.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_definition_rejected() {
        let registry = registry();
        let result = registry
            .register(
                Arc::new(FixtureTool::new("alpha").with_version("not-semver")),
                false,
            )
            .await;
        assert_eq!(result.unwrap_err().kind, ToolErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_same_version_reregistration_is_noop() {
        let registry = registry();
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();

        let call = ToolCall::new("alpha");
        registry.execute(&call, &ctx()).await;

        // Same name + version, no force: stats survive.
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();
        let info = registry.tool_info("alpha").await.unwrap();
        assert_eq!(info["usage_count"], 1);
        assert_eq!(info["version_history"].as_array().unwrap().len(), 1);

        // Force update appends to the history but keeps stats.
        registry
            .register(Arc::new(FixtureTool::new("alpha")), true)
            .await
            .unwrap();
        let info = registry.tool_info("alpha").await.unwrap();
        assert_eq!(info["usage_count"], 1);
        assert_eq!(info["version_history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disable_hides_tool() {
        let registry = registry();
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();

        registry.disable("alpha").await.unwrap();
        assert!(!registry.has_tool("alpha").await);
        assert!(registry.tool_names().await.is_empty());

        let result = registry.execute(&ToolCall::new("alpha"), &ctx()).await;
        assert_eq!(result.error.unwrap().kind, ToolErrorKind::NotFound);

        registry.enable("alpha").await.unwrap();
        assert!(registry.has_tool("alpha").await);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = registry();
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();
        registry
            .register(Arc::new(FixtureTool::new("alpha").with_version("1.1.0")), false)
            .await
            .unwrap();

        // Dropping one version keeps the binding.
        registry.unregister("alpha", Some("1.0.0")).await.unwrap();
        assert!(registry.has_tool("alpha").await);

        registry.unregister("alpha", None).await.unwrap();
        assert!(!registry.has_tool("alpha").await);
        assert_eq!(
            registry.unregister("alpha", None).await.unwrap_err().kind,
            ToolErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_execute_calculator() {
        let registry = registry();
        registry
            .register(Arc::new(CalculatorTool::new()), false)
            .await
            .unwrap();

        let call = ToolCall::new("calculator")
            .with_arg("operation", "add")
            .with_arg("a", 2)
            .with_arg("b", 3);
        let result = registry.execute(&call, &ctx()).await;

        assert!(result.is_success());
        assert_eq!(result.result.unwrap()["result"], 5.0);

        let info = registry.tool_info("calculator").await.unwrap();
        assert_eq!(info["usage_count"], 1);
    }

    #[tokio::test]
    async fn test_model_compatibility_gate() {
        let registry = registry();
        registry
            .register(
                Arc::new(FixtureTool::new("big_context").with_requirements(ModelRequirements {
                    require_tool_calls: true,
                    min_context_length: Some(64_000),
                    allowed_models: vec![],
                })),
                false,
            )
            .await
            .unwrap();

        assert!(registry
            .is_model_compatible("big_context", "gpt-4o")
            .await
            .unwrap());
        assert!(!registry
            .is_model_compatible("big_context", "tiny-chat")
            .await
            .unwrap());
        assert!(!registry
            .is_model_compatible("big_context", "no-such-model")
            .await
            .unwrap());

        let call = ToolCall::new("big_context");
        let result = registry
            .execute(&call, &ExecutionContext::new("session-1", "tiny-chat"))
            .await;
        assert_eq!(result.error.unwrap().kind, ToolErrorKind::Permission);
    }

    #[tokio::test]
    async fn test_permission_denied_role() {
        let registry = registry();
        registry
            .register(
                Arc::new(
                    FixtureTool::new("admin_only")
                        .with_permissions(PermissionSpec::restricted_to(["admin"])),
                ),
                false,
            )
            .await
            .unwrap();

        registry
            .check_permission("admin_only", "s1", "admin", "gpt-4o")
            .await
            .unwrap();
        let denied = registry
            .check_permission("admin_only", "s1", "user", "gpt-4o")
            .await
            .unwrap_err();
        assert_eq!(denied.kind, ToolErrorKind::Permission);

        // Cached outcome is stable on repeat.
        let denied = registry
            .check_permission("admin_only", "s1", "user", "gpt-4o")
            .await
            .unwrap_err();
        assert!(denied.message.contains("allow list"));
    }

    #[tokio::test]
    async fn test_session_rate_limit() {
        let registry = registry();
        registry
            .register(
                Arc::new(FixtureTool::new("limited").with_permissions(
                    PermissionSpec::public().with_rate_limit(RateLimit::per_session(2)),
                )),
                false,
            )
            .await
            .unwrap();

        let call = ToolCall::new("limited");
        assert!(registry.execute(&call, &ctx()).await.is_success());
        assert!(registry.execute(&call, &ctx()).await.is_success());

        let third = registry.execute(&call, &ctx()).await;
        let error = third.error.unwrap();
        assert_eq!(error.kind, ToolErrorKind::Permission);
        assert!(error.message.contains("session limit"));

        // A different session still has quota.
        let other = ExecutionContext::new("session-2", "gpt-4o");
        assert!(registry.execute(&call, &other).await.is_success());
    }

    #[tokio::test]
    async fn test_concurrent_calls_cannot_exceed_quota() {
        let registry = registry();
        registry
            .register(
                Arc::new(FixtureTool::new("limited").with_permissions(
                    PermissionSpec::public().with_rate_limit(RateLimit::per_session(2)),
                )),
                false,
            )
            .await
            .unwrap();

        let call = ToolCall::new("limited");
        let context = ctx();
        let results =
            futures::future::join_all((0..5).map(|_| registry.execute(&call, &context))).await;

        let successes = results.iter().filter(|r| r.is_success()).count();
        assert_eq!(successes, 2);
        for error in results.iter().filter_map(|r| r.error.as_ref()) {
            assert_eq!(error.kind, ToolErrorKind::Permission);
            assert!(error.message.contains("session limit"));
        }

        let info = registry.tool_info("limited").await.unwrap();
        assert_eq!(info["usage_count"], 2);
    }

    #[tokio::test]
    async fn test_hourly_rate_limit() {
        let registry = registry();
        registry
            .register(
                Arc::new(FixtureTool::new("hourly").with_permissions(
                    PermissionSpec::public().with_rate_limit(RateLimit::per_hour(1)),
                )),
                false,
            )
            .await
            .unwrap();

        let call = ToolCall::new("hourly");
        assert!(registry.execute(&call, &ctx()).await.is_success());
        let denied = registry.execute(&call, &ctx()).await;
        assert!(denied.error.unwrap().message.contains("hourly rate limit"));
    }

    #[tokio::test]
    async fn test_model_allow_list() {
        let registry = registry();
        registry
            .register(
                Arc::new(FixtureTool::new("gpt_only").with_permissions(
                    PermissionSpec::public().with_allowed_model("gpt-4o"),
                )),
                false,
            )
            .await
            .unwrap();

        registry
            .check_permission("gpt_only", "s1", "user", "gpt-4o")
            .await
            .unwrap();
        let denied = registry
            .check_permission("gpt_only", "s1", "user", "tiny-chat")
            .await
            .unwrap_err();
        assert_eq!(denied.kind, ToolErrorKind::Permission);
    }

    #[tokio::test]
    async fn test_status_summary() {
        let registry = registry();
        registry
            .register(Arc::new(FixtureTool::new("alpha")), false)
            .await
            .unwrap();
        registry
            .register(Arc::new(FixtureTool::new("beta")), false)
            .await
            .unwrap();
        registry.disable("beta").await.unwrap();

        let status = registry.status().await;
        assert_eq!(status["total_tools"], 2);
        assert_eq!(status["enabled_tools"], 1);
        assert_eq!(status["disabled_tools"], 1);
        assert_eq!(status["tools"]["beta"], false);
    }
}
