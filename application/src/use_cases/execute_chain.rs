//! Chain orchestration.
//!
//! [`ChainOrchestrator`] drives a [`ToolExecutionRequest`] through one of the
//! four strategies. A [`ChainExecution`] handle is shared with the caller and
//! stays usable while the run is in flight: `status()` and `results()` return
//! consistent snapshots, `cancel()` cooperatively stops future steps, and
//! `update_config()` merges tunables into the live configuration for steps
//! that have not started yet.
//!
//! Cancellation never aborts an in-flight call; the flag is consulted before
//! each unit of work and pending steps turn into synthetic cancelled results
//! or are skipped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use conductor_domain::chain::{
    ChainConfig, ChainStatus, ChainStep, ChainStrategy, ExecutionSummary, ToolExecutionRequest,
    resolve_batches,
};
use conductor_domain::tool::{ExecutionContext, ToolCall, ToolCallResult, ToolError};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ports::{DurableExecutionPort, ExecutionEvent, ExecutionLogger, ToolExecutorPort};

/// Final outcome of a chain run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub execution_id: String,
    pub status: ChainStatus,
    pub results: Vec<ToolCallResult>,
    pub summary: ExecutionSummary,
    /// True when the dependency graph contained a cycle that had to be broken.
    pub cycle_detected: bool,
}

/// Point-in-time view of a running chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStatusSnapshot {
    pub execution_id: String,
    pub status: ChainStatus,
    pub current_step: usize,
    pub results_count: usize,
    pub cancellation_requested: bool,
}

#[derive(Debug)]
struct ChainState {
    status: ChainStatus,
    current_step: usize,
    results: Vec<ToolCallResult>,
}

struct ChainShared {
    execution_id: String,
    state: RwLock<ChainState>,
    config: RwLock<ChainConfig>,
    cancel: CancellationToken,
}

/// Handle to one chain run, cloneable and usable concurrently with it.
#[derive(Clone)]
pub struct ChainExecution {
    shared: Arc<ChainShared>,
}

impl ChainExecution {
    pub fn new(execution_id: impl Into<String>, config: ChainConfig) -> Self {
        Self {
            shared: Arc::new(ChainShared {
                execution_id: execution_id.into(),
                state: RwLock::new(ChainState {
                    status: ChainStatus::Pending,
                    current_step: 0,
                    results: Vec::new(),
                }),
                config: RwLock::new(config),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.shared.execution_id
    }

    /// Request cooperative cancellation. Steps not yet started are skipped;
    /// the in-flight call, if any, runs to completion.
    pub fn cancel(&self) {
        info!(execution = %self.shared.execution_id, "chain cancellation requested");
        self.shared.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Merge a JSON patch into the live configuration. Affects only steps
    /// that have not started yet.
    pub async fn update_config(&self, patch: &Value) {
        self.shared.config.write().await.merge(patch);
        debug!(execution = %self.shared.execution_id, "chain configuration updated");
    }

    pub async fn config(&self) -> ChainConfig {
        self.shared.config.read().await.clone()
    }

    /// Side-effect-free status snapshot, safe during a run.
    pub async fn status(&self) -> ChainStatusSnapshot {
        let state = self.shared.state.read().await;
        ChainStatusSnapshot {
            execution_id: self.shared.execution_id.clone(),
            status: state.status,
            current_step: state.current_step,
            results_count: state.results.len(),
            cancellation_requested: self.shared.cancel.is_cancelled(),
        }
    }

    /// Side-effect-free copy of the results collected so far.
    pub async fn results(&self) -> Vec<ToolCallResult> {
        self.shared.state.read().await.results.clone()
    }

    async fn set_status(&self, status: ChainStatus) {
        self.shared.state.write().await.status = status;
    }

    async fn set_current_step(&self, step: usize) {
        self.shared.state.write().await.current_step = step;
    }

    async fn push_result(&self, result: ToolCallResult) {
        self.shared.state.write().await.results.push(result);
    }
}

/// Drives chain requests against the executor port.
pub struct ChainOrchestrator {
    executor: Arc<dyn ToolExecutorPort>,
    durable: Arc<dyn DurableExecutionPort>,
    logger: Arc<dyn ExecutionLogger>,
}

impl ChainOrchestrator {
    pub fn new(
        executor: Arc<dyn ToolExecutorPort>,
        durable: Arc<dyn DurableExecutionPort>,
        logger: Arc<dyn ExecutionLogger>,
    ) -> Self {
        Self {
            executor,
            durable,
            logger,
        }
    }

    /// Run a chain to completion under its handle. The global timeout wraps
    /// the whole run; on expiry the outcome is `Failed` with the partial
    /// results collected so far.
    pub async fn execute(
        &self,
        request: ToolExecutionRequest,
        handle: ChainExecution,
    ) -> ChainOutcome {
        let execution_id = request.execution_id.clone();
        info!(
            execution = %execution_id,
            strategy = request.strategy.as_str(),
            steps = request.steps.len(),
            "starting chain execution"
        );
        self.logger.log(ExecutionEvent::new(
            "chain_started",
            json!({
                "execution_id": execution_id,
                "session_id": request.session_id,
                "strategy": request.strategy.as_str(),
                "steps": request.steps.len(),
            }),
        ));

        handle.set_status(ChainStatus::Running).await;
        let timeout = Duration::from_secs_f64(request.timeout_seconds.max(0.0));
        let cycle_holder = RwLock::new(false);

        let run = self.run_strategy(&request, &handle, &cycle_holder);
        let timed_out = tokio::time::timeout(timeout, run).await.is_err();

        let status = if timed_out {
            warn!(execution = %execution_id, "chain execution timed out");
            ChainStatus::Failed
        } else if handle.is_cancelled() {
            ChainStatus::Cancelled
        } else {
            let results = handle.results().await;
            let fail_fast = handle.config().await.fail_fast;
            let stopped_early = fail_fast && results.iter().any(|r| !r.is_success());
            if stopped_early {
                ChainStatus::Failed
            } else {
                ChainStatus::Completed
            }
        };
        handle.set_status(status).await;
        self.checkpoint(&request, &handle).await;

        let results = handle.results().await;
        let summary = ExecutionSummary::compute(&results);
        let cycle_detected = *cycle_holder.read().await;

        info!(
            execution = %execution_id,
            status = status.as_str(),
            success_rate = summary.success_rate,
            "chain execution finished"
        );
        self.logger.log(ExecutionEvent::new(
            "chain_finished",
            json!({
                "execution_id": execution_id,
                "status": status.as_str(),
                "total_calls": summary.total_calls,
                "successful_calls": summary.successful_calls,
            }),
        ));

        ChainOutcome {
            execution_id,
            status,
            results,
            summary,
            cycle_detected,
        }
    }

    async fn run_strategy(
        &self,
        request: &ToolExecutionRequest,
        handle: &ChainExecution,
        cycle_holder: &RwLock<bool>,
    ) {
        match request.strategy {
            ChainStrategy::Parallel => self.run_parallel(request, handle).await,
            ChainStrategy::Sequential => self.run_sequential(request, handle, false).await,
            ChainStrategy::Conditional => self.run_sequential(request, handle, true).await,
            ChainStrategy::DependencyBased => {
                self.run_dependency_based(request, handle, cycle_holder).await
            }
        }
    }

    async fn context_for(
        &self,
        request: &ToolExecutionRequest,
        handle: &ChainExecution,
    ) -> ExecutionContext {
        let config = handle.config().await;
        ExecutionContext::new(
            &request.session_id,
            config.model.as_deref().unwrap_or("default"),
        )
        .with_metadata("execution_id", request.execution_id.clone())
    }

    /// All steps at once under a bounded-concurrency gate; results land in
    /// input order.
    async fn run_parallel(&self, request: &ToolExecutionRequest, handle: &ChainExecution) {
        let config = handle.config().await;
        let ctx = self.context_for(request, handle).await;
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

        let futures = request.steps.iter().map(|step| {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let call = with_tool_timeout(&step.call, &config);
            let ctx = ctx.clone();
            let handle = handle.clone();
            async move {
                let _permit = semaphore.acquire().await;
                if handle.is_cancelled() {
                    return ToolCallResult::cancelled(&call);
                }
                executor.execute(&call, &ctx).await
            }
        });

        for result in join_all(futures).await {
            handle.push_result(result).await;
        }
        handle.set_current_step(request.steps.len()).await;
        self.checkpoint(request, handle).await;
    }

    /// Sequential and conditional execution share one loop. Each step's
    /// context carries the accumulator of earlier successes under
    /// `previous_results`, keyed by tool name; the conditional variant
    /// additionally gates each step on its condition against the same
    /// accumulator.
    async fn run_sequential(
        &self,
        request: &ToolExecutionRequest,
        handle: &ChainExecution,
        conditional: bool,
    ) {
        let mut accumulator: HashMap<String, Value> = HashMap::new();

        for (index, step) in request.steps.iter().enumerate() {
            if handle.is_cancelled() {
                break;
            }

            if conditional
                && let Some(condition) = &step.condition
                && !condition.evaluate(&accumulator)
            {
                debug!(
                    execution = %request.execution_id,
                    tool = %step.call.tool_name,
                    "step skipped by condition"
                );
                continue;
            }

            handle.set_current_step(index + 1).await;
            let config = handle.config().await;
            let ctx = self
                .context_for(request, handle)
                .await
                .with_turn(index as u32)
                .with_metadata("previous_results", json!(&accumulator));

            let result = self
                .execute_step_with_retry(step, &ctx, request.max_retries, &config, handle)
                .await;

            let success = result.is_success();
            if success && let Some(data) = &result.result {
                accumulator.insert(step.call.tool_name.clone(), data.clone());
            }
            handle.push_result(result).await;

            self.checkpoint(request, handle).await;

            if !success && config.fail_fast {
                warn!(
                    execution = %request.execution_id,
                    step = index + 1,
                    "stopping chain after failure (fail_fast)"
                );
                break;
            }
        }
    }

    /// Topological batches; steps within a batch run concurrently. Each
    /// batch's context carries the accumulator of earlier successes under
    /// `dependency_results`, keyed by step id.
    async fn run_dependency_based(
        &self,
        request: &ToolExecutionRequest,
        handle: &ChainExecution,
        cycle_holder: &RwLock<bool>,
    ) {
        let plan = resolve_batches(&request.step_ids(), &request.dependencies);
        if plan.cycle_detected {
            *cycle_holder.write().await = true;
        }

        let steps_by_id: HashMap<&str, &ChainStep> = request
            .steps
            .iter()
            .map(|step| (step.step_id(), step))
            .collect();
        let mut accumulator: HashMap<String, Value> = HashMap::new();

        for batch in &plan.batches {
            if handle.is_cancelled() {
                break;
            }
            let config = handle.config().await;
            let ctx = self
                .context_for(request, handle)
                .await
                .with_metadata("dependency_results", json!(&accumulator));

            let futures = batch.iter().filter_map(|id| {
                let step = steps_by_id.get(id.as_str())?;
                let ctx = ctx.clone();
                let config = config.clone();
                Some(async move {
                    let result = self
                        .execute_step_with_retry(step, &ctx, request.max_retries, &config, handle)
                        .await;
                    (id.clone(), result)
                })
            });

            for (id, result) in join_all(futures).await {
                if result.is_success()
                    && let Some(data) = &result.result
                {
                    accumulator.insert(id, data.clone());
                }
                let step = handle.status().await.current_step + 1;
                handle.set_current_step(step).await;
                handle.push_result(result).await;
            }
            self.checkpoint(request, handle).await;
        }
    }

    /// Persist a small progress snapshot under the execution id so an
    /// external substrate can observe (or resume from) the last completed
    /// step or batch.
    async fn checkpoint(&self, request: &ToolExecutionRequest, handle: &ChainExecution) {
        let snapshot = handle.status().await;
        self.durable
            .save_checkpoint(
                &request.execution_id,
                json!({
                    "status": snapshot.status.as_str(),
                    "current_step": snapshot.current_step,
                    "results_count": snapshot.results_count,
                }),
            )
            .await;
    }

    /// Per-call retry sub-procedure with a cancellation check before each
    /// attempt. Exhaustion returns the last failure with the attempt count.
    async fn execute_step_with_retry(
        &self,
        step: &ChainStep,
        ctx: &ExecutionContext,
        max_retries: u32,
        config: &ChainConfig,
        handle: &ChainExecution,
    ) -> ToolCallResult {
        let call = with_tool_timeout(&step.call, config);
        let max_attempts = max_retries + 1;

        let mut backoff = Duration::from_secs_f64(config.retry_initial_interval.max(0.0));
        let cap = Duration::from_secs_f64(config.retry_max_interval.max(0.0));

        let mut last = ToolCallResult::cancelled(&call);
        for attempt in 1..=max_attempts {
            if handle.is_cancelled() {
                return ToolCallResult::cancelled(&call);
            }

            let result = self.executor.execute(&call, ctx).await;
            if result.is_success() {
                return result.with_attempts(attempt);
            }

            let retryable = result.error.as_ref().is_some_and(ToolError::is_retryable);
            last = result.with_attempts(attempt);
            if !retryable || attempt == max_attempts {
                break;
            }

            warn!(
                tool = %call.tool_name,
                attempt,
                max_attempts,
                "chain step failed, retrying"
            );
            self.durable.sleep(backoff).await;
            backoff = backoff.mul_f64(config.retry_backoff.max(1.0)).min(cap);
        }
        last
    }
}

/// Apply the chain's per-tool timeout to calls that carry no override.
fn with_tool_timeout(call: &ToolCall, config: &ChainConfig) -> ToolCall {
    let mut call = call.clone();
    if call.timeout_seconds.is_none() {
        call.timeout_seconds = Some(config.timeout_per_tool);
    }
    call
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conductor_domain::chain::StepCondition;
    use conductor_domain::tool::ToolDefinition;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::ports::{InMemoryDurable, NoExecutionLogger};

    /// Scripted executor: behavior decided by tool name.
    ///
    /// - `ok_*` succeeds with `{"tool": name}`
    /// - `fail_*` fails with a retryable execution error
    /// - `flaky` fails twice, then succeeds
    /// - `slow` sleeps 10 s before succeeding
    struct ScriptedExecutor {
        calls: AtomicU32,
        flaky_failures: AtomicU32,
    }

    impl ScriptedExecutor {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                flaky_failures: AtomicU32::new(2),
            }
        }
    }

    #[async_trait]
    impl ToolExecutorPort for ScriptedExecutor {
        async fn definitions(&self) -> Vec<ToolDefinition> {
            Vec::new()
        }

        async fn tool_names(&self) -> Vec<String> {
            Vec::new()
        }

        async fn execute(&self, call: &ToolCall, _ctx: &ExecutionContext) -> ToolCallResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match call.tool_name.as_str() {
                name if name.starts_with("ok") => {
                    ToolCallResult::completed(call, json!({"tool": name}), 5.0)
                }
                "flaky" => {
                    if self
                        .flaky_failures
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok()
                    {
                        ToolCallResult::failed(
                            call,
                            ToolError::execution("flaky", "transient"),
                            1.0,
                        )
                    } else {
                        ToolCallResult::completed(call, json!({"tool": "flaky"}), 1.0)
                    }
                }
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    ToolCallResult::completed(call, json!(null), 10_000.0)
                }
                name => ToolCallResult::failed(
                    call,
                    ToolError::execution(name, "scripted failure"),
                    1.0,
                ),
            }
        }
    }

    /// Executor that records the context metadata of every call it serves.
    #[derive(Default)]
    struct RecordingExecutor {
        seen: tokio::sync::Mutex<Vec<(String, HashMap<String, Value>)>>,
    }

    #[async_trait]
    impl ToolExecutorPort for RecordingExecutor {
        async fn definitions(&self) -> Vec<ToolDefinition> {
            Vec::new()
        }

        async fn tool_names(&self) -> Vec<String> {
            Vec::new()
        }

        async fn execute(&self, call: &ToolCall, ctx: &ExecutionContext) -> ToolCallResult {
            self.seen
                .lock()
                .await
                .push((call.tool_name.clone(), ctx.metadata.clone()));
            ToolCallResult::completed(call, json!({"tool": call.tool_name}), 1.0)
        }
    }

    fn orchestrator() -> (ChainOrchestrator, Arc<ScriptedExecutor>) {
        let executor = Arc::new(ScriptedExecutor::new());
        let orchestrator = ChainOrchestrator::new(
            Arc::clone(&executor) as Arc<dyn ToolExecutorPort>,
            Arc::new(InMemoryDurable::new()),
            Arc::new(NoExecutionLogger),
        );
        (orchestrator, executor)
    }

    fn handle_for(request: &ToolExecutionRequest) -> ChainExecution {
        ChainExecution::new(request.execution_id.clone(), request.config.clone())
    }

    fn step(tool: &str) -> ChainStep {
        ChainStep::new(ToolCall::new(tool))
    }

    #[tokio::test]
    async fn test_parallel_preserves_order() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Parallel)
            .with_step(step("ok_a"))
            .with_step(step("ok_b"))
            .with_step(step("ok_c"));
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Completed);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[0].tool_name, "ok_a");
        assert_eq!(outcome.results[2].tool_name, "ok_c");
        assert_eq!(outcome.summary.success_rate, 1.0);
        assert!(!outcome.cycle_detected);
    }

    #[tokio::test]
    async fn test_sequential_fail_fast_skips_rest() {
        let (orchestrator, _) = orchestrator();
        let mut request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("broken"))
            .with_step(step("ok_c"))
            .with_max_retries(0);
        request.config.fail_fast = true;
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Failed);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[1].tool_name, "broken");
    }

    #[tokio::test]
    async fn test_sequential_without_fail_fast_runs_everything() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("broken"))
            .with_step(step("ok_c"))
            .with_max_retries(0);
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Completed);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.summary.successful_calls, 2);
        assert_eq!(outcome.summary.failed_calls, 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_flaky_step() {
        let (orchestrator, executor) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("flaky"))
            .with_max_retries(3);
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Completed);
        assert_eq!(outcome.results[0].attempts, Some(3));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conditional_skips_emit_no_results() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Conditional)
            .with_step(step("ok_a"))
            .with_step(step("ok_b").with_condition(StepCondition::Never))
            .with_step(step("ok_c").with_condition(StepCondition::SucceededBefore {
                tool: "ok_a".into(),
            }))
            .with_step(step("ok_d").with_condition(StepCondition::SucceededBefore {
                tool: "ok_b".into(),
            }));
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Completed);
        let names: Vec<&str> = outcome.results.iter().map(|r| r.tool_name.as_str()).collect();
        assert_eq!(names, vec!["ok_a", "ok_c"]);
    }

    #[tokio::test]
    async fn test_dependency_batches_respect_order() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::DependencyBased)
            .with_step(step("ok_a").with_id("a"))
            .with_step(step("ok_b").with_id("b"))
            .with_step(step("ok_c").with_id("c"))
            .with_dependency("b", ["a"])
            .with_dependency("c", ["a", "b"]);
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Completed);
        assert_eq!(outcome.results.len(), 3);
        assert!(!outcome.cycle_detected);
        let names: Vec<&str> = outcome.results.iter().map(|r| r.tool_name.as_str()).collect();
        assert_eq!(names, vec!["ok_a", "ok_b", "ok_c"]);
    }

    #[tokio::test]
    async fn test_dependency_cycle_flagged() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::DependencyBased)
            .with_step(step("ok_a").with_id("a"))
            .with_step(step("ok_b").with_id("b"))
            .with_dependency("a", ["b"])
            .with_dependency("b", ["a"]);
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert!(outcome.cycle_detected);
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_before_run_skips_steps() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("ok_b"));
        let handle = handle_for(&request);
        handle.cancel();

        let outcome = orchestrator.execute(request, handle.clone()).await;
        assert_eq!(outcome.status, ChainStatus::Cancelled);
        assert!(outcome.results.is_empty());

        let snapshot = handle.status().await;
        assert_eq!(snapshot.status, ChainStatus::Cancelled);
        assert!(snapshot.cancellation_requested);
    }

    #[tokio::test]
    async fn test_global_timeout_fails_with_partial_results() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("slow"))
            .with_timeout(0.2);
        let handle = handle_for(&request);

        let outcome = orchestrator.execute(request, handle).await;
        assert_eq!(outcome.status, ChainStatus::Failed);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].tool_name, "ok_a");
    }

    #[tokio::test]
    async fn test_status_snapshot_during_run() {
        let (orchestrator, _) = orchestrator();
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("slow"))
            .with_timeout(0.2);
        let handle = handle_for(&request);

        let observer = handle.clone();
        let run = tokio::spawn(async move { orchestrator.execute(request, handle).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = observer.status().await;
        assert_eq!(snapshot.status, ChainStatus::Running);
        assert_eq!(snapshot.current_step, 1);

        let outcome = run.await.unwrap();
        assert_eq!(outcome.status, ChainStatus::Failed);
    }

    #[tokio::test]
    async fn test_update_config_changes_later_steps() {
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential);
        let handle = handle_for(&request);
        assert!(!handle.config().await.fail_fast);

        handle.update_config(&json!({"fail_fast": true})).await;
        assert!(handle.config().await.fail_fast);
    }

    #[tokio::test]
    async fn test_sequential_context_carries_previous_results() {
        let executor = Arc::new(RecordingExecutor::default());
        let orchestrator = ChainOrchestrator::new(
            Arc::clone(&executor) as Arc<dyn ToolExecutorPort>,
            Arc::new(InMemoryDurable::new()),
            Arc::new(NoExecutionLogger),
        );
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("ok_b"));
        let handle = handle_for(&request);

        orchestrator.execute(request, handle).await;

        let seen = executor.seen.lock().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1["previous_results"], json!({}));
        assert_eq!(
            seen[1].1["previous_results"],
            json!({"ok_a": {"tool": "ok_a"}})
        );
    }

    #[tokio::test]
    async fn test_dependency_context_carries_dependency_results() {
        let executor = Arc::new(RecordingExecutor::default());
        let orchestrator = ChainOrchestrator::new(
            Arc::clone(&executor) as Arc<dyn ToolExecutorPort>,
            Arc::new(InMemoryDurable::new()),
            Arc::new(NoExecutionLogger),
        );
        let request = ToolExecutionRequest::new("s1", ChainStrategy::DependencyBased)
            .with_step(step("ok_a").with_id("a"))
            .with_step(step("ok_b").with_id("b"))
            .with_dependency("b", ["a"]);
        let handle = handle_for(&request);

        orchestrator.execute(request, handle).await;

        let seen = executor.seen.lock().await;
        let (_, metadata) = seen.iter().find(|(tool, _)| tool == "ok_b").unwrap();
        assert_eq!(
            metadata["dependency_results"],
            json!({"a": {"tool": "ok_a"}})
        );
    }

    #[tokio::test]
    async fn test_checkpoints_track_progress() {
        let durable = Arc::new(InMemoryDurable::new());
        let orchestrator = ChainOrchestrator::new(
            Arc::new(ScriptedExecutor::new()) as Arc<dyn ToolExecutorPort>,
            Arc::clone(&durable) as Arc<dyn DurableExecutionPort>,
            Arc::new(NoExecutionLogger),
        );
        let request = ToolExecutionRequest::new("s1", ChainStrategy::Sequential)
            .with_step(step("ok_a"))
            .with_step(step("ok_b"));
        let execution_id = request.execution_id.clone();
        let handle = handle_for(&request);

        orchestrator.execute(request, handle).await;

        let checkpoint = durable.load_checkpoint(&execution_id).await.unwrap();
        assert_eq!(checkpoint["status"], "completed");
        assert_eq!(checkpoint["current_step"], 2);
        assert_eq!(checkpoint["results_count"], 2);
    }
}
