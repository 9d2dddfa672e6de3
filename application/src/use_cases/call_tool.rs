//! Single tool call driver.
//!
//! Drives one [`ToolCall`] through its lifecycle against a [`Tool`]
//! implementation:
//!
//! ```text
//! pending ──▶ validate ──▶ running ──▶ completed
//!                │                        │
//!                ▼                        ▼
//!       configuration /           failed | timeout
//!       validation error
//! ```
//!
//! Every failure path produces a [`ToolCallResult`] with a tagged error;
//! nothing in here panics or returns `Err`. The retry wrapper re-attempts
//! only non-terminal failures, sleeping through the durable port between
//! attempts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use conductor_domain::tool::{
    ExecutionContext, Tool, ToolCall, ToolCallResult, ToolError, validate_parameters,
};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::ports::{DurableExecutionPort, ToolExecutorPort};

/// Run one call against a tool implementation.
///
/// Validation order: name match, execution context, parameters. The tool body
/// then runs under `tokio::time::timeout` using the call's override or the
/// definition's default. `pre_execute` and `post_execute` hooks run around
/// the body; `post_execute` also runs when the body reported failure (but not
/// on timeout, when the body future was dropped).
pub async fn run_tool_call(
    tool: &dyn Tool,
    call: &ToolCall,
    ctx: &ExecutionContext,
) -> ToolCallResult {
    let started = Instant::now();
    let definition = tool.definition();

    if call.tool_name != definition.name {
        let error = ToolError::configuration(
            &definition.name,
            format!("call addressed to '{}'", call.tool_name),
        );
        return ToolCallResult::failed(call, error, elapsed_ms(started));
    }

    if let Err(error) = tool.validate_context(ctx) {
        return ToolCallResult::failed(call, error, elapsed_ms(started));
    }

    let params = match validate_parameters(definition, &call.parameters) {
        Ok(params) => params,
        Err(error) => return ToolCallResult::failed(call, error, elapsed_ms(started)),
    };

    let timeout_seconds = call.timeout_seconds.unwrap_or(definition.timeout_seconds);
    let timeout = Duration::from_secs_f64(timeout_seconds.max(0.0));

    debug!(
        tool = %definition.name,
        call_id = %call.id,
        session = %ctx.session_id,
        timeout_seconds,
        "executing tool call"
    );

    tool.pre_execute(ctx).await;

    let output = match tokio::time::timeout(timeout, tool.execute(params, ctx)).await {
        Ok(output) => output,
        Err(_) => {
            warn!(tool = %definition.name, call_id = %call.id, "tool call timed out");
            let error = ToolError::timeout(&definition.name, timeout_seconds);
            return ToolCallResult::failed(call, error, elapsed_ms(started));
        }
    };

    tool.post_execute(ctx, &output).await;

    let execution_time_ms = elapsed_ms(started);
    if output.success {
        ToolCallResult::completed(call, output.data, execution_time_ms)
            .with_metadata(output.metadata)
    } else {
        let message = output.error.unwrap_or_else(|| "tool reported failure".into());
        let error = ToolError::execution(&definition.name, message);
        ToolCallResult::failed(call, error, execution_time_ms).with_metadata(output.metadata)
    }
}

/// Run one call with retries.
///
/// Budget is `policy.max_retries + 1` total attempts. Terminal failure kinds
/// (validation, configuration, not-found, permission, cancellation) return
/// immediately. Backoff between attempts goes through the durable port and
/// doubles up to the policy cap. The returned result carries the attempt
/// number that produced it.
pub async fn call_with_retry(
    tool: &dyn Tool,
    call: &ToolCall,
    ctx: &ExecutionContext,
    policy: &RetryPolicy,
    durable: &dyn DurableExecutionPort,
) -> ToolCallResult {
    let max_attempts = policy.max_retries + 1;
    let mut last = None;

    for attempt in 1..=max_attempts {
        let result = run_tool_call(tool, call, ctx).await;

        if result.is_success() {
            return result.with_attempts(attempt);
        }

        let retryable = result.error.as_ref().is_some_and(ToolError::is_retryable);
        if !retryable || attempt == max_attempts {
            return result.with_attempts(attempt);
        }

        warn!(
            tool = %call.tool_name,
            call_id = %call.id,
            attempt,
            max_attempts,
            "tool call failed, retrying"
        );
        last = Some(result);
        durable.sleep(policy.backoff_for(attempt - 1)).await;
    }

    // Unreachable for max_attempts >= 1; kept for the zero case.
    last.unwrap_or_else(|| {
        ToolCallResult::failed(
            call,
            ToolError::execution(&call.tool_name, "no attempts were made"),
            0.0,
        )
    })
}

/// Execute several calls concurrently through an executor port.
///
/// Concurrency is bounded by a semaphore of `max_concurrent` permits. The
/// result order matches the input order regardless of completion order.
pub async fn execute_parallel(
    executor: Arc<dyn ToolExecutorPort>,
    calls: &[ToolCall],
    ctx: &ExecutionContext,
    max_concurrent: usize,
) -> Vec<ToolCallResult> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let futures = calls.iter().map(|call| {
        let executor = Arc::clone(&executor);
        let semaphore = Arc::clone(&semaphore);
        async move {
            // The semaphore is never closed while we hold it.
            let _permit = semaphore.acquire().await;
            executor.execute(call, ctx).await
        }
    });

    join_all(futures).await
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
