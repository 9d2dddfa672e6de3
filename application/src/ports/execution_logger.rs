//! Port for structured execution logging.
//!
//! Defines the [`ExecutionLogger`] trait for recording tool execution events
//! (call started, call finished, chain lifecycle, model switches) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the execution
//! history in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured execution event for logging.
///
/// Each event has a type string and a JSON payload containing event-specific
/// fields.
pub struct ExecutionEvent {
    /// Event type identifier (e.g., "call_finished", "chain_started",
    /// "model_switched").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ExecutionEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging execution events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is intentionally synchronous and non-fallible to avoid
/// disrupting the main execution flow — logging failures are silently ignored.
pub trait ExecutionLogger: Send + Sync {
    /// Record an execution event.
    fn log(&self, event: ExecutionEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoExecutionLogger;

impl ExecutionLogger for NoExecutionLogger {
    fn log(&self, _event: ExecutionEvent) {}
}
