//! Tool error taxonomy.
//!
//! Every failure in the tool pipeline is a [`ToolError`] tagged with a
//! [`ToolErrorKind`]. The kind drives retry behavior:
//!
//! | Kind | Retryable? | Raised by |
//! |------|-----------|-----------|
//! | `NotFound` | No | Registry lookup (missing/disabled tool, unknown session) |
//! | `Validation` | No | Parameter/context validation |
//! | `Configuration` | No | Malformed definition, tool name mismatch |
//! | `Permission` | No | Role/model/rate-limit denial |
//! | `Timeout` | Yes | Execution deadline exceeded |
//! | `Execution` | Yes | Tool body reported failure |
//! | `Cancelled` | No | Cooperative cancellation |
//!
//! Callers pattern-match on the kind instead of catching exceptions; the
//! retry wrapper consults [`ToolErrorKind::is_terminal`] before re-attempting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Tool or session missing from the registry/state store.
    NotFound,
    /// Bad or missing parameters, or an invalid execution context.
    Validation,
    /// Malformed tool definition or name mismatch.
    Configuration,
    /// Role, model, or rate-limit denial.
    Permission,
    /// Execution exceeded its deadline.
    Timeout,
    /// The tool body reported a failure.
    Execution,
    /// Cooperative cancellation. Terminal, but not an error for reporting.
    Cancelled,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Validation => "validation",
            ToolErrorKind::Configuration => "configuration",
            ToolErrorKind::Permission => "permission",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::Execution => "execution",
            ToolErrorKind::Cancelled => "cancelled",
        }
    }

    /// Terminal kinds are never retried by the retry wrapper.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ToolErrorKind::Timeout | ToolErrorKind::Execution)
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tagged tool failure carried through results instead of being thrown.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("[{kind}] {message}")]
pub struct ToolError {
    /// Failure classification.
    pub kind: ToolErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Tool the failure relates to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
        }
    }

    pub fn for_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn not_found(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::NotFound,
            format!("Tool '{tool_name}' not found in registry"),
        )
        .for_tool(tool_name)
    }

    pub fn validation(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Validation,
            format!("Tool '{tool_name}' validation failed: {}", message.into()),
        )
        .for_tool(tool_name)
    }

    pub fn configuration(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Configuration,
            format!("Tool '{tool_name}' configuration error: {}", message.into()),
        )
        .for_tool(tool_name)
    }

    pub fn permission(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Permission,
            format!(
                "Tool '{tool_name}' execution not permitted: {}",
                reason.into()
            ),
        )
        .for_tool(tool_name)
    }

    pub fn timeout(tool_name: impl Into<String>, timeout_seconds: f64) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Timeout,
            format!("Tool '{tool_name}' execution timed out after {timeout_seconds} seconds"),
        )
        .for_tool(tool_name)
    }

    pub fn execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Execution,
            format!("Tool '{tool_name}' execution failed: {}", message.into()),
        )
        .for_tool(tool_name)
    }

    pub fn cancelled(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::Cancelled,
            format!("Tool '{tool_name}' execution was cancelled"),
        )
        .for_tool(tool_name)
    }

    /// Whether the retry wrapper may re-attempt after this failure.
    pub fn is_retryable(&self) -> bool {
        !self.kind.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_kinds() {
        assert!(ToolErrorKind::Validation.is_terminal());
        assert!(ToolErrorKind::Configuration.is_terminal());
        assert!(ToolErrorKind::NotFound.is_terminal());
        assert!(ToolErrorKind::Permission.is_terminal());
        assert!(ToolErrorKind::Cancelled.is_terminal());
        assert!(!ToolErrorKind::Timeout.is_terminal());
        assert!(!ToolErrorKind::Execution.is_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = ToolError::not_found("weather");
        assert_eq!(err.kind, ToolErrorKind::NotFound);
        assert!(err.to_string().contains("weather"));
        assert!(err.to_string().starts_with("[not_found]"));
    }

    #[test]
    fn test_retryable() {
        assert!(ToolError::execution("t", "boom").is_retryable());
        assert!(ToolError::timeout("t", 5.0).is_retryable());
        assert!(!ToolError::validation("t", "bad").is_retryable());
        assert!(!ToolError::cancelled("t").is_retryable());
    }

    #[test]
    fn test_serde_round_trip() {
        let err = ToolError::permission("calc", "rate limit exceeded");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "permission");
        let back: ToolError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}
