//! Step conditions for conditional chains.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gate deciding whether a conditional step runs.
///
/// Conditions are evaluated against the accumulator of earlier successful
/// results, keyed by tool name. A tool that failed (or was skipped) never
/// enters the accumulator, so `SucceededBefore` and `FailedBefore` are
/// complements over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepCondition {
    Always,
    Never,
    /// Run only when `tool` produced a successful result earlier.
    SucceededBefore { tool: String },
    /// Run only when `tool` has no successful result so far.
    FailedBefore { tool: String },
    /// Run only when the value at `path` (dot notation) inside the earlier
    /// result of `tool` equals `expected`.
    ValueEquals {
        tool: String,
        path: String,
        expected: Value,
    },
}

impl Default for StepCondition {
    fn default() -> Self {
        StepCondition::Always
    }
}

impl StepCondition {
    pub fn evaluate(&self, accumulator: &HashMap<String, Value>) -> bool {
        match self {
            StepCondition::Always => true,
            StepCondition::Never => false,
            StepCondition::SucceededBefore { tool } => accumulator.contains_key(tool),
            StepCondition::FailedBefore { tool } => !accumulator.contains_key(tool),
            StepCondition::ValueEquals {
                tool,
                path,
                expected,
            } => match accumulator.get(tool) {
                Some(result) => lookup_path(result, path) == Some(expected),
                None => false,
            },
        }
    }
}

/// Dot-notation lookup into a JSON object. An empty path returns the value
/// itself.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}
