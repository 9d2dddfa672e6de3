//! Builtin calculator tool.

use std::collections::HashMap;

use async_trait::async_trait;
use conductor_domain::tool::{
    ExecutionContext, ParameterType, Tool, ToolDefinition, ToolOutput, ToolParameter,
};
use serde_json::{Value, json};
use tracing::debug;

/// Operand magnitudes beyond this fail instead of losing precision.
const MAX_OPERAND: f64 = 1e15;

/// Basic arithmetic: add, subtract, multiply, divide, power, sqrt.
///
/// Domain failures (division by zero, square root of a negative) come back
/// as failed outputs rather than validation errors, so chain conditions can
/// branch on them.
pub struct CalculatorTool {
    definition: ToolDefinition,
}

impl CalculatorTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "calculator",
            "Perform basic mathematical operations: addition, subtraction, \
             multiplication, division, power, and square root",
        )
        .with_timeout(10.0)
        .with_category("math")
        .with_parameter(
            ToolParameter::new("operation", ParameterType::String, "Operation to perform")
                .required()
                .with_enum(["add", "subtract", "multiply", "divide", "power", "sqrt"]),
        )
        .with_parameter(
            ToolParameter::new("a", ParameterType::Number, "First operand").required(),
        )
        .with_parameter(ToolParameter::new(
            "b",
            ParameterType::Number,
            "Second operand. Not used by sqrt.",
        ))
        .with_parameter(
            ToolParameter::new(
                "precision",
                ParameterType::Integer,
                "Decimal places in the result",
            )
            .with_default(2)
            .with_range(0.0, 10.0),
        );
        Self { definition }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: HashMap<String, Value>, _ctx: &ExecutionContext) -> ToolOutput {
        let operation = params
            .get("operation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let a = params.get("a").and_then(Value::as_f64).unwrap_or(0.0);
        let b = params.get("b").and_then(Value::as_f64);
        let precision = params
            .get("precision")
            .and_then(Value::as_i64)
            .unwrap_or(2)
            .clamp(0, 10) as i32;

        if a.abs() > MAX_OPERAND || b.is_some_and(|b| b.abs() > MAX_OPERAND) {
            return ToolOutput::fail(format!(
                "operands must be within ±{MAX_OPERAND} for calculation"
            ));
        }

        let (raw, expression) = match (operation.as_str(), b) {
            ("add", Some(b)) => (a + b, format!("{a} + {b}")),
            ("subtract", Some(b)) => (a - b, format!("{a} - {b}")),
            ("multiply", Some(b)) => (a * b, format!("{a} * {b}")),
            ("divide", Some(b)) => {
                if b == 0.0 {
                    return ToolOutput::fail("division by zero is not allowed");
                }
                (a / b, format!("{a} / {b}"))
            }
            ("power", Some(b)) => (a.powf(b), format!("{a} ^ {b}")),
            ("sqrt", _) => {
                if a < 0.0 {
                    return ToolOutput::fail("square root of a negative number is not supported");
                }
                (a.sqrt(), format!("sqrt({a})"))
            }
            (op, None) => {
                return ToolOutput::fail(format!("parameter 'b' is required for '{op}'"));
            }
            (op, _) => {
                return ToolOutput::fail(format!("unknown operation '{op}'"));
            }
        };

        if !raw.is_finite() {
            return ToolOutput::fail("calculation result is too large to represent");
        }

        let factor = 10f64.powi(precision);
        let result = (raw * factor).round() / factor;
        debug!(operation = %operation, %expression, result, "calculator finished");

        ToolOutput::ok(json!({
            "operation": operation,
            "expression": expression,
            "result": result,
            "raw_result": raw,
            "precision": precision,
        }))
        .with_metadata("tool_version", self.definition.version.clone())
    }
}
