//! Parameter validation against a tool definition.
//!
//! Validation collects every field problem before failing, so callers see one
//! Validation error listing all offending parameters rather than the first.
//! Optional parameters that are unset receive their declared defaults in the
//! returned map.

use std::collections::HashMap;

use serde_json::Value;

use super::definition::{ParameterType, ToolDefinition, ToolParameter};
use super::error::ToolError;

/// Check `supplied` against `definition` and return the effective parameter
/// map (supplied values plus defaults for unset optional parameters).
pub fn validate_parameters(
    definition: &ToolDefinition,
    supplied: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, ToolError> {
    let mut problems: Vec<String> = Vec::new();
    let mut effective: HashMap<String, Value> = HashMap::new();

    for (name, value) in supplied {
        match definition.parameter(name) {
            Some(param) => {
                if let Err(problem) = check_value(param, value) {
                    problems.push(problem);
                } else {
                    effective.insert(name.clone(), value.clone());
                }
            }
            None => problems.push(format!("unknown parameter '{name}'")),
        }
    }

    for param in &definition.parameters {
        if supplied.contains_key(&param.name) {
            continue;
        }
        if param.required {
            problems.push(format!("missing required parameter '{}'", param.name));
        } else if let Some(default) = &param.default {
            effective.insert(param.name.clone(), default.clone());
        }
    }

    if problems.is_empty() {
        Ok(effective)
    } else {
        Err(ToolError::validation(&definition.name, problems.join("; ")))
    }
}

/// Type and constraint check for one supplied value.
fn check_value(param: &ToolParameter, value: &Value) -> Result<(), String> {
    if !param.ty.matches(value) {
        return Err(format!(
            "parameter '{}' expects {}, got {}",
            param.name,
            param.ty.as_str(),
            value_type_name(value)
        ));
    }

    if let Some(allowed) = &param.enum_values
        && !allowed.contains(value)
    {
        return Err(format!(
            "parameter '{}' must be one of {}",
            param.name,
            serde_json::to_string(allowed).unwrap_or_default()
        ));
    }

    match param.ty {
        ParameterType::Integer | ParameterType::Number => {
            if let Some(n) = value.as_f64() {
                if let Some(min) = param.min_value
                    && n < min
                {
                    return Err(format!("parameter '{}' must be >= {min}", param.name));
                }
                if let Some(max) = param.max_value
                    && n > max
                {
                    return Err(format!("parameter '{}' must be <= {max}", param.name));
                }
            }
        }
        ParameterType::String => {
            if let Some(s) = value.as_str() {
                let len = s.chars().count();
                if let Some(min) = param.min_length
                    && len < min
                {
                    return Err(format!(
                        "parameter '{}' must be at least {min} characters",
                        param.name
                    ));
                }
                if let Some(max) = param.max_length
                    && len > max
                {
                    return Err(format!(
                        "parameter '{}' must be at most {max} characters",
                        param.name
                    ));
                }
                if let Some(pattern) = &param.pattern {
                    // Definition validation already confirmed the pattern compiles.
                    match regex::Regex::new(pattern) {
                        Ok(re) if !re.is_match(s) => {
                            return Err(format!(
                                "parameter '{}' does not match pattern '{pattern}'",
                                param.name
                            ));
                        }
                        Err(_) => {
                            return Err(format!(
                                "parameter '{}' has an invalid pattern",
                                param.name
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
        ParameterType::Array => {
            if let Some(items) = value.as_array() {
                if let Some(min) = param.min_length
                    && items.len() < min
                {
                    return Err(format!(
                        "parameter '{}' must have at least {min} items",
                        param.name
                    ));
                }
                if let Some(max) = param.max_length
                    && items.len() > max
                {
                    return Err(format!(
                        "parameter '{}' must have at most {max} items",
                        param.name
                    ));
                }
            }
        }
        ParameterType::Boolean | ParameterType::Object => {}
    }

    Ok(())
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
