//! Declarative tool schemas.
//!
//! A [`ToolDefinition`] describes everything the registry needs to know about
//! a tool before executing it: its parameters with typed constraints, its
//! timeout, its semantic version, its [`PermissionSpec`] and metadata with
//! model requirements. Definitions are validated at registration time;
//! a definition that fails [`ToolDefinition::validate`] never enters the
//! registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ToolError;
use super::permissions::PermissionSpec;
use crate::model::ModelCapability;

/// Supported parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }

    /// Whether a JSON value has this type's shape.
    ///
    /// Booleans are never integers or numbers, and integers are accepted
    /// where numbers are expected.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Integer => value.is_i64() || value.is_u64(),
            ParameterType::Number => value.is_number(),
            ParameterType::Boolean => value.is_boolean(),
            ParameterType::Array => value.is_array(),
            ParameterType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema for a single tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParameterType,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Default applied when an optional parameter is not supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values, checked after the type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Minimum numeric value (integer/number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Maximum numeric value (integer/number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Minimum length (string/array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length (string/array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regex the full string value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, ty: ParameterType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_range(mut self, min: impl Into<Option<f64>>, max: impl Into<Option<f64>>) -> Self {
        self.min_value = min.into();
        self.max_value = max.into();
        self
    }

    pub fn with_length(
        mut self,
        min: impl Into<Option<usize>>,
        max: impl Into<Option<usize>>,
    ) -> Self {
        self.min_length = min.into();
        self.max_length = max.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Check structural invariants: the default value must have the declared
    /// type's shape, and any pattern must compile.
    pub fn validate(&self, tool_name: &str) -> Result<(), ToolError> {
        if let Some(default) = &self.default
            && !self.ty.matches(default)
        {
            return Err(ToolError::configuration(
                tool_name,
                format!(
                    "default value for parameter '{}' must be a {}",
                    self.name, self.ty
                ),
            ));
        }
        if let Some(pattern) = &self.pattern
            && regex::Regex::new(pattern).is_err()
        {
            return Err(ToolError::configuration(
                tool_name,
                format!("invalid pattern for parameter '{}': {pattern}", self.name),
            ));
        }
        Ok(())
    }

    /// Provider-facing JSON schema fragment for this parameter.
    pub fn schema(&self) -> Value {
        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), Value::String(self.ty.as_str().into()));
        schema.insert("description".into(), Value::String(self.description.clone()));
        if let Some(values) = &self.enum_values {
            schema.insert("enum".into(), Value::Array(values.clone()));
        }
        if let Some(min) = self.min_value {
            schema.insert("minimum".into(), serde_json::json!(min));
        }
        if let Some(max) = self.max_value {
            schema.insert("maximum".into(), serde_json::json!(max));
        }
        if let Some(min) = self.min_length {
            schema.insert("minLength".into(), serde_json::json!(min));
        }
        if let Some(max) = self.max_length {
            schema.insert("maxLength".into(), serde_json::json!(max));
        }
        if let Some(pattern) = &self.pattern {
            schema.insert("pattern".into(), Value::String(pattern.clone()));
        }
        Value::Object(schema)
    }
}

/// Model requirements a tool can declare in its metadata.
///
/// Evaluated by the registry against a resolved [`ModelCapability`] when
/// building the per-tool model-compatibility cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequirements {
    /// The model must support tool calls at all. Almost always true.
    #[serde(default = "default_true")]
    pub require_tool_calls: bool,
    /// Minimum context window the model must offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_context_length: Option<u32>,
    /// When non-empty, only these model ids are compatible.
    #[serde(default)]
    pub allowed_models: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ModelRequirements {
    fn default() -> Self {
        Self {
            require_tool_calls: true,
            min_context_length: None,
            allowed_models: Vec::new(),
        }
    }
}

impl ModelRequirements {
    pub fn satisfied_by(&self, capability: &ModelCapability) -> bool {
        if self.require_tool_calls && !capability.supports_tool_calls {
            return false;
        }
        if let Some(min) = self.min_context_length
            && capability.context_length < min
        {
            return false;
        }
        if !self.allowed_models.is_empty()
            && !self.allowed_models.iter().any(|m| m == &capability.model_id)
        {
            return false;
        }
        true
    }
}

/// Free-form classification attached to a definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub model_requirements: ModelRequirements,
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

/// Declarative schema for a tool.
///
/// The name is immutable once registered under that name; only the version
/// may change across re-registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name, valid identifier format (`[A-Za-z_][A-Za-z0-9_]*`).
    pub name: String,
    pub description: String,
    /// Ordered parameter list.
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Semantic version (`MAJOR.MINOR.PATCH`).
    #[serde(default = "default_version")]
    pub version: String,
    /// Default execution timeout; a call may override it.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    #[serde(default)]
    pub permissions: PermissionSpec,
    #[serde(default)]
    pub metadata: ToolMetadata,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_timeout() -> f64 {
    30.0
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            version: default_version(),
            timeout_seconds: default_timeout(),
            permissions: PermissionSpec::default(),
            metadata: ToolMetadata::default(),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionSpec) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    pub fn with_model_requirements(mut self, requirements: ModelRequirements) -> Self {
        self.metadata.model_requirements = requirements;
        self
    }

    /// Names of all required parameters, in declaration order.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Validate the whole definition. Called by the registry before accepting
    /// a registration.
    pub fn validate(&self) -> Result<(), ToolError> {
        if !is_valid_identifier(&self.name) {
            return Err(ToolError::configuration(
                &self.name,
                "tool name must be a valid identifier",
            ));
        }
        if !is_semantic_version(&self.version) {
            return Err(ToolError::configuration(
                &self.name,
                format!("'{}' is not a semantic version", self.version),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for parameter in &self.parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(ToolError::configuration(
                    &self.name,
                    format!("duplicate parameter '{}'", parameter.name),
                ));
            }
            parameter.validate(&self.name)?;
        }
        Ok(())
    }

    /// Provider-facing function-call schema.
    pub fn schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for parameter in &self.parameters {
            properties.insert(parameter.name.clone(), parameter.schema());
            if parameter.required {
                required.push(Value::String(parameter.name.clone()));
            }
        }
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `MAJOR.MINOR.PATCH` with purely numeric fields.
pub fn is_semantic_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator_definition() -> ToolDefinition {
        ToolDefinition::new("calculator", "Perform basic arithmetic")
            .with_parameter(
                ToolParameter::new("operation", ParameterType::String, "Operation to perform")
                    .required()
                    .with_enum(["add", "subtract"]),
            )
            .with_parameter(
                ToolParameter::new("a", ParameterType::Number, "First operand").required(),
            )
            .with_parameter(
                ToolParameter::new("b", ParameterType::Number, "Second operand").required(),
            )
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("calculator"));
        assert!(is_valid_identifier("_private_tool"));
        assert!(is_valid_identifier("tool2"));
        assert!(!is_valid_identifier("2tool"));
        assert!(!is_valid_identifier("bad-name"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_semver_validation() {
        assert!(is_semantic_version("1.0.0"));
        assert!(is_semantic_version("0.12.3"));
        assert!(!is_semantic_version("1.0"));
        assert!(!is_semantic_version("1.0.0-beta"));
        assert!(!is_semantic_version("v1.0.0"));
    }

    #[test]
    fn test_definition_validate_ok() {
        assert!(calculator_definition().validate().is_ok());
    }

    #[test]
    fn test_definition_rejects_bad_name() {
        let def = ToolDefinition::new("not a name", "x");
        let err = def.validate().unwrap_err();
        assert_eq!(err.kind, crate::tool::error::ToolErrorKind::Configuration);
    }

    #[test]
    fn test_definition_rejects_bad_version() {
        let def = ToolDefinition::new("tool", "x").with_version("latest");
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_duplicate_parameter() {
        let def = ToolDefinition::new("tool", "x")
            .with_parameter(ToolParameter::new("a", ParameterType::String, "first"))
            .with_parameter(ToolParameter::new("a", ParameterType::Number, "second"));
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_default_shape_must_match_type() {
        let def = ToolDefinition::new("tool", "x").with_parameter(
            ToolParameter::new("count", ParameterType::Integer, "count").with_default("three"),
        );
        assert!(def.validate().is_err());

        let def = ToolDefinition::new("tool", "x").with_parameter(
            ToolParameter::new("count", ParameterType::Integer, "count").with_default(3),
        );
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_parameter_type_matches() {
        assert!(ParameterType::Number.matches(&serde_json::json!(1)));
        assert!(ParameterType::Number.matches(&serde_json::json!(1.5)));
        assert!(!ParameterType::Number.matches(&serde_json::json!(true)));
        assert!(ParameterType::Integer.matches(&serde_json::json!(7)));
        assert!(!ParameterType::Integer.matches(&serde_json::json!(7.5)));
        assert!(!ParameterType::Integer.matches(&serde_json::json!(false)));
    }

    #[test]
    fn test_required_parameters() {
        let def = calculator_definition();
        assert_eq!(def.required_parameters(), vec!["operation", "a", "b"]);
    }

    #[test]
    fn test_schema_shape() {
        let schema = calculator_definition().schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "calculator");
        let required = schema["function"]["parameters"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(
            schema["function"]["parameters"]["properties"]["operation"]["enum"][0],
            "add"
        );
    }

    #[test]
    fn test_model_requirements() {
        let capable = ModelCapability::new("m1", "Model One", true, 8192);
        let incapable = ModelCapability::new("m2", "Model Two", false, 8192);

        let default = ModelRequirements::default();
        assert!(default.satisfied_by(&capable));
        assert!(!default.satisfied_by(&incapable));

        let strict = ModelRequirements {
            require_tool_calls: true,
            min_context_length: Some(16_000),
            allowed_models: vec![],
        };
        assert!(!strict.satisfied_by(&capable));

        let listed = ModelRequirements {
            allowed_models: vec!["m2".into()],
            require_tool_calls: false,
            min_context_length: None,
        };
        assert!(listed.satisfied_by(&incapable));
        assert!(!listed.satisfied_by(&capable));
    }
}
