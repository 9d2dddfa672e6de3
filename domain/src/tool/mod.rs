//! Tool domain module
//!
//! Defines everything the conductor knows about a tool before and after it
//! runs: the declarative schema, the execution contract, the invocation and
//! result types, and the error taxonomy.
//!
//! # Overview
//!
//! ```text
//! ┌────────────────┐    ┌──────────────┐    ┌────────────────┐
//! │ ToolDefinition │───▶│ ToolCall     │───▶│ ToolCallResult │
//! │ (schema)       │    │ (invocation) │    │ (outcome)      │
//! └──────┬─────────┘    └──────────────┘    └────────────────┘
//!        │
//!        ├─ parameters: typed constraints, defaults, patterns
//!        ├─ permissions: level, roles, models, rate limits
//!        └─ metadata:    tags, category, model requirements
//! ```
//!
//! # Key Types
//!
//! - [`ToolDefinition`] — Schema for a single tool (parameters, version,
//!   timeout, permissions, model requirements)
//! - [`Tool`] — Async execution contract implementations fulfil
//! - [`ToolCall`] / [`ToolCallResult`] — One invocation and its outcome
//! - [`ToolError`] / [`ToolErrorKind`] — Tagged failure taxonomy; the kind
//!   decides whether the retry wrapper may re-attempt
//! - [`validate_parameters`] — Supplied-value check + default filling
//!
//! # Architecture
//!
//! - **Domain** (this module): pure schemas and validation, no I/O
//! - **Application** (`ToolExecutorPort`, `run_tool_call`): call lifecycle,
//!   retries, parallel fan-out
//! - **Infrastructure** (`ToolRegistry`): registration, permission gating,
//!   usage tracking

pub mod call;
pub mod contract;
pub mod definition;
pub mod error;
pub mod permissions;
pub mod validation;

pub use call::{ExecutionContext, ToolCall, ToolCallResult, ToolCallStatus, ToolOutput};
pub use contract::Tool;
pub use definition::{
    ModelRequirements, ParameterType, ToolDefinition, ToolMetadata, ToolParameter,
};
pub use error::{ToolError, ToolErrorKind};
pub use permissions::{PermissionLevel, PermissionSpec, RateLimit};
pub use validation::validate_parameters;
