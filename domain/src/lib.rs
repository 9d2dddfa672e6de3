//! Domain layer for conductor
//!
//! This crate contains the core business logic, entities, and value objects
//! of the tool conductor. It has no dependencies on infrastructure concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! Every capability the agent can invoke is described by a
//! [`ToolDefinition`] (parameters, version, timeout, permissions) and
//! implemented behind the async [`Tool`] contract. Invocations travel as
//! [`ToolCall`] values and come back as [`ToolCallResult`]s carrying a tagged
//! [`ToolError`] on failure.
//!
//! ## Sessions
//!
//! Each chat session tracks which tools its current model can use, with
//! cached availability and running statistics ([`SessionToolState`]).
//!
//! ## Chains
//!
//! Multi-step executions are described by a [`ToolExecutionRequest`] with a
//! [`ChainStrategy`], optional per-step [`StepCondition`]s and a dependency
//! graph resolved into concurrent batches.

pub mod chain;
pub mod model;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use chain::{
    BatchPlan, ChainConfig, ChainStatus, ChainStep, ChainStrategy, ExecutionSummary,
    StepCondition, ToolExecutionRequest, resolve_batches,
};
pub use model::ModelCapability;
pub use session::{
    AvailabilityState, CapabilityLevel, ModelCapabilityInfo, SessionConfig, SessionToolState,
    ToolAvailabilityInfo,
};
pub use tool::{
    ExecutionContext, ModelRequirements, ParameterType, PermissionLevel, PermissionSpec,
    RateLimit, Tool, ToolCall, ToolCallResult, ToolCallStatus, ToolDefinition, ToolError,
    ToolErrorKind, ToolMetadata, ToolOutput, ToolParameter, validate_parameters,
};
