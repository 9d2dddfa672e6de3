//! Application layer for conductor
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ParallelParams, RetryPolicy};
pub use ports::{
    durable::{DurableExecutionPort, InMemoryDurable},
    execution_logger::{ExecutionEvent, ExecutionLogger, NoExecutionLogger},
    model_capability::ModelCapabilityPort,
    tool_executor::ToolExecutorPort,
};
pub use use_cases::{
    call_tool::{call_with_retry, execute_parallel, run_tool_call},
    execute_chain::{ChainExecution, ChainOrchestrator, ChainOutcome, ChainStatusSnapshot},
    model_switch::{ModelChangeEvent, ModelSwitchCoordinator, ToolCallValidation},
    session_tools::{AggregateStats, SessionStateManager, SessionStats},
    tool_service::ToolService,
};
