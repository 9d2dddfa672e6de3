//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod durable;
pub mod execution_logger;
pub mod model_capability;
pub mod tool_executor;

pub use durable::{DurableExecutionPort, InMemoryDurable};
pub use execution_logger::{ExecutionEvent, ExecutionLogger, NoExecutionLogger};
pub use model_capability::ModelCapabilityPort;
pub use tool_executor::ToolExecutorPort;
