//! Use cases
//!
//! Application-level operations that orchestrate domain logic through the
//! ports:
//!
//! - [`call_tool`] — single-call driver, retry wrapper, parallel fan-out
//! - [`execute_chain`] — chain orchestration with live handles
//! - [`model_switch`] — per-session tool snapshots across model switches
//! - [`session_tools`] — session tool state store
//! - [`tool_service`] — facade the outer layer talks to

pub mod call_tool;
pub mod execute_chain;
pub mod model_switch;
pub mod session_tools;
pub mod tool_service;

pub use call_tool::{call_with_retry, execute_parallel, run_tool_call};
pub use execute_chain::{ChainExecution, ChainOrchestrator, ChainOutcome, ChainStatusSnapshot};
pub use model_switch::{ModelChangeEvent, ModelSwitchCoordinator, ToolCallValidation};
pub use session_tools::{AggregateStats, SessionStateManager, SessionStats};
pub use tool_service::{ToolService, capability_level_for};
