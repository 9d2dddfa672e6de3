//! Tool registry adapter.
//!
//! Concrete [`ToolExecutorPort`](conductor_application::ports::ToolExecutorPort)
//! implementation: registrations with usage statistics and version history,
//! plus the execution gate sequence (existence, model compatibility,
//! permissions, usage tracking).

mod registration;
mod store;

pub use registration::{SessionUsage, ToolRegistration, VersionRecord};
pub use store::ToolRegistry;
