//! Chain domain module
//!
//! Declarative descriptions of multi-step tool executions: strategies,
//! per-step conditions, the dependency graph batching algorithm and the
//! summary statistics computed over finished runs. The application layer's
//! `ChainOrchestrator` drives these types.
//!
//! | Strategy | Scheduling |
//! |----------|------------|
//! | `Parallel` | all steps at once, bounded by `max_concurrent` |
//! | `Sequential` | in order, earlier successes fed forward |
//! | `Conditional` | in order, each step gated by its [`StepCondition`] |
//! | `DependencyBased` | topological batches from the dependency graph |

pub mod condition;
pub mod dependency;
pub mod request;
pub mod status;

pub use condition::StepCondition;
pub use dependency::{BatchPlan, resolve_batches};
pub use request::{ChainConfig, ChainStep, ChainStrategy, ToolExecutionRequest};
pub use status::{ChainStatus, ExecutionSummary};
