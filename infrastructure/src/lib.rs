//! Infrastructure layer for conductor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the tool registry, the model capability
//! catalog, builtin tools, the durable execution adapter, configuration
//! file loading, and structured logging.

pub mod capability;
pub mod config;
pub mod durable;
pub mod logging;
pub mod registry;
pub mod tools;

// Re-export commonly used types
pub use capability::ModelCatalog;
pub use config::{
    ConfigLoader, FileChainConfig, FileConfig, FileModelEntry, FileRegistryConfig,
    FileSessionConfig,
};
pub use durable::TokioDurable;
pub use logging::{JsonlExecutionLogger, init_tracing};
pub use registry::{ToolRegistration, ToolRegistry};
pub use tools::{
    builtin::{CalculatorTool, WeatherTool},
    register_builtin_tools,
};
