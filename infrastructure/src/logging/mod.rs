//! Logging infrastructure — tracing setup and structured execution logging.
//!
//! Provides [`JsonlExecutionLogger`], a JSONL file writer that implements
//! the [`ExecutionLogger`](conductor_application::ExecutionLogger) port,
//! and [`init_tracing`] for the diagnostic log.

mod jsonl_logger;

pub use jsonl_logger::JsonlExecutionLogger;

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `filter` is an env-filter directive such as `"info"` or
/// `"conductor_application=debug"`; `RUST_LOG` overrides it when set.
/// Calling this twice is a no-op (the second init fails silently).
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
