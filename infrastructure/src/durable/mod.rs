//! Durable execution adapters.

mod tokio_port;

pub use tokio_port::TokioDurable;
