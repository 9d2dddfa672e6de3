//! Durable Execution port
//!
//! Time and checkpointing abstraction for long-running executions. Retry
//! backoff sleeps go through this port so tests can use a virtual clock, and
//! chain runs may persist small progress checkpoints through it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Port for durable execution primitives.
#[async_trait]
pub trait DurableExecutionPort: Send + Sync {
    /// Suspend the current execution for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Persist a progress checkpoint under `key`. Overwrites any previous
    /// value for the key.
    async fn save_checkpoint(&self, key: &str, state: Value);

    /// Load a previously saved checkpoint.
    async fn load_checkpoint(&self, key: &str) -> Option<Value>;
}

/// In-memory implementation used by tests and standalone runs.
#[derive(Default)]
pub struct InMemoryDurable {
    checkpoints: tokio::sync::Mutex<std::collections::HashMap<String, Value>>,
}

impl InMemoryDurable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableExecutionPort for InMemoryDurable {
    async fn sleep(&self, _duration: Duration) {
        // Virtual clock: backoff is a no-op.
        tokio::task::yield_now().await;
    }

    async fn save_checkpoint(&self, key: &str, state: Value) {
        self.checkpoints
            .lock()
            .await
            .insert(key.to_string(), state);
    }

    async fn load_checkpoint(&self, key: &str) -> Option<Value> {
        self.checkpoints.lock().await.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_checkpoints() {
        let durable = InMemoryDurable::new();
        assert!(durable.load_checkpoint("run-1").await.is_none());

        durable.save_checkpoint("run-1", json!({"step": 2})).await;
        assert_eq!(
            durable.load_checkpoint("run-1").await,
            Some(json!({"step": 2}))
        );

        durable.save_checkpoint("run-1", json!({"step": 3})).await;
        assert_eq!(
            durable.load_checkpoint("run-1").await.unwrap()["step"],
            3
        );
    }
}
