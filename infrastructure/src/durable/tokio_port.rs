//! Durable execution adapter on the tokio clock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use conductor_application::ports::DurableExecutionPort;
use serde_json::Value;
use tokio::sync::Mutex;

/// [`DurableExecutionPort`] using real tokio sleeps and an in-memory
/// checkpoint map. Checkpoints do not survive a process restart; a
/// persistent adapter can replace this one behind the same port.
#[derive(Default)]
pub struct TokioDurable {
    checkpoints: Mutex<HashMap<String, Value>>,
}

impl TokioDurable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableExecutionPort for TokioDurable {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn save_checkpoint(&self, key: &str, state: Value) {
        self.checkpoints.lock().await.insert(key.to_string(), state);
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
    async fn test_checkpoint_round_trip() {
        let durable = TokioDurable::new();
        assert!(durable.load_checkpoint("chain-1").await.is_none());

        durable.save_checkpoint("chain-1", json!({"batch": 1})).await;
        assert_eq!(
            durable.load_checkpoint("chain-1").await,
            Some(json!({"batch": 1}))
        );
    }

    #[tokio::test]
    async fn test_sleep_elapses() {
        let durable = TokioDurable::new();
        let started = std::time::Instant::now();
        durable.sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
