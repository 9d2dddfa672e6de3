//! In-memory model capability catalog.

use std::collections::HashMap;

use async_trait::async_trait;
use conductor_application::ports::ModelCapabilityPort;
use conductor_domain::model::ModelCapability;
use tokio::sync::RwLock;
use tracing::debug;

/// [`ModelCapabilityPort`] backed by an in-memory map.
///
/// Typically seeded from the `[[models]]` entries of the config file and
/// updated at runtime through [`ModelCatalog::upsert`].
#[derive(Default)]
pub struct ModelCatalog {
    models: RwLock<HashMap<String, ModelCapability>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: impl IntoIterator<Item = ModelCapability>) -> Self {
        let models = models
            .into_iter()
            .map(|m| (m.model_id.clone(), m))
            .collect();
        Self {
            models: RwLock::new(models),
        }
    }

    /// Insert or replace one entry.
    pub async fn upsert(&self, capability: ModelCapability) {
        debug!(model = %capability.model_id, "catalog upsert");
        self.models
            .write()
            .await
            .insert(capability.model_id.clone(), capability);
    }

    /// Remove one entry. Returns whether it was present.
    pub async fn remove(&self, model_id: &str) -> bool {
        self.models.write().await.remove(model_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.read().await.is_empty()
    }
}

#[async_trait]
impl ModelCapabilityPort for ModelCatalog {
    async fn resolve(&self, model_id: &str) -> Option<ModelCapability> {
        self.models.read().await.get(model_id).cloned()
    }

    async fn all_models(&self) -> Vec<ModelCapability> {
        let mut models: Vec<_> = self.models.read().await.values().cloned().collect();
        models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        models
    }
}
