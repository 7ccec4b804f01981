use crate::shared::infrastructure::key_value_store::KeyValueStore;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// A JSON array persisted under one key.
///
/// Reads never fail: a missing, unreadable or corrupt record is an empty
/// collection. A write that the store rejects is kept in memory and served by
/// later reads until a subsequent write persists.
pub struct JsonSlot<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    unsaved: Option<Vec<T>>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            unsaved: None,
        }
    }

    /// True while the slot is holding a value the store refused.
    pub fn is_degraded(&self) -> bool {
        self.unsaved.is_some()
    }

    pub async fn load(&self) -> Vec<T> {
        if let Some(items) = &self.unsaved {
            return items.clone();
        }
        let raw = match self.store.get(self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!(key = self.key, %error, "storage read failed, using an empty collection");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(key = self.key, %error, "stored record is corrupt, using an empty collection");
                Vec::new()
            }
        }
    }

    pub async fn save(&mut self, items: Vec<T>) {
        let raw = match serde_json::to_string(&items) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(key = self.key, %error, "could not encode collection, keeping it in memory");
                self.unsaved = Some(items);
                return;
            }
        };
        match self.store.set(self.key, raw).await {
            Ok(()) => self.unsaved = None,
            Err(error) => {
                tracing::warn!(key = self.key, %error, "storage write failed, keeping collection in memory");
                self.unsaved = Some(items);
            }
        }
    }

    pub async fn clear(&mut self) {
        match self.store.remove(self.key).await {
            Ok(()) => self.unsaved = None,
            Err(error) => {
                tracing::warn!(key = self.key, %error, "storage remove failed, clearing in memory only");
                self.unsaved = Some(Vec::new());
            }
        }
    }
}
