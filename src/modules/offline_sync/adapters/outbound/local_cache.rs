use crate::modules::offline_sync::core::cached_product::CachedProduct;
use crate::modules::offline_sync::core::merge::{
    ConflictPolicy, PendingWork, absorb_server_records, merge_with_server,
};
use crate::modules::products::core::product::Product;
use crate::shared::infrastructure::key_value_store::KeyValueStore;
use crate::shared::infrastructure::key_value_store::json_slot::JsonSlot;
use std::sync::Arc;

pub const LOCAL_CACHE_KEY: &str = "products_offline";

/// Durable product collection, keyed by id, in insertion order.
pub struct LocalCache {
    slot: JsonSlot<CachedProduct>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            slot: JsonSlot::new(store, LOCAL_CACHE_KEY),
        }
    }

    pub async fn get_all(&self) -> Vec<CachedProduct> {
        self.slot.load().await
    }

    pub async fn save(&mut self, all: Vec<CachedProduct>) {
        self.slot.save(all).await;
    }

    pub async fn find(&self, id: i64) -> Option<CachedProduct> {
        self.get_all().await.into_iter().find(|record| record.id() == id)
    }

    /// Appends, dropping any older copy with the same id.
    pub async fn add(&mut self, record: CachedProduct) {
        let mut all = self.get_all().await;
        all.retain(|existing| existing.id() != record.id());
        all.push(record);
        self.save(all).await;
    }

    /// Replaces in place, or appends when the id is new.
    pub async fn upsert(&mut self, record: CachedProduct) {
        let mut all = self.get_all().await;
        match all.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => all.push(record),
        }
        self.save(all).await;
    }

    pub async fn update(
        &mut self,
        id: i64,
        change: impl FnOnce(&mut CachedProduct),
    ) -> Option<CachedProduct> {
        let mut all = self.get_all().await;
        let record = all.iter_mut().find(|existing| existing.id() == id)?;
        change(record);
        let updated = record.clone();
        self.save(all).await;
        Some(updated)
    }

    pub async fn remove(&mut self, id: i64) -> Option<CachedProduct> {
        let mut all = self.get_all().await;
        let position = all.iter().position(|existing| existing.id() == id)?;
        let removed = all.remove(position);
        self.save(all).await;
        Some(removed)
    }

    /// Moves a record to a new id, replacing anything already stored under it.
    pub async fn rekey(&mut self, from: i64, to: i64) -> bool {
        let mut all = self.get_all().await;
        if !all.iter().any(|existing| existing.id() == from) {
            return false;
        }
        all.retain(|existing| existing.id() != to);
        for record in all.iter_mut().filter(|existing| existing.id() == from) {
            record.product.id = to;
        }
        self.save(all).await;
        true
    }

    /// A strictly negative id distinct from every cached id and every id in `reserved`.
    pub async fn next_placeholder_id(&self, reserved: impl IntoIterator<Item = i64>) -> i64 {
        let largest = self
            .get_all()
            .await
            .iter()
            .map(CachedProduct::id)
            .chain(reserved)
            .map(i64::unsigned_abs)
            .max()
            .unwrap_or(0);
        -(i64::try_from(largest).unwrap_or(i64::MAX - 1) + 1)
    }

    pub async fn merge_with_server(
        &mut self,
        server: Vec<Product>,
        policy: ConflictPolicy,
        pending: &PendingWork,
    ) {
        let merged = merge_with_server(self.get_all().await, server, policy, pending);
        self.save(merged).await;
    }

    pub async fn absorb(
        &mut self,
        server: Vec<Product>,
        policy: ConflictPolicy,
        pending: &PendingWork,
    ) {
        let absorbed = absorb_server_records(self.get_all().await, server, policy, pending);
        self.save(absorbed).await;
    }

    pub async fn clear(&mut self) {
        self.slot.clear().await;
    }

    pub fn is_degraded(&self) -> bool {
        self.slot.is_degraded()
    }
}
