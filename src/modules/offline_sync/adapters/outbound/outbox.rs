use crate::modules::offline_sync::core::merge::PendingWork;
use crate::modules::offline_sync::core::outbox_entry::{OutboxEntry, OutboxKind};
use crate::modules::products::core::product::ProductDraft;
use crate::shared::infrastructure::key_value_store::KeyValueStore;
use crate::shared::infrastructure::key_value_store::json_slot::JsonSlot;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub const OUTBOX_KEY: &str = "sync_queue";

/// Durable FIFO of mutations the server has not confirmed.
pub struct Outbox {
    slot: JsonSlot<OutboxEntry>,
}

impl Outbox {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            slot: JsonSlot::new(store, OUTBOX_KEY),
        }
    }

    pub async fn enqueue(
        &mut self,
        kind: OutboxKind,
        target_id: i64,
        payload: Option<ProductDraft>,
    ) -> OutboxEntry {
        let entry = OutboxEntry::new(kind, target_id, payload);
        let mut entries = self.entries().await;
        entries.push(entry.clone());
        self.slot.save(entries).await;
        tracing::debug!(entry_id = %entry.entry_id, ?kind, target_id, "mutation queued");
        entry
    }

    pub async fn entries(&self) -> Vec<OutboxEntry> {
        self.slot.load().await
    }

    pub async fn is_empty(&self) -> bool {
        self.entries().await.is_empty()
    }

    pub async fn contains(&self, entry_id: Uuid) -> bool {
        self.entries()
            .await
            .iter()
            .any(|entry| entry.entry_id == entry_id)
    }

    /// Ids some queued entry still targets.
    pub async fn pending_targets(&self) -> HashSet<i64> {
        self.entries()
            .await
            .iter()
            .map(|entry| entry.target_id)
            .collect()
    }

    pub async fn pending_work(&self) -> PendingWork {
        PendingWork::from_entries(&self.entries().await)
    }

    pub async fn dequeue_confirmed(&mut self, entry_ids: &[Uuid]) {
        self.retain(|entry| !entry_ids.contains(&entry.entry_id)).await;
    }

    pub async fn retarget(&mut self, from: i64, to: i64) {
        let mut entries = self.entries().await;
        let mut changed = false;
        for entry in entries.iter_mut().filter(|entry| entry.target_id == from) {
            entry.target_id = to;
            changed = true;
        }
        if changed {
            self.slot.save(entries).await;
        }
    }

    /// Bumps `attempts` on each listed entry and returns the entries as stored.
    pub async fn record_failures(&mut self, entry_ids: &[Uuid]) -> Vec<OutboxEntry> {
        let mut entries = self.entries().await;
        let mut failed = Vec::new();
        for entry in entries
            .iter_mut()
            .filter(|entry| entry_ids.contains(&entry.entry_id))
        {
            entry.attempts = entry.attempts.saturating_add(1);
            failed.push(entry.clone());
        }
        if !failed.is_empty() {
            self.slot.save(entries).await;
        }
        failed
    }

    /// Drops queued UPDATEs for `target_id`; a later confirmed write already covers them.
    pub async fn supersede(&mut self, target_id: i64) -> usize {
        self.retain(|entry| !(entry.kind == OutboxKind::Update && entry.target_id == target_id))
            .await
    }

    /// Drops every entry for `target_id` and returns their ids.
    pub async fn discard_target(&mut self, target_id: i64) -> Vec<Uuid> {
        let dropped: Vec<Uuid> = self
            .entries()
            .await
            .iter()
            .filter(|entry| entry.target_id == target_id)
            .map(|entry| entry.entry_id)
            .collect();
        if !dropped.is_empty() {
            self.retain(|entry| entry.target_id != target_id).await;
        }
        dropped
    }

    pub fn is_degraded(&self) -> bool {
        self.slot.is_degraded()
    }

    /// Empties the queue and removes its persisted record.
    pub async fn drain(&mut self) {
        self.slot.clear().await;
    }

    async fn retain(&mut self, keep: impl Fn(&OutboxEntry) -> bool) -> usize {
        let mut entries = self.entries().await;
        let before = entries.len();
        entries.retain(|entry| keep(entry));
        let removed = before - entries.len();
        if removed > 0 {
            self.slot.save(entries).await;
        }
        removed
    }
}

#[cfg(test)]
mod outbox_tests {
    use super::*;
    use crate::shared::infrastructure::key_value_store::in_memory::InMemoryKeyValueStore;
    use crate::tests::fixtures::products::ProductInputBuilder;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    fn draft() -> Option<ProductDraft> {
        Some(ProductInputBuilder::new().build().validate().unwrap())
    }

    fn kinds(entries: &[OutboxEntry]) -> Vec<(OutboxKind, i64)> {
        entries.iter().map(|e| (e.kind, e.target_id)).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_enqueue_order_without_deduplicating(store: Arc<InMemoryKeyValueStore>) {
        let mut outbox = Outbox::new(store.clone());
        outbox.enqueue(OutboxKind::Create, -1, draft()).await;
        outbox.enqueue(OutboxKind::Update, -1, draft()).await;
        outbox.enqueue(OutboxKind::Update, -1, draft()).await;

        let reopened = Outbox::new(store);
        assert_eq!(
            kinds(&reopened.entries().await),
            vec![
                (OutboxKind::Create, -1),
                (OutboxKind::Update, -1),
                (OutboxKind::Update, -1)
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_dequeue_by_entry_id_not_target(store: Arc<InMemoryKeyValueStore>) {
        let mut outbox = Outbox::new(store);
        let create = outbox.enqueue(OutboxKind::Create, -1, draft()).await;
        let update = outbox.enqueue(OutboxKind::Update, -1, draft()).await;

        outbox.dequeue_confirmed(&[create.entry_id]).await;

        let remaining = outbox.entries().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].entry_id, update.entry_id);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_retarget_entries_after_a_placeholder_is_confirmed(
        store: Arc<InMemoryKeyValueStore>,
    ) {
        let mut outbox = Outbox::new(store);
        outbox.enqueue(OutboxKind::Update, -1, draft()).await;
        outbox.enqueue(OutboxKind::Delete, -2, None).await;

        outbox.retarget(-1, 12).await;

        assert_eq!(outbox.pending_targets().await, HashSet::from([12, -2]));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_count_failed_attempts(store: Arc<InMemoryKeyValueStore>) {
        let mut outbox = Outbox::new(store);
        let entry = outbox.enqueue(OutboxKind::Delete, 3, None).await;

        outbox.record_failures(&[entry.entry_id]).await;
        let failed = outbox.record_failures(&[entry.entry_id]).await;

        assert_eq!(failed[0].attempts, 2);
        assert_eq!(outbox.entries().await[0].attempts, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_supersede_only_updates_for_the_target(store: Arc<InMemoryKeyValueStore>) {
        let mut outbox = Outbox::new(store);
        outbox.enqueue(OutboxKind::Update, 4, draft()).await;
        outbox.enqueue(OutboxKind::Update, 5, draft()).await;
        outbox.enqueue(OutboxKind::Delete, 4, None).await;

        assert_eq!(outbox.supersede(4).await, 1);
        assert_eq!(
            kinds(&outbox.entries().await),
            vec![(OutboxKind::Update, 5), (OutboxKind::Delete, 4)]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_drain_the_persisted_record(store: Arc<InMemoryKeyValueStore>) {
        let mut outbox = Outbox::new(store.clone());
        outbox.enqueue(OutboxKind::Delete, 3, None).await;

        outbox.drain().await;

        assert!(outbox.is_empty().await);
        assert_eq!(store.get(OUTBOX_KEY).await.unwrap(), None);
    }
}
