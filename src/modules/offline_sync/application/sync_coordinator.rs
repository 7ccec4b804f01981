// Offline-first entry point for every product operation.
//
// Responsibilities
// - Try the remote first; mirror successes into the local cache.
// - On transport failure, apply the change locally and queue it in the outbox.
// - Replay the outbox in enqueue order when connectivity returns, one pass at a time.
//
// Cache and outbox are only touched while `local` is held; remote calls never run under it.

use crate::modules::offline_sync::adapters::outbound::local_cache::LocalCache;
use crate::modules::offline_sync::adapters::outbound::outbox::Outbox;
use crate::modules::offline_sync::application::errors::SyncError;
use crate::modules::offline_sync::core::cached_product::CachedProduct;
use crate::modules::offline_sync::core::merge::ConflictPolicy;
use crate::modules::offline_sync::core::outbox_entry::{OutboxEntry, OutboxKind};
use crate::modules::offline_sync::core::ports::{ProductRemote, RemoteError};
use crate::modules::offline_sync::core::sync_report::SyncReport;
use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::{Product, ProductDraft, ProductInput, ProductPatch};
use crate::shared::infrastructure::key_value_store::KeyValueStore;
use chrono::{Local, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub conflict_policy: ConflictPolicy,
    /// Failed replays after which an entry is reported as stalled.
    pub max_replay_attempts: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::ServerWins,
            max_replay_attempts: 5,
        }
    }
}

struct LocalState {
    cache: LocalCache,
    outbox: Outbox,
    /// Placeholder id -> server id, for placeholders confirmed this session.
    aliases: HashMap<i64, i64>,
    /// Placeholders deleted while their CREATE may already be on the wire.
    abandoned: HashSet<i64>,
}

impl LocalState {
    fn resolve(&self, id: i64) -> i64 {
        self.aliases.get(&id).copied().unwrap_or(id)
    }

    async fn still_pending(&self, id: i64) -> bool {
        self.outbox.pending_targets().await.contains(&id)
    }

    async fn placeholder_id(&self) -> i64 {
        let mut reserved: Vec<i64> = self.outbox.pending_targets().await.into_iter().collect();
        reserved.extend(self.aliases.keys().copied());
        reserved.extend(self.abandoned.iter().copied());
        self.cache.next_placeholder_id(reserved).await
    }

    async fn confirm_created(&mut self, placeholder: i64, server_id: i64, still_queued: bool) {
        self.aliases.insert(placeholder, server_id);
        if !still_queued && self.abandoned.remove(&placeholder) {
            tracing::info!(
                placeholder,
                server_id,
                "product was deleted while its creation was replayed, queueing delete"
            );
            self.outbox
                .enqueue(OutboxKind::Delete, server_id, None)
                .await;
            return;
        }
        self.outbox.retarget(placeholder, server_id).await;
        self.cache.rekey(placeholder, server_id).await;
        let pending = self.still_pending(server_id).await;
        self.cache
            .update(server_id, |record| record.offline = pending)
            .await;
    }

    async fn settle(&mut self, id: i64) {
        if !self.still_pending(id).await {
            self.cache.update(id, |record| record.offline = false).await;
        }
    }
}

pub struct SyncCoordinator<TRemote>
where
    TRemote: ProductRemote + 'static,
{
    remote: Arc<TRemote>,
    local: Mutex<LocalState>,
    replay_guard: Mutex<()>,
    connectivity: watch::Sender<bool>,
    settings: SyncSettings,
}

impl<TRemote> SyncCoordinator<TRemote>
where
    TRemote: ProductRemote + 'static,
{
    pub fn new(remote: Arc<TRemote>, store: Arc<dyn KeyValueStore>, settings: SyncSettings) -> Self {
        let (connectivity, _) = watch::channel(false);
        Self {
            remote,
            local: Mutex::new(LocalState {
                cache: LocalCache::new(store.clone()),
                outbox: Outbox::new(store),
                aliases: HashMap::new(),
                abandoned: HashSet::new(),
            }),
            replay_guard: Mutex::new(()),
            connectivity,
            settings,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.connectivity.borrow()
    }

    /// Follows the last known connectivity state.
    pub fn subscribe_connectivity(&self) -> watch::Receiver<bool> {
        self.connectivity.subscribe()
    }

    pub async fn probe(&self) -> bool {
        self.remote.probe().await
    }

    /// Returns true when the flag actually changed.
    fn note_reachability(&self, online: bool) -> bool {
        let changed = self.connectivity.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
        changed
    }

    fn note_failure(&self, error: &RemoteError) {
        self.note_reachability(!error.is_transport());
    }

    pub async fn list(&self, query: &ListQuery) -> Vec<Product> {
        match self.remote.list(query).await {
            Ok(server) => {
                self.note_reachability(true);
                let policy = self.settings.conflict_policy;
                let mut local = self.local.lock().await;
                let pending = local.outbox.pending_work().await;
                if query.filter.is_none() {
                    local
                        .cache
                        .merge_with_server(server.clone(), policy, &pending)
                        .await;
                } else {
                    local.cache.absorb(server.clone(), policy, &pending).await;
                }
                server
            }
            Err(error) => {
                tracing::warn!(%error, "listing from the local cache");
                self.note_failure(&error);
                let cached: Vec<Product> = self
                    .cached()
                    .await
                    .into_iter()
                    .map(|record| record.product)
                    .collect();
                if *query == ListQuery::default() {
                    cached
                } else {
                    query.apply(cached, Local::now().date_naive())
                }
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<Product, SyncError> {
        let id = self.local.lock().await.resolve(id);
        if id < 0 {
            return self.cached_product(id).await;
        }
        match self.remote.get(id).await {
            Ok(product) => {
                self.note_reachability(true);
                let mut local = self.local.lock().await;
                let pending = local.outbox.pending_work().await;
                local
                    .cache
                    .absorb(vec![product.clone()], self.settings.conflict_policy, &pending)
                    .await;
                Ok(local
                    .cache
                    .find(id)
                    .await
                    .map(|record| record.product)
                    .unwrap_or(product))
            }
            Err(RemoteError::NotFound(_)) => {
                self.note_reachability(true);
                Err(SyncError::NotFound(id))
            }
            Err(error) => {
                tracing::warn!(%error, product_id = id, "reading from the local cache");
                self.note_failure(&error);
                self.cached_product(id).await
            }
        }
    }

    async fn cached_product(&self, id: i64) -> Result<Product, SyncError> {
        self.local
            .lock()
            .await
            .cache
            .find(id)
            .await
            .map(|record| record.product)
            .ok_or(SyncError::NotFound(id))
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product, SyncError> {
        let draft = input.validate().map_err(SyncError::Validation)?;
        match self.remote.create(&draft).await {
            Ok(product) => {
                self.note_reachability(true);
                self.local
                    .lock()
                    .await
                    .cache
                    .add(CachedProduct::confirmed(product.clone()))
                    .await;
                tracing::info!(product_id = product.id, "product created");
                Ok(product)
            }
            Err(RemoteError::Validation(errors)) => {
                self.note_reachability(true);
                Err(SyncError::Validation(errors))
            }
            Err(error) => {
                tracing::warn!(%error, "create failed, keeping the product offline");
                self.note_failure(&error);
                let mut local = self.local.lock().await;
                let id = local.placeholder_id().await;
                let product = Product::from_draft(id, draft.clone());
                local
                    .cache
                    .add(CachedProduct::offline_created(product.clone(), Utc::now()))
                    .await;
                local
                    .outbox
                    .enqueue(OutboxKind::Create, id, Some(draft))
                    .await;
                Ok(product)
            }
        }
    }

    pub async fn update(&self, id: i64, patch: ProductPatch) -> Result<Product, SyncError> {
        let (id, cached) = {
            let local = self.local.lock().await;
            let id = local.resolve(id);
            (id, local.cache.find(id).await)
        };
        let base = match cached {
            Some(record) => record.product,
            None if id < 0 => return Err(SyncError::NotFound(id)),
            None => match self.remote.get(id).await {
                Ok(product) => product,
                Err(error) => {
                    self.note_failure(&error);
                    return Err(SyncError::NotFound(id));
                }
            },
        };
        let draft = patch
            .apply_to(&base)
            .validate()
            .map_err(SyncError::Validation)?;

        if id < 0 {
            return self.update_offline(id, draft).await;
        }
        match self.remote.update(id, &draft).await {
            Ok(()) => {
                self.note_reachability(true);
                let product = Product::from_draft(id, draft);
                let mut local = self.local.lock().await;
                local.outbox.supersede(id).await;
                let pending = local.still_pending(id).await;
                let mut record = local
                    .cache
                    .find(id)
                    .await
                    .unwrap_or_else(|| CachedProduct::confirmed(product.clone()));
                record.product = product.clone();
                record.offline = pending;
                local.cache.upsert(record).await;
                tracing::info!(product_id = id, "product updated");
                Ok(product)
            }
            Err(RemoteError::Validation(errors)) => {
                self.note_reachability(true);
                Err(SyncError::Validation(errors))
            }
            Err(RemoteError::NotFound(_)) => {
                self.note_reachability(true);
                Err(SyncError::NotFound(id))
            }
            Err(error) => {
                tracing::warn!(%error, product_id = id, "update failed, applying it offline");
                self.note_failure(&error);
                self.update_offline(id, draft).await
            }
        }
    }

    async fn update_offline(&self, id: i64, draft: ProductDraft) -> Result<Product, SyncError> {
        let mut local = self.local.lock().await;
        let product = Product::from_draft(id, draft.clone());
        let now = Utc::now();
        let updated = local
            .cache
            .update(id, |record| {
                record.product = product;
                record.offline = true;
                record.updated_at = Some(now);
            })
            .await
            .ok_or(SyncError::NotFound(id))?;
        local
            .outbox
            .enqueue(OutboxKind::Update, id, Some(draft))
            .await;
        Ok(updated.product)
    }

    /// Returns whether the product existed, locally or on the server.
    pub async fn delete(&self, id: i64) -> bool {
        let id = self.local.lock().await.resolve(id);
        if id < 0 {
            let mut local = self.local.lock().await;
            let existed = local.cache.remove(id).await.is_some();
            let dropped = local.outbox.discard_target(id).await;
            local.abandoned.insert(id);
            tracing::debug!(placeholder = id, dropped = dropped.len(), "offline product deleted");
            return existed;
        }
        match self.remote.delete(id).await {
            Ok(()) => {
                self.note_reachability(true);
                let mut local = self.local.lock().await;
                local.outbox.supersede(id).await;
                local.cache.remove(id).await;
                tracing::info!(product_id = id, "product deleted");
                true
            }
            Err(RemoteError::NotFound(_)) => {
                self.note_reachability(true);
                let mut local = self.local.lock().await;
                local.outbox.supersede(id).await;
                local.cache.remove(id).await.is_some()
            }
            Err(error) => {
                tracing::warn!(%error, product_id = id, "delete failed, queueing it");
                self.note_failure(&error);
                let mut local = self.local.lock().await;
                let existed = local.cache.remove(id).await.is_some();
                local.outbox.enqueue(OutboxKind::Delete, id, None).await;
                existed
            }
        }
    }

    /// Runs the outbox replay when connectivity comes back.
    ///
    /// Only an offline -> online transition triggers a pass; the report is returned when one ran.
    pub async fn connectivity_changed(&self, online: bool) -> Option<SyncReport> {
        if self.note_reachability(online) && online {
            return self.sync_pending().await;
        }
        None
    }

    /// Replays queued mutations in enqueue order, committing each one as it completes.
    ///
    /// Returns `None` without doing anything when another pass is already running.
    pub async fn sync_pending(&self) -> Option<SyncReport> {
        let Ok(_guard) = self.replay_guard.try_lock() else {
            tracing::debug!("outbox replay already running");
            return None;
        };

        let snapshot = self.local.lock().await.outbox.entries().await;
        let mut report = SyncReport::default();
        for queued in snapshot {
            let current = self
                .local
                .lock()
                .await
                .outbox
                .entries()
                .await
                .into_iter()
                .find(|entry| entry.entry_id == queued.entry_id);
            let Some(entry) = current else {
                continue;
            };
            if entry.kind != OutboxKind::Create && entry.target_id < 0 {
                report.deferred += 1;
                continue;
            }
            let outcome = self.replay(&entry).await;
            self.commit(entry, outcome, &mut report).await;
        }

        let mut local = self.local.lock().await;
        let remaining = local.outbox.entries().await;
        report.remaining = remaining.len();
        report.stalled = remaining
            .iter()
            .filter(|entry| entry.attempts >= self.settings.max_replay_attempts)
            .map(|entry| entry.entry_id)
            .collect();
        if remaining.is_empty() {
            local.outbox.drain().await;
        }
        report.storage_degraded = local.cache.is_degraded() || local.outbox.is_degraded();
        tracing::info!(
            replayed = report.replayed,
            discarded = report.discarded,
            failed = report.failed,
            deferred = report.deferred,
            remaining = report.remaining,
            stalled = report.stalled.len(),
            storage_degraded = report.storage_degraded,
            "outbox replay finished"
        );
        Some(report)
    }

    async fn replay(&self, entry: &OutboxEntry) -> Result<Option<Product>, RemoteError> {
        match (entry.kind, entry.payload.as_ref()) {
            (OutboxKind::Create, Some(draft)) => self.remote.create(draft).await.map(Some),
            (OutboxKind::Update, Some(draft)) => self
                .remote
                .update(entry.target_id, draft)
                .await
                .map(|()| None),
            (OutboxKind::Delete, _) => match self.remote.delete(entry.target_id).await {
                Ok(()) | Err(RemoteError::NotFound(_)) => Ok(None),
                Err(error) => Err(error),
            },
            (_, None) => Err(RemoteError::Validation(vec![
                "queued mutation has no payload".to_string(),
            ])),
        }
    }

    async fn commit(
        &self,
        entry: OutboxEntry,
        outcome: Result<Option<Product>, RemoteError>,
        report: &mut SyncReport,
    ) {
        let mut local = self.local.lock().await;
        match outcome {
            Ok(created) => {
                report.replayed += 1;
                let still_queued = local.outbox.contains(entry.entry_id).await;
                local.outbox.dequeue_confirmed(&[entry.entry_id]).await;
                match (entry.kind, created) {
                    (OutboxKind::Create, Some(product)) => {
                        local
                            .confirm_created(entry.target_id, product.id, still_queued)
                            .await
                    }
                    (OutboxKind::Update, _) => local.settle(entry.target_id).await,
                    (OutboxKind::Delete, _) => {
                        local.cache.remove(entry.target_id).await;
                    }
                    _ => {}
                }
                tracing::debug!(entry_id = %entry.entry_id, kind = ?entry.kind, "queued mutation confirmed");
            }
            Err(error) if error.is_transport() => {
                report.failed += 1;
                let attempts = local
                    .outbox
                    .record_failures(&[entry.entry_id])
                    .await
                    .first()
                    .map_or(entry.attempts, |failed| failed.attempts);
                tracing::warn!(entry_id = %entry.entry_id, attempts, %error, "replay failed, entry stays queued");
            }
            Err(error) => {
                report.discarded += 1;
                tracing::warn!(
                    entry_id = %entry.entry_id,
                    kind = ?entry.kind,
                    target_id = entry.target_id,
                    %error,
                    "server rejected queued mutation, discarding it"
                );
                local.outbox.dequeue_confirmed(&[entry.entry_id]).await;
                match entry.kind {
                    OutboxKind::Create => {
                        report.discarded += local.outbox.discard_target(entry.target_id).await.len();
                        local.cache.remove(entry.target_id).await;
                    }
                    OutboxKind::Update if matches!(error, RemoteError::NotFound(_)) => {
                        report.discarded += local.outbox.discard_target(entry.target_id).await.len();
                        local.cache.remove(entry.target_id).await;
                    }
                    OutboxKind::Update => local.settle(entry.target_id).await,
                    OutboxKind::Delete => {}
                }
            }
        }
    }

    /// Snapshot of the queued mutations, oldest first.
    pub async fn pending(&self) -> Vec<OutboxEntry> {
        self.local.lock().await.outbox.entries().await
    }

    pub async fn cached(&self) -> Vec<CachedProduct> {
        self.local.lock().await.cache.get_all().await
    }

    /// Forgets the cache, the outbox and the session's placeholder aliases.
    pub async fn reset_local_state(&self) {
        let mut local = self.local.lock().await;
        local.cache.clear().await;
        local.outbox.drain().await;
        local.aliases.clear();
        local.abandoned.clear();
        tracing::info!("local state cleared");
    }
}
