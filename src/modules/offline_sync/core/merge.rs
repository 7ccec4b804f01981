// Reconciling a server listing with the local cache.
//
// Under either policy a local record is kept over the server copy while it carries
// unconfirmed edits or the outbox still holds a mutation for it, and placeholder
// records are never dropped. Server records with a queued DELETE are left out.

use crate::modules::offline_sync::core::cached_product::CachedProduct;
use crate::modules::offline_sync::core::outbox_entry::{OutboxEntry, OutboxKind};
use crate::modules::products::core::product::Product;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Any cached copy of a server id beats the server copy.
    LocalWins,
    /// The server copy replaces cached copies that have nothing pending.
    #[default]
    ServerWins,
}

/// What the outbox still owes the server, as seen by a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWork {
    /// Ids any queued entry targets.
    pub targets: HashSet<i64>,
    /// Ids with a queued DELETE.
    pub deletes: HashSet<i64>,
}

impl PendingWork {
    pub fn from_entries(entries: &[OutboxEntry]) -> Self {
        let mut pending = Self::default();
        for entry in entries {
            pending.targets.insert(entry.target_id);
            if entry.kind == OutboxKind::Delete {
                pending.deletes.insert(entry.target_id);
            }
        }
        pending
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown conflict policy {0:?}, expected local-wins or server-wins")]
pub struct UnknownConflictPolicy(pub String);

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::LocalWins => "local-wins",
            ConflictPolicy::ServerWins => "server-wins",
        }
    }

    fn keeps_local(&self, local: &CachedProduct, pending: &PendingWork) -> bool {
        match self {
            ConflictPolicy::LocalWins => true,
            ConflictPolicy::ServerWins => local.offline || pending.targets.contains(&local.id()),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = UnknownConflictPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local-wins" | "local" => Ok(ConflictPolicy::LocalWins),
            "server-wins" | "server" => Ok(ConflictPolicy::ServerWins),
            _ => Err(UnknownConflictPolicy(raw.to_string())),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rebuilds the cache from a complete server listing.
///
/// Server order comes first. Local records the server no longer lists survive only
/// when they are placeholders or still have something to push.
pub fn merge_with_server(
    local: Vec<CachedProduct>,
    server: Vec<Product>,
    policy: ConflictPolicy,
    pending: &PendingWork,
) -> Vec<CachedProduct> {
    let mut by_id: HashMap<i64, CachedProduct> =
        local.iter().cloned().map(|record| (record.id(), record)).collect();
    let server_ids: HashSet<i64> = server.iter().map(|product| product.id).collect();

    let mut merged: Vec<CachedProduct> = server
        .into_iter()
        .filter(|product| !pending.deletes.contains(&product.id))
        .map(|product| match by_id.remove(&product.id) {
            Some(cached) if policy.keeps_local(&cached, pending) => cached,
            _ => CachedProduct::confirmed(product),
        })
        .collect();

    merged.extend(local.into_iter().filter(|record| {
        !server_ids.contains(&record.id())
            && (record.product.is_placeholder()
                || record.offline
                || pending.targets.contains(&record.id()))
    }));
    merged
}

/// Folds a partial (filtered) server listing into the cache without dropping anything.
pub fn absorb_server_records(
    mut local: Vec<CachedProduct>,
    server: Vec<Product>,
    policy: ConflictPolicy,
    pending: &PendingWork,
) -> Vec<CachedProduct> {
    for product in server
        .into_iter()
        .filter(|product| !pending.deletes.contains(&product.id))
    {
        match local.iter_mut().find(|record| record.id() == product.id) {
            Some(cached) if policy.keeps_local(cached, pending) => {}
            Some(cached) => *cached = CachedProduct::confirmed(product),
            None => local.push(CachedProduct::confirmed(product)),
        }
    }
    local
}
