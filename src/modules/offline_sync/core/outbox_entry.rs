use crate::modules::products::core::product::ProductDraft;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutboxKind {
    Create,
    Update,
    Delete,
}

/// One mutation waiting for the server to confirm it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    /// Time-ordered and unique; the key entries are confirmed by.
    pub entry_id: Uuid,
    pub kind: OutboxKind,
    pub target_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ProductDraft>,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
}

impl OutboxEntry {
    pub fn new(kind: OutboxKind, target_id: i64, payload: Option<ProductDraft>) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            kind,
            target_id,
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }
}
