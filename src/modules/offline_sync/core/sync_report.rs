use uuid::Uuid;

/// Outcome of one outbox replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub replayed: usize,
    pub discarded: usize,
    pub failed: usize,
    pub deferred: usize,
    pub remaining: usize,
    /// Entries that have failed at least the configured number of times.
    pub stalled: Vec<Uuid>,
    /// The cache or the outbox is only held in memory because storage refused a write.
    pub storage_degraded: bool,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.remaining == 0
    }
}
