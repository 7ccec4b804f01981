use thiserror::Error;

/// What the sync client reports to its caller. Transport failures never surface here;
/// they become queued work instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("invalid product: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("product {0} not found")]
    NotFound(i64),
}
