use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structural failures raised by the reconciliation core.
///
/// Skip conditions (too few samples in a window, an empty overlap, a keyword that
/// exists on one side only) never surface here; they are logged and omitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("reference keyword '{keyword}' not found in {source_label}")]
    MissingReferenceColumn {
        source_label: String,
        keyword: String,
    },

    #[error("reference-ratio rescaling requires a reference keyword")]
    MissingReferenceKeyword,

    #[error("chunk width must be at least one month, got {0}")]
    InvalidChunkWidth(u32),

    #[error("no increment available to audit")]
    NoIncrementAvailable,

    #[error("history store ends at {store_end} but cursor is {cursor:?}")]
    CursorBehindStore {
        store_end: DateTime<Utc>,
        cursor: Option<DateTime<Utc>>,
    },
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
