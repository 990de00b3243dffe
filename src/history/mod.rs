//! Incremental, append-only history of AUC comparisons.
//!
//! The tracker itself is pure: it takes a `ProcessingCursor` and `HistoryStore` by
//! value and hands back the advanced pair. Persisting them is left to a
//! `HistoryBackend`, which must write records and cursor atomically.

pub mod state;
pub mod tracker;

pub use state::{HistoryStore, ProcessingCursor, TrackerState};
pub use tracker::{
    advance, plan_run, run_incremental, Advance, HistoryBackend, InMemoryHistory, RunPlan,
    TrackerOutcome,
};
