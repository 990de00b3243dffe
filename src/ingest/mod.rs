//! File boundary of the engine: reading Trends exports and writing result tables.

pub mod csv;
pub mod export;
pub mod merge;
pub mod trends;

pub use export::{
    append_auc_csv, sync_auc_history_csv, write_audit_csv, write_auc_csv, write_series_csv,
};
pub use merge::merge_exports;
pub use trends::{load_increment_candidates, parse_trends_export, read_trends_file};
