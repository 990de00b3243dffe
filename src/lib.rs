#[macro_use]
mod utils;

pub mod audit;
pub mod db;
pub mod error;
pub mod history;
pub mod ingest;
pub mod integral;
pub mod models;
pub mod pipeline;
pub mod rescale;
pub mod segmentation;
pub mod settings;

use std::path::{Path, PathBuf};

use anyhow::Result;
use history::TrackerOutcome;
use log::{info, warn};
use settings::Settings;

pub use error::{ReconcileError, ReconcileResult};
pub use pipeline::{run_batch, BatchReport};

pub const DEFAULT_SETTINGS_FILE: &str = "trend_reconcile.json";

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    info!("trend_reconcile starting with settings {}", settings_path.display());

    let base = settings_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let settings = Settings::load(&settings_path)?.resolved_against(base);

    let report = run_batch(&settings)?;

    match &report.history {
        TrackerOutcome::UpToDate { .. } => info!("History already up to date"),
        TrackerOutcome::NothingComparable { .. } => {
            warn!("New span had too few samples; history unchanged")
        }
        TrackerOutcome::Appended { records, .. } => {
            info!("History extended by {} record(s)", records.len())
        }
    }
    if let Some(audit) = &report.audit {
        info!(
            "Audited '{}': {} keyword(s)",
            audit.increment_label,
            audit.audits.len()
        );
    }
    info!(
        "Wrote {} chunk comparison(s) to {}",
        report.chunk_records.len(),
        settings.output_dir.display()
    );
    Ok(())
}
