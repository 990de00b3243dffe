//! One batch run: read exports, rescale, compare, extend history, audit.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::audit::audit_latest;
use crate::db::Database;
use crate::history::{run_incremental, TrackerOutcome};
use crate::ingest::{
    load_increment_candidates, merge_exports, read_trends_file, sync_auc_history_csv,
    write_audit_csv, write_auc_csv, write_series_csv,
};
use crate::integral::compare_chunks;
use crate::models::{AucRecord, ScalingAudit, ScalingFactor, SeriesSet};
use crate::rescale::{apply_audited_scaling, rescale_by_chunk_means, rescale_to_reference};
use crate::segmentation::{day_span, segment_range, RescaleMethod};
use crate::settings::Settings;
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

pub const RESCALED_FILE: &str = "daily_rescaled.csv";
pub const CHUNK_TABLE_FILE: &str = "auc_chunks.csv";
pub const HISTORY_FILE: &str = "auc_history.csv";
pub const AUDIT_FILE: &str = "scaling_audit.csv";
pub const AUDITED_INCREMENT_FILE: &str = "increment_rescaled.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub increment_label: String,
    pub ingested_at: DateTime<Utc>,
    pub audits: Vec<ScalingAudit>,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub rescaled: SeriesSet,
    /// Per-(keyword, chunk) factors; empty under reference-ratio rescaling.
    pub factors: Vec<ScalingFactor>,
    pub reference_peak: Option<f64>,
    pub chunk_records: Vec<AucRecord>,
    pub history: TrackerOutcome,
    pub audit: Option<AuditReport>,
}

fn output_path(settings: &Settings, name: &str) -> PathBuf {
    settings.output_dir.join(name)
}

struct Rescaled {
    series: SeriesSet,
    factors: Vec<ScalingFactor>,
    reference_peak: Option<f64>,
}

fn rescale_daily(settings: &Settings, weekly: &SeriesSet, daily_files: &[SeriesSet]) -> Result<Rescaled> {
    let config = &settings.reconcile;
    match config.rescale_method {
        RescaleMethod::MeanRatio => {
            let daily = merge_exports("daily", daily_files);
            let outcome = rescale_by_chunk_means(weekly, &daily, config.chunk_width_months)
                .context("mean-ratio rescaling failed")?;
            Ok(Rescaled {
                series: outcome.series,
                factors: outcome.factors,
                reference_peak: None,
            })
        }
        RescaleMethod::ReferenceRatio => {
            let reference = config.reference_keyword.as_deref().unwrap_or_default();
            let outcome = rescale_to_reference(daily_files, reference)
                .context("reference-ratio rescaling failed")?;
            Ok(Rescaled {
                series: outcome.series,
                factors: Vec::new(),
                reference_peak: outcome.reference_peak,
            })
        }
    }
}

/// Audit the newest increment in `increment_dir` against the rescaled history.
fn audit_increments(
    settings: &Settings,
    historical: &SeriesSet,
    db: &mut Database,
) -> Result<Option<AuditReport>> {
    let Some(dir) = settings.increment_dir.as_deref() else {
        return Ok(None);
    };

    let candidates = load_increment_candidates(dir)?;
    let (latest, audits) = audit_latest(historical, &candidates)
        .with_context(|| format!("failed to audit increments in {}", dir.display()))?;

    db.insert_audits(&latest.data.label, latest.ingested_at, &audits)?;
    write_audit_csv(&output_path(settings, AUDIT_FILE), &audits)?;
    write_series_csv(
        &output_path(settings, AUDITED_INCREMENT_FILE),
        &apply_audited_scaling(&latest.data, &audits),
    )?;

    Ok(Some(AuditReport {
        increment_label: latest.data.label.clone(),
        ingested_at: latest.ingested_at,
        audits,
    }))
}

pub fn run_batch(settings: &Settings) -> Result<BatchReport> {
    settings
        .reconcile
        .validate()
        .context("invalid reconcile configuration")?;

    let weekly = read_trends_file(&settings.weekly_path)?;
    let daily_files = settings
        .daily_paths
        .iter()
        .map(|path| read_trends_file(path))
        .collect::<Result<Vec<_>>>()?;
    log_info!(
        "Loaded weekly '{}' ({} keyword(s)) and {} daily file(s)",
        weekly.label,
        weekly.series.len(),
        daily_files.len()
    );

    let Some((overall_start, overall_end)) = day_span(&weekly) else {
        bail!("weekly export '{}' holds no samples", weekly.label);
    };

    let rescaled = rescale_daily(settings, &weekly, &daily_files)?;
    write_series_csv(&output_path(settings, RESCALED_FILE), &rescaled.series)?;

    let chunks = segment_range(overall_start, overall_end, settings.reconcile.chunk_width_months)?;
    let chunk_records = compare_chunks(&weekly, &rescaled.series, &chunks);
    write_auc_csv(&output_path(settings, CHUNK_TABLE_FILE), &chunk_records)?;
    log_info!(
        "Compared {} chunk(s) into {} record(s)",
        chunks.len(),
        chunk_records.len()
    );

    let mut db = Database::new(settings.database_path.clone())?;
    let history = run_incremental(&mut db, &weekly, &rescaled.series, overall_start, overall_end)?;

    // The database is authoritative; the table catches up on rows a failed write missed.
    let stored = db.load_history()?;
    let written = sync_auc_history_csv(&output_path(settings, HISTORY_FILE), stored.records())?;
    if written > history.appended().len() {
        log_warn!(
            "History table was behind the database; wrote {} earlier record(s)",
            written - history.appended().len()
        );
    }

    let audit = audit_increments(settings, &rescaled.series, &mut db)?;

    Ok(BatchReport {
        rescaled: rescaled.series,
        factors: rescaled.factors,
        reference_peak: rescaled.reference_peak,
        chunk_records,
        history,
        audit,
    })
}
