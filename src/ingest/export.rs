//! CSV writers for the rescaled series and the comparison tables.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};

use crate::ingest::csv::{parse_rows, write_row};
use crate::ingest::trends::BELOW_THRESHOLD;
use crate::models::{AucRecord, SampleValue, ScalingAudit, SeriesSet};

pub const AUC_HEADER: [&str; 6] = [
    "Keyword",
    "Start",
    "End",
    "Weekly AUC",
    "Daily AUC",
    "AUC Ratio",
];

pub const AUDIT_HEADER: [&str; 4] = ["Keyword", "Historical Mean", "New Mean", "Scaling"];

/// Midnight timestamps as `YYYY-MM-DD`, anything else as RFC 3339.
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    if timestamp.time() == NaiveTime::MIN {
        timestamp.format("%Y-%m-%d").to_string()
    } else {
        timestamp.to_rfc3339()
    }
}

fn format_value(value: Option<SampleValue>) -> String {
    match value {
        Some(SampleValue::Numeric(v)) => v.to_string(),
        Some(SampleValue::BelowThreshold) => BELOW_THRESHOLD.to_string(),
        Some(SampleValue::Missing) | None => String::new(),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Wide table: one `Date` column then one column per keyword.
///
/// A timestamp repeated within a series gets one row per occurrence.
pub fn write_series<W: Write>(mut out: W, set: &SeriesSet) -> Result<()> {
    let mut header = vec!["Date".to_string()];
    header.extend(set.keywords().map(str::to_string));
    write_row(&mut out, header.as_slice())?;

    let width = set.series.len();
    let mut rows: BTreeMap<(DateTime<Utc>, usize), Vec<Option<SampleValue>>> = BTreeMap::new();
    for (column, series) in set.series.iter().enumerate() {
        let mut seen: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
        for sample in &series.samples {
            let occurrence = seen.entry(sample.timestamp).or_insert(0);
            let cells = rows
                .entry((sample.timestamp, *occurrence))
                .or_insert_with(|| vec![None; width]);
            cells[column] = Some(sample.value);
            *occurrence += 1;
        }
    }

    for ((timestamp, _), cells) in rows {
        let mut row = vec![format_date(timestamp)];
        row.extend(cells.into_iter().map(format_value));
        write_row(&mut out, row.as_slice())?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_series_csv(path: &Path, set: &SeriesSet) -> Result<()> {
    write_series(create(path)?, set).with_context(|| format!("failed to write {}", path.display()))
}

fn auc_row(record: &AucRecord) -> [String; 6] {
    [
        record.keyword.clone(),
        format_date(record.start),
        format_date(record.end),
        format!("{:.2}", record.weekly_auc),
        format!("{:.2}", record.daily_auc),
        record.ratio.to_string(),
    ]
}

pub fn write_auc_records<W: Write>(mut out: W, records: &[AucRecord], header: bool) -> Result<()> {
    if header {
        write_row(&mut out, &AUC_HEADER[..])?;
    }
    for record in records {
        write_row(&mut out, &auc_row(record)[..])?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_auc_csv(path: &Path, records: &[AucRecord]) -> Result<()> {
    write_auc_records(create(path)?, records, true)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Append to a running history table, writing the header only into a new or empty file.
pub fn append_auc_csv(path: &Path, records: &[AucRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let needs_header = fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    write_auc_records(BufWriter::new(file), records, needs_header)
        .with_context(|| format!("failed to append to {}", path.display()))
}

fn count_data_rows(text: &str) -> usize {
    let rows = parse_rows(text);
    let has_header = rows
        .first()
        .and_then(|row| row.first())
        .is_some_and(|cell| cell == AUC_HEADER[0]);
    rows.len() - usize::from(has_header)
}

/// Bring a history table level with `records`, the full stored history in
/// insertion order. Rows already in the file are kept; only the missing tail is
/// appended. Returns how many rows were written.
pub fn sync_auc_history_csv(path: &Path, records: &[AucRecord]) -> Result<usize> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => count_data_rows(&text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
        Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
    };
    let missing = records.get(existing..).unwrap_or_default();
    if missing.is_empty() {
        return Ok(0);
    }
    append_auc_csv(path, missing)?;
    Ok(missing.len())
}

pub fn write_audits<W: Write>(mut out: W, audits: &[ScalingAudit]) -> Result<()> {
    write_row(&mut out, &AUDIT_HEADER[..])?;
    for audit in audits {
        write_row(
            &mut out,
            &[
                audit.keyword.clone(),
                format!("{:.2}", audit.historical_mean),
                format!("{:.2}", audit.new_mean),
                audit.scaling.to_string(),
            ][..],
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_audit_csv(path: &Path, audits: &[ScalingAudit]) -> Result<()> {
    write_audits(create(path)?, audits).with_context(|| format!("failed to write {}", path.display()))
}
