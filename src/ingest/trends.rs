//! Reader for Google Trends "multiTimeline" CSV exports.
//!
//! Exports open with a short metadata preamble ("Category: ...", a blank line)
//! before the header row, whose first cell names the date column.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::audit::IncrementCandidate;
use crate::ingest::csv::parse_rows;
use crate::models::{Sample, SampleValue, SeriesSet, TimeSeries};
use crate::{log_debug, log_warn};

const ENABLE_LOGS: bool = true;

/// First-cell names that mark the header row.
pub const DATE_HEADERS: [&str; 3] = ["day", "week", "date"];

/// Cell text the source uses for values below its measurable threshold.
pub const BELOW_THRESHOLD: &str = "<1";

pub fn parse_cell(raw: &str) -> SampleValue {
    let trimmed = raw.trim();
    if trimmed == BELOW_THRESHOLD {
        return SampleValue::BelowThreshold;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => SampleValue::Numeric(value),
        _ => SampleValue::Missing,
    }
}

/// `YYYY-MM-DD` as midnight UTC, or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_header(row: &[String]) -> bool {
    row.first()
        .map(|cell| cell.trim().to_ascii_lowercase())
        .is_some_and(|cell| DATE_HEADERS.contains(&cell.as_str()))
}

/// Parse the text of one export into a keyword series set labelled `label`.
///
/// Rows whose date cannot be parsed are skipped; a missing header row is an error.
pub fn parse_trends_export(text: &str, label: &str) -> Result<SeriesSet> {
    let rows = parse_rows(text);
    let Some(header_index) = rows.iter().position(|row| is_header(row)) else {
        bail!("{label}: no header row starting with Day, Week or Date");
    };

    let keywords: Vec<String> = rows[header_index][1..]
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    let mut columns: Vec<Vec<Sample>> = vec![Vec::new(); keywords.len()];

    for (offset, row) in rows[header_index + 1..].iter().enumerate() {
        let Some(timestamp) = row.first().and_then(|cell| parse_date(cell)) else {
            log_warn!(
                "{}: skipping row {} with unparsable date {:?}",
                label,
                header_index + offset + 2,
                row.first()
            );
            continue;
        };

        for (index, column) in columns.iter_mut().enumerate() {
            let value = row
                .get(index + 1)
                .map_or(SampleValue::Missing, |cell| parse_cell(cell));
            column.push(Sample::new(timestamp, value));
        }
    }

    let mut set = SeriesSet::new(label);
    for (keyword, mut samples) in keywords.into_iter().zip(columns) {
        samples.sort_by_key(|sample| sample.timestamp);
        set.insert(TimeSeries::new(keyword, samples));
    }

    log_debug!(
        "{}: {} keyword(s), {} sample(s)",
        label,
        set.series.len(),
        set.sample_count()
    );
    Ok(set)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn read_trends_file(path: &Path) -> Result<SeriesSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_trends_export(&text, &file_label(path))
}

/// CSV files directly inside `dir`, sorted by name.
pub fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every CSV export in `dir`, stamped with its modification time as the ingestion time.
///
/// Files that are not Trends exports are skipped with a warning.
pub fn load_increment_candidates(dir: &Path) -> Result<Vec<IncrementCandidate>> {
    let mut candidates = Vec::new();
    for path in csv_files_in(dir)? {
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let data = match read_trends_file(&path) {
            Ok(data) => data,
            Err(err) => {
                log_warn!("Skipping increment candidate {}: {:#}", path.display(), err);
                continue;
            }
        };
        candidates.push(IncrementCandidate {
            ingested_at: DateTime::<Utc>::from(modified),
            data,
        });
    }
    Ok(candidates)
}
