//! Cross-checks a freshly ingested raw increment against the historical fine series.
//!
//! Each ingestion session rescales its data independently, so the same dates can
//! come back with a different magnitude. The audit only reports the drift.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::series::mean;
use crate::models::{ScalingAudit, ScalingEstimate, SeriesSet};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// One ingested increment together with when it was ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct IncrementCandidate {
    pub ingested_at: DateTime<Utc>,
    pub data: SeriesSet,
}

/// Most recently ingested candidate.
pub fn latest_increment(candidates: &[IncrementCandidate]) -> Option<&IncrementCandidate> {
    candidates.iter().max_by_key(|candidate| candidate.ingested_at)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Compare mean magnitudes over the timestamps both sides share, per keyword.
///
/// Keywords missing from either side, or without any shared numeric timestamp,
/// are skipped.
pub fn audit_increment(historical: &SeriesSet, increment: &SeriesSet) -> Vec<ScalingAudit> {
    let mut audits = Vec::new();

    for new_series in &increment.series {
        let Some(old_series) = historical.get(&new_series.keyword) else {
            log_warn!("Skipping '{}' (not found in historical data)", new_series.keyword);
            continue;
        };

        let old_by_timestamp: BTreeMap<DateTime<Utc>, f64> = old_series
            .samples
            .iter()
            .filter_map(|sample| sample.value.numeric().map(|v| (sample.timestamp, v)))
            .collect();

        let pairs: Vec<(f64, f64)> = new_series
            .samples
            .iter()
            .filter_map(|sample| {
                let new_value = sample.value.numeric()?;
                let old_value = old_by_timestamp.get(&sample.timestamp)?;
                Some((*old_value, new_value))
            })
            .collect();

        let (Some(historical_mean), Some(new_mean)) = (
            mean(pairs.iter().map(|(old, _)| *old)),
            mean(pairs.iter().map(|(_, new)| *new)),
        ) else {
            log_warn!("No overlapping dates for '{}'", new_series.keyword);
            continue;
        };

        let scaling = if new_mean == 0.0 {
            ScalingEstimate::Infinite
        } else {
            ScalingEstimate::Finite(historical_mean / new_mean)
        };

        let median_ratio = median(
            pairs
                .iter()
                .filter(|(old, new)| *old > 0.0 && *new > 0.0)
                .map(|(old, new)| old / new)
                .collect(),
        );

        log_info!(
            "Scaling factor for '{}': {} over {} shared date(s)",
            new_series.keyword,
            scaling,
            pairs.len()
        );

        audits.push(ScalingAudit {
            keyword: new_series.keyword.clone(),
            historical_mean,
            new_mean,
            scaling,
            overlap: pairs.len(),
            median_ratio,
        });
    }

    audits
}

/// Audit the most recent candidate against the historical series.
pub fn audit_latest<'a>(
    historical: &SeriesSet,
    candidates: &'a [IncrementCandidate],
) -> ReconcileResult<(&'a IncrementCandidate, Vec<ScalingAudit>)> {
    let latest = latest_increment(candidates).ok_or(ReconcileError::NoIncrementAvailable)?;
    log_info!(
        "Auditing increment '{}' ingested at {}",
        latest.data.label,
        latest.ingested_at
    );
    Ok((latest, audit_increment(historical, &latest.data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sample, SampleValue, TimeSeries};
    use chrono::{Duration, TimeZone};

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + Duration::days(d)
    }

    fn series(keyword: &str, start: i64, values: &[f64]) -> TimeSeries {
        TimeSeries::new(
            keyword,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Sample::numeric(day(start + i as i64), *v))
                .collect(),
        )
    }

    #[test]
    fn mean_ratio_over_overlap_only() {
        let historical = SeriesSet::with_series("hist", vec![series("kw", 0, &[100.0, 40.0, 60.0])]);
        let increment = SeriesSet::with_series("inc", vec![series("kw", 1, &[20.0, 30.0, 99.0])]);

        let audits = audit_increment(&historical, &increment);

        assert_eq!(audits.len(), 1);
        let audit = &audits[0];
        assert_eq!(audit.overlap, 2);
        assert_eq!(audit.historical_mean, 50.0);
        assert_eq!(audit.new_mean, 25.0);
        assert_eq!(audit.scaling, ScalingEstimate::Finite(2.0));
        assert_eq!(audit.median_ratio, Some(2.0));
    }

    #[test]
    fn zero_new_mean_is_infinite() {
        let historical = SeriesSet::with_series("hist", vec![series("kw", 0, &[5.0, 5.0])]);
        let increment = SeriesSet::with_series("inc", vec![series("kw", 0, &[0.0, 0.0])]);

        let audits = audit_increment(&historical, &increment);

        assert_eq!(audits[0].scaling, ScalingEstimate::Infinite);
        assert_eq!(audits[0].median_ratio, None);
    }

    #[test]
    fn skips_unknown_keywords_and_empty_overlap() {
        let historical = SeriesSet::with_series(
            "hist",
            vec![series("a", 0, &[1.0]), series("b", 0, &[1.0])],
        );
        let increment = SeriesSet::with_series(
            "inc",
            vec![
                series("a", 10, &[1.0]),
                series("new", 0, &[1.0]),
                TimeSeries::new("b", vec![Sample::new(day(0), SampleValue::BelowThreshold)]),
            ],
        );

        assert!(audit_increment(&historical, &increment).is_empty());
    }

    #[test]
    fn latest_candidate_wins() {
        let older = IncrementCandidate {
            ingested_at: day(0),
            data: SeriesSet::with_series("older", vec![series("kw", 0, &[1.0])]),
        };
        let newer = IncrementCandidate {
            ingested_at: day(3),
            data: SeriesSet::with_series("newer", vec![series("kw", 0, &[4.0])]),
        };
        let historical = SeriesSet::with_series("hist", vec![series("kw", 0, &[8.0])]);

        let candidates = [older, newer];
        let (latest, audits) = audit_latest(&historical, &candidates).unwrap();

        assert_eq!(latest.ingested_at, day(3));
        assert_eq!(latest.data.label, "newer");
        assert_eq!(audits[0].scaling, ScalingEstimate::Finite(2.0));
    }

    #[test]
    fn no_candidates_is_an_error() {
        let historical = SeriesSet::new("hist");
        assert_eq!(
            audit_latest(&historical, &[]).unwrap_err(),
            ReconcileError::NoIncrementAvailable
        );
    }
}
