use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{Sample, SampleValue, SeriesSet, TimeSeries};
use crate::{log_debug, log_info};

const ENABLE_LOGS: bool = true;

const PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOutcome {
    pub series: SeriesSet,
    /// Largest reference value seen across every file. Diagnostic only; the
    /// scaling formula does not use it.
    pub reference_peak: Option<f64>,
}

/// `value / reference * 100` with missing or below-threshold entries read as zero.
/// A zero reference yields zero.
pub fn reference_percent(value: SampleValue, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    let scaled = value.zero_filled().unwrap_or(0.0) / reference * PERCENT;
    if scaled.is_finite() {
        scaled
    } else {
        0.0
    }
}

/// Express every non-reference keyword as a percentage of `reference_keyword`,
/// file by file, then concatenate all files in timestamp order.
///
/// Every file must carry the reference keyword; the check runs before any output
/// is produced. Timestamps repeated across files are all kept.
pub fn rescale_to_reference(
    files: &[SeriesSet],
    reference_keyword: &str,
) -> ReconcileResult<ReferenceOutcome> {
    let mut references = Vec::with_capacity(files.len());
    for file in files {
        let reference = file.get(reference_keyword).ok_or_else(|| {
            ReconcileError::MissingReferenceColumn {
                source_label: file.label.clone(),
                keyword: reference_keyword.to_string(),
            }
        })?;
        references.push(reference);
    }

    let reference_peak = references
        .iter()
        .flat_map(|series| series.samples.iter())
        .map(|sample| sample.value.zero_filled().unwrap_or(0.0))
        .fold(None, |peak: Option<f64>, value| Some(peak.map_or(value, |p| p.max(value))));

    log_info!(
        "Reference '{}' across {} file(s), peak {:?}",
        reference_keyword,
        files.len(),
        reference_peak
    );

    let mut keyword_order: Vec<String> = Vec::new();
    let mut combined: BTreeMap<String, Vec<Sample>> = BTreeMap::new();

    for (file, reference) in files.iter().zip(&references) {
        let by_timestamp: BTreeMap<DateTime<Utc>, f64> = reference
            .samples
            .iter()
            .map(|sample| (sample.timestamp, sample.value.zero_filled().unwrap_or(0.0)))
            .collect();

        for series in &file.series {
            if !combined.contains_key(&series.keyword) {
                keyword_order.push(series.keyword.clone());
            }
            let bucket = combined.entry(series.keyword.clone()).or_default();

            if series.keyword == reference_keyword {
                bucket.extend(series.samples.iter().copied());
                continue;
            }

            let mut zero_references = 0usize;
            bucket.extend(series.samples.iter().map(|sample| {
                let reference_value = by_timestamp.get(&sample.timestamp).copied().unwrap_or(0.0);
                if reference_value == 0.0 {
                    zero_references += 1;
                }
                Sample::numeric(sample.timestamp, reference_percent(sample.value, reference_value))
            }));

            if zero_references > 0 {
                log_debug!(
                    "'{}' in {}: {} row(s) with zero reference set to 0",
                    series.keyword,
                    file.label,
                    zero_references
                );
            }
        }
    }

    let mut series = SeriesSet::new(format!("{reference_keyword} (reference-scaled)"));
    for keyword in keyword_order {
        if let Some(mut samples) = combined.remove(&keyword) {
            // Stable: files keep their relative order on equal timestamps.
            samples.sort_by_key(|sample| sample.timestamp);
            series.insert(TimeSeries::new(keyword, samples));
        }
    }

    Ok(ReferenceOutcome {
        series,
        reference_peak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const REF: &str = "Combined Graduate Level Examination: (India)";

    fn day(d: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap() + Duration::days(d)
    }

    fn file(label: &str, offset: i64, reference: &[f64], other: &[SampleValue]) -> SeriesSet {
        let reference = reference
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::numeric(day(offset + i as i64), *v))
            .collect();
        let other = other
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(day(offset + i as i64), *v))
            .collect();
        SeriesSet::with_series(
            label,
            vec![TimeSeries::new(REF, reference), TimeSeries::new("other", other)],
        )
    }

    fn numbers(set: &SeriesSet, keyword: &str) -> Vec<f64> {
        set.get(keyword)
            .unwrap()
            .samples
            .iter()
            .map(|s| s.value.zero_filled().unwrap())
            .collect()
    }

    #[test]
    fn divides_by_reference_and_keeps_reference_unscaled() {
        let input = file(
            "a.csv",
            0,
            &[50.0, 25.0],
            &[SampleValue::Numeric(10.0), SampleValue::Numeric(25.0)],
        );

        let outcome = rescale_to_reference(&[input], REF).unwrap();

        assert_eq!(numbers(&outcome.series, "other"), vec![20.0, 100.0]);
        assert_eq!(numbers(&outcome.series, REF), vec![50.0, 25.0]);
        assert_eq!(outcome.reference_peak, Some(50.0));
    }

    #[test]
    fn zero_reference_yields_zero() {
        let input = file(
            "a.csv",
            0,
            &[0.0, 10.0],
            &[SampleValue::Numeric(7.0), SampleValue::BelowThreshold],
        );

        let outcome = rescale_to_reference(&[input], REF).unwrap();

        let values = numbers(&outcome.series, "other");
        assert_eq!(values, vec![0.0, 0.0]);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn concatenates_files_in_time_order_keeping_overlaps() {
        let later = file("b.csv", 1, &[10.0, 10.0], &[SampleValue::Numeric(1.0), SampleValue::Numeric(2.0)]);
        let earlier = file("a.csv", 0, &[10.0, 10.0], &[SampleValue::Numeric(3.0), SampleValue::Numeric(4.0)]);

        let outcome = rescale_to_reference(&[later, earlier], REF).unwrap();
        let other = outcome.series.get("other").unwrap();

        let stamps: Vec<_> = other.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![day(0), day(1), day(1), day(2)]);
        assert_eq!(numbers(&outcome.series, "other"), vec![30.0, 10.0, 40.0, 20.0]);
    }

    #[test]
    fn missing_reference_column_is_fatal() {
        let good = file("a.csv", 0, &[1.0], &[SampleValue::Numeric(1.0)]);
        let bad = SeriesSet::with_series(
            "b.csv",
            vec![TimeSeries::new("other", vec![Sample::numeric(day(0), 1.0)])],
        );

        let err = rescale_to_reference(&[good, bad], REF).unwrap_err();

        assert_eq!(
            err,
            ReconcileError::MissingReferenceColumn {
                source_label: "b.csv".into(),
                keyword: REF.into(),
            }
        );
    }
}
