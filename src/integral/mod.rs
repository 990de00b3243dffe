//! Area-under-curve comparison of weekly and daily series.
//!
//! The x-axis is seconds since the Unix epoch, so sample spacing rather than
//! sample count drives the area. Below-threshold values count as zero here, unlike
//! the rescaler's means which exclude them.

use chrono::{DateTime, Utc};

use crate::models::{AucRatio, AucRecord, Chunk, SeriesSet, TimeSeries};
use crate::{log_debug, log_skip};

const ENABLE_LOGS: bool = true;

/// Fewest usable samples a window needs on each side to be compared.
pub const MIN_SAMPLES: usize = 2;

fn epoch_seconds(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) / 1e9
}

/// Trapezoidal integral over `(x, y)` points in x order.
pub fn trapezoid_auc(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| (pair[1].0 - pair[0].0) * (pair[0].1 + pair[1].1) / 2.0)
        .sum()
}

/// Points of `series` inside `chunk` as (epoch seconds, value); below-threshold
/// values become zero and missing values are dropped.
pub fn usable_points(series: &TimeSeries, chunk: &Chunk) -> Vec<(f64, f64)> {
    series
        .within(chunk)
        .filter_map(|sample| {
            sample
                .value
                .zero_filled()
                .map(|value| (epoch_seconds(sample.timestamp), value))
        })
        .collect()
}

pub fn auc_ratio(weekly_auc: f64, daily_auc: f64) -> AucRatio {
    if weekly_auc == 0.0 {
        AucRatio::Undefined
    } else {
        AucRatio::Value(daily_auc / weekly_auc)
    }
}

/// Compare one keyword over one window. `None` when either side has fewer than
/// `MIN_SAMPLES` usable samples.
pub fn compare_window(weekly: &TimeSeries, daily: &TimeSeries, chunk: &Chunk) -> Option<AucRecord> {
    let weekly_points = usable_points(weekly, chunk);
    let daily_points = usable_points(daily, chunk);

    if weekly_points.len() < MIN_SAMPLES || daily_points.len() < MIN_SAMPLES {
        log_skip!(
            weekly.keyword,
            chunk,
            format!(
                "{} weekly / {} daily usable sample(s)",
                weekly_points.len(),
                daily_points.len()
            )
        );
        return None;
    }

    let weekly_auc = trapezoid_auc(&weekly_points);
    let daily_auc = trapezoid_auc(&daily_points);

    Some(AucRecord {
        keyword: weekly.keyword.clone(),
        start: chunk.start,
        end: chunk.end,
        weekly_auc,
        daily_auc,
        ratio: auc_ratio(weekly_auc, daily_auc),
    })
}

/// Compare every keyword shared by both sets over every chunk, keyword-major.
pub fn compare_chunks(weekly: &SeriesSet, daily: &SeriesSet, chunks: &[Chunk]) -> Vec<AucRecord> {
    let mut records = Vec::new();

    for keyword in weekly.shared_keywords(daily) {
        let (Some(weekly_series), Some(daily_series)) = (weekly.get(&keyword), daily.get(&keyword))
        else {
            continue;
        };

        records.extend(
            chunks
                .iter()
                .filter_map(|chunk| compare_window(weekly_series, daily_series, chunk)),
        );
    }

    log_debug!(
        "Compared {} chunk(s), produced {} AUC record(s)",
        chunks.len(),
        records.len()
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sample, SampleValue};
    use crate::rescale::rescale_by_chunk_means;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn series(keyword: &str, points: &[(i64, f64)]) -> TimeSeries {
        TimeSeries::new(
            keyword,
            points
                .iter()
                .map(|(hours, v)| Sample::numeric(t0() + Duration::hours(*hours), *v))
                .collect(),
        )
    }

    #[test]
    fn weekly_vs_rescaled_daily_scenario() {
        let weekly = series("kw", &[(0, 10.0), (24, 20.0)]);
        let raw_daily = series("kw", &[(0, 1.0), (12, 2.0), (24, 3.0)]);
        let rescaled = rescale_by_chunk_means(
            &SeriesSet::with_series("weekly", vec![weekly.clone()]),
            &SeriesSet::with_series("daily", vec![raw_daily]),
            6,
        )
        .unwrap();
        assert_eq!(rescaled.factors[0].factor, 7.5);

        let daily = rescaled.series.get("kw").unwrap();
        let values: Vec<f64> = daily.samples.iter().filter_map(|s| s.value.numeric()).collect();
        assert_eq!(values, vec![7.5, 15.0, 22.5]);

        let chunk = Chunk::closed(t0(), t0() + Duration::days(1));
        let record = compare_window(&weekly, daily, &chunk).unwrap();

        assert!((record.weekly_auc - 1_296_000.0).abs() < 1e-6);
        assert!((record.daily_auc - 1_296_000.0).abs() < 1e-6);
        assert!((record.ratio.value().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identical_series_have_unit_ratio() {
        let points = [(0, 3.0), (24, 8.0), (48, 1.0), (96, 4.0)];
        let chunk = Chunk::closed(t0(), t0() + Duration::days(4));

        let record = compare_window(&series("kw", &points), &series("kw", &points), &chunk).unwrap();

        assert_eq!(record.ratio, AucRatio::Value(1.0));
    }

    #[test]
    fn single_sample_is_skipped() {
        let chunk = Chunk::closed(t0(), t0() + Duration::days(1));
        let weekly = series("kw", &[(0, 10.0)]);
        let daily = series("kw", &[(0, 1.0), (12, 2.0)]);

        assert!(compare_window(&weekly, &daily, &chunk).is_none());
        assert!(compare_window(&daily, &weekly, &chunk).is_none());
    }

    #[test]
    fn below_threshold_counts_as_zero_area() {
        let chunk = Chunk::closed(t0(), t0() + Duration::days(2));
        let weekly = series("kw", &[(0, 2.0), (48, 2.0)]);
        let daily = TimeSeries::new(
            "kw",
            vec![
                Sample::new(t0(), SampleValue::BelowThreshold),
                Sample::numeric(t0() + Duration::days(1), 2.0),
                Sample::new(t0() + Duration::days(2), SampleValue::Missing),
            ],
        );

        let record = compare_window(&weekly, &daily, &chunk).unwrap();

        assert!((record.daily_auc - 86_400.0).abs() < 1e-6);
    }

    #[test]
    fn zero_weekly_area_is_undefined() {
        let chunk = Chunk::closed(t0(), t0() + Duration::days(1));
        let weekly = series("kw", &[(0, 0.0), (24, 0.0)]);
        let daily = series("kw", &[(0, 1.0), (24, 1.0)]);

        let record = compare_window(&weekly, &daily, &chunk).unwrap();

        assert_eq!(record.ratio, AucRatio::Undefined);
    }

    #[test]
    fn compare_chunks_uses_shared_keywords_only() {
        let weekly = SeriesSet::with_series(
            "weekly",
            vec![series("b", &[(0, 1.0), (24, 1.0)]), series("a", &[(0, 1.0), (24, 1.0)])],
        );
        let daily = SeriesSet::with_series(
            "daily",
            vec![series("a", &[(0, 1.0), (24, 1.0)]), series("z", &[(0, 1.0), (24, 1.0)])],
        );
        let chunks = [Chunk::closed(t0(), t0() + Duration::days(1))];

        let records = compare_chunks(&weekly, &daily, &chunks);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keyword, "a");
    }
}
