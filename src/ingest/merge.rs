use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::series::mean;
use crate::models::{Sample, SampleValue, SeriesSet, TimeSeries};

#[derive(Default)]
struct Bucket {
    numeric: Vec<f64>,
    below_threshold: bool,
}

impl Bucket {
    fn add(&mut self, value: SampleValue) {
        match value {
            SampleValue::Numeric(_) => {
                if let Some(v) = value.numeric() {
                    self.numeric.push(v);
                }
            }
            SampleValue::BelowThreshold => self.below_threshold = true,
            SampleValue::Missing => {}
        }
    }

    fn resolve(self) -> SampleValue {
        match mean(self.numeric.into_iter()) {
            Some(value) => SampleValue::Numeric(value),
            None if self.below_threshold => SampleValue::BelowThreshold,
            None => SampleValue::Missing,
        }
    }
}

/// Combine several exports of the same cadence into one set.
///
/// Overlapping (keyword, timestamp) cells are averaged over their numeric
/// values. A cell with only below-threshold reports stays below threshold.
pub fn merge_exports(label: &str, exports: &[SeriesSet]) -> SeriesSet {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: BTreeMap<String, BTreeMap<DateTime<Utc>, Bucket>> = BTreeMap::new();

    for export in exports {
        for series in &export.series {
            if !buckets.contains_key(&series.keyword) {
                order.push(series.keyword.clone());
            }
            let by_timestamp = buckets.entry(series.keyword.clone()).or_default();
            for sample in &series.samples {
                by_timestamp.entry(sample.timestamp).or_default().add(sample.value);
            }
        }
    }

    let mut merged = SeriesSet::new(label);
    for keyword in order {
        let Some(by_timestamp) = buckets.remove(&keyword) else {
            continue;
        };
        let samples = by_timestamp
            .into_iter()
            .map(|(timestamp, bucket)| Sample::new(timestamp, bucket.resolve()))
            .collect();
        merged.insert(TimeSeries::new(keyword, samples));
    }
    merged
}
