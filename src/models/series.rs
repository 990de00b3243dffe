//! Keyword time series handed to the core by the ingestion layer.
//!
//! A `SeriesSet` is one source (a weekly export, a merged daily file, one chunk
//! export) holding a `TimeSeries` per keyword column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Chunk;

/// Raw value of a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SampleValue {
    Numeric(f64),
    /// Reported by the source as "<1": present, but below measurable threshold.
    BelowThreshold,
    /// Empty or unparsable cell.
    Missing,
}

impl SampleValue {
    /// Numeric value, with non-numeric entries treated as missing.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            SampleValue::Numeric(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Numeric value with below-threshold entries coerced to zero.
    /// Missing entries stay missing.
    pub fn zero_filled(&self) -> Option<f64> {
        match self {
            SampleValue::Numeric(value) if value.is_finite() => Some(*value),
            SampleValue::BelowThreshold => Some(0.0),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.zero_filled().is_some()
    }

    /// Multiplies numeric values; non-numeric entries are returned unchanged.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            SampleValue::Numeric(value) => SampleValue::Numeric(value * factor),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: SampleValue,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: SampleValue) -> Self {
        Self { timestamp, value }
    }

    pub fn numeric(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::new(timestamp, SampleValue::Numeric(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub keyword: String,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(keyword: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            keyword: keyword.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn within<'a>(&'a self, chunk: &'a Chunk) -> impl Iterator<Item = &'a Sample> + 'a {
        self.samples
            .iter()
            .filter(move |sample| chunk.contains(sample.timestamp))
    }

    /// Arithmetic mean of the numeric samples inside `chunk`, or `None` when the
    /// chunk holds no numeric sample.
    pub fn numeric_mean_within(&self, chunk: &Chunk) -> Option<f64> {
        mean(self.within(chunk).filter_map(|sample| sample.value.numeric()))
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).max()
    }
}

/// Arithmetic mean of an iterator of values, `None` when empty.
pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// A labelled collection of keyword series from one source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesSet {
    pub label: String,
    pub series: Vec<TimeSeries>,
}

impl SeriesSet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            series: Vec::new(),
        }
    }

    pub fn with_series(label: impl Into<String>, series: Vec<TimeSeries>) -> Self {
        Self {
            label: label.into(),
            series,
        }
    }

    /// Adds a series, replacing any existing series for the same keyword.
    pub fn insert(&mut self, series: TimeSeries) {
        match self.series.iter_mut().find(|s| s.keyword == series.keyword) {
            Some(existing) => *existing = series,
            None => self.series.push(series),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&TimeSeries> {
        self.series.iter().find(|s| s.keyword == keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.keyword.as_str())
    }

    /// Keywords present in both sets, sorted for stable output order.
    pub fn shared_keywords(&self, other: &SeriesSet) -> Vec<String> {
        let mut shared: Vec<String> = self
            .keywords()
            .filter(|keyword| other.contains(keyword))
            .map(str::to_string)
            .collect();
        shared.sort();
        shared.dedup();
        shared
    }

    /// Earliest and latest timestamp across every series.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.series.iter().filter_map(TimeSeries::first_timestamp).min()?;
        let end = self.series.iter().filter_map(TimeSeries::last_timestamp).max()?;
        Some((start, end))
    }

    pub fn sample_count(&self) -> usize {
        self.series.iter().map(TimeSeries::len).sum()
    }
}
