use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;

use crate::models::{AucRatio, ScalingEstimate};

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_usize(value: i64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// Wraps a column decoding failure so it can be returned from a row mapper.
pub fn conversion_error(index: usize, err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

pub fn ratio_to_sql(ratio: AucRatio) -> Option<f64> {
    ratio.value()
}

pub fn ratio_from_sql(value: Option<f64>) -> AucRatio {
    value.map_or(AucRatio::Undefined, AucRatio::Value)
}

pub fn estimate_to_sql(estimate: ScalingEstimate) -> Option<f64> {
    estimate.finite()
}

pub fn estimate_from_sql(value: Option<f64>) -> ScalingEstimate {
    value.map_or(ScalingEstimate::Infinite, ScalingEstimate::Finite)
}
