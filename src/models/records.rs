//! Output records of the reconciliation core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Chunk;

/// Multiplier applied to one keyword's fine series inside one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingFactor {
    pub keyword: String,
    pub chunk: Chunk,
    pub factor: f64,
    /// True when `factor` is the explicit no-rescale value rather than a computed ratio.
    pub fallback: bool,
}

impl ScalingFactor {
    pub fn computed(keyword: impl Into<String>, chunk: Chunk, factor: f64) -> Self {
        Self {
            keyword: keyword.into(),
            chunk,
            factor,
            fallback: false,
        }
    }

    pub fn no_rescale(keyword: impl Into<String>, chunk: Chunk) -> Self {
        Self {
            keyword: keyword.into(),
            chunk,
            factor: 1.0,
            fallback: true,
        }
    }
}

/// Daily AUC divided by weekly AUC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AucRatio {
    Value(f64),
    /// Weekly AUC was zero.
    Undefined,
}

impl AucRatio {
    pub const UNDEFINED_LABEL: &'static str = "undefined";

    pub fn value(&self) -> Option<f64> {
        match self {
            AucRatio::Value(value) => Some(*value),
            AucRatio::Undefined => None,
        }
    }
}

impl fmt::Display for AucRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AucRatio::Value(value) => write!(f, "{value:.4}"),
            AucRatio::Undefined => f.write_str(Self::UNDEFINED_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AucRecord {
    pub keyword: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub weekly_auc: f64,
    pub daily_auc: f64,
    pub ratio: AucRatio,
}

/// Historical-over-new mean ratio for one keyword.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalingEstimate {
    Finite(f64),
    /// Mean of the new increment was zero.
    Infinite,
}

impl ScalingEstimate {
    pub const INFINITE_LABEL: &'static str = "infinite";

    pub fn finite(&self) -> Option<f64> {
        match self {
            ScalingEstimate::Finite(value) => Some(*value),
            ScalingEstimate::Infinite => None,
        }
    }
}

impl fmt::Display for ScalingEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingEstimate::Finite(value) => write!(f, "{value:.4}"),
            ScalingEstimate::Infinite => f.write_str(Self::INFINITE_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingAudit {
    pub keyword: String,
    pub historical_mean: f64,
    pub new_mean: f64,
    pub scaling: ScalingEstimate,
    /// Number of timestamps present on both sides.
    pub overlap: usize,
    /// Median of per-timestamp historical/new ratios where both sides are positive.
    pub median_ratio: Option<f64>,
}
