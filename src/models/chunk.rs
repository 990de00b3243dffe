use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndBound {
    Exclusive,
    Inclusive,
}

/// Time window used as the unit of rescaling and comparison.
///
/// Chunks are half-open `[start, end)`; the final chunk of a segmented range is
/// closed so the range end itself is covered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub end_bound: EndBound,
}

impl Chunk {
    pub fn half_open(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            end_bound: EndBound::Exclusive,
        }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            end_bound: EndBound::Inclusive,
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if timestamp < self.start {
            return false;
        }
        match self.end_bound {
            EndBound::Exclusive => timestamp < self.end,
            EndBound::Inclusive => timestamp <= self.end,
        }
    }
}
