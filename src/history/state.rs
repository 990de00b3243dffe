use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AucRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerState {
    NoHistory,
    UpToDate,
    Processing,
}

/// Last date through which the comparison history has been computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingCursor {
    pub last_end: Option<DateTime<Utc>>,
}

impl ProcessingCursor {
    pub fn new(last_end: Option<DateTime<Utc>>) -> Self {
        Self { last_end }
    }

    pub fn at(last_end: DateTime<Utc>) -> Self {
        Self {
            last_end: Some(last_end),
        }
    }

    /// First timestamp not yet covered: the day after `last_end`, or
    /// `overall_start` when there is no history.
    pub fn next_start(&self, overall_start: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_end {
            Some(last_end) => last_end + Duration::days(1),
            None => overall_start,
        }
    }

    pub fn state(&self, overall_start: DateTime<Utc>, overall_end: DateTime<Utc>) -> TrackerState {
        if self.last_end.is_none() {
            return TrackerState::NoHistory;
        }
        if self.next_start(overall_start) >= overall_end {
            TrackerState::UpToDate
        } else {
            TrackerState::Processing
        }
    }
}

/// Append-only, insertion-ordered AUC history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryStore {
    records: Vec<AucRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AucRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AucRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest_end(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|record| record.end).max()
    }

    /// Consumes the store and returns it extended with `appended`.
    pub fn extended(mut self, appended: &[AucRecord]) -> Self {
        self.records.extend_from_slice(appended);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn next_start_is_day_after_cursor() {
        assert_eq!(ProcessingCursor::default().next_start(date(1)), date(1));
        assert_eq!(ProcessingCursor::at(date(10)).next_start(date(1)), date(11));
    }

    #[test]
    fn state_follows_cursor_position() {
        assert_eq!(ProcessingCursor::default().state(date(1), date(20)), TrackerState::NoHistory);
        assert_eq!(ProcessingCursor::at(date(10)).state(date(1), date(20)), TrackerState::Processing);
        assert_eq!(ProcessingCursor::at(date(19)).state(date(1), date(20)), TrackerState::UpToDate);
        assert_eq!(ProcessingCursor::at(date(20)).state(date(1), date(20)), TrackerState::UpToDate);
    }
}
