use chrono::{DateTime, Months, TimeZone, Utc};

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{Chunk, SeriesSet};

/// Split `[start, end]` into contiguous windows `step_months` calendar months wide.
///
/// Every window but the last is half-open; the last one is clipped to `end` and
/// closed so the range end is covered. `start >= end` yields no windows.
pub fn segment_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_months: u32,
) -> ReconcileResult<Vec<Chunk>> {
    if step_months == 0 {
        return Err(ReconcileError::InvalidChunkWidth(step_months));
    }

    let mut chunks = Vec::new();
    let mut current = start;

    while current < end {
        let next = current
            .checked_add_months(Months::new(step_months))
            .unwrap_or(end);

        if next >= end {
            chunks.push(Chunk::closed(current, end));
            break;
        }

        chunks.push(Chunk::half_open(current, next));
        current = next;
    }

    Ok(chunks)
}

pub fn start_of_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = timestamp.date_naive().and_time(chrono::NaiveTime::MIN);
    Utc.from_utc_datetime(&midnight)
}

/// Span of a series set with both ends truncated to midnight.
pub fn day_span(set: &SeriesSet) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    set.time_span()
        .map(|(start, end)| (start_of_day(start), start_of_day(end)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndBound;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn splits_into_calendar_months_and_clips_last() {
        let chunks = segment_range(date(2020, 1, 15), date(2021, 3, 1), 6).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], Chunk::half_open(date(2020, 1, 15), date(2020, 7, 15)));
        assert_eq!(chunks[1], Chunk::half_open(date(2020, 7, 15), date(2021, 1, 15)));
        assert_eq!(chunks[2], Chunk::closed(date(2021, 1, 15), date(2021, 3, 1)));
    }

    #[test]
    fn exact_multiple_ends_on_range_end() {
        let chunks = segment_range(date(2020, 1, 1), date(2021, 1, 1), 6).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].end, date(2021, 1, 1));
        assert_eq!(chunks[1].end_bound, EndBound::Inclusive);
    }

    #[test]
    fn month_end_is_clamped() {
        let chunks = segment_range(date(2020, 8, 31), date(2021, 12, 31), 6).unwrap();
        assert_eq!(chunks[0].end, date(2021, 2, 28));
    }

    #[test]
    fn empty_or_inverted_range_has_no_chunks() {
        assert!(segment_range(date(2020, 1, 1), date(2020, 1, 1), 6).unwrap().is_empty());
        assert!(segment_range(date(2021, 1, 1), date(2020, 1, 1), 6).unwrap().is_empty());
    }

    #[test]
    fn zero_step_is_rejected() {
        assert_eq!(
            segment_range(date(2020, 1, 1), date(2021, 1, 1), 0),
            Err(ReconcileError::InvalidChunkWidth(0))
        );
    }

    #[test]
    fn start_of_day_truncates_time() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        assert_eq!(start_of_day(noon), date(2024, 3, 5));
    }
}
