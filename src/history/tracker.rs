use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::error::{ReconcileError, ReconcileResult};
use crate::history::state::{HistoryStore, ProcessingCursor, TrackerState};
use crate::integral::compare_chunks;
use crate::models::{AucRecord, Chunk, SeriesSet};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPlan {
    UpToDate,
    /// Compare the whole not-yet-covered span as a single window.
    Process(Chunk),
}

pub fn plan_run(
    cursor: ProcessingCursor,
    overall_start: DateTime<Utc>,
    overall_end: DateTime<Utc>,
) -> RunPlan {
    let new_start = cursor.next_start(overall_start);
    if new_start >= overall_end {
        RunPlan::UpToDate
    } else {
        RunPlan::Process(Chunk::closed(new_start, overall_end))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerOutcome {
    /// Nothing past the cursor.
    UpToDate { cursor: ProcessingCursor },
    /// New span existed but no keyword had enough samples; the cursor stays put so
    /// the span is retried once more data arrives.
    NothingComparable {
        window: Chunk,
        cursor: ProcessingCursor,
    },
    Appended {
        window: Chunk,
        records: Vec<AucRecord>,
        cursor: ProcessingCursor,
    },
}

impl TrackerOutcome {
    pub fn cursor(&self) -> ProcessingCursor {
        match self {
            TrackerOutcome::UpToDate { cursor }
            | TrackerOutcome::NothingComparable { cursor, .. }
            | TrackerOutcome::Appended { cursor, .. } => *cursor,
        }
    }

    pub fn appended(&self) -> &[AucRecord] {
        match self {
            TrackerOutcome::Appended { records, .. } => records,
            _ => &[],
        }
    }
}

/// Cursor and store after one pure tracker step.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub outcome: TrackerOutcome,
    pub cursor: ProcessingCursor,
    pub store: HistoryStore,
}

/// Compute the next history step without touching persistence.
///
/// The returned cursor is a proposal; callers persist it together with the
/// appended records or not at all. A span that yields no record leaves the
/// cursor where it was, so the span is retried once data arrives.
pub fn advance(
    cursor: ProcessingCursor,
    store: HistoryStore,
    weekly: &SeriesSet,
    daily: &SeriesSet,
    overall_start: DateTime<Utc>,
    overall_end: DateTime<Utc>,
) -> ReconcileResult<Advance> {
    if let Some(store_end) = store.latest_end() {
        if cursor.last_end.map_or(true, |last_end| last_end < store_end) {
            return Err(ReconcileError::CursorBehindStore {
                store_end,
                cursor: cursor.last_end,
            });
        }
    }

    let window = match plan_run(cursor, overall_start, overall_end) {
        RunPlan::UpToDate => {
            return Ok(Advance {
                outcome: TrackerOutcome::UpToDate { cursor },
                cursor,
                store,
            });
        }
        RunPlan::Process(window) => window,
    };

    let records = compare_chunks(weekly, daily, &[window]);
    if records.is_empty() {
        return Ok(Advance {
            outcome: TrackerOutcome::NothingComparable { window, cursor },
            cursor,
            store,
        });
    }

    let advanced = ProcessingCursor::at(window.end);
    let store = store.extended(&records);

    Ok(Advance {
        outcome: TrackerOutcome::Appended {
            window,
            records,
            cursor: advanced,
        },
        cursor: advanced,
        store,
    })
}

/// Persistence for the cursor and the append-only history.
pub trait HistoryBackend {
    fn load(&mut self) -> Result<(ProcessingCursor, HistoryStore)>;

    /// Persist `appended` and `cursor` as one unit: both land or neither does.
    fn commit(&mut self, appended: &[AucRecord], cursor: ProcessingCursor) -> Result<()>;
}

/// Backend holding everything in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryHistory {
    pub cursor: ProcessingCursor,
    pub store: HistoryStore,
}

impl HistoryBackend for InMemoryHistory {
    fn load(&mut self) -> Result<(ProcessingCursor, HistoryStore)> {
        Ok((self.cursor, self.store.clone()))
    }

    fn commit(&mut self, appended: &[AucRecord], cursor: ProcessingCursor) -> Result<()> {
        self.store = std::mem::take(&mut self.store).extended(appended);
        self.cursor = cursor;
        Ok(())
    }
}

/// Load state, compare the span past the cursor and commit the result.
pub fn run_incremental<B: HistoryBackend>(
    backend: &mut B,
    weekly: &SeriesSet,
    daily: &SeriesSet,
    overall_start: DateTime<Utc>,
    overall_end: DateTime<Utc>,
) -> Result<TrackerOutcome> {
    let (cursor, store) = backend.load().context("failed to load history state")?;

    let state = cursor.state(overall_start, overall_end);
    log_info!(
        "History state {:?}: cursor {:?}, {} stored record(s), data ends {}",
        state,
        cursor.last_end.map(|c| c.date_naive()),
        store.len(),
        overall_end.date_naive()
    );

    let step = advance(cursor, store, weekly, daily, overall_start, overall_end)?;

    match &step.outcome {
        TrackerOutcome::UpToDate { .. } => {
            log_info!("History is up to date");
        }
        TrackerOutcome::NothingComparable { window, .. } => {
            log_warn!(
                "No keyword had enough samples in {} -> {}; cursor left unchanged",
                window.start.date_naive(),
                window.end.date_naive()
            );
        }
        TrackerOutcome::Appended {
            window,
            records,
            cursor,
        } => {
            backend
                .commit(records, *cursor)
                .context("failed to commit history records and cursor")?;
            log_info!(
                "Appended {} record(s) for {} -> {}; state {:?}",
                records.len(),
                window.start.date_naive(),
                window.end.date_naive(),
                TrackerState::UpToDate
            );
        }
    }

    Ok(step.outcome)
}
