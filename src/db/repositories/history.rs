use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{conversion_error, format_datetime, parse_datetime, ratio_from_sql, ratio_to_sql, to_i64},
};
use crate::history::{HistoryBackend, HistoryStore, ProcessingCursor};
use crate::models::AucRecord;

fn row_to_record(row: &Row) -> Result<AucRecord, rusqlite::Error> {
    let start_str: String = row.get("start_date")?;
    let end_str: String = row.get("end_date")?;

    Ok(AucRecord {
        keyword: row.get("keyword")?,
        start: parse_datetime(&start_str, "start_date").map_err(|e| conversion_error(1, e))?,
        end: parse_datetime(&end_str, "end_date").map_err(|e| conversion_error(2, e))?,
        weekly_auc: row.get("weekly_auc")?,
        daily_auc: row.get("daily_auc")?,
        ratio: ratio_from_sql(row.get("auc_ratio")?),
    })
}

impl Database {
    pub fn read_cursor(&self) -> Result<ProcessingCursor> {
        let raw: Option<String> = self
            .connection()
            .query_row(
                "SELECT last_end FROM processing_cursor WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read processing cursor")?;

        let last_end = raw
            .map(|value| parse_datetime(&value, "processing_cursor.last_end"))
            .transpose()?;
        Ok(ProcessingCursor::new(last_end))
    }

    /// Every stored record in insertion order.
    pub fn load_history(&self) -> Result<HistoryStore> {
        let mut stmt = self.connection().prepare(
            "SELECT keyword, start_date, end_date, weekly_auc, daily_auc, auc_ratio
             FROM auc_history
             ORDER BY seq ASC",
        )?;

        let records_iter = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for record_result in records_iter {
            records.push(record_result.context("failed to decode history row")?);
        }

        Ok(HistoryStore::from_records(records))
    }

    /// Append `records` and move the cursor in a single transaction.
    pub fn commit_run(&mut self, records: &[AucRecord], cursor: ProcessingCursor) -> Result<Uuid> {
        let Some(last_end) = cursor.last_end else {
            bail!("refusing to commit a run without a cursor position");
        };
        let window_start = records
            .iter()
            .map(|record| record.start)
            .min()
            .unwrap_or(last_end);

        let run_id = Uuid::new_v4();
        let committed_at = format_datetime(Utc::now());

        let tx = self
            .connection_mut()
            .transaction()
            .context("failed to open history transaction")?;

        tx.execute(
            "INSERT INTO history_runs (id, window_start, window_end, record_count, committed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id.to_string(),
                format_datetime(window_start),
                format_datetime(last_end),
                to_i64(records.len())?,
                committed_at,
            ],
        )
        .context("failed to insert history run")?;

        for record in records {
            tx.execute(
                "INSERT INTO auc_history (
                    keyword,
                    start_date,
                    end_date,
                    weekly_auc,
                    daily_auc,
                    auc_ratio,
                    run_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.keyword,
                    format_datetime(record.start),
                    format_datetime(record.end),
                    record.weekly_auc,
                    record.daily_auc,
                    ratio_to_sql(record.ratio),
                    run_id.to_string(),
                ],
            )
            .with_context(|| format!("failed to append history record for '{}'", record.keyword))?;
        }

        tx.execute(
            "INSERT INTO processing_cursor (id, last_end, updated_at)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                last_end = excluded.last_end,
                updated_at = excluded.updated_at",
            params![format_datetime(last_end), committed_at],
        )
        .context("failed to advance processing cursor")?;

        tx.commit().context("failed to commit history run")?;
        Ok(run_id)
    }
}

impl HistoryBackend for Database {
    fn load(&mut self) -> Result<(ProcessingCursor, HistoryStore)> {
        Ok((self.read_cursor()?, self.load_history()?))
    }

    fn commit(&mut self, appended: &[AucRecord], cursor: ProcessingCursor) -> Result<()> {
        self.commit_run(appended, cursor).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AucRatio;
    use chrono::{DateTime, TimeZone};

    fn date(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, d, 0, 0, 0).unwrap()
    }

    fn record(keyword: &str, end: u32, ratio: AucRatio) -> AucRecord {
        AucRecord {
            keyword: keyword.into(),
            start: date(1),
            end: date(end),
            weekly_auc: 1200.5,
            daily_auc: 1300.25,
            ratio,
        }
    }

    #[test]
    fn fresh_database_has_no_cursor_or_history() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.read_cursor().unwrap(), ProcessingCursor::default());
        assert!(db.load_history().unwrap().is_empty());
    }

    #[test]
    fn commit_appends_records_and_moves_cursor() {
        let mut db = Database::open_in_memory().unwrap();
        let records = vec![
            record("a", 10, AucRatio::Value(1.08)),
            record("b", 10, AucRatio::Undefined),
        ];

        db.commit_run(&records, ProcessingCursor::at(date(10))).unwrap();

        assert_eq!(db.read_cursor().unwrap(), ProcessingCursor::at(date(10)));
        assert_eq!(db.load_history().unwrap().records(), records.as_slice());
    }

    #[test]
    fn failed_append_keeps_cursor_in_place() {
        let mut db = Database::open_in_memory().unwrap();
        db.commit_run(&[record("a", 10, AucRatio::Value(1.0))], ProcessingCursor::at(date(10)))
            .unwrap();

        // Same (keyword, end) violates the history key.
        let result = db.commit_run(
            &[record("b", 20, AucRatio::Value(1.0)), record("a", 10, AucRatio::Value(2.0))],
            ProcessingCursor::at(date(20)),
        );

        assert!(result.is_err());
        assert_eq!(db.read_cursor().unwrap(), ProcessingCursor::at(date(10)));
        assert_eq!(db.load_history().unwrap().len(), 1);
    }

    #[test]
    fn history_rows_cannot_be_rewritten() {
        let mut db = Database::open_in_memory().unwrap();
        db.commit_run(&[record("a", 10, AucRatio::Value(1.0))], ProcessingCursor::at(date(10)))
            .unwrap();

        let update = db
            .connection()
            .execute("UPDATE auc_history SET weekly_auc = 0", []);
        let delete = db.connection().execute("DELETE FROM auc_history", []);

        assert!(update.is_err());
        assert!(delete.is_err());
    }

    #[test]
    fn commit_without_cursor_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.commit_run(&[], ProcessingCursor::default()).is_err());
    }
}
