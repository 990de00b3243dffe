use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, estimate_from_sql, estimate_to_sql, format_datetime, to_i64, to_usize},
};
use crate::models::ScalingAudit;

fn row_to_audit(row: &Row) -> Result<ScalingAudit, rusqlite::Error> {
    let overlap: i64 = row.get("overlap")?;

    Ok(ScalingAudit {
        keyword: row.get("keyword")?,
        historical_mean: row.get("historical_mean")?,
        new_mean: row.get("new_mean")?,
        scaling: estimate_from_sql(row.get("scaling")?),
        overlap: to_usize(overlap, "overlap").map_err(|e| conversion_error(4, e))?,
        median_ratio: row.get("median_ratio")?,
    })
}

impl Database {
    /// Batch insert the audit rows for one increment.
    pub fn insert_audits(
        &mut self,
        increment_label: &str,
        ingested_at: DateTime<Utc>,
        audits: &[ScalingAudit],
    ) -> Result<()> {
        let audited_at = format_datetime(Utc::now());
        let tx = self.connection_mut().transaction()?;

        for audit in audits {
            tx.execute(
                "INSERT INTO scaling_audits (
                    increment_label,
                    ingested_at,
                    audited_at,
                    keyword,
                    historical_mean,
                    new_mean,
                    scaling,
                    overlap,
                    median_ratio
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    increment_label,
                    format_datetime(ingested_at),
                    audited_at,
                    audit.keyword,
                    audit.historical_mean,
                    audit.new_mean,
                    estimate_to_sql(audit.scaling),
                    to_i64(audit.overlap)?,
                    audit.median_ratio,
                ],
            )
            .with_context(|| format!("failed to insert audit for '{}'", audit.keyword))?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Audit rows recorded for an increment, oldest first.
    pub fn get_audits_for_increment(&self, increment_label: &str) -> Result<Vec<ScalingAudit>> {
        let mut stmt = self.connection().prepare(
            "SELECT
                keyword,
                historical_mean,
                new_mean,
                scaling,
                overlap,
                median_ratio
            FROM scaling_audits
            WHERE increment_label = ?1
            ORDER BY id ASC",
        )?;

        let audits_iter = stmt.query_map(params![increment_label], row_to_audit)?;

        let mut audits = Vec::new();
        for audit_result in audits_iter {
            audits.push(audit_result?);
        }

        Ok(audits)
    }
}
