use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// SQLite store for the processing cursor, the AUC history and scaling audits.
///
/// Runs are batch and single-threaded, so the connection is owned directly and
/// writes take `&mut self` to open transactions.
pub struct Database {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open SQLite database {}", db_path.display()))?;

        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }

        let database = Self::initialize(conn, Some(db_path))?;
        if let Some(path) = database.path() {
            info!("Database initialized at {}", path.display());
        }
        Ok(database)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::initialize(conn, None)
    }

    fn initialize(mut conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
            error!("Failed to enable foreign keys: {err}");
        }

        run_migrations(&mut conn).context("failed to run database migrations")?;

        Ok(Self { conn, db_path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(super) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
