pub mod migrations;
pub mod queries;
pub mod store;

use anyhow::Context;
use rusqlite::Connection;

pub use store::SqliteStore;

use crate::errors::AppError;
use crate::models::WeeklySchedule;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Parses every stored trainer schedule so a bad row stops startup instead
/// of surfacing on the first request. Returns how many were checked.
pub fn validate_schedules(conn: &Connection) -> Result<usize, AppError> {
    let rows = queries::list_raw_schedules(conn)?;
    for (trainer, raw) in &rows {
        WeeklySchedule::from_json(raw)
            .map_err(|e| AppError::Config(format!("schedule for trainer {trainer}: {e}")))?;
    }
    Ok(rows.len())
}
