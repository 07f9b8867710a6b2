//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time and applied in order
//! on startup. Applied names are recorded in `_staffline_migrations`, so
//! each migration runs exactly once per database.

use std::collections::HashSet;

use rusqlite::Connection;
use thiserror::Error;

/// `(name, sql)` pairs, in application order. New migrations are appended
/// here.
const MIGRATIONS: [(&str, &str); 2] = [
    ("000_principals", include_str!("migrations/000_principals.sql")),
    (
        "001_notifications",
        include_str!("migrations/001_notifications.sql"),
    ),
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration's SQL failed or could not be recorded as applied.
    #[error("migration '{name}' failed: {source}")]
    Apply {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The tracking table could not be created or read.
    #[error("migration bookkeeping failed: {0}")]
    Bookkeeping(#[from] rusqlite::Error),
}

/// Runs all pending migrations against the given connection, returning how
/// many were applied.
///
/// # Errors
///
/// Returns `MigrationError` if a migration fails to execute or the tracking
/// table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    let done = applied_names(conn)?;
    let mut applied = 0;

    for (name, sql) in MIGRATIONS {
        if done.contains(name) {
            tracing::debug!(migration = name, "migration already applied, skipping");
            continue;
        }
        tracing::info!(migration = name, "applying migration");
        apply_migration(conn, name, sql)?;
        applied += 1;
    }

    Ok(applied)
}

/// Creates the tracking table if needed and returns the applied set.
fn applied_names(conn: &Connection) -> Result<HashSet<String>, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _staffline_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let mut stmt = conn.prepare("SELECT name FROM _staffline_migrations")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

/// Runs one migration and records it, atomically.
fn apply_migration(conn: &Connection, name: &'static str, sql: &str) -> Result<(), MigrationError> {
    let wrap = |source| MigrationError::Apply { name, source };

    let tx = conn.unchecked_transaction().map_err(wrap)?;
    tx.execute_batch(sql).map_err(wrap)?;
    tx.execute(
        "INSERT INTO _staffline_migrations (name) VALUES (?1)",
        [name],
    )
    .map_err(wrap)?;
    tx.commit().map_err(wrap)
}
