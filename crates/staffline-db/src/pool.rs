//! Connection pool creation and configuration.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior, taken from the server
/// `[database]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Creates the SQLite connection pool for `db_path`.
///
/// Every connection the pool hands out has been through
/// [`prepare_connection`]: WAL journal mode, foreign keys on, and the
/// configured busy timeout. Use `:memory:` with a pool size of 1 for tests
/// (each in-memory connection is its own database).
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the connection pool cannot be created.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let busy_timeout_ms = settings.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(move |conn| prepare_connection(conn, busy_timeout_ms));

    Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)
        .map_err(PoolError::PoolInit)
}

/// Pragma setup run once per pooled connection.
///
/// The history endpoint reads while ingest writes, so connections run in
/// WAL mode with a busy timeout instead of failing fast on contention.
fn prepare_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.pragma_update(None, "busy_timeout", busy_timeout_ms as i64)?;
    conn.pragma_update(None, "foreign_keys", true)?;

    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    // In-memory databases stay in "memory" journal mode, which is fine; an
    // on-disk database that refuses WAL is not.
    if mode.eq_ignore_ascii_case("wal") || mode.eq_ignore_ascii_case("memory") {
        Ok(())
    } else {
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            Some(format!("database refused WAL journal mode (got {mode})")),
        ))
    }
}
