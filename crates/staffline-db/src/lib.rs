//! Database layer for the Staffline notification pipeline.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode
//! initialization, embedded SQL migrations, and the persistence the
//! pipeline needs: principal lookup for the auth middleware and the
//! notification history the client snapshot fetch reads.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: no external database process required; WAL
//!   allows concurrent readers with a single writer, matching the access
//!   pattern (many history reads, occasional inserts and mark-reads).
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so migrations ship with the server and cannot drift
//!   from the code that depends on them.

mod migrations;
mod notifications;
mod pool;
mod principals;

pub use migrations::{run_migrations, MigrationError};
pub use notifications::{
    insert_notification, list_notifications, mark_all_read, mark_one_read, NewNotification,
    Recipient,
};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use principals::{find_employee_by_token, find_staff_by_token, EmployeeRecord, StaffRecord};

use thiserror::Error;

/// Errors from notification and principal persistence operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored JSON payload could not be parsed.
    #[error("stored payload corrupt: {0}")]
    Payload(#[from] serde_json::Error),
}
