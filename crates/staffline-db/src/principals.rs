//! Principal lookup for the auth middleware.

use rusqlite::{Connection, OptionalExtension, Row};
use staffline_types::RoleFlags;

use crate::DbError;

/// A staff portal account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffRecord {
    pub id: i64,
    pub name: String,
    pub flags: RoleFlags,
    pub active: bool,
}

/// An employee self-service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// Resolves a staff account by session token. `Ok(None)` when no staff row
/// matches (the caller then tries the employee namespace).
pub fn find_staff_by_token(conn: &Connection, token: &str) -> Result<Option<StaffRecord>, DbError> {
    conn.query_row(
        "SELECT id, name, is_supervisor, is_hr, is_super_admin, active
         FROM staff WHERE token = ?1",
        [token],
        map_row_to_staff,
    )
    .optional()
    .map_err(DbError::Database)
}

/// Resolves an employee account by session token.
pub fn find_employee_by_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<EmployeeRecord>, DbError> {
    conn.query_row(
        "SELECT id, name, active FROM employees WHERE token = ?1",
        [token],
        |row| {
            Ok(EmployeeRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                active: row.get::<_, i64>(2)? != 0,
            })
        },
    )
    .optional()
    .map_err(DbError::Database)
}

fn map_row_to_staff(row: &Row) -> rusqlite::Result<StaffRecord> {
    Ok(StaffRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        flags: RoleFlags {
            supervisor: row.get::<_, i64>(2)? != 0,
            hr: row.get::<_, i64>(3)? != 0,
            super_admin: row.get::<_, i64>(4)? != 0,
        },
        active: row.get::<_, i64>(5)? != 0,
    })
}
