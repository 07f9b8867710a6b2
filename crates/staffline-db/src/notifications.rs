//! Notification history persistence.

use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use staffline_types::{DomainKey, Notification, NotificationKind, RequestKind};

use crate::DbError;

/// Which audience a notification row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The shared staff history (admin dashboards).
    Staff,
    /// One employee's private history.
    Employee(i64),
}

impl Recipient {
    fn kind(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Employee(_) => "employee",
        }
    }

    fn id(&self) -> Option<i64> {
        match self {
            Self::Staff => None,
            Self::Employee(id) => Some(*id),
        }
    }
}

/// Parameters for inserting a notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub data: serde_json::Value,
    pub domain_key: Option<DomainKey>,
}

/// Inserts a notification row and returns its assigned id.
pub fn insert_notification(conn: &Connection, new: &NewNotification) -> Result<i64, DbError> {
    let data_json = serde_json::to_string(&new.data)?;
    let (request_kind, request_id) = match new.domain_key {
        Some(key) => (Some(key.kind.as_str()), Some(key.id)),
        None => (None, None),
    };

    let id = conn.query_row(
        "INSERT INTO notifications
            (recipient_kind, recipient_id, kind, data_json, request_kind, request_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
        params![
            new.recipient.kind(),
            new.recipient.id(),
            new.kind.as_str(),
            data_json,
            request_kind,
            request_id,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Lists a recipient's notifications, most recent first.
pub fn list_notifications(
    conn: &Connection,
    recipient: Recipient,
    limit: Option<u32>,
) -> Result<Vec<Notification>, DbError> {
    let limit = limit.unwrap_or(50).min(200);

    let sql = format!(
        "SELECT id, kind, data_json, request_kind, request_id, read_at, created_at
         FROM notifications
         WHERE recipient_kind = ?1 AND (recipient_id IS ?2)
         ORDER BY id DESC
         LIMIT {limit}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![recipient.kind(), recipient.id()], map_row)?;

    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(row??);
    }
    Ok(notifications)
}

/// Marks one of the recipient's notifications read. Returns `false` when no
/// row matched — unknown id, already read, or a row belonging to a
/// different recipient.
pub fn mark_one_read(conn: &Connection, recipient: Recipient, id: i64) -> Result<bool, DbError> {
    let count = conn.execute(
        "UPDATE notifications SET read_at = datetime('now')
         WHERE id = ?1 AND recipient_kind = ?2 AND (recipient_id IS ?3) AND read_at IS NULL",
        params![id, recipient.kind(), recipient.id()],
    )?;
    Ok(count > 0)
}

/// Marks all of a recipient's notifications read. Returns the number of
/// rows updated.
pub fn mark_all_read(conn: &Connection, recipient: Recipient) -> Result<usize, DbError> {
    let count = conn.execute(
        "UPDATE notifications SET read_at = datetime('now')
         WHERE recipient_kind = ?1 AND (recipient_id IS ?2) AND read_at IS NULL",
        params![recipient.kind(), recipient.id()],
    )?;
    Ok(count)
}

fn map_row(row: &Row) -> rusqlite::Result<Result<Notification, DbError>> {
    let id: i64 = row.get(0)?;
    let kind_str: String = row.get(1)?;
    let data_json: String = row.get(2)?;
    let request_kind: Option<String> = row.get(3)?;
    let request_id: Option<i64> = row.get(4)?;
    let read_at: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok((|| {
        let kind = NotificationKind::from_str(&kind_str)
            .map_err(|e| DbError::NotFound(e.to_string()))?;
        let data = serde_json::from_str(&data_json)?;
        let domain_key = match (request_kind.as_deref(), request_id) {
            (Some("leave"), Some(id)) => Some(DomainKey::new(RequestKind::Leave, id)),
            (Some("absence"), Some(id)) => Some(DomainKey::new(RequestKind::Absence, id)),
            (Some("return_work"), Some(id)) => Some(DomainKey::new(RequestKind::ReturnWork, id)),
            _ => None,
        };
        Ok(Notification {
            id,
            kind,
            data,
            domain_key,
            read_at,
            created_at,
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_migrations;
    use serde_json::json;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations(&conn).expect("migrations");
        conn
    }

    fn leave_row(recipient: Recipient, leave_id: i64) -> NewNotification {
        NewNotification {
            recipient,
            kind: NotificationKind::LeaveRequest,
            data: json!({ "leave_id": leave_id, "employee_name": "Jane Cruz" }),
            domain_key: Some(DomainKey::new(RequestKind::Leave, leave_id)),
        }
    }

    #[test]
    fn insert_and_list_most_recent_first() {
        let conn = setup_db();
        let first = insert_notification(&conn, &leave_row(Recipient::Staff, 1)).unwrap();
        let second = insert_notification(&conn, &leave_row(Recipient::Staff, 2)).unwrap();

        let rows = list_notifications(&conn, Recipient::Staff, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[1].id, first);
        assert_eq!(
            rows[0].domain_key,
            Some(DomainKey::new(RequestKind::Leave, 2))
        );
        assert!(rows[0].is_unread());
    }

    #[test]
    fn recipients_are_isolated() {
        let conn = setup_db();
        insert_notification(&conn, &leave_row(Recipient::Staff, 1)).unwrap();
        insert_notification(&conn, &leave_row(Recipient::Employee(5), 2)).unwrap();

        let staff = list_notifications(&conn, Recipient::Staff, None).unwrap();
        let employee = list_notifications(&conn, Recipient::Employee(5), None).unwrap();
        let other = list_notifications(&conn, Recipient::Employee(6), None).unwrap();

        assert_eq!(staff.len(), 1);
        assert_eq!(employee.len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn mark_one_read_is_idempotent() {
        let conn = setup_db();
        let id = insert_notification(&conn, &leave_row(Recipient::Staff, 1)).unwrap();

        assert!(mark_one_read(&conn, Recipient::Staff, id).unwrap());
        // Already read: no row matches the NULL guard.
        assert!(!mark_one_read(&conn, Recipient::Staff, id).unwrap());
        assert!(!mark_one_read(&conn, Recipient::Staff, 9999).unwrap());

        let rows = list_notifications(&conn, Recipient::Staff, None).unwrap();
        assert!(!rows[0].is_unread());
    }

    #[test]
    fn mark_one_read_cannot_cross_recipients() {
        let conn = setup_db();
        let staff_id = insert_notification(&conn, &leave_row(Recipient::Staff, 1)).unwrap();
        let employee_id =
            insert_notification(&conn, &leave_row(Recipient::Employee(5), 2)).unwrap();

        assert!(!mark_one_read(&conn, Recipient::Employee(5), staff_id).unwrap());
        assert!(!mark_one_read(&conn, Recipient::Employee(6), employee_id).unwrap());
        assert!(!mark_one_read(&conn, Recipient::Staff, employee_id).unwrap());

        let staff = list_notifications(&conn, Recipient::Staff, None).unwrap();
        let employee = list_notifications(&conn, Recipient::Employee(5), None).unwrap();
        assert!(staff[0].is_unread());
        assert!(employee[0].is_unread());

        assert!(mark_one_read(&conn, Recipient::Employee(5), employee_id).unwrap());
    }

    #[test]
    fn mark_all_read_scopes_to_recipient() {
        let conn = setup_db();
        insert_notification(&conn, &leave_row(Recipient::Staff, 1)).unwrap();
        insert_notification(&conn, &leave_row(Recipient::Staff, 2)).unwrap();
        insert_notification(&conn, &leave_row(Recipient::Employee(5), 3)).unwrap();

        assert_eq!(mark_all_read(&conn, Recipient::Staff).unwrap(), 2);

        let employee = list_notifications(&conn, Recipient::Employee(5), None).unwrap();
        assert!(employee[0].is_unread());
    }
}
