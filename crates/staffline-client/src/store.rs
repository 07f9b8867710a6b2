//! Client-side notification state.
//!
//! One store backs one UI surface (header bell, admin dashboard). It holds
//! the merged view of the persisted history snapshot and realtime arrivals,
//! the derived unread count, and the queue of transient toasts. All
//! mutations keep the invariant that `unread_count` equals the number of
//! rows with no `read_at`.

use std::collections::VecDeque;

use staffline_types::{DomainEvent, Notification, NotificationKind, RequestKind, Toast};

/// Mutable notification state for one UI surface.
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    unread_count: usize,
    toasts: VecDeque<Toast>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rows, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of unread rows.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Replaces state with a server history snapshot, preserving realtime
    /// arrivals the snapshot does not know about yet (an event can land on
    /// the channel after the history query ran but before it arrived here).
    pub fn apply_server_snapshot(&mut self, snapshot: Vec<Notification>) {
        let mut merged: Vec<Notification> = Vec::with_capacity(snapshot.len());

        for existing in self.notifications.drain(..) {
            let in_snapshot = snapshot.iter().any(|row| {
                row.id == existing.id
                    || (existing.domain_key.is_some() && row.domain_key == existing.domain_key)
            });
            if !in_snapshot {
                merged.push(existing);
            }
        }
        merged.extend(snapshot);

        self.notifications = merged;
        self.recount_unread();
    }

    /// Materializes a realtime event as an unread notification. Returns
    /// `false` when the event was deduplicated (a row with the same domain
    /// key already exists) or does not materialize a row at all.
    ///
    /// Status updates never create rows; they are routed to
    /// [`Self::reconcile_status_update`] instead.
    pub fn apply_inbound_event(&mut self, event: &DomainEvent) -> bool {
        if matches!(event, DomainEvent::RequestStatusUpdated { .. }) {
            self.reconcile_status_update(event);
            return false;
        }

        if let Some(key) = event.domain_key() {
            if self
                .notifications
                .iter()
                .any(|row| row.domain_key == Some(key))
            {
                tracing::debug!(kind = key.kind.as_str(), id = key.id, "duplicate event ignored");
                return false;
            }
        }

        let Some(kind) = event.notification_kind() else {
            return false;
        };

        let now = chrono::Utc::now();
        self.notifications.insert(
            0,
            Notification {
                // Local placeholder id until the next snapshot carries the
                // server-issued one; timestamps keep placeholders unique
                // enough for UI keys and read tracking.
                id: now.timestamp_millis(),
                kind,
                data: event.payload_json(),
                domain_key: event.domain_key(),
                read_at: None,
                created_at: now.to_rfc3339(),
            },
        );
        self.unread_count += 1;
        true
    }

    /// Applies a status change to the matching request row in place and
    /// queues a toast. The row's read state and the unread count do not
    /// change; a status flip is not a new notification.
    pub fn reconcile_status_update(&mut self, event: &DomainEvent) {
        let DomainEvent::RequestStatusUpdated {
            kind,
            status,
            request_id,
            ..
        } = event
        else {
            return;
        };

        let family = RequestKind::from_status_tag(kind);
        let row = self.notifications.iter_mut().find(|row| {
            row.domain_key.is_some_and(|key| {
                key.id == *request_id && family.map_or(true, |f| key.kind == f)
            })
        });

        match row {
            Some(row) => {
                if let Some(payload) = row.data.as_object_mut() {
                    payload.insert(
                        "status".to_string(),
                        serde_json::Value::String(status.clone()),
                    );
                }
                // An approved return-to-work request means the employee is
                // back; the row's tag changes with it.
                if family == Some(RequestKind::ReturnWork) && status == "approved" {
                    row.kind = NotificationKind::EmployeeReturned;
                }
            }
            None => {
                tracing::debug!(
                    tag = %kind,
                    request_id,
                    "status update for a request not in the local view"
                );
            }
        }

        let label = match family {
            Some(f) => format!("{} request", f.display_label()),
            None => "Request".to_string(),
        };
        self.toasts
            .push_back(Toast::success(format!("{label} {status}")));
    }

    /// Marks one row read. Idempotent; unknown ids and already-read rows
    /// leave the count unchanged.
    pub fn mark_one_read(&mut self, id: i64) -> bool {
        let Some(row) = self
            .notifications
            .iter_mut()
            .find(|row| row.id == id && row.is_unread())
        else {
            return false;
        };
        row.read_at = Some(chrono::Utc::now().to_rfc3339());
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    /// Marks every row read and zeroes the count.
    pub fn mark_all_read(&mut self) {
        let now = chrono::Utc::now().to_rfc3339();
        for row in &mut self.notifications {
            if row.is_unread() {
                row.read_at = Some(now.clone());
            }
        }
        self.unread_count = 0;
    }

    /// Queues a toast for the UI.
    pub fn push_toast(&mut self, toast: Toast) {
        self.toasts.push_back(toast);
    }

    /// Takes all pending toasts, oldest first.
    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain(..).collect()
    }

    fn recount_unread(&mut self) {
        self.unread_count = self
            .notifications
            .iter()
            .filter(|row| row.is_unread())
            .count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use staffline_types::{DomainKey, NotificationKind, ToastLevel};

    fn leave_requested(leave_id: i64) -> DomainEvent {
        DomainEvent::LeaveRequested {
            leave_id: Some(leave_id),
            employee_name: "Jane Cruz".to_string(),
            leave_type: "vacation".to_string(),
            leave_start_date: "2026-09-01".to_string(),
            leave_end_date: "2026-09-05".to_string(),
            department: "Engineering".to_string(),
        }
    }

    fn status_update(tag: &str, request_id: i64, status: &str) -> DomainEvent {
        DomainEvent::RequestStatusUpdated {
            kind: tag.to_string(),
            status: status.to_string(),
            employee_id: 5,
            request_id,
            meta: json!({}),
        }
    }

    fn snapshot_row(id: i64, leave_id: i64, read: bool) -> Notification {
        Notification {
            id,
            kind: NotificationKind::LeaveRequest,
            data: json!({ "leave_id": leave_id }),
            domain_key: Some(DomainKey::new(RequestKind::Leave, leave_id)),
            read_at: read.then(|| "2026-08-20T10:00:00Z".to_string()),
            created_at: "2026-08-20T09:00:00Z".to_string(),
        }
    }

    #[test]
    fn duplicate_events_count_once() {
        let mut store = NotificationStore::new();

        assert!(store.apply_inbound_event(&leave_requested(42)));
        assert!(!store.apply_inbound_event(&leave_requested(42)));

        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn same_id_different_family_is_not_a_duplicate() {
        let mut store = NotificationStore::new();

        assert!(store.apply_inbound_event(&leave_requested(7)));
        assert!(store.apply_inbound_event(&DomainEvent::AbsenceRequested {
            absence_id: Some(7),
            employee_name: "Ben Ocampo".to_string(),
            absence_type: "sick".to_string(),
            from_date: String::new(),
            to_date: String::new(),
            department: String::new(),
        }));

        assert_eq!(store.notifications().len(), 2);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn event_without_domain_key_always_materializes() {
        let mut store = NotificationStore::new();
        let keyless = DomainEvent::AbsenceRequested {
            absence_id: None,
            employee_name: "No Id".to_string(),
            absence_type: String::new(),
            from_date: String::new(),
            to_date: String::new(),
            department: String::new(),
        };

        assert!(store.apply_inbound_event(&keyless));
        assert!(store.apply_inbound_event(&keyless));
        assert_eq!(store.notifications().len(), 2);
    }

    #[test]
    fn mark_one_read_is_idempotent_and_never_goes_negative() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(1));
        let id = store.notifications()[0].id;

        assert!(store.mark_one_read(id));
        assert_eq!(store.unread_count(), 0);

        assert!(!store.mark_one_read(id));
        assert!(!store.mark_one_read(999_999));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn mark_all_read_zeroes_the_count() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(1));
        store.apply_inbound_event(&leave_requested(2));
        assert_eq!(store.unread_count(), 2);

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().iter().all(|n| !n.is_unread()));

        // Second pass is a no-op.
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn snapshot_merge_keeps_realtime_arrivals() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(100));

        // Snapshot ran before leave 100 was persisted; it carries older rows.
        store.apply_server_snapshot(vec![snapshot_row(10, 50, true), snapshot_row(9, 49, false)]);

        assert_eq!(store.notifications().len(), 3);
        assert_eq!(store.unread_count(), 2);
        assert_eq!(
            store.notifications()[0].domain_key,
            Some(DomainKey::new(RequestKind::Leave, 100))
        );
    }

    #[test]
    fn snapshot_replaces_placeholder_row_with_persisted_one() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(50));

        // The snapshot now carries the persisted row for the same request.
        store.apply_server_snapshot(vec![snapshot_row(10, 50, false)]);

        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].id, 10);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn status_update_rewrites_row_in_place_and_toasts() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(42));
        store.mark_one_read(store.notifications()[0].id);

        store.reconcile_status_update(&status_update("leave_status", 42, "approved"));

        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].data["status"], "approved");
        assert_eq!(store.unread_count(), 0);

        let toasts = store.drain_toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[0].message, "Leave request approved");
        assert!(store.drain_toasts().is_empty());
    }

    #[test]
    fn status_update_for_unknown_request_only_toasts() {
        let mut store = NotificationStore::new();

        store.reconcile_status_update(&status_update("absence_status", 77, "declined"));

        assert!(store.notifications().is_empty());
        assert_eq!(store.drain_toasts().len(), 1);
    }

    #[test]
    fn status_update_routed_through_apply_does_not_materialize() {
        let mut store = NotificationStore::new();

        assert!(!store.apply_inbound_event(&status_update("leave_status", 1, "approved")));
        assert!(store.notifications().is_empty());
        assert_eq!(store.drain_toasts().len(), 1);
    }

    #[test]
    fn approved_return_work_becomes_employee_returned() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&DomainEvent::ReturnWorkRequested {
            return_work_id: Some(8),
            employee_name: "Lea Santos".to_string(),
            employee_id_number: "E-104".to_string(),
            department: "Finance".to_string(),
            return_date: "2026-09-10".to_string(),
            absence_type: "sick".to_string(),
            reason: String::new(),
        });
        assert_eq!(store.notifications()[0].kind, NotificationKind::ResumeToWork);

        store.reconcile_status_update(&status_update("return_work_status", 8, "approved"));

        assert_eq!(
            store.notifications()[0].kind,
            NotificationKind::EmployeeReturned
        );
        assert_eq!(store.notifications()[0].data["status"], "approved");
        assert_eq!(
            store.drain_toasts()[0].message,
            "Return to work request approved"
        );

        // A declined request keeps its original tag.
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&DomainEvent::ReturnWorkRequested {
            return_work_id: Some(9),
            employee_name: "Lea Santos".to_string(),
            employee_id_number: "E-104".to_string(),
            department: "Finance".to_string(),
            return_date: "2026-09-10".to_string(),
            absence_type: "sick".to_string(),
            reason: String::new(),
        });
        store.reconcile_status_update(&status_update("return_work_status", 9, "declined"));
        assert_eq!(store.notifications()[0].kind, NotificationKind::ResumeToWork);
    }

    #[test]
    fn unknown_status_tag_matches_by_request_id_only() {
        let mut store = NotificationStore::new();
        store.apply_inbound_event(&leave_requested(42));

        store.reconcile_status_update(&status_update("mystery_status", 42, "approved"));

        assert_eq!(store.notifications()[0].data["status"], "approved");
        assert_eq!(store.drain_toasts()[0].message, "Request approved");
    }
}
