//! Event→channel routing.
//!
//! Domain services are external collaborators: they hand a typed event to
//! the ingest endpoint, which resolves the channel set here and fans out.
//! Request events reach the public feed plus the matching admin scopes and,
//! when the ingest call names one, the responsible supervisor or HR
//! principal. Status updates go only to the affected employee's channel.

use staffline_types::{ChannelName, DomainEvent};

/// Optional private-channel targets named by the ingest call.
///
/// The producing service knows which supervisor or HR principal is
/// responsible for the request; routing stays server-side and typed instead
/// of being interpolated by each client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutTarget {
    /// Supervisor to notify on leave/absence requests.
    pub supervisor_id: Option<i64>,
    /// HR principal to notify on return-to-work requests.
    pub hr_id: Option<i64>,
}

/// Resolves the channels an event fans out to.
pub fn route_event(event: &DomainEvent, target: &FanoutTarget) -> Vec<ChannelName> {
    match event {
        DomainEvent::LeaveRequested { .. } => {
            let mut channels = vec![
                ChannelName::Notifications,
                ChannelName::AdminNotifications,
                ChannelName::AdminLeave,
            ];
            if let Some(id) = target.supervisor_id {
                channels.push(ChannelName::Supervisor(id));
            }
            channels
        }
        DomainEvent::AbsenceRequested { .. } => {
            let mut channels = vec![
                ChannelName::Notifications,
                ChannelName::AdminNotifications,
                ChannelName::AdminAbsence,
            ];
            if let Some(id) = target.supervisor_id {
                channels.push(ChannelName::Supervisor(id));
            }
            channels
        }
        DomainEvent::ReturnWorkRequested { .. } => {
            let mut channels = vec![
                ChannelName::Notifications,
                ChannelName::AdminNotifications,
            ];
            if let Some(id) = target.hr_id {
                channels.push(ChannelName::Hr(id));
            }
            channels
        }
        DomainEvent::RequestStatusUpdated { employee_id, .. } => {
            vec![ChannelName::Employee(*employee_id)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave_event() -> DomainEvent {
        DomainEvent::LeaveRequested {
            leave_id: Some(1),
            employee_name: "Jane Cruz".into(),
            leave_type: "vacation".into(),
            leave_start_date: String::new(),
            leave_end_date: String::new(),
            department: "Eng".into(),
        }
    }

    #[test]
    fn leave_request_routes_to_admin_scopes_and_supervisor() {
        let channels = route_event(
            &leave_event(),
            &FanoutTarget {
                supervisor_id: Some(7),
                hr_id: None,
            },
        );
        assert_eq!(
            channels,
            vec![
                ChannelName::Notifications,
                ChannelName::AdminNotifications,
                ChannelName::AdminLeave,
                ChannelName::Supervisor(7),
            ]
        );
    }

    #[test]
    fn leave_request_without_target_skips_private_channel() {
        let channels = route_event(&leave_event(), &FanoutTarget::default());
        assert!(!channels.iter().any(|c| c.is_private()));
    }

    #[test]
    fn status_update_routes_only_to_employee() {
        let event = DomainEvent::RequestStatusUpdated {
            kind: "leave_status".into(),
            status: "approved".into(),
            employee_id: 5,
            request_id: 101,
            meta: serde_json::Value::Null,
        };
        assert_eq!(
            route_event(&event, &FanoutTarget::default()),
            vec![ChannelName::Employee(5)]
        );
    }

    #[test]
    fn return_work_routes_to_hr_when_named() {
        let event = DomainEvent::ReturnWorkRequested {
            return_work_id: Some(3),
            employee_name: "Lea".into(),
            employee_id_number: "E-100".into(),
            department: "Ops".into(),
            return_date: String::new(),
            absence_type: String::new(),
            reason: String::new(),
        };
        let channels = route_event(
            &event,
            &FanoutTarget {
                supervisor_id: None,
                hr_id: Some(2),
            },
        );
        assert!(channels.contains(&ChannelName::Hr(2)));
        assert!(channels.contains(&ChannelName::AdminNotifications));
    }
}
