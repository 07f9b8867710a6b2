//! Domain event contract consumed from the broadcast transport.
//!
//! Inbound events are decoded into a tagged union at the transport boundary
//! rather than inspected as loose JSON bags downstream. Decoding is lenient
//! about the field variations the original producers emit (`leave_id` vs
//! `id`, `employee_name` vs `full_name`) and about missing domain keys — a
//! payload without its business id still decodes, it just cannot be
//! deduplicated.

use serde::{Deserialize, Serialize};

use crate::notification::NotificationKind;

/// Event names the subscription manager listens for, in their canonical
/// dot-prefixed broadcast form. Admin channels also deliver the non-dot
/// variants; [`DomainEvent::decode`] accepts both.
pub const LISTENED_EVENTS: [&str; 4] = [
    ".LeaveRequested",
    ".AbsenceRequested",
    ".ReturnWorkRequested",
    ".RequestStatusUpdated",
];

/// Which request family a domain key belongs to.
///
/// Keys from different families may collide numerically, so the dedup key
/// always carries the family alongside the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// A leave request.
    Leave,
    /// An absence request.
    Absence,
    /// A return-to-work request.
    ReturnWork,
}

impl RequestKind {
    /// Returns the string label for this family.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Absence => "absence",
            Self::ReturnWork => "return_work",
        }
    }

    /// Human-readable label used in status toasts.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Leave => "Leave",
            Self::Absence => "Absence",
            Self::ReturnWork => "Return to work",
        }
    }

    /// Maps a status-update `type` tag (e.g. `leave_status`) to a family.
    pub fn from_status_tag(tag: &str) -> Option<Self> {
        match tag {
            "leave_status" => Some(Self::Leave),
            "absence_status" => Some(Self::Absence),
            "return_work_status" | "resume_status" => Some(Self::ReturnWork),
            _ => None,
        }
    }
}

/// The business identifier used to prevent duplicate notifications for the
/// same underlying request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainKey {
    /// Request family the id belongs to.
    pub kind: RequestKind,
    /// Business id of the request (leave_id, absence_id, return_work_id).
    pub id: i64,
}

impl DomainKey {
    pub fn new(kind: RequestKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// A typed event from the broadcast transport.
///
/// The serde tag uses the non-dot event names, which is what the ingest
/// endpoint accepts from domain services; the broadcast frames carry the
/// dot-prefixed form from [`DomainEvent::event_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DomainEvent {
    /// An employee filed a leave request.
    LeaveRequested {
        /// Business id; producers emit it as `leave_id` or bare `id`.
        #[serde(default, alias = "id")]
        leave_id: Option<i64>,
        #[serde(default)]
        employee_name: String,
        #[serde(default)]
        leave_type: String,
        #[serde(default)]
        leave_start_date: String,
        #[serde(default)]
        leave_end_date: String,
        #[serde(default)]
        department: String,
    },

    /// An employee filed an absence request.
    AbsenceRequested {
        #[serde(default, alias = "id")]
        absence_id: Option<i64>,
        #[serde(default, alias = "full_name")]
        employee_name: String,
        #[serde(default)]
        absence_type: String,
        #[serde(default)]
        from_date: String,
        #[serde(default)]
        to_date: String,
        #[serde(default)]
        department: String,
    },

    /// An employee filed a return-to-work request after an absence.
    ReturnWorkRequested {
        #[serde(default)]
        return_work_id: Option<i64>,
        #[serde(default)]
        employee_name: String,
        #[serde(default)]
        employee_id_number: String,
        #[serde(default)]
        department: String,
        #[serde(default)]
        return_date: String,
        #[serde(default)]
        absence_type: String,
        #[serde(default)]
        reason: String,
    },

    /// A supervisor or HR changed the status of an existing request.
    RequestStatusUpdated {
        /// Status family tag, e.g. `leave_status`.
        #[serde(rename = "type")]
        kind: String,
        status: String,
        employee_id: i64,
        request_id: i64,
        #[serde(default)]
        meta: serde_json::Value,
    },
}

/// The wire frame the transport delivers to subscribers.
///
/// `event` carries the broadcast-as name (dot-prefixed for domain events);
/// `data` is the undecoded payload, decoded into a [`DomainEvent`] at the
/// client boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub channel: String,
    pub event: String,
    pub data: serde_json::Value,
}

impl EventFrame {
    /// Builds the frame broadcast for a domain event on a channel.
    pub fn for_event(channel: &crate::ChannelName, event: &DomainEvent) -> Self {
        Self {
            channel: channel.to_string(),
            event: event.event_name().to_string(),
            data: event.payload_json(),
        }
    }

    /// Decodes the carried payload into a typed event.
    pub fn decode(&self) -> Result<DomainEvent, EventDecodeError> {
        DomainEvent::decode(&self.event, &self.data)
    }
}

/// Error returned when an inbound frame cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    /// The event name is not one of the consumed event types.
    #[error("unknown event name: {0}")]
    UnknownEvent(String),
    /// The payload did not match the variant's field set.
    #[error("malformed payload for {event}: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DomainEvent {
    /// Canonical broadcast-as event name (dot-prefixed).
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::LeaveRequested { .. } => ".LeaveRequested",
            Self::AbsenceRequested { .. } => ".AbsenceRequested",
            Self::ReturnWorkRequested { .. } => ".ReturnWorkRequested",
            Self::RequestStatusUpdated { .. } => ".RequestStatusUpdated",
        }
    }

    /// The notification kind a request event materializes as, or `None` for
    /// status updates (those reconcile an existing row instead).
    pub fn notification_kind(&self) -> Option<NotificationKind> {
        match self {
            Self::LeaveRequested { .. } => Some(NotificationKind::LeaveRequest),
            Self::AbsenceRequested { .. } => Some(NotificationKind::AbsenceRequest),
            Self::ReturnWorkRequested { .. } => Some(NotificationKind::ResumeToWork),
            Self::RequestStatusUpdated { .. } => None,
        }
    }

    /// The dedup key embedded in the payload, when the producer supplied it.
    pub fn domain_key(&self) -> Option<DomainKey> {
        match self {
            Self::LeaveRequested { leave_id, .. } => {
                leave_id.map(|id| DomainKey::new(RequestKind::Leave, id))
            }
            Self::AbsenceRequested { absence_id, .. } => {
                absence_id.map(|id| DomainKey::new(RequestKind::Absence, id))
            }
            Self::ReturnWorkRequested { return_work_id, .. } => {
                return_work_id.map(|id| DomainKey::new(RequestKind::ReturnWork, id))
            }
            Self::RequestStatusUpdated { .. } => None,
        }
    }

    /// Decodes an inbound transport frame into a typed event.
    ///
    /// Accepts both the dot-prefixed broadcast names and the bare variants
    /// delivered on admin channels.
    pub fn decode(
        event_name: &str,
        data: &serde_json::Value,
    ) -> Result<Self, EventDecodeError> {
        let name = event_name.strip_prefix('.').unwrap_or(event_name);

        let tagged = |data: &serde_json::Value| -> serde_json::Value {
            let mut obj = match data {
                serde_json::Value::Object(map) => map.clone(),
                // Non-object payloads decode as an empty field set; every
                // field is defaulted, so this yields a keyless notification
                // rather than an error.
                _ => serde_json::Map::new(),
            };
            obj.insert(
                "event".to_string(),
                serde_json::Value::String(name.to_string()),
            );
            serde_json::Value::Object(obj)
        };

        match name {
            "LeaveRequested" | "AbsenceRequested" | "ReturnWorkRequested"
            | "RequestStatusUpdated" => serde_json::from_value(tagged(data)).map_err(|e| {
                EventDecodeError::Malformed {
                    event: name.to_string(),
                    source: e,
                }
            }),
            other => Err(EventDecodeError::UnknownEvent(other.to_string())),
        }
    }

    /// Serializes the payload portion (everything but the tag) for display
    /// in notification rows.
    pub fn payload_json(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("event");
                serde_json::Value::Object(map)
            }
            _ => serde_json::Value::Null,
        }
    }
}
