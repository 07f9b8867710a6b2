//! Client-side notification record and toast types.

use serde::{Deserialize, Serialize};

use crate::event::DomainKey;

/// The notification `type` tag shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A leave request awaiting action.
    #[serde(rename = "leave_request")]
    LeaveRequest,
    /// An absence request awaiting action.
    #[serde(rename = "absence_request")]
    AbsenceRequest,
    /// A return-to-work request awaiting action.
    #[serde(rename = "resume_to_work")]
    ResumeToWork,
    /// An employee completed their return to work.
    #[serde(rename = "employee_returned")]
    EmployeeReturned,
}

impl NotificationKind {
    /// Returns the canonical tag string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeaveRequest => "leave_request",
            Self::AbsenceRequest => "absence_request",
            Self::ResumeToWork => "resume_to_work",
            Self::EmployeeReturned => "employee_returned",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = ParseNotificationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leave_request" => Ok(Self::LeaveRequest),
            "absence_request" => Ok(Self::AbsenceRequest),
            "resume_to_work" => Ok(Self::ResumeToWork),
            "employee_returned" => Ok(Self::EmployeeReturned),
            _ => Err(ParseNotificationKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown notification kind string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown notification kind: {0}")]
pub struct ParseNotificationKindError(pub String);

/// A materialized notification row.
///
/// `id` is server-issued for rows from the history fetch, or locally
/// synthesized (millisecond timestamp) for events that arrive over the
/// realtime channel before any persisted id exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Domain payload (ids, names, dates, status, free-form metadata).
    pub data: serde_json::Value,
    /// Dedup key, when the producing event carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_key: Option<DomainKey>,
    /// ISO 8601 read timestamp; `None` means unread.
    pub read_at: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl Notification {
    /// Whether this notification has not been read yet.
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Severity of a transient user-facing toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing message surfaced by the reconciliation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}
