//! Channel naming scheme for the broadcast transport.
//!
//! Channel identity is immutable once constructed; the wire string is the
//! canonical form and `FromStr`/`Display` round-trip exactly.

use serde::{Deserialize, Serialize};

/// A named subscription scope on the broadcast transport.
///
/// Wire strings, exactly:
///
/// | Variant | Wire name |
/// |---------|-----------|
/// | `Notifications` | `notifications` |
/// | `AdminNotifications` | `admin.notifications` |
/// | `AdminLeave` | `admin.leave` |
/// | `AdminAbsence` | `admin.absence` |
/// | `Employee(id)` | `employee.{id}` |
/// | `Supervisor(id)` | `supervisor.{id}` |
/// | `Hr(id)` | `hr.{id}` |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelName {
    /// Public notification feed for any authenticated principal.
    Notifications,
    /// Broad admin notification scope.
    AdminNotifications,
    /// Admin scope for leave requests.
    AdminLeave,
    /// Admin scope for absence requests.
    AdminAbsence,
    /// Private channel scoped to one employee.
    Employee(i64),
    /// Private channel scoped to one supervisor (or escalated roles).
    Supervisor(i64),
    /// Private channel scoped to one HR principal (or escalated roles).
    Hr(i64),
}

impl ChannelName {
    /// Whether this channel admits only specific principals.
    pub fn is_private(&self) -> bool {
        matches!(
            self,
            Self::Employee(_) | Self::Supervisor(_) | Self::Hr(_)
        )
    }

    /// Whether this channel is one of the broad admin scopes.
    pub fn is_admin_scope(&self) -> bool {
        matches!(
            self,
            Self::AdminNotifications | Self::AdminLeave | Self::AdminAbsence
        )
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notifications => f.write_str("notifications"),
            Self::AdminNotifications => f.write_str("admin.notifications"),
            Self::AdminLeave => f.write_str("admin.leave"),
            Self::AdminAbsence => f.write_str("admin.absence"),
            Self::Employee(id) => write!(f, "employee.{id}"),
            Self::Supervisor(id) => write!(f, "supervisor.{id}"),
            Self::Hr(id) => write!(f, "hr.{id}"),
        }
    }
}

/// Error returned when parsing an unknown or malformed channel name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown channel name: {0}")]
pub struct ParseChannelError(pub String);

impl std::str::FromStr for ChannelName {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notifications" => return Ok(Self::Notifications),
            "admin.notifications" => return Ok(Self::AdminNotifications),
            "admin.leave" => return Ok(Self::AdminLeave),
            "admin.absence" => return Ok(Self::AdminAbsence),
            _ => {}
        }

        let parse_id = |rest: &str| -> Result<i64, ParseChannelError> {
            rest.parse::<i64>()
                .map_err(|_| ParseChannelError(s.to_string()))
        };

        if let Some(rest) = s.strip_prefix("employee.") {
            return Ok(Self::Employee(parse_id(rest)?));
        }
        if let Some(rest) = s.strip_prefix("supervisor.") {
            return Ok(Self::Supervisor(parse_id(rest)?));
        }
        if let Some(rest) = s.strip_prefix("hr.") {
            return Ok(Self::Hr(parse_id(rest)?));
        }

        Err(ParseChannelError(s.to_string()))
    }
}
