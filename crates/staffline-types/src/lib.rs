//! Shared types for the Staffline notification pipeline.
//!
//! This crate provides the foundational types used across all Staffline
//! crates: authenticated principals and their role flags, the channel
//! naming scheme, the domain event contract consumed from the broadcast
//! transport, and the client-side notification record.
//!
//! No crate in the workspace depends on anything *except* `staffline-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

mod channel;
mod event;
mod notification;

pub use channel::{ChannelName, ParseChannelError};
pub use event::{
    DomainEvent, DomainKey, EventDecodeError, EventFrame, RequestKind, LISTENED_EVENTS,
};
pub use notification::{Notification, NotificationKind, Toast, ToastLevel};

use serde::{Deserialize, Serialize};

/// Which session namespace an authenticated principal came from.
///
/// The HR system keeps two login surfaces: the staff portal (supervisors,
/// HR, admins) and the employee self-service portal. Channel admission
/// rules distinguish between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalKind {
    /// An employee self-service session.
    Employee,
    /// A staff portal session (supervisor, HR, admin).
    Staff,
}

impl PrincipalKind {
    /// Returns the string label for this kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::Staff => "STAFF",
        }
    }
}

/// An authenticated actor.
///
/// Established at session time by the auth layer; read-only to the
/// notification core. Role capabilities are resolved separately (see the
/// `RoleSource` trait in `staffline-auth`) because predicate evaluation may
/// consult external state and fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity id within the principal's namespace.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Session namespace the principal authenticated through.
    pub kind: PrincipalKind,
}

impl Principal {
    /// Convenience constructor for a staff principal.
    pub fn staff(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: PrincipalKind::Staff,
        }
    }

    /// Convenience constructor for an employee principal.
    pub fn employee(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: PrincipalKind::Employee,
        }
    }
}

/// Resolved role capability flags for a principal.
///
/// These are the booleans the channel admission ladder consults. A fallible
/// role source may produce them from a directory lookup; this struct is the
/// already-resolved form carried around by sessions and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    /// Supervises at least one department.
    pub supervisor: bool,
    /// Belongs to the HR staff group.
    pub hr: bool,
    /// Full administrative access.
    pub super_admin: bool,
}

impl RoleFlags {
    /// Flags for a principal with no elevated roles.
    pub fn none() -> Self {
        Self::default()
    }
}

/// The presence payload returned on successful channel authorization.
///
/// Mirrors the wire contract of the broadcasting auth endpoint: a minimal
/// `{id, name}` object identifying the admitted principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    /// The admitted principal's id.
    pub id: i64,
    /// The admitted principal's display name.
    pub name: String,
}

impl From<&Principal> for PresencePayload {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
        }
    }
}
