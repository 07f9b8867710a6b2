//! Channel admission for the Staffline broadcast transport.
//!
//! Decides, for each inbound subscription request `(principal, channel)`,
//! whether to admit it — returning either a denial or a small presence
//! payload `{id, name}`.
//!
//! Role predicates may consult external state (a directory, a department
//! table) and can fail. Each predicate evaluation is independently
//! fault-isolated: an error is logged with structure and treated as `false`,
//! and the ladder continues to the next check. A failing predicate never
//! takes down the authorization endpoint.

use std::collections::HashMap;

use staffline_types::{ChannelName, PresencePayload, Principal, PrincipalKind, RoleFlags};
use thiserror::Error;

/// Error produced by a role predicate evaluation.
#[derive(Debug, Error)]
pub enum RoleError {
    /// The backing role directory could not answer the query.
    #[error("role lookup failed: {0}")]
    Lookup(String),
}

/// Source of role capability answers for principals.
///
/// Implementations may be in-memory flags or a live directory; either way
/// the answers are fallible and the authorizer collapses errors to `false`
/// only at the admission boundary, after logging them.
pub trait RoleSource: Send + Sync {
    /// Whether the principal supervises at least one department.
    fn is_supervisor(&self, principal: &Principal) -> Result<bool, RoleError>;

    /// Whether the principal belongs to the HR staff group.
    fn is_hr(&self, principal: &Principal) -> Result<bool, RoleError>;

    /// Whether the principal has full administrative access.
    fn is_super_admin(&self, principal: &Principal) -> Result<bool, RoleError>;
}

/// In-memory role source backed by resolved [`RoleFlags`] per principal id.
///
/// Staff and employee namespaces never share a channel family ladder, so a
/// flat id map is sufficient here.
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    flags: HashMap<i64, RoleFlags>,
}

impl StaticRoles {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source holding flags for exactly one principal.
    pub fn single(id: i64, flags: RoleFlags) -> Self {
        let mut map = HashMap::new();
        map.insert(id, flags);
        Self { flags: map }
    }

    /// Registers flags for a principal id, replacing any prior entry.
    pub fn insert(&mut self, id: i64, flags: RoleFlags) {
        self.flags.insert(id, flags);
    }

    fn get(&self, principal: &Principal) -> RoleFlags {
        self.flags.get(&principal.id).copied().unwrap_or_default()
    }
}

impl RoleSource for StaticRoles {
    fn is_supervisor(&self, principal: &Principal) -> Result<bool, RoleError> {
        Ok(self.get(principal).supervisor)
    }

    fn is_hr(&self, principal: &Principal) -> Result<bool, RoleError> {
        Ok(self.get(principal).hr)
    }

    fn is_super_admin(&self, principal: &Principal) -> Result<bool, RoleError> {
        Ok(self.get(principal).super_admin)
    }
}

/// Outcome of a channel admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Admitted; carries the presence payload for the auth response.
    Allow(PresencePayload),
    /// Not admitted.
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// The channel authorizer.
///
/// Pure with respect to its inputs: `(principal, channel) -> Decision`,
/// plus structured log entries for denials and predicate failures.
pub struct Authorizer<R: RoleSource> {
    roles: R,
}

impl<R: RoleSource> Authorizer<R> {
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Decides admission for `principal` (or an unauthenticated request
    /// when `None`) on `channel`.
    pub fn authorize(&self, principal: Option<&Principal>, channel: &ChannelName) -> Decision {
        let Some(principal) = principal else {
            tracing::debug!(channel = %channel, "denied unauthenticated subscription");
            return Decision::Deny;
        };

        let allowed = match channel {
            // Any authenticated principal, staff or employee session.
            ChannelName::Notifications => true,

            ChannelName::AdminNotifications
            | ChannelName::AdminLeave
            | ChannelName::AdminAbsence => principal.kind == PrincipalKind::Staff,

            ChannelName::Employee(id) => {
                if principal.kind == PrincipalKind::Employee {
                    principal.id == *id
                } else {
                    // Any staff session is admitted to any employee channel.
                    // The admission is deliberately audible: dashboards rely
                    // on it, but it grants staff-wide reach over private
                    // channels, so non-matching ids are logged.
                    if principal.id != *id {
                        tracing::warn!(
                            channel = %channel,
                            staff_id = principal.id,
                            "staff principal admitted to non-matching employee channel"
                        );
                    }
                    true
                }
            }

            ChannelName::Supervisor(id) => {
                principal.kind == PrincipalKind::Staff
                    && (principal.id == *id
                        || self.check(principal, channel, "is_supervisor", |r, p| {
                            r.is_supervisor(p)
                        })
                        || self.check(principal, channel, "is_super_admin", |r, p| {
                            r.is_super_admin(p)
                        }))
            }

            ChannelName::Hr(id) => {
                principal.kind == PrincipalKind::Staff
                    && (principal.id == *id
                        || self.check(principal, channel, "is_hr", |r, p| r.is_hr(p))
                        || self.check(principal, channel, "is_super_admin", |r, p| {
                            r.is_super_admin(p)
                        }))
            }
        };

        if allowed {
            Decision::Allow(PresencePayload::from(principal))
        } else {
            tracing::info!(
                channel = %channel,
                principal_id = principal.id,
                principal_kind = principal.kind.label(),
                "channel subscription denied"
            );
            Decision::Deny
        }
    }

    /// Evaluates one role predicate, logging and absorbing any error.
    fn check(
        &self,
        principal: &Principal,
        channel: &ChannelName,
        predicate: &'static str,
        eval: impl Fn(&R, &Principal) -> Result<bool, RoleError>,
    ) -> bool {
        match eval(&self.roles, principal) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    channel = %channel,
                    principal_id = principal.id,
                    predicate,
                    "role predicate failed, treating as false: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Role source whose predicates always fail, for fault-isolation tests.
    struct FailingRoles;

    impl RoleSource for FailingRoles {
        fn is_supervisor(&self, _: &Principal) -> Result<bool, RoleError> {
            Err(RoleError::Lookup("directory offline".into()))
        }
        fn is_hr(&self, _: &Principal) -> Result<bool, RoleError> {
            Err(RoleError::Lookup("directory offline".into()))
        }
        fn is_super_admin(&self, _: &Principal) -> Result<bool, RoleError> {
            Err(RoleError::Lookup("directory offline".into()))
        }
    }

    fn supervisor_flags() -> RoleFlags {
        RoleFlags {
            supervisor: true,
            ..RoleFlags::none()
        }
    }

    #[test]
    fn supervisor_own_id_short_circuits() {
        let auth = Authorizer::new(StaticRoles::single(7, supervisor_flags()));
        let principal = Principal::staff(7, "Sup Seven");
        let decision = auth.authorize(Some(&principal), &ChannelName::Supervisor(7));
        assert_eq!(
            decision,
            Decision::Allow(PresencePayload {
                id: 7,
                name: "Sup Seven".to_string()
            })
        );
    }

    #[test]
    fn supervisor_role_predicate_admits_other_id() {
        let auth = Authorizer::new(StaticRoles::single(9, supervisor_flags()));
        let principal = Principal::staff(9, "Sup Nine");
        assert!(auth
            .authorize(Some(&principal), &ChannelName::Supervisor(7))
            .is_allowed());
    }

    #[test]
    fn non_supervisor_denied_on_foreign_channel() {
        let auth = Authorizer::new(StaticRoles::single(9, RoleFlags::none()));
        let principal = Principal::staff(9, "Plain Staff");
        assert_eq!(
            auth.authorize(Some(&principal), &ChannelName::Supervisor(7)),
            Decision::Deny
        );
    }

    #[test]
    fn unauthenticated_denied_everywhere() {
        let auth = Authorizer::new(StaticRoles::new());
        for channel in [
            ChannelName::Notifications,
            ChannelName::AdminLeave,
            ChannelName::Supervisor(7),
            ChannelName::Hr(2),
            ChannelName::Employee(5),
        ] {
            assert_eq!(auth.authorize(None, &channel), Decision::Deny);
        }
    }

    #[test]
    fn predicate_failure_is_not_fatal_and_falls_through_to_deny() {
        let auth = Authorizer::new(FailingRoles);
        let principal = Principal::staff(9, "Sup Nine");
        // Both is_supervisor and is_super_admin error out; the ladder
        // treats them as false rather than panicking.
        assert_eq!(
            auth.authorize(Some(&principal), &ChannelName::Supervisor(7)),
            Decision::Deny
        );
    }

    #[test]
    fn predicate_failure_still_allows_id_match() {
        let auth = Authorizer::new(FailingRoles);
        let principal = Principal::staff(7, "Sup Seven");
        assert!(auth
            .authorize(Some(&principal), &ChannelName::Supervisor(7))
            .is_allowed());
    }

    #[test]
    fn hr_ladder_mirrors_supervisor() {
        let mut roles = StaticRoles::new();
        roles.insert(
            4,
            RoleFlags {
                hr: true,
                ..RoleFlags::none()
            },
        );
        roles.insert(
            5,
            RoleFlags {
                super_admin: true,
                ..RoleFlags::none()
            },
        );
        let auth = Authorizer::new(roles);

        assert!(auth
            .authorize(Some(&Principal::staff(4, "HR")), &ChannelName::Hr(12))
            .is_allowed());
        assert!(auth
            .authorize(Some(&Principal::staff(5, "Admin")), &ChannelName::Hr(12))
            .is_allowed());
        assert!(!auth
            .authorize(Some(&Principal::staff(6, "Other")), &ChannelName::Hr(12))
            .is_allowed());
    }

    #[test]
    fn notifications_admits_both_session_kinds() {
        let auth = Authorizer::new(StaticRoles::new());
        assert!(auth
            .authorize(Some(&Principal::staff(1, "S")), &ChannelName::Notifications)
            .is_allowed());
        assert!(auth
            .authorize(
                Some(&Principal::employee(2, "E")),
                &ChannelName::Notifications
            )
            .is_allowed());
    }

    #[test]
    fn admin_scopes_are_staff_only() {
        let auth = Authorizer::new(StaticRoles::new());
        let employee = Principal::employee(2, "E");
        for channel in [
            ChannelName::AdminNotifications,
            ChannelName::AdminLeave,
            ChannelName::AdminAbsence,
        ] {
            assert_eq!(auth.authorize(Some(&employee), &channel), Decision::Deny);
            assert!(auth
                .authorize(Some(&Principal::staff(1, "S")), &channel)
                .is_allowed());
        }
    }

    #[test]
    fn employee_channel_admits_owner_and_staff() {
        let auth = Authorizer::new(StaticRoles::new());
        let owner = Principal::employee(5, "Owner");
        let other = Principal::employee(6, "Other");
        let staff = Principal::staff(1, "Staff");

        assert!(auth
            .authorize(Some(&owner), &ChannelName::Employee(5))
            .is_allowed());
        assert_eq!(
            auth.authorize(Some(&other), &ChannelName::Employee(5)),
            Decision::Deny
        );
        assert!(auth
            .authorize(Some(&staff), &ChannelName::Employee(5))
            .is_allowed());
    }
}
