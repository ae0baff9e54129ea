//! Authorization predicates.
//!
//! These functions only answer yes or no. Turning a `false` into an HTTP-visible
//! rejection is the caller's job.

use crate::entities::user::Role;

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID of the caller
    pub id: i64,
    /// Role loaded at authentication time
    pub role: Role,
}

impl Actor {
    /// Whether this actor may change something owned by `owner_id`, either as its owner
    /// or as a moderator/admin.
    #[must_use]
    pub fn may_manage(&self, owner_id: i64) -> bool {
        can_modify(self.id, owner_id) || require_role(self.role, Role::Moderator)
    }
}

/// Ownership check: only the stored owner may modify a resource.
#[must_use]
pub const fn can_modify(actor_id: i64, resource_owner_id: i64) -> bool {
    actor_id == resource_owner_id
}

/// Role check over the ordering `user < moderator < admin`.
#[must_use]
pub fn require_role(actor_role: Role, minimum_role: Role) -> bool {
    actor_role >= minimum_role
}
