//! Authorization module contract

use crate::decision::ModuleOutcome;
use bastion_core::{Resource, RoleGroup, Subject};

/// A pluggable authorization decision-maker
///
/// Modules are shared across threads and invoked concurrently; they must not
/// keep per-request state. Implementations that consult an external policy
/// store may block.
pub trait AuthorizationModule: Send + Sync {
    /// Decide whether `subject`, holding `caller_roles`, may access `resource`
    fn authorize(
        &self,
        resource: &Resource,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> ModuleOutcome;
}
