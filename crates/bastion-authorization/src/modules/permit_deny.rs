//! Constant-outcome modules

use crate::decision::ModuleOutcome;
use crate::module::AuthorizationModule;
use bastion_core::{Resource, RoleGroup, Subject};

/// Permits every request
#[derive(Debug, Default, Clone, Copy)]
pub struct PermitAllModule;

impl AuthorizationModule for PermitAllModule {
    fn authorize(&self, _: &Resource, _: &Subject, _: &RoleGroup) -> ModuleOutcome {
        ModuleOutcome::Permit
    }
}

/// Denies every request
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllModule;

impl AuthorizationModule for DenyAllModule {
    fn authorize(&self, _: &Resource, _: &Subject, _: &RoleGroup) -> ModuleOutcome {
        ModuleOutcome::Deny
    }
}
