//! ACL-backed module

use crate::acl::AclContext;
use crate::config::ModuleOptions;
use crate::decision::ModuleOutcome;
use crate::module::AuthorizationModule;
use bastion_core::{AclRequest, Resource, ResourceDetail, Result, RoleGroup, Subject};
use std::sync::Arc;

/// Option enabling role entries in the ACL lookup
pub const CHECK_ROLES_OPTION: &str = "check-roles";

/// Grants ACL requests the caller's ACL entries cover
#[derive(Debug, Clone)]
pub struct AclModule {
    acl: Arc<AclContext>,
    check_roles: bool,
}

impl AclModule {
    /// Module consulting `acl`; role entries count when `check_roles`
    pub fn new(acl: Arc<AclContext>, check_roles: bool) -> Self {
        Self { acl, check_roles }
    }

    /// Build from module options (`check-roles`, default `true`)
    pub fn from_options(acl: Arc<AclContext>, options: &ModuleOptions) -> Result<Self> {
        let check_roles = options.get_bool(CHECK_ROLES_OPTION)?.unwrap_or(true);
        Ok(Self::new(acl, check_roles))
    }

    pub(crate) fn decide(
        &self,
        resource: &Resource,
        request: &AclRequest,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> ModuleOutcome {
        let Some(caller) = subject.caller() else {
            return ModuleOutcome::Deny;
        };
        let roles = self.check_roles.then_some(caller_roles);
        self.acl
            .authorize(resource.id(), caller.name(), roles, request.permission)
            .into()
    }
}

impl AuthorizationModule for AclModule {
    fn authorize(&self, resource: &Resource, subject: &Subject, caller_roles: &RoleGroup) -> ModuleOutcome {
        match resource.detail() {
            ResourceDetail::Acl(request) => self.decide(resource, request, subject, caller_roles),
            _ => ModuleOutcome::Abstain,
        }
    }
}
