//! Layer-dispatching module

use super::acl::AclModule;
use super::ejb::EjbPolicyModule;
use super::web::WebPolicyModule;
use crate::decision::ModuleOutcome;
use crate::module::AuthorizationModule;
use bastion_core::{Resource, ResourceDetail, RoleGroup, Subject};

/// Routes each request to the module for its layer
///
/// Generic resources, and ACL resources when no ACL module is configured,
/// abstain.
#[derive(Debug, Clone, Default)]
pub struct DelegatingModule {
    ejb: EjbPolicyModule,
    web: WebPolicyModule,
    acl: Option<AclModule>,
}

impl DelegatingModule {
    /// Dispatcher over the given layer modules
    pub fn new(ejb: EjbPolicyModule, acl: Option<AclModule>) -> Self {
        Self {
            ejb,
            web: WebPolicyModule,
            acl,
        }
    }
}

impl AuthorizationModule for DelegatingModule {
    fn authorize(&self, resource: &Resource, subject: &Subject, caller_roles: &RoleGroup) -> ModuleOutcome {
        match resource.detail() {
            ResourceDetail::Ejb(invocation) => self.ejb.decide(invocation, caller_roles),
            ResourceDetail::Web(request) => self.web.decide(request, caller_roles),
            ResourceDetail::Acl(request) => match &self.acl {
                Some(acl) => acl.decide(resource, request, subject, caller_roles),
                None => ModuleOutcome::Abstain,
            },
            ResourceDetail::Generic => ModuleOutcome::Abstain,
        }
    }
}
