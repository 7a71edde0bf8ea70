//! Web resource, user-data and role-reference checks

use crate::decision::ModuleOutcome;
use crate::module::AuthorizationModule;
use bastion_core::{Resource, ResourceDetail, RoleGroup, Subject, TransportGuarantee, WebRequest};

/// Decides web requests from their matching security constraints
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPolicyModule;

impl WebPolicyModule {
    pub(crate) fn decide(&self, request: &WebRequest, caller_roles: &RoleGroup) -> ModuleOutcome {
        if let Some(check) = &request.role_ref {
            return ModuleOutcome::permit_if(caller_roles.contains_role_named(check.effective_role()));
        }
        if request.excluded {
            return ModuleOutcome::Deny;
        }
        if request.transport_guarantee != TransportGuarantee::None && !request.secure {
            tracing::debug!(
                uri = %request.uri,
                guarantee = ?request.transport_guarantee,
                "user-data constraint requires a secure request"
            );
            return ModuleOutcome::Deny;
        }
        if request.unchecked {
            return ModuleOutcome::Permit;
        }
        if request.required_roles.is_empty() {
            return ModuleOutcome::Deny;
        }
        ModuleOutcome::permit_if(caller_roles.contains_at_least_one_role(&request.required_roles))
    }
}

impl AuthorizationModule for WebPolicyModule {
    fn authorize(&self, resource: &Resource, _: &Subject, caller_roles: &RoleGroup) -> ModuleOutcome {
        match resource.detail() {
            ResourceDetail::Web(request) => self.decide(request, caller_roles),
            _ => ModuleOutcome::Abstain,
        }
    }
}
