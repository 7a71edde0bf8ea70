//! EJB method-permission and role-reference checks

use crate::config::ModuleOptions;
use crate::decision::ModuleOutcome;
use crate::module::AuthorizationModule;
use bastion_core::{BastionError, EjbInvocation, Resource, ResourceDetail, Result, RoleGroup, Subject};

/// Option naming the outcome for methods with no method roles
pub const UNSPECIFIED_METHOD_OPTION: &str = "unspecified-method";

/// Decides EJB invocations from their method-permission metadata
///
/// Evaluation order: a programmatic role check (`isCallerInRole`) is
/// answered from the caller roles alone; otherwise excluded methods are
/// denied, unchecked methods are permitted, and any other method requires the
/// caller to hold at least one of its method roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct EjbPolicyModule {
    permit_unspecified: bool,
}

impl EjbPolicyModule {
    /// Module denying methods that declare no roles
    pub fn new() -> Self {
        Self::default()
    }

    /// Module permitting methods that declare no roles
    pub fn permit_unspecified() -> Self {
        Self {
            permit_unspecified: true,
        }
    }

    /// Build from module options (`unspecified-method = "deny" | "permit"`)
    pub fn from_options(options: &ModuleOptions) -> Result<Self> {
        match options.get_str(UNSPECIFIED_METHOD_OPTION)? {
            None => Ok(Self::new()),
            Some(value) if value.eq_ignore_ascii_case("deny") => Ok(Self::new()),
            Some(value) if value.eq_ignore_ascii_case("permit") => Ok(Self::permit_unspecified()),
            Some(other) => Err(BastionError::configuration(format!(
                "option '{UNSPECIFIED_METHOD_OPTION}' must be 'deny' or 'permit', got '{other}'"
            ))),
        }
    }

    pub(crate) fn decide(&self, invocation: &EjbInvocation, caller_roles: &RoleGroup) -> ModuleOutcome {
        if let Some(check) = &invocation.role_ref {
            return ModuleOutcome::permit_if(caller_roles.contains_role_named(check.effective_role()));
        }
        if invocation.excluded {
            return ModuleOutcome::Deny;
        }
        if invocation.unchecked {
            return ModuleOutcome::Permit;
        }
        if invocation.method_roles.is_empty() {
            return ModuleOutcome::permit_if(self.permit_unspecified);
        }
        ModuleOutcome::permit_if(caller_roles.contains_at_least_one_role(&invocation.method_roles))
    }
}

impl AuthorizationModule for EjbPolicyModule {
    fn authorize(&self, resource: &Resource, _: &Subject, caller_roles: &RoleGroup) -> ModuleOutcome {
        match resource.detail() {
            ResourceDetail::Ejb(invocation) => self.decide(invocation, caller_roles),
            _ => ModuleOutcome::Abstain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{ResourceId, ResourceKind, ANY_AUTHENTICATED};

    fn caller(roles: &[&str]) -> RoleGroup {
        RoleGroup::from_names(RoleGroup::CALLER_ROLES, roles.iter().copied())
    }

    fn method(roles: &[&str]) -> EjbInvocation {
        EjbInvocation::new("Ledger")
            .method("post")
            .method_roles(RoleGroup::from_names("method", roles.iter().copied()))
    }

    fn run(module: EjbPolicyModule, invocation: EjbInvocation, roles: &[&str]) -> ModuleOutcome {
        module.authorize(&Resource::ejb(invocation), &Subject::anonymous(), &caller(roles))
    }

    #[test]
    fn caller_needs_one_method_role() {
        let module = EjbPolicyModule::new();
        assert_eq!(run(module, method(&["clerk", "auditor"]), &["auditor"]), ModuleOutcome::Permit);
        assert_eq!(run(module, method(&["clerk"]), &["guest"]), ModuleOutcome::Deny);
    }

    #[test]
    fn any_authenticated_method_role_admits_any_caller_role() {
        let module = EjbPolicyModule::new();
        assert_eq!(
            run(module, method(&[ANY_AUTHENTICATED]), &["guest"]),
            ModuleOutcome::Permit
        );
        assert_eq!(run(module, method(&[ANY_AUTHENTICATED]), &[]), ModuleOutcome::Deny);
    }

    #[test]
    fn excluded_beats_unchecked_and_roles() {
        let module = EjbPolicyModule::new();
        let invocation = method(&["clerk"]).unchecked().excluded();
        assert_eq!(run(module, invocation, &["clerk"]), ModuleOutcome::Deny);
        assert_eq!(run(module, method(&[]).unchecked(), &[]), ModuleOutcome::Permit);
    }

    #[test]
    fn unspecified_method_uses_option() {
        assert_eq!(run(EjbPolicyModule::new(), method(&[]), &["clerk"]), ModuleOutcome::Deny);
        let permissive =
            EjbPolicyModule::from_options(&ModuleOptions::new().with(UNSPECIFIED_METHOD_OPTION, "PERMIT"))
                .unwrap();
        assert_eq!(run(permissive, method(&[]), &["clerk"]), ModuleOutcome::Permit);
        assert!(EjbPolicyModule::from_options(
            &ModuleOptions::new().with(UNSPECIFIED_METHOD_OPTION, "maybe")
        )
        .unwrap_err()
        .is_configuration());
    }

    #[test]
    fn role_ref_check_uses_linked_role() {
        let module = EjbPolicyModule::new();
        let mut resource = Resource::ejb(EjbInvocation::new("Ledger").role_ref_check("roleLink"));
        resource.link_role_ref("roleA");
        let subject = Subject::anonymous();
        assert_eq!(
            module.authorize(&resource, &subject, &caller(&["roleA"])),
            ModuleOutcome::Permit
        );
        assert_eq!(
            module.authorize(&resource, &subject, &caller(&["roleB"])),
            ModuleOutcome::Deny
        );
    }

    #[test]
    fn other_layers_abstain() {
        let resource = Resource::new(ResourceId::new(ResourceKind::Web, "/"));
        assert_eq!(
            EjbPolicyModule::new().authorize(&resource, &Subject::anonymous(), &caller(&["a"])),
            ModuleOutcome::Abstain
        );
    }
}
