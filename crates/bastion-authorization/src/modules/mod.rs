//! Built-in authorization modules
//!
//! | id           | module                |
//! |--------------|-----------------------|
//! | `permit-all` | [`PermitAllModule`]   |
//! | `deny-all`   | [`DenyAllModule`]     |
//! | `ejb`        | [`EjbPolicyModule`]   |
//! | `web`        | [`WebPolicyModule`]   |
//! | `acl`        | [`AclModule`]         |
//! | `delegating` | [`DelegatingModule`]  |
//!
//! `acl` is only registered when an [`AclContext`] is supplied.

mod acl;
mod delegating;
mod ejb;
mod permit_deny;
mod web;

pub use acl::{AclModule, CHECK_ROLES_OPTION};
pub use delegating::DelegatingModule;
pub use ejb::{EjbPolicyModule, UNSPECIFIED_METHOD_OPTION};
pub use permit_deny::{DenyAllModule, PermitAllModule};
pub use web::WebPolicyModule;

use crate::acl::AclContext;
use crate::config::ModuleOptions;
use crate::module::AuthorizationModule;
use crate::registry::ModuleRegistry;
use std::sync::Arc;

/// Register the built-in modules, plus the ACL module when `acl` is given
pub fn register_builtin(registry: &mut ModuleRegistry, acl: Option<Arc<AclContext>>) {
    registry.register("permit-all", |_: &ModuleOptions| {
        Ok(Arc::new(PermitAllModule) as Arc<dyn AuthorizationModule>)
    });
    registry.register("deny-all", |_: &ModuleOptions| {
        Ok(Arc::new(DenyAllModule) as Arc<dyn AuthorizationModule>)
    });
    registry.register("ejb", |options: &ModuleOptions| {
        Ok(Arc::new(EjbPolicyModule::from_options(options)?) as Arc<dyn AuthorizationModule>)
    });
    registry.register("web", |_: &ModuleOptions| {
        Ok(Arc::new(WebPolicyModule) as Arc<dyn AuthorizationModule>)
    });

    match acl {
        Some(acl) => {
            let for_acl = Arc::clone(&acl);
            registry.register("acl", move |options: &ModuleOptions| {
                let module = AclModule::from_options(Arc::clone(&for_acl), options)?;
                Ok(Arc::new(module) as Arc<dyn AuthorizationModule>)
            });
            registry.register("delegating", move |options: &ModuleOptions| {
                let ejb = EjbPolicyModule::from_options(options)?;
                let acl = AclModule::from_options(Arc::clone(&acl), options)?;
                Ok(Arc::new(DelegatingModule::new(ejb, Some(acl))) as Arc<dyn AuthorizationModule>)
            });
        }
        None => {
            registry.register("delegating", |options: &ModuleOptions| {
                let ejb = EjbPolicyModule::from_options(options)?;
                Ok(Arc::new(DelegatingModule::new(ejb, None)) as Arc<dyn AuthorizationModule>)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::InMemoryAclStrategy;

    #[test]
    fn acl_module_needs_acl_context() {
        let mut registry = ModuleRegistry::new("authorization module");
        register_builtin(&mut registry, None);
        assert!(!registry.contains("acl"));

        let acl = Arc::new(AclContext::new(Arc::new(InMemoryAclStrategy::new())));
        register_builtin(&mut registry, Some(acl));
        assert_eq!(
            registry.ids(),
            vec!["acl", "delegating", "deny-all", "ejb", "permit-all", "web"]
        );
    }

    #[test]
    fn factories_validate_options() {
        let mut registry = ModuleRegistry::new("authorization module");
        register_builtin(&mut registry, None);
        let bad = ModuleOptions::new().with(UNSPECIFIED_METHOD_OPTION, 3);
        assert!(registry.create("ejb", &bad).err().unwrap().is_configuration());
        assert!(registry.create("delegating", &bad).is_err());
        assert!(registry.create("web", &bad).is_ok());
    }
}
