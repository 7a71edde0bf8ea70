//! Provider registries
//!
//! Modules and mapping providers are resolved by string identifier through
//! registries populated at startup. A registry maps an id to a factory that
//! builds the provider from its configured options.

use crate::acl::AclContext;
use crate::config::ModuleOptions;
use crate::mapping::{self, PrincipalMappingProvider, RoleMappingProvider};
use crate::module::AuthorizationModule;
use crate::modules;
use crate::trust::{self, TrustModule};
use bastion_core::{BastionError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Factory building a provider from its options
pub type ProviderFactory<P> = Arc<dyn Fn(&ModuleOptions) -> Result<Arc<P>> + Send + Sync>;

/// Identifier → factory map for one kind of provider
pub struct ProviderRegistry<P: ?Sized> {
    kind: &'static str,
    factories: BTreeMap<String, ProviderFactory<P>>,
}

impl<P: ?Sized> ProviderRegistry<P> {
    /// Empty registry; `kind` names the provider kind in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) the factory for `id`
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&ModuleOptions) -> Result<Arc<P>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the provider registered under `id`
    pub fn create(&self, id: &str, options: &ModuleOptions) -> Result<Arc<P>> {
        let factory = self.factories.get(id).ok_or_else(|| {
            BastionError::configuration(format!("unknown {} '{id}'", self.kind))
        })?;
        factory(options)
    }
}

impl<P: ?Sized> Clone for ProviderRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            factories: self.factories.clone(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for ProviderRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kind", &self.kind)
            .field("ids", &self.ids())
            .finish()
    }
}

/// Registry of authorization modules
pub type ModuleRegistry = ProviderRegistry<dyn AuthorizationModule>;

/// Registry of role-mapping providers
pub type RoleMappingRegistry = ProviderRegistry<dyn RoleMappingProvider>;

/// Registry of principal-mapping providers
pub type PrincipalMappingRegistry = ProviderRegistry<dyn PrincipalMappingProvider>;

/// Registry of identity-trust modules
pub type TrustRegistry = ProviderRegistry<dyn TrustModule>;

/// Every registry a security domain draws from
#[derive(Debug, Clone)]
pub struct Providers {
    /// Authorization modules
    pub modules: ModuleRegistry,
    /// Role-mapping providers
    pub role_mappers: RoleMappingRegistry,
    /// Principal-mapping providers
    pub principal_mappers: PrincipalMappingRegistry,
    /// Identity-trust modules
    pub trust_modules: TrustRegistry,
}

impl Providers {
    /// Registries with nothing registered
    pub fn empty() -> Self {
        Self {
            modules: ModuleRegistry::new("authorization module"),
            role_mappers: RoleMappingRegistry::new("role-mapping provider"),
            principal_mappers: PrincipalMappingRegistry::new("principal-mapping provider"),
            trust_modules: TrustRegistry::new("trust module"),
        }
    }

    /// Registries holding every built-in provider except the ACL module
    pub fn builtin() -> Self {
        let mut providers = Self::empty();
        modules::register_builtin(&mut providers.modules, None);
        mapping::register_builtin(&mut providers.role_mappers, &mut providers.principal_mappers);
        trust::register_builtin(&mut providers.trust_modules);
        providers
    }

    /// Register the `acl` module and ACL-aware `delegating` module
    pub fn with_acl(mut self, acl: Arc<AclContext>) -> Self {
        modules::register_builtin(&mut self.modules, Some(acl));
        self
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::ModuleOutcome;
    use bastion_core::{Resource, RoleGroup, Subject};

    struct Fixed(bool);

    impl AuthorizationModule for Fixed {
        fn authorize(&self, _: &Resource, _: &Subject, _: &RoleGroup) -> ModuleOutcome {
            ModuleOutcome::permit_if(self.0)
        }
    }

    #[test]
    fn registers_and_creates() {
        let mut registry = ModuleRegistry::new("authorization module");
        registry.register("fixed", |options: &ModuleOptions| {
            let permit = options.get_bool("permit")?.unwrap_or(false);
            Ok(Arc::new(Fixed(permit)) as Arc<dyn AuthorizationModule>)
        });
        assert!(registry.contains("fixed"));
        assert_eq!(registry.ids(), vec!["fixed"]);

        let module = registry
            .create("fixed", &ModuleOptions::new().with("permit", true))
            .unwrap();
        let outcome = module.authorize(
            &Resource::new(bastion_core::ResourceId::new(
                bastion_core::ResourceKind::Web,
                "/",
            )),
            &Subject::anonymous(),
            &RoleGroup::new("Roles"),
        );
        assert_eq!(outcome, ModuleOutcome::Permit);
    }

    #[test]
    fn unknown_id_is_configuration_error() {
        let registry = ModuleRegistry::new("authorization module");
        let err = registry.create("ghost", &ModuleOptions::new()).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn builtin_providers_are_registered() {
        let providers = Providers::builtin();
        for id in ["permit-all", "deny-all", "ejb", "web", "delegating"] {
            assert!(providers.modules.contains(id), "missing {id}");
        }
        assert!(!providers.modules.contains("acl"));
        assert!(providers.role_mappers.contains("principal-roles"));
        assert!(providers.role_mappers.contains("role-map"));
        assert!(providers.principal_mappers.contains("principal-map"));
        assert!(providers.trust_modules.contains("principal-list"));
    }
}
