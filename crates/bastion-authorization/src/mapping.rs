//! Role and principal mapping
//!
//! Mapping runs before authorization: principal mappers rewrite the caller
//! principal, then role mappers transform the caller's role group, each in
//! configuration order.

use crate::config::{MappingEntry, ModuleOptions, SecurityDomainConfig};
use crate::registry::{PrincipalMappingRegistry, Providers, RoleMappingRegistry};
use bastion_core::{Principal, Result, Role, RoleGroup, SimpleRole, Subject};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Transforms the roles of an authenticated subject
pub trait RoleMappingProvider: Send + Sync {
    /// Roles `subject` holds after mapping `roles`
    fn map_roles(&self, subject: &Subject, roles: RoleGroup) -> Result<RoleGroup>;
}

/// Rewrites a caller principal
pub trait PrincipalMappingProvider: Send + Sync {
    /// Replacement principal, or `None` to keep the original
    fn map_principal(&self, principal: &Principal) -> Result<Option<Principal>>;
}

/// Adds configured roles for each principal the subject carries
#[derive(Debug, Clone, Default)]
pub struct PrincipalRolesMapper {
    principals: BTreeMap<String, Vec<String>>,
}

impl PrincipalRolesMapper {
    /// Mapper over a principal → roles table
    pub fn new(principals: BTreeMap<String, Vec<String>>) -> Self {
        Self { principals }
    }

    /// Build from the `principals` option
    pub fn from_options(options: &ModuleOptions) -> Result<Self> {
        Ok(Self::new(options.get_str_list_table("principals")?))
    }
}

impl RoleMappingProvider for PrincipalRolesMapper {
    fn map_roles(&self, subject: &Subject, mut roles: RoleGroup) -> Result<RoleGroup> {
        for principal in subject.principals() {
            if let Some(granted) = self.principals.get(principal.name()) {
                for role in granted {
                    roles.add_role(Role::simple(role.as_str()));
                }
            }
        }
        Ok(roles)
    }
}

/// Maps role names one-to-many
///
/// Mapped roles are added next to the original unless `replace` is set, in
/// which case the original is dropped. Replacement flattens nested groups.
#[derive(Debug, Clone, Default)]
pub struct RoleMapMapper {
    roles: BTreeMap<String, Vec<String>>,
    replace: bool,
}

impl RoleMapMapper {
    /// Mapper over a role → roles table
    pub fn new(roles: BTreeMap<String, Vec<String>>, replace: bool) -> Self {
        Self { roles, replace }
    }

    /// Build from the `roles` and `replace-roles` options
    pub fn from_options(options: &ModuleOptions) -> Result<Self> {
        Ok(Self::new(
            options.get_str_list_table("roles")?,
            options.get_bool("replace-roles")?.unwrap_or(false),
        ))
    }
}

impl RoleMappingProvider for RoleMapMapper {
    fn map_roles(&self, _subject: &Subject, roles: RoleGroup) -> Result<RoleGroup> {
        let leaves = roles.leaf_names();
        let mut mapped = if self.replace {
            RoleGroup::new(roles.name())
        } else {
            roles.clone()
        };
        for leaf in &leaves {
            match self.roles.get(leaf) {
                Some(targets) => {
                    for target in targets {
                        mapped.add_role(Role::simple(target.as_str()));
                    }
                }
                None if self.replace => {
                    mapped.add_role(Role::Simple(SimpleRole::new(leaf.as_str())));
                }
                None => {}
            }
        }
        Ok(mapped)
    }
}

/// Maps caller principal names through a table
#[derive(Debug, Clone, Default)]
pub struct PrincipalMapMapper {
    principals: BTreeMap<String, String>,
}

impl PrincipalMapMapper {
    /// Mapper over a principal → principal table
    pub fn new(principals: BTreeMap<String, String>) -> Self {
        Self { principals }
    }

    /// Build from the `principals` option
    pub fn from_options(options: &ModuleOptions) -> Result<Self> {
        Ok(Self::new(options.get_str_table("principals")?))
    }
}

impl PrincipalMappingProvider for PrincipalMapMapper {
    fn map_principal(&self, principal: &Principal) -> Result<Option<Principal>> {
        Ok(self
            .principals
            .get(principal.name())
            .map(|name| Principal::new(name.as_str())))
    }
}

/// Register `principal-roles`, `role-map` and `principal-map`
pub fn register_builtin(roles: &mut RoleMappingRegistry, principals: &mut PrincipalMappingRegistry) {
    roles.register("principal-roles", |options: &ModuleOptions| {
        Ok(Arc::new(PrincipalRolesMapper::from_options(options)?) as Arc<dyn RoleMappingProvider>)
    });
    roles.register("role-map", |options: &ModuleOptions| {
        Ok(Arc::new(RoleMapMapper::from_options(options)?) as Arc<dyn RoleMappingProvider>)
    });
    principals.register("principal-map", |options: &ModuleOptions| {
        Ok(Arc::new(PrincipalMapMapper::from_options(options)?) as Arc<dyn PrincipalMappingProvider>)
    });
}

/// The mapping chains of one security domain
#[derive(Clone, Default)]
pub struct MappingManager {
    role_mappers: Vec<Arc<dyn RoleMappingProvider>>,
    principal_mappers: Vec<Arc<dyn PrincipalMappingProvider>>,
}

impl MappingManager {
    /// Build the domain's chains; unknown provider ids are configuration errors
    pub fn from_config(config: &SecurityDomainConfig, providers: &Providers) -> Result<Self> {
        let role_mappers = config
            .role_mapping
            .iter()
            .map(|entry: &MappingEntry| providers.role_mappers.create(&entry.provider, &entry.options))
            .collect::<Result<Vec<_>>>()?;
        let principal_mappers = config
            .principal_mapping
            .iter()
            .map(|entry: &MappingEntry| {
                providers
                    .principal_mappers
                    .create(&entry.provider, &entry.options)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            role_mappers,
            principal_mappers,
        })
    }

    /// Whether both chains are empty
    pub fn is_empty(&self) -> bool {
        self.role_mappers.is_empty() && self.principal_mappers.is_empty()
    }

    /// Apply the role-mapping chain
    pub fn map_roles(&self, subject: &Subject, roles: RoleGroup) -> Result<RoleGroup> {
        self.role_mappers
            .iter()
            .try_fold(roles, |roles, mapper| mapper.map_roles(subject, roles))
    }

    /// Apply the principal-mapping chain to the caller principal
    pub fn map_subject(&self, subject: &Subject) -> Result<Subject> {
        let mut mapped = subject.clone();
        let Some(original) = subject.caller() else {
            return Ok(mapped);
        };
        let mut caller = original.clone();
        for mapper in &self.principal_mappers {
            if let Some(next) = mapper.map_principal(&caller)? {
                tracing::trace!(from = %caller, to = %next, "caller principal mapped");
                caller = next;
            }
        }
        if &caller != original {
            mapped.replace_caller(caller);
        }
        Ok(mapped)
    }
}

impl std::fmt::Debug for MappingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingManager")
            .field("role_mappers", &self.role_mappers.len())
            .field("principal_mappers", &self.principal_mappers.len())
            .finish()
    }
}
