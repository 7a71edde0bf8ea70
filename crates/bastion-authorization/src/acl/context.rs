//! ACL-based decisions

use super::entry::AclIdentity;
use super::list::Acl;
use super::strategy::AclPersistenceStrategy;
use crate::decision::AuthorizationDecision;
use bastion_core::{CompositeAclPermission, ResourceId, Result, RoleGroup};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Decides ACL access against a persistence strategy
#[derive(Clone)]
pub struct AclContext {
    strategy: Arc<dyn AclPersistenceStrategy>,
}

impl AclContext {
    /// Context backed by `strategy`
    pub fn new(strategy: Arc<dyn AclPersistenceStrategy>) -> Self {
        Self { strategy }
    }

    /// Backing store
    pub fn strategy(&self) -> &Arc<dyn AclPersistenceStrategy> {
        &self.strategy
    }

    /// Whether `identity` (or any of `roles`) holds every requested bit on
    /// `resource`. A resource without an ACL, or an ACL with no entry for the
    /// identity or its roles, is denied.
    pub fn authorize(
        &self,
        resource: &ResourceId,
        identity: &str,
        roles: Option<&RoleGroup>,
        requested: CompositeAclPermission,
    ) -> Result<AuthorizationDecision> {
        let Some(acl) = self.strategy.get_acl(resource)? else {
            tracing::debug!(resource = %resource, identity, "no ACL for resource");
            return Ok(AuthorizationDecision::Deny);
        };
        let Some(granted) = acl.effective_permission(identity, roles) else {
            tracing::debug!(resource = %resource, identity, "no ACL entry for identity");
            return Ok(AuthorizationDecision::Deny);
        };
        let permitted = granted.contains_permission(requested);
        tracing::trace!(
            resource = %resource,
            identity,
            requested = %requested,
            granted = %granted,
            permitted,
            "ACL evaluated"
        );
        Ok(permitted.into())
    }

    /// Effective permission held on each resource that has an ACL.
    /// Resources with no ACL, or granting nothing, are omitted.
    pub fn entitlements<'a, I>(
        &self,
        identity: &str,
        roles: Option<&RoleGroup>,
        resources: I,
    ) -> Result<BTreeMap<ResourceId, CompositeAclPermission>>
    where
        I: IntoIterator<Item = &'a ResourceId>,
    {
        let mut out = BTreeMap::new();
        for resource in resources {
            let granted = self
                .strategy
                .get_acl(resource)?
                .and_then(|acl| acl.effective_permission(identity, roles))
                .filter(|granted| !granted.is_empty());
            if let Some(granted) = granted {
                out.insert(resource.clone(), granted);
            }
        }
        Ok(out)
    }

    /// Stored ACL entry for exactly this identity on `resource`
    pub fn entry_permission(
        &self,
        resource: &ResourceId,
        identity: &AclIdentity,
    ) -> Result<Option<CompositeAclPermission>> {
        Ok(self
            .strategy
            .get_acl(resource)?
            .and_then(|acl: Acl| acl.entry(identity).map(|entry| entry.permission())))
    }
}

impl std::fmt::Debug for AclContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclContext").finish_non_exhaustive()
    }
}
