//! Access-control lists

use super::entry::{AclEntry, AclIdentity};
use bastion_core::{BastionError, CompositeAclPermission, ResourceId, Result, RoleGroup};
use serde::{Deserialize, Serialize};

/// Per-resource list of grants, at most one entry per identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    resource: ResourceId,
    entries: Vec<AclEntry>,
}

impl Acl {
    /// Empty ACL for a resource
    pub fn new(resource: ResourceId) -> Self {
        Self {
            resource,
            entries: Vec::new(),
        }
    }

    /// ACL with initial entries; two entries for one identity are rejected
    pub fn with_entries(resource: ResourceId, entries: Vec<AclEntry>) -> Result<Self> {
        let mut acl = Self::new(resource);
        for entry in entries {
            let identity = entry.identity().clone();
            if !acl.add_entry(entry) {
                return Err(BastionError::invalid(format!(
                    "ACL for {} has more than one entry for {identity}",
                    acl.resource
                )));
            }
        }
        Ok(acl)
    }

    /// Protected resource
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// Entry for exactly this identity
    pub fn entry(&self, identity: &AclIdentity) -> Option<&AclEntry> {
        self.entries.iter().find(|entry| entry.identity() == identity)
    }

    /// Add an entry. Returns `false`, leaving the ACL unchanged, if the
    /// identity already has one.
    pub fn add_entry(&mut self, entry: AclEntry) -> bool {
        if self.entry(entry.identity()).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Replace the entry for the same identity. Returns `false` if there was none.
    pub fn update_entry(&mut self, entry: AclEntry) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.identity() == entry.identity())
        {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for an identity. Returns `true` if it existed.
    pub fn remove_entry(&mut self, identity: &AclIdentity) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.identity() != identity);
        self.entries.len() != before
    }

    /// Whether the entry for `identity` grants every requested bit
    pub fn is_granted(&self, requested: CompositeAclPermission, identity: &AclIdentity) -> bool {
        self.entry(identity)
            .is_some_and(|entry| entry.check_permission(requested))
    }

    /// Union of the permissions granted to a user and to the roles it holds.
    /// `None` when no entry names the user or one of its roles.
    pub fn effective_permission(
        &self,
        user: &str,
        roles: Option<&RoleGroup>,
    ) -> Option<CompositeAclPermission> {
        self.entries
            .iter()
            .filter(|entry| match entry.identity() {
                AclIdentity::User(name) => name == user,
                AclIdentity::Role(role) => roles.is_some_and(|group| group.contains_role_named(role)),
            })
            .map(AclEntry::permission)
            .reduce(|acc, permission| acc | permission)
    }

    /// Whether any role entry held by `roles` grants every requested bit
    pub fn is_granted_to_roles(&self, requested: CompositeAclPermission, roles: &RoleGroup) -> bool {
        self.entries.iter().any(|entry| match entry.identity() {
            AclIdentity::Role(role) => {
                roles.contains_role_named(role) && entry.check_permission(requested)
            }
            AclIdentity::User(_) => false,
        })
    }
}
