//! ACL persistence
//!
//! [`AclPersistenceStrategy`] is the seam between ACL-based decisions and
//! wherever ACLs are stored. [`InMemoryAclStrategy`] keeps them in a map
//! guarded by a reader/writer lock.

use super::entry::AclEntry;
use super::list::Acl;
use bastion_core::{BastionError, ResourceId, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Behaviour of `create_acl` when the resource already has an ACL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateMode {
    /// Fail with `AlreadyExists`
    #[default]
    Reject,
    /// Replace the stored ACL
    Overwrite,
}

/// Storage for per-resource ACLs
pub trait AclPersistenceStrategy: Send + Sync {
    /// Create and store the ACL for `resource`
    fn create_acl(&self, resource: &ResourceId, entries: Vec<AclEntry>) -> Result<Acl>;

    /// Stored ACL for `resource`
    fn get_acl(&self, resource: &ResourceId) -> Result<Option<Acl>>;

    /// Every stored ACL, ordered by resource
    fn get_acls(&self) -> Result<Vec<Acl>>;

    /// Replace a stored ACL. Returns `false` when none was stored; nothing
    /// is inserted in that case.
    fn update_acl(&self, acl: Acl) -> Result<bool>;

    /// Delete the ACL for `resource`. Returns `true` if one was stored.
    fn remove_acl(&self, resource: &ResourceId) -> Result<bool>;
}

/// In-process ACL store
#[derive(Debug, Default)]
pub struct InMemoryAclStrategy {
    acls: RwLock<HashMap<ResourceId, Acl>>,
    create_mode: CreateMode,
}

impl InMemoryAclStrategy {
    /// Empty store rejecting duplicate creation
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with the given duplicate-creation behaviour
    pub fn with_create_mode(create_mode: CreateMode) -> Self {
        Self {
            acls: RwLock::new(HashMap::new()),
            create_mode,
        }
    }

    /// Number of stored ACLs
    pub fn len(&self) -> usize {
        self.acls.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.acls.read().is_empty()
    }
}

impl AclPersistenceStrategy for InMemoryAclStrategy {
    fn create_acl(&self, resource: &ResourceId, entries: Vec<AclEntry>) -> Result<Acl> {
        let acl = Acl::with_entries(resource.clone(), entries)?;
        let mut acls = self.acls.write();
        if self.create_mode == CreateMode::Reject && acls.contains_key(resource) {
            return Err(BastionError::already_exists(format!(
                "ACL for {resource} already exists"
            )));
        }
        acls.insert(resource.clone(), acl.clone());
        tracing::debug!(resource = %resource, entries = acl.entries().len(), "ACL created");
        Ok(acl)
    }

    fn get_acl(&self, resource: &ResourceId) -> Result<Option<Acl>> {
        Ok(self.acls.read().get(resource).cloned())
    }

    fn get_acls(&self) -> Result<Vec<Acl>> {
        let mut acls: Vec<Acl> = self.acls.read().values().cloned().collect();
        acls.sort_by(|a, b| a.resource().cmp(b.resource()));
        Ok(acls)
    }

    fn update_acl(&self, acl: Acl) -> Result<bool> {
        let mut acls = self.acls.write();
        match acls.get_mut(acl.resource()) {
            Some(stored) => {
                *stored = acl;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_acl(&self, resource: &ResourceId) -> Result<bool> {
        Ok(self.acls.write().remove(resource).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::AclIdentity;
    use bastion_core::{CompositeAclPermission, ResourceKind};

    fn doc(key: &str) -> ResourceId {
        ResourceId::new(ResourceKind::Acl, key)
    }

    #[test]
    fn create_get_remove() {
        let store = InMemoryAclStrategy::new();
        let entries = vec![AclEntry::user("alice", CompositeAclPermission::READ)];
        let created = store.create_acl(&doc("a"), entries).unwrap();
        assert_eq!(store.get_acl(&doc("a")).unwrap(), Some(created));
        assert_eq!(store.get_acl(&doc("b")).unwrap(), None);
        assert!(store.remove_acl(&doc("a")).unwrap());
        assert!(!store.remove_acl(&doc("a")).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_create_follows_mode() {
        let store = InMemoryAclStrategy::new();
        store.create_acl(&doc("a"), Vec::new()).unwrap();
        let err = store.create_acl(&doc("a"), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), "already_exists");

        let store = InMemoryAclStrategy::with_create_mode(CreateMode::Overwrite);
        store.create_acl(&doc("a"), Vec::new()).unwrap();
        store
            .create_acl(
                &doc("a"),
                vec![AclEntry::role("ops", CompositeAclPermission::all())],
            )
            .unwrap();
        let stored = store.get_acl(&doc("a")).unwrap().unwrap();
        assert!(stored.entry(&AclIdentity::role("ops")).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_never_inserts() {
        let store = InMemoryAclStrategy::new();
        assert!(!store.update_acl(Acl::new(doc("ghost"))).unwrap());
        assert!(store.get_acl(&doc("ghost")).unwrap().is_none());

        let mut acl = store.create_acl(&doc("a"), Vec::new()).unwrap();
        acl.add_entry(AclEntry::user("bob", CompositeAclPermission::DELETE));
        assert!(store.update_acl(acl.clone()).unwrap());
        assert_eq!(store.get_acl(&doc("a")).unwrap(), Some(acl));
    }

    #[test]
    fn get_acls_is_ordered() {
        let store = InMemoryAclStrategy::new();
        for key in ["c", "a", "b"] {
            store.create_acl(&doc(key), Vec::new()).unwrap();
        }
        let keys: Vec<String> = store
            .get_acls()
            .unwrap()
            .iter()
            .map(|acl| acl.resource().key().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
