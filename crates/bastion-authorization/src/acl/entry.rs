//! ACL entries

use bastion_core::CompositeAclPermission;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who an ACL entry grants to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum AclIdentity {
    /// A single identity, matched against the caller principal name
    User(String),
    /// Every caller holding this role
    Role(String),
}

impl AclIdentity {
    /// User identity
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    /// Role identity
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }

    /// Identity or role name
    pub fn name(&self) -> &str {
        match self {
            Self::User(name) | Self::Role(name) => name,
        }
    }
}

impl fmt::Display for AclIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "user:{name}"),
            Self::Role(name) => write!(f, "role:{name}"),
        }
    }
}

/// One (identity → permission) grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    identity: AclIdentity,
    permission: CompositeAclPermission,
}

impl AclEntry {
    /// Grant `permission` to `identity`
    pub fn new(identity: AclIdentity, permission: CompositeAclPermission) -> Self {
        Self {
            identity,
            permission,
        }
    }

    /// Grant to a user identity
    pub fn user(name: impl Into<String>, permission: CompositeAclPermission) -> Self {
        Self::new(AclIdentity::user(name), permission)
    }

    /// Grant to a role
    pub fn role(name: impl Into<String>, permission: CompositeAclPermission) -> Self {
        Self::new(AclIdentity::role(name), permission)
    }

    /// Grantee
    pub fn identity(&self) -> &AclIdentity {
        &self.identity
    }

    /// Granted permission bit-set
    pub fn permission(&self) -> CompositeAclPermission {
        self.permission
    }

    /// Replace the granted permission
    pub fn set_permission(&mut self, permission: CompositeAclPermission) {
        self.permission = permission;
    }

    /// Whether every requested bit is granted
    pub fn check_permission(&self, requested: CompositeAclPermission) -> bool {
        self.permission.contains_permission(requested)
    }
}
