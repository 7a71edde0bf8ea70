//! ACL permissions
//!
//! [`BasicAclPermission`] names a single position bit; [`CompositeAclPermission`]
//! is the bit-set granted by an ACL entry. Equality is exact bit-set equality,
//! use [`CompositeAclPermission::contains_permission`] for subset checks.

use crate::{BastionError, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single enumerated ACL permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicAclPermission {
    /// Read access
    Read,
    /// Modify existing content
    Update,
    /// Create new content
    Create,
    /// Delete content
    Delete,
}

impl BasicAclPermission {
    /// All basic permissions in bit order
    pub const ALL: [BasicAclPermission; 4] = [Self::Read, Self::Update, Self::Create, Self::Delete];

    /// Position bit of this permission
    pub fn bits(self) -> u8 {
        CompositeAclPermission::from(self).bits()
    }
}

impl FromStr for BasicAclPermission {
    type Err = BastionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "update" | "write" => Ok(Self::Update),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            other => Err(BastionError::invalid(format!(
                "unknown ACL permission '{other}'"
            ))),
        }
    }
}

bitflags! {
    /// Bit-set of ACL permissions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CompositeAclPermission: u8 {
        /// Read access
        const READ = 0b0001;
        /// Modify existing content
        const UPDATE = 0b0010;
        /// Create new content
        const CREATE = 0b0100;
        /// Delete content
        const DELETE = 0b1000;
    }
}

impl CompositeAclPermission {
    /// Build a composite from individual permissions
    pub fn from_basic(permissions: &[BasicAclPermission]) -> Self {
        permissions
            .iter()
            .fold(Self::empty(), |acc, permission| acc | Self::from(*permission))
    }

    /// Whether every bit of `requested` is granted by `self`
    pub fn contains_permission(&self, requested: CompositeAclPermission) -> bool {
        self.contains(requested)
    }

    /// The individual permissions set in this composite
    pub fn basic_permissions(&self) -> Vec<BasicAclPermission> {
        BasicAclPermission::ALL
            .into_iter()
            .filter(|permission| self.contains(Self::from(*permission)))
            .collect()
    }
}

impl From<BasicAclPermission> for CompositeAclPermission {
    fn from(permission: BasicAclPermission) -> Self {
        match permission {
            BasicAclPermission::Read => Self::READ,
            BasicAclPermission::Update => Self::UPDATE,
            BasicAclPermission::Create => Self::CREATE,
            BasicAclPermission::Delete => Self::DELETE,
        }
    }
}

impl FromStr for CompositeAclPermission {
    type Err = BastionError;

    /// Parse a comma-separated list such as `"read,update"`; `"all"` and
    /// `"none"` are accepted as shorthands
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => return Ok(Self::all()),
            "none" | "" => return Ok(Self::empty()),
            _ => {}
        }
        s.split(',')
            .map(str::parse::<BasicAclPermission>)
            .try_fold(Self::empty(), |acc, permission| {
                Ok::<_, BastionError>(acc | Self::from(permission?))
            })
    }
}

impl fmt::Display for CompositeAclPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .basic_permissions()
            .into_iter()
            .map(|permission| match permission {
                BasicAclPermission::Read => "read",
                BasicAclPermission::Update => "update",
                BasicAclPermission::Create => "create",
                BasicAclPermission::Delete => "delete",
            })
            .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}
