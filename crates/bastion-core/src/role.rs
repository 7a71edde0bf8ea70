//! Security roles and role groups
//!
//! Roles form a tagged union: a [`SimpleRole`] is a leaf, a [`RoleGroup`] owns
//! a set of nested roles. Groups own their members by value, so a group can
//! never (transitively) contain itself and containment checks always
//! terminate.
//!
//! Containment is asymmetric:
//!
//! - [`Role::contains_all`] uses AND semantics for group candidates: every
//!   role in the candidate must be contained by `self`.
//! - [`RoleGroup::contains_at_least_one_role`] uses OR semantics: a single
//!   shared leaf role is enough.
//!
//! A candidate role named [`ANYBODY`] or [`ANY_AUTHENTICATED`] is contained by
//! every simple role. The comparison is an exact, case-sensitive match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Wildcard role matching any caller role
pub const ANYBODY: &str = "ANYBODY";

/// Wildcard role matching any authenticated caller
pub const ANY_AUTHENTICATED: &str = "**";

/// Whether a role name is one of the reserved wildcard markers
pub fn is_wildcard(role_name: &str) -> bool {
    role_name == ANYBODY || role_name == ANY_AUTHENTICATED
}

/// A leaf security role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleRole {
    name: String,
    /// Informational link to the role this one was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

impl SimpleRole {
    /// Create a role with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// Create a role that records the name of its parent role
    pub fn with_parent(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
        }
    }

    /// Role name (case-sensitive)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent role name, if recorded
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether this role contains `candidate`
    ///
    /// A simple candidate is contained if it has the same name or is a
    /// wildcard marker. A group candidate is contained if every one of its
    /// members is.
    pub fn contains_all(&self, candidate: &Role) -> bool {
        match candidate {
            Role::Simple(other) => self.name == other.name || is_wildcard(&other.name),
            Role::Group(group) => group.roles.iter().all(|role| self.contains_all(role)),
        }
    }
}

/// A named, unordered collection of roles (simple or nested groups)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RoleGroupRepr")]
pub struct RoleGroup {
    name: String,
    #[serde(default)]
    roles: Vec<Role>,
}

#[derive(Deserialize)]
struct RoleGroupRepr {
    name: String,
    #[serde(default)]
    roles: Vec<Role>,
}

impl From<RoleGroupRepr> for RoleGroup {
    fn from(repr: RoleGroupRepr) -> Self {
        Self::with_roles(repr.name, repr.roles)
    }
}

impl RoleGroup {
    /// Conventional name of the group holding a caller's roles
    pub const CALLER_ROLES: &'static str = "Roles";

    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Create a group from an iterator of roles, dropping duplicates
    pub fn with_roles(name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut group = Self::new(name);
        for role in roles {
            group.add_role(role);
        }
        group
    }

    /// Create a group of simple roles from their names
    pub fn from_names<I, S>(name: impl Into<String>, role_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_roles(
            name,
            role_names
                .into_iter()
                .map(|role_name| Role::Simple(SimpleRole::new(role_name))),
        )
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct members of this group
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Number of direct members
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the group has no direct members
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Add a role. Returns `false` if an equal role is already a direct member.
    pub fn add_role(&mut self, role: Role) -> bool {
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Remove a direct member. Returns `true` if it was present.
    pub fn remove_role(&mut self, role: &Role) -> bool {
        let before = self.roles.len();
        self.roles.retain(|existing| existing != role);
        self.roles.len() != before
    }

    /// Remove every member
    pub fn clear_roles(&mut self) {
        self.roles.clear();
    }

    /// Whether this group contains `candidate`
    ///
    /// A simple candidate must be contained by at least one member
    /// (recursively). A group candidate must have every member contained by
    /// this group.
    pub fn contains_all(&self, candidate: &Role) -> bool {
        match candidate {
            Role::Simple(_) => self.roles.iter().any(|role| role.contains_all(candidate)),
            Role::Group(group) => group.roles.iter().all(|role| self.contains_all(role)),
        }
    }

    /// Whether any single leaf role reachable from `other` is contained by
    /// this group
    pub fn contains_at_least_one_role(&self, other: &RoleGroup) -> bool {
        other
            .leaves()
            .into_iter()
            .any(|leaf| self.contains_simple(leaf))
    }

    /// Whether a simple role with this name is contained by the group
    pub fn contains_role_named(&self, role_name: &str) -> bool {
        self.contains_simple(&SimpleRole::new(role_name))
    }

    fn contains_simple(&self, leaf: &SimpleRole) -> bool {
        self.roles.iter().any(|role| match role {
            Role::Simple(own) => own.name == leaf.name || is_wildcard(&leaf.name),
            Role::Group(group) => group.contains_simple(leaf),
        })
    }

    /// Every simple role reachable from this group
    pub fn leaves(&self) -> Vec<&SimpleRole> {
        let mut out = Vec::new();
        collect_leaves(&self.roles, &mut out);
        out
    }

    /// Names of every simple role reachable from this group
    pub fn leaf_names(&self) -> BTreeSet<String> {
        self.leaves()
            .into_iter()
            .map(|leaf| leaf.name.clone())
            .collect()
    }
}

fn collect_leaves<'a>(roles: &'a [Role], out: &mut Vec<&'a SimpleRole>) {
    for role in roles {
        match role {
            Role::Simple(simple) => out.push(simple),
            Role::Group(group) => collect_leaves(&group.roles, out),
        }
    }
}

impl PartialEq for RoleGroup {
    // Member order is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.roles.iter().all(|role| other.roles.contains(role))
            && other.roles.iter().all(|role| self.roles.contains(role))
    }
}

impl Eq for RoleGroup {}

/// A security role: a leaf or a group of roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Leaf role
    Simple(SimpleRole),
    /// Group of nested roles
    Group(RoleGroup),
}

impl Role {
    /// Create a simple role
    pub fn simple(name: impl Into<String>) -> Self {
        Self::Simple(SimpleRole::new(name))
    }

    /// Create a group role from member roles
    pub fn group(name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self::Group(RoleGroup::with_roles(name, roles))
    }

    /// Role or group name
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(role) => role.name(),
            Self::Group(group) => group.name(),
        }
    }

    /// Whether this role is a group
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Borrow as a group, if it is one
    pub fn as_group(&self) -> Option<&RoleGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Simple(_) => None,
        }
    }

    /// Whether this role contains every role in `candidate`
    pub fn contains_all(&self, candidate: &Role) -> bool {
        match self {
            Self::Simple(role) => role.contains_all(candidate),
            Self::Group(group) => group.contains_all(candidate),
        }
    }

    /// Names of every simple role reachable from this role
    pub fn leaf_names(&self) -> BTreeSet<String> {
        match self {
            Self::Simple(role) => BTreeSet::from([role.name.clone()]),
            Self::Group(group) => group.leaf_names(),
        }
    }
}

impl From<SimpleRole> for Role {
    fn from(role: SimpleRole) -> Self {
        Self::Simple(role)
    }
}

impl From<RoleGroup> for Role {
    fn from(group: RoleGroup) -> Self {
        Self::Group(group)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(role) => write!(f, "{}", role.name),
            Self::Group(group) => {
                write!(f, "{}(", group.name)?;
                for (i, role) in group.roles.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{role}")?;
                }
                write!(f, ")")
            }
        }
    }
}
