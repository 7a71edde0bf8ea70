//! Bastion Core - shared security model
//!
//! Foundation types for the Bastion authorization engine. This crate holds
//! data and containment semantics only; decision logic lives in
//! `bastion-authorization`.
//!
//! # Contents
//!
//! - [`Role`] / [`RoleGroup`]: nested role containment with wildcard roles
//! - [`Principal`] / [`Subject`]: explicitly passed caller identity
//! - [`Resource`]: resource identity plus layer-specific request data
//! - [`CompositeAclPermission`]: ACL permission bit-set
//! - [`BastionError`]: unified error type

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Principals and subjects
pub mod identity;

/// ACL permission bit-sets
pub mod permission;

/// Protected resources and security-role references
pub mod resource;

/// Roles and role groups
pub mod role;

pub use errors::{BastionError, Result};
pub use identity::{Principal, Subject};
pub use permission::{BasicAclPermission, CompositeAclPermission};
pub use resource::{
    resolve_role_link, AclRequest, EjbInvocation, Resource, ResourceDetail, ResourceId,
    ResourceKind, RoleRefCheck, SecurityRoleRef, TransportGuarantee, WebRequest,
};
pub use role::{is_wildcard, Role, RoleGroup, SimpleRole, ANYBODY, ANY_AUTHENTICATED};
