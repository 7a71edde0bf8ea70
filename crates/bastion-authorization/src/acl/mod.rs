//! ACL engine
//!
//! Resource identity → access-control list of (identity → permission)
//! entries, a pluggable persistence strategy, and the decision context that
//! evaluates requested permissions against stored ACLs.

mod context;
mod entry;
mod list;
mod strategy;

pub use context::AclContext;
pub use entry::{AclEntry, AclIdentity};
pub use list::Acl;
pub use strategy::{AclPersistenceStrategy, CreateMode, InMemoryAclStrategy};
