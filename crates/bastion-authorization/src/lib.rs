//! Bastion Authorization - pluggable decision engine
//!
//! Evaluates an ordered chain of authorization modules for a security domain
//! and combines their outcomes with control-flag semantics
//! (REQUIRED / REQUISITE / SUFFICIENT / OPTIONAL).
//!
//! # Architecture
//!
//! - [`config`]: security-domain configuration, loadable from TOML
//! - [`registry`]: string id → factory registries for every provider kind
//! - [`modules`]: built-in EJB, Web, ACL and constant modules
//! - [`aggregator`]: control-flag aggregation over lazily-invoked steps
//! - [`context`]: one domain's chain, role-ref resolution and audit
//! - [`manager`]: mapping + context per domain, cached per domain name
//! - [`acl`]: ACL engine with a pluggable persistence strategy
//! - [`mapping`] / [`trust`]: identity layer
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bastion_authorization::{
//!     AuthorizationContext, AuthorizationDecision, ControlFlag, ModuleEntry, Providers,
//!     SecurityDomainConfig,
//! };
//! use bastion_core::{EjbInvocation, Principal, Resource, RoleGroup, Subject};
//!
//! let config = SecurityDomainConfig::new("ledger")
//!     .with_module(ModuleEntry::new("ejb", ControlFlag::Required));
//! let context = AuthorizationContext::new(&config, Arc::new(Providers::builtin().modules))?;
//!
//! let resource = Resource::ejb(
//!     EjbInvocation::new("Ledger")
//!         .method("post")
//!         .method_roles(RoleGroup::from_names("method", ["clerk"])),
//! );
//! let roles = RoleGroup::from_names(RoleGroup::CALLER_ROLES, ["clerk"]);
//! let decision = context.authorize(&resource, &Subject::new(Principal::new("ann")), &roles)?;
//! assert_eq!(decision, AuthorizationDecision::Permit);
//! # Ok::<(), bastion_core::BastionError>(())
//! ```

#![forbid(unsafe_code)]

pub mod acl;
pub mod aggregator;
pub mod audit;
pub mod config;
pub mod context;
pub mod control_flag;
pub mod decision;
pub mod manager;
pub mod mapping;
pub mod module;
pub mod modules;
pub mod registry;
pub mod trust;

pub use acl::{
    Acl, AclContext, AclEntry, AclIdentity, AclPersistenceStrategy, CreateMode,
    InMemoryAclStrategy,
};
pub use aggregator::{aggregate, AggregateDecision, ChainOutcome, StepFailure};
pub use audit::{AuditEvent, AuditLevel, AuditSink, MemoryAuditSink, NoopAuditSink, TracingAuditSink};
pub use config::{
    AuthorizationModuleEntry, ConfigurationProvider, DomainSettings, MappingEntry, ModuleEntry,
    ModuleOptions, SecurityDomainConfig, StaticConfiguration, TrustModuleEntry,
};
pub use context::AuthorizationContext;
pub use control_flag::ControlFlag;
pub use decision::{AuthorizationDecision, ModuleOutcome};
pub use manager::{AuthorizationManager, SecurityDomains};
pub use mapping::{MappingManager, PrincipalMappingProvider, RoleMappingProvider};
pub use module::AuthorizationModule;
pub use registry::{ModuleRegistry, ProviderRegistry, Providers};
pub use trust::{IdentityTrustContext, TrustDecision, TrustModule};
