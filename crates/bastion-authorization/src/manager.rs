//! Authorization managers
//!
//! An [`AuthorizationManager`] is bound to one security domain. It applies
//! principal and role mapping, then delegates to the domain's
//! [`AuthorizationContext`], which it builds once on first use.
//! [`SecurityDomains`] hands out one shared manager per domain name.

use crate::audit::{AuditSink, NoopAuditSink};
use crate::config::{ConfigurationProvider, SecurityDomainConfig};
use crate::context::AuthorizationContext;
use crate::decision::AuthorizationDecision;
use crate::mapping::MappingManager;
use crate::registry::Providers;
use crate::trust::{IdentityTrustContext, TrustDecision};
use bastion_core::{Resource, Result, RoleGroup, SecurityRoleRef, Subject};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Entry point for authorization decisions in one security domain
pub struct AuthorizationManager {
    config: Arc<SecurityDomainConfig>,
    providers: Arc<Providers>,
    audit: Arc<dyn AuditSink>,
    context: OnceCell<AuthorizationContext>,
    mapping: OnceCell<MappingManager>,
    trust: OnceCell<IdentityTrustContext>,
}

impl AuthorizationManager {
    /// Manager for `config`, resolving providers from `providers`
    pub fn new(config: Arc<SecurityDomainConfig>, providers: Arc<Providers>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            providers,
            audit: Arc::new(NoopAuditSink),
            context: OnceCell::new(),
            mapping: OnceCell::new(),
            trust: OnceCell::new(),
        })
    }

    /// Route the context's audit events to `sink`
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Security domain name
    pub fn domain(&self) -> &str {
        &self.config.name
    }

    /// The domain's authorization context, built on first use
    pub fn context(&self) -> Result<&AuthorizationContext> {
        self.context.get_or_try_init(|| {
            tracing::debug!(domain = %self.config.name, "building authorization context");
            let registry = Arc::new(self.providers.modules.clone());
            Ok(AuthorizationContext::new(&self.config, registry)?.with_audit(Arc::clone(&self.audit)))
        })
    }

    fn mapping(&self) -> Result<&MappingManager> {
        self.mapping
            .get_or_try_init(|| MappingManager::from_config(&self.config, &self.providers))
    }

    /// The domain's identity-trust chain, built on first use
    pub fn trust_context(&self) -> Result<&IdentityTrustContext> {
        self.trust.get_or_try_init(|| {
            IdentityTrustContext::new(
                self.config.name.as_str(),
                &self.config.trust,
                &self.providers.trust_modules,
            )
        })
    }

    /// Map the caller, map its roles, then evaluate the module chain
    pub fn authorize(
        &self,
        resource: &Resource,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> Result<AuthorizationDecision> {
        let context = self.context()?;
        let subject = self.mapping()?.map_subject(subject)?;
        let roles = self.mapping()?.map_roles(&subject, caller_roles.clone())?;
        context.authorize(resource, &subject, &roles)
    }

    /// Roles the subject holds after mapping
    pub fn subject_roles(&self, subject: &Subject, caller_roles: &RoleGroup) -> Result<RoleGroup> {
        let mapping = self.mapping()?;
        let subject = mapping.map_subject(subject)?;
        mapping.map_roles(&subject, caller_roles.clone())
    }

    /// Whether the subject holds `role_name` after mapping
    pub fn does_user_have_role(
        &self,
        subject: &Subject,
        caller_roles: &RoleGroup,
        role_name: &str,
    ) -> Result<bool> {
        Ok(self
            .subject_roles(subject, caller_roles)?
            .contains_role_named(role_name))
    }

    /// Programmatic role check through the component's role references
    ///
    /// Under the strict role-ref restriction a role name without a
    /// reference, or one linked to an undeclared role, is a configuration
    /// error.
    pub fn is_caller_in_role(
        &self,
        subject: &Subject,
        caller_roles: &RoleGroup,
        role_name: &str,
        role_refs: &[SecurityRoleRef],
    ) -> Result<bool> {
        let role = self
            .config
            .settings
            .resolve_role_ref(role_refs, role_name)?
            .unwrap_or(role_name);
        self.does_user_have_role(subject, caller_roles, role)
    }

    /// Evaluate the domain's trust chain
    pub fn is_trusted(&self, subject: &Subject) -> Result<TrustDecision> {
        Ok(self.trust_context()?.is_trusted(subject))
    }
}

impl fmt::Debug for AuthorizationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationManager")
            .field("domain", &self.config.name)
            .field("context_built", &self.context.get().is_some())
            .finish_non_exhaustive()
    }
}

/// One shared [`AuthorizationManager`] per security domain
pub struct SecurityDomains {
    configuration: Arc<dyn ConfigurationProvider>,
    providers: Arc<Providers>,
    audit: Arc<dyn AuditSink>,
    managers: RwLock<HashMap<String, Arc<AuthorizationManager>>>,
}

impl SecurityDomains {
    /// Cache over `configuration`
    pub fn new(configuration: Arc<dyn ConfigurationProvider>, providers: Arc<Providers>) -> Self {
        Self {
            configuration,
            providers,
            audit: Arc::new(NoopAuditSink),
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Audit sink handed to every manager created from now on
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Manager for `domain`, created on first request
    ///
    /// Concurrent first requests may each build a manager, but only the
    /// first one inserted is ever returned.
    pub fn manager(&self, domain: &str) -> Result<Arc<AuthorizationManager>> {
        if let Some(manager) = self.managers.read().get(domain) {
            return Ok(Arc::clone(manager));
        }
        let config = self.configuration.security_domain(domain)?;
        let manager = AuthorizationManager::new(config, Arc::clone(&self.providers))?
            .with_audit(Arc::clone(&self.audit));
        let mut managers = self.managers.write();
        let entry = managers
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(manager));
        Ok(Arc::clone(entry))
    }

    /// Authorize through the manager for `domain`
    pub fn authorize(
        &self,
        domain: &str,
        resource: &Resource,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> Result<AuthorizationDecision> {
        self.manager(domain)?.authorize(resource, subject, caller_roles)
    }

    /// Drop the cached manager for `domain`. Returns `true` if one was cached.
    pub fn remove(&self, domain: &str) -> bool {
        self.managers.write().remove(domain).is_some()
    }

    /// Names of domains with a cached manager, sorted
    pub fn cached_domains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.managers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SecurityDomains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityDomains")
            .field("cached", &self.cached_domains())
            .finish_non_exhaustive()
    }
}
