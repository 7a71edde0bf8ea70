//! Authorization context
//!
//! An [`AuthorizationContext`] evaluates one security domain's module chain.
//! It is shared across threads: the only mutable state is the per-entry module
//! cache, filled at most once per entry on first use.

use crate::aggregator::{aggregate, ChainOutcome};
use crate::audit::{AuditEvent, AuditLevel, AuditSink, NoopAuditSink};
use crate::config::{AuthorizationModuleEntry, DomainSettings, SecurityDomainConfig};
use crate::decision::AuthorizationDecision;
use crate::module::AuthorizationModule;
use crate::registry::ModuleRegistry;
use bastion_core::{BastionError, Resource, Result, RoleGroup, Subject};
use once_cell::sync::OnceCell;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Evaluates a security domain's ordered module chain
pub struct AuthorizationContext {
    domain: String,
    entries: Vec<AuthorizationModuleEntry>,
    settings: DomainSettings,
    registry: Arc<ModuleRegistry>,
    resolved: Vec<OnceCell<Arc<dyn AuthorizationModule>>>,
    audit: Arc<dyn AuditSink>,
}

impl AuthorizationContext {
    /// Context for `config`; every module id must be registered
    pub fn new(config: &SecurityDomainConfig, registry: Arc<ModuleRegistry>) -> Result<Self> {
        config.validate()?;
        if let Some(entry) = config
            .authorization
            .iter()
            .find(|entry| !registry.contains(&entry.module))
        {
            return Err(BastionError::configuration(format!(
                "security domain '{}' uses unknown authorization module '{}'",
                config.name, entry.module
            )));
        }
        Ok(Self {
            domain: config.name.clone(),
            entries: config.authorization.clone(),
            settings: config.settings.clone(),
            resolved: config.authorization.iter().map(|_| OnceCell::new()).collect(),
            registry,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Send per-module and per-decision audit events to `sink`
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Security domain name
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Configured module ids, in chain order
    pub fn module_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.module.as_str()).collect()
    }

    /// Policy switches
    pub fn settings(&self) -> &DomainSettings {
        &self.settings
    }

    /// Decide whether `subject`, holding `caller_roles`, may access `resource`
    ///
    /// Returns `Err` when the request could not be evaluated: a module failed
    /// to build, a role reference violates the strict role-ref restriction,
    /// or a REQUISITE module errored and thereby decided the chain.
    pub fn authorize(
        &self,
        resource: &Resource,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> Result<AuthorizationDecision> {
        let result = self
            .modules()
            .and_then(|modules| {
                let resource = self.resolve_role_refs(resource)?;
                Ok((modules, resource))
            })
            .and_then(|(modules, resource)| {
                let outcome = self.evaluate(&modules, &resource, subject, caller_roles);
                self.conclude(outcome)
            });

        self.audit_decision(resource, subject, &result);
        result
    }

    fn modules(&self) -> Result<Vec<Arc<dyn AuthorizationModule>>> {
        self.entries
            .iter()
            .zip(&self.resolved)
            .map(|(entry, cell)| {
                cell.get_or_try_init(|| {
                    debug!(domain = %self.domain, module = %entry.module, "building authorization module");
                    self.registry.create(&entry.module, &entry.options)
                })
                .cloned()
            })
            .collect()
    }

    /// Substitute the linked role for a programmatic role check
    fn resolve_role_refs<'r>(&self, resource: &'r Resource) -> Result<Cow<'r, Resource>> {
        let Some((check, refs)) = resource.role_ref() else {
            return Ok(Cow::Borrowed(resource));
        };
        let link = self
            .settings
            .resolve_role_ref(refs, &check.role_name)
            .map_err(|e| {
                debug!(domain = %self.domain, resource = %resource.id(), error = %e, "role reference rejected");
                e
            })?;
        match link {
            Some(link) => {
                trace!(role = %check.role_name, link, "role reference resolved");
                let mut linked = resource.clone();
                linked.link_role_ref(link);
                Ok(Cow::Owned(linked))
            }
            None => Ok(Cow::Borrowed(resource)),
        }
    }

    fn evaluate(
        &self,
        modules: &[Arc<dyn AuthorizationModule>],
        resource: &Resource,
        subject: &Subject,
        caller_roles: &RoleGroup,
    ) -> ChainOutcome {
        let steps = self
            .entries
            .iter()
            .zip(modules)
            .map(|(entry, module)| {
                let step = move || {
                    let outcome = module.authorize(resource, subject, caller_roles);
                    trace!(
                        domain = %self.domain,
                        resource = %resource.id(),
                        module = %entry.module,
                        flag = %entry.flag,
                        outcome = outcome.label(),
                        "module evaluated"
                    );
                    self.audit.audit(
                        AuditEvent::new(AuditLevel::Info)
                            .with("domain", &self.domain)
                            .with("resource", resource.id())
                            .with("module", &entry.module)
                            .with("flag", entry.flag)
                            .with("outcome", outcome.label()),
                    );
                    outcome
                };
                (entry.flag, step)
            });
        aggregate(steps)
    }

    fn conclude(&self, outcome: ChainOutcome) -> Result<AuthorizationDecision> {
        for failure in &outcome.failures {
            if let Some(err) = &failure.error {
                warn!(
                    domain = %self.domain,
                    module = self.entries.get(failure.index).map_or("", |entry| entry.module.as_str()),
                    flag = %failure.flag,
                    error = %err,
                    "authorization module failed"
                );
            }
        }
        if let Some(err) = outcome.deciding_error {
            return Err(BastionError::authorization(format!(
                "requisite module failed in domain '{}': {err}",
                self.domain
            )));
        }
        let decision = outcome.decision.or(self.settings.empty_chain_decision);
        debug!(
            domain = %self.domain,
            decision = %decision,
            evaluated = outcome.evaluated,
            stopped_early = outcome.stopped_early,
            "authorization decided"
        );
        Ok(decision)
    }

    fn audit_decision(
        &self,
        resource: &Resource,
        subject: &Subject,
        result: &Result<AuthorizationDecision>,
    ) {
        let caller = subject
            .caller()
            .map(|principal| principal.name().to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let base = |level| {
            resource.attributes().iter().fold(
                AuditEvent::new(level)
                    .with("domain", &self.domain)
                    .with("resource", resource.id())
                    .with("caller", &caller),
                |event, (key, value)| event.with(format!("attribute.{key}"), value),
            )
        };
        let event = match result {
            Ok(decision) if decision.is_permit() => base(AuditLevel::Success).with("decision", decision),
            Ok(decision) => base(AuditLevel::Failure).with("decision", decision),
            Err(err) => base(AuditLevel::Error)
                .with("error_kind", err.kind())
                .with_error(err),
        };
        self.audit.audit(event);
    }
}

impl fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("domain", &self.domain)
            .field("modules", &self.module_ids())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
