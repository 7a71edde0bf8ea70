//! Identity trust
//!
//! Trust is advisory: a trust module that fails is treated as not applicable
//! and never aborts evaluation. Module outcomes are combined with the same
//! control-flag rules as authorization.

use crate::aggregator::{aggregate, AggregateDecision};
use crate::config::{ModuleOptions, TrustModuleEntry};
use crate::control_flag::ControlFlag;
use crate::decision::ModuleOutcome;
use crate::registry::TrustRegistry;
use bastion_core::{Result, Subject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Outcome of a trust evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustDecision {
    /// The identity is trusted
    Trusted,
    /// The identity is explicitly not trusted
    Distrusted,
    /// No module had an opinion
    NotApplicable,
}

impl fmt::Display for TrustDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted => f.write_str("TRUSTED"),
            Self::Distrusted => f.write_str("DISTRUSTED"),
            Self::NotApplicable => f.write_str("NOT_APPLICABLE"),
        }
    }
}

/// A pluggable trust check
pub trait TrustModule: Send + Sync {
    /// Whether `subject` is trusted
    fn is_trusted(&self, subject: &Subject) -> Result<TrustDecision>;
}

/// Trusts or distrusts callers by principal name
#[derive(Debug, Clone, Default)]
pub struct PrincipalListTrustModule {
    trusted: BTreeSet<String>,
    distrusted: BTreeSet<String>,
}

impl PrincipalListTrustModule {
    /// Module over explicit name lists; `distrusted` wins over `trusted`
    pub fn new(
        trusted: impl IntoIterator<Item = String>,
        distrusted: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            trusted: trusted.into_iter().collect(),
            distrusted: distrusted.into_iter().collect(),
        }
    }

    /// Build from the `trusted` and `distrusted` options
    pub fn from_options(options: &ModuleOptions) -> Result<Self> {
        Ok(Self::new(
            options.get_str_list("trusted")?,
            options.get_str_list("distrusted")?,
        ))
    }
}

impl TrustModule for PrincipalListTrustModule {
    fn is_trusted(&self, subject: &Subject) -> Result<TrustDecision> {
        let Some(caller) = subject.caller() else {
            return Ok(TrustDecision::NotApplicable);
        };
        if self.distrusted.contains(caller.name()) {
            Ok(TrustDecision::Distrusted)
        } else if self.trusted.contains(caller.name()) {
            Ok(TrustDecision::Trusted)
        } else {
            Ok(TrustDecision::NotApplicable)
        }
    }
}

/// Register `principal-list`
pub fn register_builtin(registry: &mut TrustRegistry) {
    registry.register("principal-list", |options: &ModuleOptions| {
        Ok(Arc::new(PrincipalListTrustModule::from_options(options)?) as Arc<dyn TrustModule>)
    });
}

/// The trust modules of one security domain
#[derive(Clone)]
pub struct IdentityTrustContext {
    domain: String,
    modules: Vec<(String, ControlFlag, Arc<dyn TrustModule>)>,
}

impl IdentityTrustContext {
    /// Resolve every entry against `registry`
    pub fn new(
        domain: impl Into<String>,
        entries: &[TrustModuleEntry],
        registry: &TrustRegistry,
    ) -> Result<Self> {
        let modules = entries
            .iter()
            .map(|entry| {
                let module = registry.create(&entry.module, &entry.options)?;
                Ok((entry.module.clone(), entry.flag, module))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            domain: domain.into(),
            modules,
        })
    }

    /// Context with already-built modules
    pub fn from_modules(
        domain: impl Into<String>,
        modules: Vec<(String, ControlFlag, Arc<dyn TrustModule>)>,
    ) -> Self {
        Self {
            domain: domain.into(),
            modules,
        }
    }

    /// Evaluate the trust chain for `subject`
    pub fn is_trusted(&self, subject: &Subject) -> TrustDecision {
        let steps = self.modules.iter().map(|(id, flag, module)| {
            let step = move || match module.is_trusted(subject) {
                Ok(TrustDecision::Trusted) => ModuleOutcome::Permit,
                Ok(TrustDecision::Distrusted) => ModuleOutcome::Deny,
                Ok(TrustDecision::NotApplicable) => ModuleOutcome::Abstain,
                Err(err) => {
                    tracing::warn!(
                        domain = %self.domain,
                        module = %id,
                        error = %err,
                        "trust module failed; treating as not applicable"
                    );
                    ModuleOutcome::Abstain
                }
            };
            (*flag, step)
        });
        let decision = match aggregate(steps).decision {
            AggregateDecision::Permit => TrustDecision::Trusted,
            AggregateDecision::Deny => TrustDecision::Distrusted,
            AggregateDecision::Abstain => TrustDecision::NotApplicable,
        };
        tracing::debug!(domain = %self.domain, decision = %decision, "identity trust evaluated");
        decision
    }
}

impl fmt::Debug for IdentityTrustContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.modules.iter().map(|(id, _, _)| id.as_str()).collect();
        f.debug_struct("IdentityTrustContext")
            .field("domain", &self.domain)
            .field("modules", &ids)
            .finish()
    }
}
