//! Decision values
//!
//! A DENY is a normal value, not an error. Module failures are threaded
//! through [`ModuleOutcome::Error`] rather than unwinding the chain.

use bastion_core::BastionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final answer returned to callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationDecision {
    /// Access granted
    Permit,
    /// Access refused
    #[default]
    Deny,
}

impl AuthorizationDecision {
    /// Whether access is granted
    pub fn is_permit(&self) -> bool {
        matches!(self, Self::Permit)
    }
}

impl From<bool> for AuthorizationDecision {
    fn from(permitted: bool) -> Self {
        if permitted {
            Self::Permit
        } else {
            Self::Deny
        }
    }
}

impl fmt::Display for AuthorizationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permit => f.write_str("PERMIT"),
            Self::Deny => f.write_str("DENY"),
        }
    }
}

/// Result of invoking a single module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    /// Module grants access
    Permit,
    /// Module refuses access
    Deny,
    /// Module does not apply to this request
    Abstain,
    /// Module could not evaluate the request
    Error(BastionError),
}

impl ModuleOutcome {
    /// Permit when `permitted`, deny otherwise
    pub fn permit_if(permitted: bool) -> Self {
        if permitted {
            Self::Permit
        } else {
            Self::Deny
        }
    }

    /// Short label for logs and audit records
    pub fn label(&self) -> &'static str {
        match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
            Self::Abstain => "abstain",
            Self::Error(_) => "error",
        }
    }
}

impl From<AuthorizationDecision> for ModuleOutcome {
    fn from(decision: AuthorizationDecision) -> Self {
        match decision {
            AuthorizationDecision::Permit => Self::Permit,
            AuthorizationDecision::Deny => Self::Deny,
        }
    }
}

impl From<bastion_core::Result<AuthorizationDecision>> for ModuleOutcome {
    fn from(result: bastion_core::Result<AuthorizationDecision>) -> Self {
        match result {
            Ok(decision) => decision.into(),
            Err(err) => Self::Error(err),
        }
    }
}
