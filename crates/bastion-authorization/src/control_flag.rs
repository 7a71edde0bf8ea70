//! Per-module control flags
//!
//! Flags govern how a module's outcome combines with the rest of the chain;
//! see [`crate::aggregator`] for the combination rules.

use bastion_core::{BastionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JAAS-style control flag attached to each configured module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ControlFlag {
    /// Must succeed; evaluation continues after a failure
    #[default]
    Required,
    /// Must succeed; evaluation stops at the first failure
    Requisite,
    /// Success ends evaluation unless an earlier required module failed
    Sufficient,
    /// Only decides the outcome when every module is optional
    Optional,
}

impl ControlFlag {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::Requisite => "REQUISITE",
            Self::Sufficient => "SUFFICIENT",
            Self::Optional => "OPTIONAL",
        }
    }

    /// Whether a failure of this module fails the whole chain
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::Required | Self::Requisite)
    }
}

impl FromStr for ControlFlag {
    type Err = BastionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REQUIRED" => Ok(Self::Required),
            "REQUISITE" => Ok(Self::Requisite),
            "SUFFICIENT" => Ok(Self::Sufficient),
            "OPTIONAL" => Ok(Self::Optional),
            _ => Err(BastionError::configuration(format!(
                "unknown control flag '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for ControlFlag {
    type Error = BastionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ControlFlag> for String {
    fn from(flag: ControlFlag) -> Self {
        flag.as_str().to_string()
    }
}

impl fmt::Display for ControlFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
