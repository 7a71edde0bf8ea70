//! Unified error system for Bastion
//!
//! A single error type shared by every crate in the workspace. A DENY
//! decision is never an error; these variants describe requests that could
//! not be evaluated at all.

use serde::{Deserialize, Serialize};

/// Unified error type for all Bastion operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BastionError {
    /// Malformed or missing configuration, or a role-ref pointing at an
    /// undeclared role while strict role-ref checking is enabled
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration problem
        message: String,
    },

    /// A module failed while evaluating a request
    #[error("Authorization error: {message}")]
    Authorization {
        /// Error message describing the evaluation failure
        message: String,
    },

    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// An entry with the same key already exists
    #[error("Already exists: {message}")]
    AlreadyExists {
        /// Error message describing the conflicting entry
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl BastionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authorization (evaluation) error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already-exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from the configuration path
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Short, stable label for logging and audit records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Authorization { .. } => "authorization",
            Self::Invalid { .. } => "invalid",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Standard Result type for Bastion operations
pub type Result<T> = std::result::Result<T, BastionError>;

impl From<std::io::Error> for BastionError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BastionError::configuration("missing domain");
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Configuration error: missing domain");
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BastionError::from(io_err);
        assert!(matches!(err, BastionError::NotFound { .. }));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_serializes() {
        let err = BastionError::authorization("module crashed");
        let json = serde_json::to_string(&err).unwrap();
        let back: BastionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
