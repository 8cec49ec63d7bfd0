//! Error types for permission operations
//!
//! Every failure carries the operation, path, and identity it happened on,
//! so a caller working through many paths can tell which one broke.

use acl_core::{AclError, SecurableObjectKind};
use acl_host::HostError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// The four permission operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read entries.
    Get,
    /// Ensure an entry exists.
    Grant,
    /// Check for an entry.
    Test,
    /// Remove explicit entries.
    Revoke,
}

impl Operation {
    /// Get the string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Grant => "grant",
            Operation::Test => "test",
            Operation::Revoke => "revoke",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission operation error types.
#[derive(Debug, Error)]
pub enum OpsError {
    /// An operation failed on a path
    #[error("Failed to {operation} permissions on '{path}' for '{identity}': {source}")]
    Operation {
        /// What was being done
        operation: Operation,
        /// Path the caller gave, or the target path
        path: String,
        /// Identity, or `*` when none was given
        identity: String,
        /// Object kind, when classification got that far
        kind: Option<SecurableObjectKind>,
        /// Underlying failure
        #[source]
        source: HostError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for permission operations.
pub type OpsResult<T> = Result<T, OpsError>;

impl OpsError {
    /// Wrap a host failure with its context.
    pub fn operation(
        operation: Operation,
        path: &str,
        identity: Option<&str>,
        kind: Option<SecurableObjectKind>,
        source: impl Into<HostError>,
    ) -> Self {
        OpsError::Operation {
            operation,
            path: path.to_string(),
            identity: identity.unwrap_or("*").to_string(),
            kind,
            source: source.into(),
        }
    }

    /// The normalization error underneath, if any.
    pub fn acl_error(&self) -> Option<&AclError> {
        match self {
            OpsError::Operation {
                source: HostError::Acl(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// Check if the caller's input or configuration caused the failure.
    pub fn is_validation_error(&self) -> bool {
        match self {
            OpsError::Operation { source, .. } => match source {
                HostError::Acl(e) => e.is_validation_error(),
                _ => false,
            },
            OpsError::Config(_) => true,
        }
    }

    /// Get error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            OpsError::Operation { source, .. } => source.error_code(),
            OpsError::Config(_) => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_context() {
        let err = OpsError::operation(
            Operation::Grant,
            "C:\\X",
            Some("G\\Eng"),
            Some(SecurableObjectKind::FileSystem),
            HostError::PlatformWriteFailure {
                path: "C:\\X".to_string(),
                message: "Access is denied".to_string(),
            },
        );
        assert_eq!(err.error_code(), "PLATFORM_WRITE_FAILURE");
        let message = err.to_string();
        assert!(message.contains("grant"));
        assert!(message.contains("C:\\X"));
        assert!(message.contains("G\\Eng"));
        assert!(err.acl_error().is_none());
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_validation_errors() {
        let empty_rights = OpsError::operation(
            Operation::Grant,
            "C:\\X",
            Some("G\\Eng"),
            Some(SecurableObjectKind::FileSystem),
            AclError::EmptyRights(SecurableObjectKind::FileSystem),
        );
        assert!(empty_rights.is_validation_error());

        let unknown_identity = OpsError::operation(
            Operation::Grant,
            "C:\\X",
            Some("nobody"),
            None,
            AclError::IdentityNotFound("nobody".to_string()),
        );
        assert!(!unknown_identity.is_validation_error());

        let config = OpsError::from(ConfigError::InvalidValue {
            key: "ACL_DRY_RUN".to_string(),
            message: "expected a boolean, got 'maybe'".to_string(),
        });
        assert!(config.is_validation_error());
        assert_eq!(config.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_acl_error_passthrough() {
        let err = OpsError::operation(
            Operation::Get,
            "C:\\X",
            None,
            None,
            AclError::IdentityNotFound("nobody".to_string()),
        );
        assert_eq!(err.acl_error(), Some(&AclError::IdentityNotFound("nobody".to_string())));
        assert!(err.to_string().contains("'*'"));
    }
}
