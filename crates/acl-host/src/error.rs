//! Error types for host platform operations
//!
//! This module defines the errors a host can raise while reading or
//! writing access-control state, resolving identities, or locating
//! private keys.

use acl_core::AclError;
use thiserror::Error;

/// Host platform error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Normalization failure, including unresolvable identities
    #[error(transparent)]
    Acl(#[from] AclError),

    /// The path does not exist on the host
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The platform refused to return the object's security
    #[error("Failed to read security of '{path}': {message}")]
    PlatformReadFailure {
        /// Object path
        path: String,
        /// Platform message
        message: String,
    },

    /// The platform rejected a new entry set
    #[error("Failed to write security of '{path}': {message}")]
    PlatformWriteFailure {
        /// Object path
        path: String,
        /// Platform message
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

impl HostError {
    /// Check if the error came from the platform rather than caller input.
    pub fn is_platform_error(&self) -> bool {
        matches!(
            self,
            HostError::PlatformReadFailure { .. }
                | HostError::PlatformWriteFailure { .. }
                | HostError::Internal(_)
        )
    }

    /// Get error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            HostError::Acl(e) => e.error_code(),
            HostError::ObjectNotFound(_) => "OBJECT_NOT_FOUND",
            HostError::PlatformReadFailure { .. } => "PLATFORM_READ_FAILURE",
            HostError::PlatformWriteFailure { .. } => "PLATFORM_WRITE_FAILURE",
            HostError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
