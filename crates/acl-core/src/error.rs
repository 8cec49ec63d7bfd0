//! Error types for permission normalization
//!
//! This module defines the errors that can occur while classifying a path,
//! translating rights and flags, and planning changes to an entry collection.

use thiserror::Error;

use crate::kind::SecurableObjectKind;

/// Permission normalization error types.
///
/// These errors cover failures in the pure translation layer. Errors raised
/// by the host platform (reads, writes, identity lookups) live in the host
/// crate and wrap these where needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    /// The path belongs to a provider with no rights vocabulary
    #[error("Unsupported path kind: provider '{provider}' for path '{path}'")]
    UnsupportedPathKind {
        /// Path that was classified
        path: String,
        /// Provider name reported by the host
        provider: String,
    },

    /// A textual identity did not canonicalize
    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    /// A right name is not part of the kind's vocabulary
    #[error("Unknown {kind} right: '{name}'")]
    UnknownRight {
        /// Vocabulary the name was looked up in
        kind: SecurableObjectKind,
        /// The offending name
        name: String,
    },

    /// No right names were supplied
    #[error("No rights given for {0} object")]
    EmptyRights(SecurableObjectKind),

    /// Two rights masks from different vocabularies were combined or compared
    #[error("Cannot combine {left} rights with {right} rights")]
    KindMismatch {
        /// Kind of the left-hand operand
        left: SecurableObjectKind,
        /// Kind of the right-hand operand
        right: SecurableObjectKind,
    },

    /// An ApplyTo name could not be parsed
    #[error("Unknown ApplyTo value: '{0}'")]
    UnknownApplyTo(String),
}

/// Result type for normalization operations.
pub type AclResult<T> = Result<T, AclError>;

impl AclError {
    /// Check if this error is caused by caller input rather than the platform.
    pub fn is_validation_error(&self) -> bool {
        !matches!(self, AclError::IdentityNotFound(_))
    }

    /// Get a stable error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AclError::UnsupportedPathKind { .. } => "UNSUPPORTED_PATH_KIND",
            AclError::IdentityNotFound(_) => "IDENTITY_NOT_FOUND",
            AclError::UnknownRight { .. } => "UNKNOWN_RIGHT",
            AclError::EmptyRights(_) => "EMPTY_RIGHTS",
            AclError::KindMismatch { .. } => "KIND_MISMATCH",
            AclError::UnknownApplyTo(_) => "UNKNOWN_APPLY_TO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AclError::UnsupportedPathKind {
            path: "env:PATH".to_string(),
            provider: "Environment".to_string(),
        };
        assert_eq!(err.error_code(), "UNSUPPORTED_PATH_KIND");
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("Environment"));

        let err = AclError::IdentityNotFound("nobody".to_string());
        assert_eq!(err.error_code(), "IDENTITY_NOT_FOUND");
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_unknown_right_message() {
        let err = AclError::UnknownRight {
            kind: SecurableObjectKind::Registry,
            name: "Bogus".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown Registry right: 'Bogus'");
    }
}
