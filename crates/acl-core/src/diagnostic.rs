//! Non-fatal conditions surfaced alongside results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kind::SecurableObjectKind;

/// A condition worth telling the caller about that does not fail the
/// operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    /// ApplyTo/OnlyApplyToChildren was given for a leaf object and ignored.
    LeafFlagMismatch {
        /// Path of the leaf object.
        path: String,
        /// Kind of the leaf object.
        kind: SecurableObjectKind,
    },

    /// A certificate has no private key to secure.
    MissingPrivateKey {
        /// Certificate description.
        certificate: String,
    },

    /// A certificate's key exposes neither key-container security nor
    /// any backing file.
    NoPrivateKeyTarget {
        /// Certificate description.
        certificate: String,
    },
}

impl Diagnostic {
    /// Get a stable code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::LeafFlagMismatch { .. } => "LEAF_FLAG_MISMATCH",
            Diagnostic::MissingPrivateKey { .. } => "MISSING_PRIVATE_KEY",
            Diagnostic::NoPrivateKeyTarget { .. } => "NO_PRIVATE_KEY_TARGET",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::LeafFlagMismatch { path, kind } => write!(
                f,
                "Can't apply inheritance/propagation rules to a leaf {} object '{}'; ApplyTo and OnlyApplyToChildren are ignored",
                kind, path
            ),
            Diagnostic::MissingPrivateKey { certificate } => {
                write!(f, "Certificate {} doesn't have a private key", certificate)
            }
            Diagnostic::NoPrivateKeyTarget { certificate } => write!(
                f,
                "Certificate {} exposes no key-container security and no private key file",
                certificate
            ),
        }
    }
}
