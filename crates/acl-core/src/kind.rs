//! # Object Kinds
//!
//! Classifies a path into one of the three securable object kinds.
//! The kind decides which rights vocabulary applies and whether
//! inheritance flags carry any meaning.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AclError, AclResult};

/// The kind of object an access-control list is attached to.
///
/// Each kind has its own rights vocabulary; masks from different kinds
/// are never compared against each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SecurableObjectKind {
    /// NTFS files and directories.
    FileSystem,
    /// Registry keys.
    Registry,
    /// Certificate private-key containers exposing key security.
    PrivateKey,
}

impl SecurableObjectKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurableObjectKind::FileSystem => "FileSystem",
            SecurableObjectKind::Registry => "Registry",
            SecurableObjectKind::PrivateKey => "PrivateKey",
        }
    }

    /// Check if objects of this kind can ever be containers.
    ///
    /// Private-key containers never propagate rules to children, so
    /// inheritance flags are meaningless for them.
    pub fn supports_inheritance(&self) -> bool {
        !matches!(self, SecurableObjectKind::PrivateKey)
    }
}

impl fmt::Display for SecurableObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The path provider a host reports for a path.
///
/// Certificates are a provider, not a kind: whether a certificate's key
/// is secured as a key container or through its backing files is decided
/// by the host's capability detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// File-system provider.
    FileSystem,
    /// Registry provider.
    Registry,
    /// Certificate store provider.
    Certificate,
}

impl ProviderKind {
    /// Parse a provider name reported by the host.
    ///
    /// # Example
    ///
    /// ```
    /// use acl_core::kind::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("filesystem"), Some(ProviderKind::FileSystem));
    /// assert_eq!(ProviderKind::parse("Cert"), Some(ProviderKind::Certificate));
    /// assert_eq!(ProviderKind::parse("Environment"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "filesystem" | "file_system" => Some(ProviderKind::FileSystem),
            "registry" => Some(ProviderKind::Registry),
            "certificate" | "cert" => Some(ProviderKind::Certificate),
            _ => None,
        }
    }

    /// Resolve the securable kind for this provider.
    ///
    /// # Arguments
    ///
    /// * `key_security_available` - Whether the host exposes key-container
    ///   security for the certificate; ignored for other providers
    pub fn object_kind(&self, key_security_available: bool) -> SecurableObjectKind {
        match self {
            ProviderKind::FileSystem => SecurableObjectKind::FileSystem,
            ProviderKind::Registry => SecurableObjectKind::Registry,
            ProviderKind::Certificate if key_security_available => SecurableObjectKind::PrivateKey,
            ProviderKind::Certificate => SecurableObjectKind::FileSystem,
        }
    }
}

/// A classified object: where it is, what kind it is, and whether it can
/// have children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SecurableObject {
    /// Path of the object.
    pub path: String,
    /// Kind of the object.
    pub kind: SecurableObjectKind,
    /// Whether the object is a container (directory, registry key).
    pub is_container: bool,
}

impl SecurableObject {
    /// Create a classified object.
    pub fn new(path: impl Into<String>, kind: SecurableObjectKind, is_container: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_container: is_container && kind.supports_inheritance(),
        }
    }

    /// Check if inheritance flags are meaningless for this object.
    pub fn is_leaf(&self) -> bool {
        !self.is_container
    }
}

impl fmt::Display for SecurableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind)
    }
}

/// Classify a path from the provider name the host reported for it.
///
/// # Errors
///
/// Returns `UnsupportedPathKind` if the provider has no rights vocabulary.
pub fn classify(path: &str, provider: &str) -> AclResult<ProviderKind> {
    ProviderKind::parse(provider).ok_or_else(|| AclError::UnsupportedPathKind {
        path: path.to_string(),
        provider: provider.to_string(),
    })
}
