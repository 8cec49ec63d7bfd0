//! Host platform interfaces
//!
//! The narrow set of platform calls the permission operations depend on.
//! Every call is synchronous and performs one full round trip; nothing
//! here caches state between calls.

use acl_core::{AccessControlEntry, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HostResult;

/// Canonicalizes account and group names.
pub trait IdentityResolver {
    /// Resolve a textual name to its canonical identity.
    ///
    /// Fails with `AclError::IdentityNotFound` when the name is unknown.
    fn resolve_identity(&self, name: &str) -> HostResult<Identity>;
}

/// Reads and writes entry collections on file-system and registry objects.
pub trait AclStore {
    /// Name of the provider that owns `path` (`FileSystem`, `Registry`,
    /// `Certificate`, or anything else the host knows).
    fn provider_name(&self, path: &str) -> HostResult<String>;

    /// Whether the object at `path` can have children.
    fn is_container(&self, path: &str) -> HostResult<bool>;

    /// Snapshot the object's entries, in platform order.
    ///
    /// With an identity, only that identity's entries are returned. Without
    /// `include_inherited`, inherited entries are left out.
    fn read_entries(
        &self,
        path: &str,
        identity: Option<&Identity>,
        include_inherited: bool,
    ) -> HostResult<Vec<AccessControlEntry>>;

    /// Replace the object's explicit entries with `entries`.
    ///
    /// Inherited entries in `entries` are ignored by the platform.
    fn write_entries(&self, path: &str, entries: &[AccessControlEntry]) -> HostResult<()>;
}

/// A certificate found under a certificate path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CertificateInfo {
    /// Full path of the certificate.
    pub path: String,
    /// Certificate thumbprint.
    pub thumbprint: String,
    /// Certificate subject.
    pub subject: String,
    /// Whether the certificate has a private key.
    pub has_private_key: bool,
}

impl CertificateInfo {
    /// One description shared by every target derived from the certificate.
    pub fn description(&self) -> String {
        format!("{} ({})", self.subject, self.thumbprint)
    }
}

impl fmt::Display for CertificateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Locates certificates and secures their private keys.
pub trait PrivateKeyStore {
    /// Certificates at `path`: one for a certificate path, all of them for
    /// a store path.
    fn certificates(&self, path: &str) -> HostResult<Vec<CertificateInfo>>;

    /// Whether the certificate's key exposes key-container security.
    fn key_security_available(&self, certificate: &CertificateInfo) -> bool;

    /// Snapshot the key container's entries.
    fn read_key_entries(&self, certificate: &CertificateInfo) -> HostResult<Vec<AccessControlEntry>>;

    /// Replace the key container's explicit entries.
    fn write_key_entries(
        &self,
        certificate: &CertificateInfo,
        entries: &[AccessControlEntry],
    ) -> HostResult<()>;

    /// Files that hold the certificate's private key.
    fn backing_files(&self, certificate: &CertificateInfo) -> HostResult<Vec<String>>;
}

/// Everything the permission operations need from the platform.
pub trait Host: IdentityResolver + AclStore + PrivateKeyStore {}

impl<T: IdentityResolver + AclStore + PrivateKeyStore> Host for T {}
