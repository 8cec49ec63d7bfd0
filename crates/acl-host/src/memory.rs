//! In-memory host implementation
//!
//! A simulated platform holding objects, identities, and certificates in
//! memory. Suitable for tests and for callers that want to preview changes
//! against a captured snapshot. Writes are counted so callers can observe
//! whether an operation touched the platform at all.

use acl_core::{AccessControlEntry, AclError, Identity};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::error::{HostError, HostResult};
use crate::host::{AclStore, CertificateInfo, IdentityResolver, PrivateKeyStore};

const CERTIFICATE_PREFIX: &str = "cert:";

/// An object held by the memory host.
#[derive(Debug, Clone)]
struct MemoryObject {
    provider: String,
    is_container: bool,
    entries: Vec<AccessControlEntry>,
}

/// A certificate held by the memory host.
#[derive(Debug, Clone)]
pub struct MemoryCertificate {
    /// Certificate details.
    pub info: CertificateInfo,
    /// Whether the key exposes key-container security.
    pub key_security: bool,
    /// Key-container entries, used when `key_security` is set.
    pub key_entries: Vec<AccessControlEntry>,
    /// Files holding the key, used when `key_security` is not set.
    pub backing_files: Vec<String>,
}

impl MemoryCertificate {
    /// A certificate whose key exposes key-container security.
    pub fn with_key_container(store: &str, thumbprint: &str, subject: &str) -> Self {
        Self {
            info: Self::info(store, thumbprint, subject, true),
            key_security: true,
            key_entries: Vec::new(),
            backing_files: Vec::new(),
        }
    }

    /// A certificate whose key is secured through its files.
    pub fn with_backing_files(store: &str, thumbprint: &str, subject: &str, files: &[&str]) -> Self {
        Self {
            info: Self::info(store, thumbprint, subject, true),
            key_security: false,
            key_entries: Vec::new(),
            backing_files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// A certificate with no private key.
    pub fn without_private_key(store: &str, thumbprint: &str, subject: &str) -> Self {
        Self {
            info: Self::info(store, thumbprint, subject, false),
            key_security: false,
            key_entries: Vec::new(),
            backing_files: Vec::new(),
        }
    }

    fn info(store: &str, thumbprint: &str, subject: &str, has_private_key: bool) -> CertificateInfo {
        CertificateInfo {
            path: format!("{}\\{}", store.trim_end_matches('\\'), thumbprint),
            thumbprint: thumbprint.to_string(),
            subject: subject.to_string(),
            has_private_key,
        }
    }
}

/// Windows paths are case-insensitive.
fn key(path: &str) -> String {
    path.trim_end_matches('\\').to_lowercase()
}

fn poisoned<T>(_: T) -> HostError {
    HostError::Internal("memory host lock poisoned".to_string())
}

/// Write access for the builders, taking over a poisoned lock.
fn recover<'a, T>(what: &str, lock: &'a RwLock<T>) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|e| {
        warn!(lock = what, "Memory host lock poisoned, recovering");
        PoisonError::into_inner(e)
    })
}

/// In-memory host.
///
/// # Example
///
/// ```
/// use acl_host::{AclStore, IdentityResolver, MemoryHost};
///
/// let host = MemoryHost::new()
///     .with_identity("G\\Eng")
///     .with_directory("C:\\X");
///
/// let eng = host.resolve_identity("g\\eng").unwrap();
/// assert_eq!(eng.as_str(), "G\\Eng");
/// assert!(host.is_container("c:\\x").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryHost {
    objects: RwLock<HashMap<String, MemoryObject>>,
    identities: RwLock<HashMap<String, Identity>>,
    certificates: RwLock<Vec<MemoryCertificate>>,
    failing_writes: RwLock<HashSet<String>>,
    writes: AtomicUsize,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> HostResult<RwLockReadGuard<'_, HashMap<String, MemoryObject>>> {
        self.objects.read().map_err(poisoned)
    }

    fn objects_mut(&self) -> HostResult<RwLockWriteGuard<'_, HashMap<String, MemoryObject>>> {
        self.objects.write().map_err(poisoned)
    }

    /// Register an identity; lookups are case-insensitive.
    pub fn with_identity(self, name: &str) -> Self {
        recover("identities", &self.identities)
            .insert(name.to_lowercase(), Identity::new(name));
        self
    }

    /// Register an object under an arbitrary provider.
    pub fn with_object(self, path: &str, provider: &str, is_container: bool) -> Self {
        recover("objects", &self.objects)
            .entry(key(path))
            .or_insert_with(|| MemoryObject {
                provider: provider.to_string(),
                is_container,
                entries: Vec::new(),
            });
        self
    }

    /// Register a directory.
    pub fn with_directory(self, path: &str) -> Self {
        self.with_object(path, "FileSystem", true)
    }

    /// Register a file.
    pub fn with_file(self, path: &str) -> Self {
        self.with_object(path, "FileSystem", false)
    }

    /// Register a registry key.
    pub fn with_registry_key(self, path: &str) -> Self {
        self.with_object(path, "Registry", true)
    }

    /// Seed an existing entry on a registered object.
    pub fn with_entry(self, path: &str, entry: AccessControlEntry) -> Self {
        match recover("objects", &self.objects).get_mut(&key(path)) {
            Some(object) => object.entries.push(entry),
            None => warn!(path, "Entry seeded on an unregistered object, ignoring"),
        }
        self
    }

    /// Register a certificate. Backing files are registered as files.
    pub fn with_certificate(self, certificate: MemoryCertificate) -> Self {
        let files = certificate.backing_files.clone();
        recover("certificates", &self.certificates).push(certificate);
        files.iter().fold(self, |host, file| host.with_file(file))
    }

    /// Make every write to `path` fail.
    pub fn fail_writes_to(self, path: &str) -> Self {
        recover("failing_writes", &self.failing_writes).insert(key(path));
        self
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current entries of an object, inherited ones included.
    pub fn entries(&self, path: &str) -> HostResult<Vec<AccessControlEntry>> {
        self.read_entries(path, None, true)
    }

    fn check_write(&self, path: &str) -> HostResult<()> {
        let failing = self.failing_writes.read().map_err(poisoned)?;
        if failing.contains(&key(path)) {
            return Err(HostError::PlatformWriteFailure {
                path: path.to_string(),
                message: "Access is denied".to_string(),
            });
        }
        Ok(())
    }

    fn find_certificate<R>(
        &self,
        certificate: &CertificateInfo,
        f: impl FnOnce(&mut MemoryCertificate) -> R,
    ) -> HostResult<R> {
        let mut certificates = self.certificates.write().map_err(poisoned)?;
        certificates
            .iter_mut()
            .find(|c| key(&c.info.path) == key(&certificate.path))
            .map(f)
            .ok_or_else(|| HostError::ObjectNotFound(certificate.path.clone()))
    }

    /// Keep the inherited entries already on an object and replace the rest.
    fn merge_explicit(
        current: &[AccessControlEntry],
        entries: &[AccessControlEntry],
    ) -> Vec<AccessControlEntry> {
        let mut merged: Vec<AccessControlEntry> =
            entries.iter().filter(|e| e.is_explicit()).cloned().collect();
        merged.extend(current.iter().filter(|e| e.is_inherited).cloned());
        merged
    }
}

impl IdentityResolver for MemoryHost {
    fn resolve_identity(&self, name: &str) -> HostResult<Identity> {
        let identities = self.identities.read().map_err(poisoned)?;
        let lookup = name.trim().to_lowercase();

        if let Some(identity) = identities.get(&lookup) {
            return Ok(identity.clone());
        }

        // A bare account name matches a unique DOMAIN\name
        let mut candidates = identities
            .iter()
            .filter(|(k, _)| k.rsplit('\\').next() == Some(lookup.as_str()) && !lookup.contains('\\'));
        match (candidates.next(), candidates.next()) {
            (Some((_, identity)), None) => Ok(identity.clone()),
            _ => Err(AclError::IdentityNotFound(name.to_string()).into()),
        }
    }
}

impl AclStore for MemoryHost {
    fn provider_name(&self, path: &str) -> HostResult<String> {
        if path.to_lowercase().starts_with(CERTIFICATE_PREFIX) {
            return Ok("Certificate".to_string());
        }
        self.objects()?
            .get(&key(path))
            .map(|o| o.provider.clone())
            .ok_or_else(|| HostError::ObjectNotFound(path.to_string()))
    }

    fn is_container(&self, path: &str) -> HostResult<bool> {
        self.objects()?
            .get(&key(path))
            .map(|o| o.is_container)
            .ok_or_else(|| HostError::ObjectNotFound(path.to_string()))
    }

    fn read_entries(
        &self,
        path: &str,
        identity: Option<&Identity>,
        include_inherited: bool,
    ) -> HostResult<Vec<AccessControlEntry>> {
        let objects = self.objects()?;
        let object = objects
            .get(&key(path))
            .ok_or_else(|| HostError::ObjectNotFound(path.to_string()))?;

        Ok(object
            .entries
            .iter()
            .filter(|e| identity.map_or(true, |id| &e.identity == id))
            .filter(|e| include_inherited || e.is_explicit())
            .cloned()
            .collect())
    }

    fn write_entries(&self, path: &str, entries: &[AccessControlEntry]) -> HostResult<()> {
        self.check_write(path)?;
        let mut objects = self.objects_mut()?;
        let object = objects
            .get_mut(&key(path))
            .ok_or_else(|| HostError::ObjectNotFound(path.to_string()))?;

        object.entries = Self::merge_explicit(&object.entries, entries);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl PrivateKeyStore for MemoryHost {
    fn certificates(&self, path: &str) -> HostResult<Vec<CertificateInfo>> {
        let certificates = self.certificates.read().map_err(poisoned)?;
        let wanted = key(path);
        let found: Vec<CertificateInfo> = certificates
            .iter()
            .filter(|c| {
                let cert_path = key(&c.info.path);
                cert_path == wanted || cert_path.starts_with(&format!("{}\\", wanted))
            })
            .map(|c| c.info.clone())
            .collect();

        if found.is_empty() {
            return Err(HostError::ObjectNotFound(path.to_string()));
        }
        Ok(found)
    }

    fn key_security_available(&self, certificate: &CertificateInfo) -> bool {
        match self.find_certificate(certificate, |c| c.key_security) {
            Ok(available) => available,
            Err(e) => {
                warn!(
                    certificate = %certificate.path,
                    error = %e,
                    "Key security lookup failed, treating key as file-backed"
                );
                false
            }
        }
    }

    fn read_key_entries(&self, certificate: &CertificateInfo) -> HostResult<Vec<AccessControlEntry>> {
        self.find_certificate(certificate, |c| c.key_entries.clone())
    }

    fn write_key_entries(
        &self,
        certificate: &CertificateInfo,
        entries: &[AccessControlEntry],
    ) -> HostResult<()> {
        self.check_write(&certificate.path)?;
        self.find_certificate(certificate, |c| {
            c.key_entries = Self::merge_explicit(&c.key_entries, entries);
        })?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backing_files(&self, certificate: &CertificateInfo) -> HostResult<Vec<String>> {
        self.find_certificate(certificate, |c| c.backing_files.clone())
    }
}
