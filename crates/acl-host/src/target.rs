//! Target resolution
//!
//! Turns a caller's path into the concrete objects whose entries are read
//! and written. File-system and registry paths resolve to themselves. A
//! certificate path resolves to one target per certificate key: the key
//! container when the platform exposes its security, otherwise every file
//! that backs the key.

use acl_core::{classify, AccessControlEntry, Diagnostic, ProviderKind, SecurableObject, SecurableObjectKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HostResult;
use crate::host::{CertificateInfo, Host, PrivateKeyStore};

/// Where a certificate's private-key security lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrivateKeyTarget {
    /// The key container's own security descriptor.
    KeyContainer(CertificateInfo),
    /// File-level security on the files that hold the key.
    FileBacked {
        /// The certificate the files belong to.
        certificate: CertificateInfo,
        /// Backing file paths.
        paths: Vec<String>,
    },
}

/// Outcome of looking for a certificate's private-key target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// The key has somewhere to put entries.
    Resolved(PrivateKeyTarget),
    /// The certificate is skipped.
    Skipped(Diagnostic),
}

/// Decide how a certificate's private key is secured.
pub fn resolve_private_key_target<S: PrivateKeyStore + ?Sized>(
    store: &S,
    certificate: &CertificateInfo,
) -> HostResult<KeyResolution> {
    if !certificate.has_private_key {
        return Ok(KeyResolution::Skipped(Diagnostic::MissingPrivateKey {
            certificate: certificate.description(),
        }));
    }

    if store.key_security_available(certificate) {
        return Ok(KeyResolution::Resolved(PrivateKeyTarget::KeyContainer(
            certificate.clone(),
        )));
    }

    let paths = store.backing_files(certificate)?;
    if paths.is_empty() {
        return Ok(KeyResolution::Skipped(Diagnostic::NoPrivateKeyTarget {
            certificate: certificate.description(),
        }));
    }

    Ok(KeyResolution::Resolved(PrivateKeyTarget::FileBacked {
        certificate: certificate.clone(),
        paths,
    }))
}

/// Where a target's entries are read from and written to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TargetLocation {
    /// A file-system or registry ACL at the object's path.
    Path,
    /// A certificate's key container.
    KeyContainer(CertificateInfo),
}

/// One concrete object to operate on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// The classified object.
    pub object: SecurableObject,
    /// Where its entries live.
    pub location: TargetLocation,
    /// What to call it in reports; shared by all files backing one key.
    pub description: String,
}

impl Target {
    /// Snapshot every entry on the target, inherited ones included.
    pub fn read_entries<H: Host + ?Sized>(&self, host: &H) -> HostResult<Vec<AccessControlEntry>> {
        match &self.location {
            TargetLocation::Path => host.read_entries(&self.object.path, None, true),
            TargetLocation::KeyContainer(certificate) => host.read_key_entries(certificate),
        }
    }

    /// Write the target's final entry set.
    pub fn write_entries<H: Host + ?Sized>(
        &self,
        host: &H,
        entries: &[AccessControlEntry],
    ) -> HostResult<()> {
        match &self.location {
            TargetLocation::Path => host.write_entries(&self.object.path, entries),
            TargetLocation::KeyContainer(certificate) => host.write_key_entries(certificate, entries),
        }
    }
}

/// Targets for a path, plus certificates that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTargets {
    /// Objects to operate on, in order.
    pub targets: Vec<Target>,
    /// Why some certificates produced no target.
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve a caller's path into the objects to operate on.
///
/// # Errors
///
/// Fails with `UnsupportedPathKind` when the path's provider has no rights
/// vocabulary, or with whatever the host reports for a missing path.
pub fn resolve_targets<H: Host + ?Sized>(host: &H, path: &str) -> HostResult<ResolvedTargets> {
    let provider = host.provider_name(path)?;
    let provider = classify(path, &provider)?;

    let mut resolved = ResolvedTargets::default();
    match provider {
        ProviderKind::FileSystem | ProviderKind::Registry => {
            let kind = provider.object_kind(false);
            resolved.targets.push(Target {
                object: SecurableObject::new(path, kind, host.is_container(path)?),
                location: TargetLocation::Path,
                description: path.to_string(),
            });
        }
        ProviderKind::Certificate => {
            for certificate in host.certificates(path)? {
                match resolve_private_key_target(host, &certificate)? {
                    KeyResolution::Resolved(target) => {
                        push_key_target(host, &mut resolved, target)?;
                    }
                    KeyResolution::Skipped(diagnostic) => {
                        warn!(certificate = %certificate, "{}", diagnostic);
                        resolved.diagnostics.push(diagnostic);
                    }
                }
            }
        }
    }

    debug!(path = %path, targets = resolved.targets.len(), "Resolved targets");
    Ok(resolved)
}

fn push_key_target<H: Host + ?Sized>(
    host: &H,
    resolved: &mut ResolvedTargets,
    target: PrivateKeyTarget,
) -> HostResult<()> {
    match target {
        PrivateKeyTarget::KeyContainer(certificate) => {
            resolved.targets.push(Target {
                object: SecurableObject::new(
                    certificate.path.clone(),
                    SecurableObjectKind::PrivateKey,
                    false,
                ),
                description: certificate.description(),
                location: TargetLocation::KeyContainer(certificate),
            });
        }
        PrivateKeyTarget::FileBacked { certificate, paths } => {
            let description = certificate.description();
            for path in paths {
                let is_container = host.is_container(&path)?;
                resolved.targets.push(Target {
                    object: SecurableObject::new(path, SecurableObjectKind::FileSystem, is_container),
                    location: TargetLocation::Path,
                    description: description.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::memory::{MemoryCertificate, MemoryHost};
    use acl_core::AclError;

    const STORE: &str = "cert:\\LocalMachine\\My";

    #[test]
    fn test_file_system_path_resolves_to_itself() {
        let host = MemoryHost::new().with_directory("C:\\X");
        let resolved = resolve_targets(&host, "C:\\X").unwrap();

        assert_eq!(resolved.targets.len(), 1);
        let target = &resolved.targets[0];
        assert_eq!(target.object.kind, SecurableObjectKind::FileSystem);
        assert!(!target.object.is_leaf());
        assert_eq!(target.location, TargetLocation::Path);
    }

    #[test]
    fn test_registry_key_is_container() {
        let host = MemoryHost::new().with_registry_key("hklm:\\Software\\X");
        let resolved = resolve_targets(&host, "hklm:\\Software\\X").unwrap();
        assert_eq!(resolved.targets[0].object.kind, SecurableObjectKind::Registry);
        assert!(resolved.targets[0].object.is_container);
    }

    #[test]
    fn test_unsupported_provider() {
        let host = MemoryHost::new().with_object("env:\\PATH", "Environment", false);
        let err = resolve_targets(&host, "env:\\PATH").unwrap_err();
        assert!(matches!(
            err,
            HostError::Acl(AclError::UnsupportedPathKind { .. })
        ));
    }

    #[test]
    fn test_key_container_target() {
        let host = MemoryHost::new()
            .with_certificate(MemoryCertificate::with_key_container(STORE, "AAA", "CN=a"));
        let resolved = resolve_targets(&host, STORE).unwrap();

        assert_eq!(resolved.targets.len(), 1);
        let target = &resolved.targets[0];
        assert_eq!(target.object.kind, SecurableObjectKind::PrivateKey);
        assert!(target.object.is_leaf());
        assert_eq!(target.description, "CN=a (AAA)");
        assert!(matches!(target.location, TargetLocation::KeyContainer(_)));
    }

    #[test]
    fn test_file_backed_targets_share_description() {
        let host = MemoryHost::new().with_certificate(MemoryCertificate::with_backing_files(
            STORE,
            "BBB",
            "CN=b",
            &["C:\\Keys\\b1", "C:\\Keys\\b2"],
        ));
        let resolved = resolve_targets(&host, STORE).unwrap();

        assert_eq!(resolved.targets.len(), 2);
        for target in &resolved.targets {
            assert_eq!(target.object.kind, SecurableObjectKind::FileSystem);
            assert_eq!(target.description, "CN=b (BBB)");
        }
        assert_eq!(resolved.targets[1].object.path, "C:\\Keys\\b2");
    }

    #[test]
    fn test_certificates_without_key_are_skipped() {
        let host = MemoryHost::new()
            .with_certificate(MemoryCertificate::without_private_key(STORE, "CCC", "CN=c"))
            .with_certificate(MemoryCertificate::with_backing_files(STORE, "DDD", "CN=d", &[]))
            .with_certificate(MemoryCertificate::with_key_container(STORE, "EEE", "CN=e"));
        let resolved = resolve_targets(&host, STORE).unwrap();

        assert_eq!(resolved.targets.len(), 1);
        assert_eq!(
            resolved.diagnostics,
            vec![
                Diagnostic::MissingPrivateKey {
                    certificate: "CN=c (CCC)".to_string()
                },
                Diagnostic::NoPrivateKeyTarget {
                    certificate: "CN=d (DDD)".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_resolve_private_key_target_union() {
        let host = MemoryHost::new().with_certificate(MemoryCertificate::with_backing_files(
            STORE,
            "BBB",
            "CN=b",
            &["C:\\Keys\\b1"],
        ));
        let certificate = host.certificates(STORE).unwrap().remove(0);
        match resolve_private_key_target(&host, &certificate).unwrap() {
            KeyResolution::Resolved(PrivateKeyTarget::FileBacked { paths, .. }) => {
                assert_eq!(paths, vec!["C:\\Keys\\b1".to_string()]);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
    }
}
