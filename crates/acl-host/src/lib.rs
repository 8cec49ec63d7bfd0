//! # ACL Host
//!
//! This crate defines the platform calls the permission operations rely on,
//! and an in-memory platform that implements them.
//!
//! ## Overview
//!
//! The acl-host crate handles:
//! - **Identities**: Canonicalizing account and group names
//! - **ACL Store**: Reading and writing file-system and registry entries
//! - **Private Keys**: Locating certificates and securing their keys
//! - **Targets**: Resolving a caller's path into concrete objects
//!
//! ## Features
//!
//! - `memory` (default): In-memory host for tests and previews
//!
//! ## Private-Key Targets
//!
//! A certificate's private key is secured in one of two ways:
//!
//! ```text
//! certificate ──► has private key? ──no──► skipped (diagnostic)
//!                      │yes
//!                      ▼
//!          key-container security? ──yes──► KeyContainer(certificate)
//!                      │no
//!                      ▼
//!              backing files? ──none──► skipped (diagnostic)
//!                      │
//!                      ▼
//!          FileBacked { certificate, paths }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use acl_host::{resolve_targets, MemoryCertificate, MemoryHost};
//!
//! let host = MemoryHost::new().with_certificate(MemoryCertificate::with_backing_files(
//!     "cert:\\LocalMachine\\My",
//!     "ABC",
//!     "CN=web",
//!     &["C:\\Keys\\abc-1", "C:\\Keys\\abc-2"],
//! ));
//!
//! let resolved = resolve_targets(&host, "cert:\\LocalMachine\\My\\ABC").unwrap();
//! assert_eq!(resolved.targets.len(), 2);
//! ```

pub mod error;
pub mod host;
pub mod target;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export main types
pub use error::{HostError, HostResult};
pub use host::{AclStore, CertificateInfo, Host, IdentityResolver, PrivateKeyStore};
pub use target::{
    resolve_private_key_target, resolve_targets, KeyResolution, PrivateKeyTarget, ResolvedTargets,
    Target, TargetLocation,
};

#[cfg(feature = "memory")]
pub use memory::{MemoryCertificate, MemoryHost};
