//! # ACL Core
//!
//! This crate provides the permission-normalization and rule-reconciliation
//! logic shared by every securable object kind: NTFS files and directories,
//! registry keys, and certificate private-key containers.
//!
//! ## Overview
//!
//! The acl-core crate handles:
//! - **Kinds**: Classifying a path into a securable object kind
//! - **Rights**: Per-kind rights vocabularies over one mask type
//! - **Flags**: Translating `ApplyTo` scopes to inheritance/propagation flags
//! - **Matching**: Deciding whether existing entries already grant a request
//! - **Reconciling**: Planning the entries to add and remove for a grant or revoke
//!
//! Nothing here talks to the platform. Reading and writing entries, resolving
//! identities, and locating private keys belong to the host crate.
//!
//! ## Architecture
//!
//! ```text
//! path ──► classify ──► SecurableObject
//!                          │
//! rights names ──► Rights  │   ApplyTo ──► EntryFlags
//!                    │     │       │
//!                    ▼     ▼       ▼
//!   entries ──► matches / plan_grant / plan_revoke ──► Plan ──► final entries
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use acl_core::{
//!     plan_grant, AccessControlEntry, ApplyScope, ApplyTo, GrantRequest, Identity, Rights,
//!     SecurableObject, SecurableObjectKind,
//! };
//!
//! let dir = SecurableObject::new("C:\\X", SecurableObjectKind::FileSystem, true);
//! let rights = Rights::parse(SecurableObjectKind::FileSystem, &["FullControl"]).unwrap();
//! let request = GrantRequest::new(Identity::new("G\\Eng"), rights)
//!     .with_scope(Some(ApplyScope::new(ApplyTo::ContainerOnly, false)));
//!
//! let existing: Vec<AccessControlEntry> = Vec::new();
//! let plan = plan_grant(&existing, &request, &dir).unwrap();
//! let entries = plan.apply(&existing);
//!
//! // Granting again changes nothing
//! assert!(plan_grant(&entries, &request, &dir).unwrap().is_empty());
//! ```

pub mod diagnostic;
pub mod entry;
pub mod error;
pub mod flags;
pub mod kind;
pub mod matcher;
pub mod reconciler;
pub mod rights;

// Re-export main types for convenience
pub use diagnostic::Diagnostic;
pub use entry::{AccessControlEntry, AccessType, EntrySummary, Identity};
pub use error::{AclError, AclResult};
pub use flags::{
    to_apply_to, to_flags, ApplyScope, ApplyTo, EntryFlags, InheritanceFlags, PropagationFlags,
};
pub use kind::{classify, ProviderKind, SecurableObject, SecurableObjectKind};
pub use matcher::{matches, MatchCriteria, MatchOutcome};
pub use reconciler::{plan_grant, plan_revoke, GrantRequest, Plan};
pub use rights::{Rights, RightsMask, FILE_SYSTEM_FORCED_RIGHTS};
