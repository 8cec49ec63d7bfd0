//! # ACL Operations
//!
//! Get, Grant, Test, and Revoke permissions on file-system paths, registry
//! keys, and certificate private keys, with one uniform request shape.
//!
//! ## Overview
//!
//! The acl-ops crate handles:
//! - **Get**: Reporting the entries on a path, optionally for one identity
//! - **Grant**: Ensuring an identity holds rights, idempotently
//! - **Test**: Checking whether an identity holds rights
//! - **Revoke**: Removing an identity's explicit entries
//!
//! Rights are named in the vocabulary of the object being secured
//! (`FullControl` on a directory, `ReadKey` on a registry key,
//! `GenericRead` on a key container). Inheritance is named with
//! [`ApplyTo`](acl_core::ApplyTo) instead of raw flags.
//!
//! ## Configuration
//!
//! Options a request leaves unset fall back to [`OpsConfig`]:
//! - `ACL_DRY_RUN`: Report Grant and Revoke changes without writing
//! - `ACL_INCLUDE_INHERITED`: Make Get and Test consider inherited entries
//! - `ACL_STRICT_TESTS`: Make Test require exact rights
//!
//! ## Usage
//!
//! ```rust
//! use acl_host::MemoryHost;
//! use acl_ops::{GrantOptions, Permissions, RevokeOptions, TestOptions};
//!
//! let host = MemoryHost::new().with_identity("CORP\\svc").with_file("C:\\app.log");
//! let permissions = Permissions::new(host);
//!
//! permissions
//!     .grant("C:\\app.log", &GrantOptions::new("CORP\\svc", &["Read", "Write"]))
//!     .unwrap();
//! assert!(permissions
//!     .test("C:\\app.log", &TestOptions::new("svc", &["Read"]))
//!     .unwrap()
//!     .granted);
//!
//! permissions
//!     .revoke("C:\\app.log", &RevokeOptions::new("CORP\\svc"))
//!     .unwrap();
//! ```

pub mod config;
pub mod error;
pub mod options;
pub mod report;
pub mod service;

// Re-export main types
pub use config::{ConfigError, OpsConfig};
pub use error::{Operation, OpsError, OpsResult};
pub use options::{GetOptions, GrantOptions, RevokeOptions, TestOptions};
pub use report::{ChangeReport, GetReport, TargetEntries, TargetReport, TargetStatus, TestReport};
pub use service::Permissions;
