//! Request options for the four operations.
//!
//! Rights are given by name and parsed against each target's own
//! vocabulary, so the same request works for a key container and for the
//! files backing a key.

use acl_core::reconciler::DEFAULT_CONTAINER_SCOPE;
use acl_core::{AccessType, ApplyScope, ApplyTo};
use serde::{Deserialize, Serialize};

use crate::config::OpsConfig;

/// Options for reading entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetOptions {
    /// Only entries for this identity; all identities when unset.
    pub identity: Option<String>,
    /// Include inherited entries; falls back to configuration.
    pub include_inherited: Option<bool>,
}

impl GetOptions {
    /// Entries for every identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for one identity.
    pub fn for_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            include_inherited: None,
        }
    }

    /// Include inherited entries.
    pub fn include_inherited(mut self, include_inherited: bool) -> Self {
        self.include_inherited = Some(include_inherited);
        self
    }

    pub(crate) fn resolved_include_inherited(&self, config: &OpsConfig) -> bool {
        self.include_inherited.unwrap_or(config.include_inherited)
    }
}

/// Options for granting rights.
///
/// # Example
///
/// ```
/// use acl_core::ApplyTo;
/// use acl_ops::GrantOptions;
///
/// let options = GrantOptions::new("G\\Eng", &["FullControl"])
///     .apply_to(ApplyTo::ContainerOnly)
///     .dry_run(true);
/// assert_eq!(options.rights, vec!["FullControl".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantOptions {
    /// Who to grant to.
    pub identity: String,
    /// Right names in the target's vocabulary.
    pub rights: Vec<String>,
    /// Inheritance scope for containers.
    pub apply_to: Option<ApplyTo>,
    /// Limit inheritance to direct children.
    pub only_apply_to_children: bool,
    /// Allow or deny.
    pub access_type: AccessType,
    /// Keep the identity's existing entries.
    pub append: bool,
    /// Remove every other identity's explicit entries.
    pub clear: bool,
    /// Write even if the entry is already present.
    pub force: bool,
    /// Report without writing; falls back to configuration.
    pub dry_run: Option<bool>,
}

impl GrantOptions {
    /// An allow grant of `rights` to `identity`.
    pub fn new<S: AsRef<str>>(identity: impl Into<String>, rights: &[S]) -> Self {
        Self {
            identity: identity.into(),
            rights: rights.iter().map(|r| r.as_ref().to_string()).collect(),
            apply_to: None,
            only_apply_to_children: false,
            access_type: AccessType::Allow,
            append: false,
            clear: false,
            force: false,
            dry_run: None,
        }
    }

    /// Set the inheritance scope.
    pub fn apply_to(mut self, apply_to: ApplyTo) -> Self {
        self.apply_to = Some(apply_to);
        self
    }

    /// Limit inheritance to direct children.
    pub fn only_apply_to_children(mut self, only: bool) -> Self {
        self.only_apply_to_children = only;
        self
    }

    /// Grant a deny entry instead of an allow entry.
    pub fn deny(mut self) -> Self {
        self.access_type = AccessType::Deny;
        self
    }

    /// Keep the identity's existing entries.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Remove other identities' explicit entries.
    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Write even if already granted.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Report without writing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// The requested scope. Children-only without a scope applies to the
    /// default container scope.
    pub(crate) fn scope(&self) -> Option<ApplyScope> {
        match (self.apply_to, self.only_apply_to_children) {
            (Some(apply_to), only) => Some(ApplyScope::new(apply_to, only)),
            (None, true) => Some(ApplyScope::new(DEFAULT_CONTAINER_SCOPE, true)),
            (None, false) => None,
        }
    }

    pub(crate) fn resolved_dry_run(&self, config: &OpsConfig) -> bool {
        self.dry_run.unwrap_or(config.dry_run)
    }
}

/// Options for testing rights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestOptions {
    /// Who to check.
    pub identity: String,
    /// Right names in the target's vocabulary.
    pub rights: Vec<String>,
    /// Required scope; flags are not compared when unset.
    pub apply_to: Option<ApplyTo>,
    /// Only match entries that skip the object itself.
    pub only_apply_to_children: bool,
    /// Look at inherited entries instead of explicit ones.
    pub include_inherited: Option<bool>,
    /// Require exact rights equality.
    pub strict: Option<bool>,
}

impl TestOptions {
    /// A non-strict test for `rights` held by `identity`.
    pub fn new<S: AsRef<str>>(identity: impl Into<String>, rights: &[S]) -> Self {
        Self {
            identity: identity.into(),
            rights: rights.iter().map(|r| r.as_ref().to_string()).collect(),
            apply_to: None,
            only_apply_to_children: false,
            include_inherited: None,
            strict: None,
        }
    }

    /// Require a scope.
    pub fn apply_to(mut self, apply_to: ApplyTo) -> Self {
        self.apply_to = Some(apply_to);
        self
    }

    /// Children-only switch for the scope.
    pub fn only_apply_to_children(mut self, only: bool) -> Self {
        self.only_apply_to_children = only;
        self
    }

    /// Look at inherited entries.
    pub fn include_inherited(mut self, include_inherited: bool) -> Self {
        self.include_inherited = Some(include_inherited);
        self
    }

    /// Require exact rights.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// The required scope. Children-only without a scope requires the
    /// default container scope, the same one Grant writes.
    pub(crate) fn scope(&self) -> Option<ApplyScope> {
        match (self.apply_to, self.only_apply_to_children) {
            (Some(apply_to), only) => Some(ApplyScope::new(apply_to, only)),
            (None, true) => Some(ApplyScope::new(DEFAULT_CONTAINER_SCOPE, true)),
            (None, false) => None,
        }
    }

    pub(crate) fn resolved_strict(&self, config: &OpsConfig) -> bool {
        self.strict.unwrap_or(config.strict_tests)
    }

    pub(crate) fn resolved_include_inherited(&self, config: &OpsConfig) -> bool {
        self.include_inherited.unwrap_or(config.include_inherited)
    }
}

/// Options for revoking an identity's entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevokeOptions {
    /// Whose explicit entries to remove.
    pub identity: String,
    /// Report without writing; falls back to configuration.
    pub dry_run: Option<bool>,
}

impl RevokeOptions {
    /// Revoke everything explicit for `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            dry_run: None,
        }
    }

    /// Report without writing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    pub(crate) fn resolved_dry_run(&self, config: &OpsConfig) -> bool {
        self.dry_run.unwrap_or(config.dry_run)
    }
}
