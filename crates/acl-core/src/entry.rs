//! # Access-Control Entries
//!
//! Snapshots of the rules on an object, and the summary view used when
//! reporting them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::flags::{to_apply_to, ApplyTo, EntryFlags};
use crate::rights::Rights;

/// A canonical account or group name.
///
/// Identities come from the host's resolver already canonicalized.
/// Windows account names are case-insensitive, so equality is too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a canonical name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Identity {}

impl std::hash::Hash for Identity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an entry allows or denies its rights.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccessType {
    #[default]
    Allow,
    Deny,
}

impl AccessType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Allow => "Allow",
            AccessType::Deny => "Deny",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allow" => Some(AccessType::Allow),
            "deny" => Some(AccessType::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grant or deny record on an object.
///
/// Entries read from the platform are snapshots. The only entries built
/// here are the desired ones a grant adds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AccessControlEntry {
    /// Who the entry applies to.
    pub identity: Identity,
    /// Allow or deny.
    pub access_type: AccessType,
    /// The rights and their vocabulary.
    pub rights: Rights,
    /// Inheritance and propagation flags.
    pub flags: EntryFlags,
    /// Whether the entry was inherited from a parent.
    pub is_inherited: bool,
}

impl AccessControlEntry {
    /// Create an explicit allow entry with no inheritance.
    pub fn allow(identity: Identity, rights: Rights) -> Self {
        Self {
            identity,
            access_type: AccessType::Allow,
            rights,
            flags: EntryFlags::NONE,
            is_inherited: false,
        }
    }

    /// Create an explicit deny entry with no inheritance.
    pub fn deny(identity: Identity, rights: Rights) -> Self {
        Self {
            access_type: AccessType::Deny,
            ..Self::allow(identity, rights)
        }
    }

    /// Set the inheritance flags.
    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark the entry as inherited.
    pub fn inherited(mut self) -> Self {
        self.is_inherited = true;
        self
    }

    /// Check if the entry is defined directly on the object.
    pub fn is_explicit(&self) -> bool {
        !self.is_inherited
    }

    /// Summarize the entry for reporting.
    pub fn summary(&self) -> EntrySummary {
        let scope = to_apply_to(self.flags);
        EntrySummary {
            identity: self.identity.to_string(),
            access_type: self.access_type,
            rights: self.rights.names(),
            inheritance_flags: self.flags.inheritance.to_string(),
            propagation_flags: self.flags.propagation.to_string(),
            is_inherited: self.is_inherited,
            apply_to: scope.map(|s| s.apply_to),
            only_apply_to_children: scope.map(|s| s.only_apply_to_children),
        }
    }
}

impl fmt::Display for AccessControlEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({} / {})",
            self.identity, self.access_type, self.rights, self.flags.inheritance, self.flags.propagation
        )?;
        if self.is_inherited {
            f.write_str(" [inherited]")?;
        }
        Ok(())
    }
}

/// The reporting view of an entry.
///
/// `apply_to` is omitted when the entry's flags do not correspond to any
/// scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntrySummary {
    /// Identity name.
    pub identity: String,
    /// Allow or deny.
    pub access_type: AccessType,
    /// Right names.
    pub rights: Vec<String>,
    /// Inheritance flags as text.
    pub inheritance_flags: String,
    /// Propagation flags as text.
    pub propagation_flags: String,
    /// Whether the entry was inherited.
    pub is_inherited: bool,
    /// Scope, when the flags map to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<ApplyTo>,
    /// Children-only switch, when the flags map to a scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_apply_to_children: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{to_flags, InheritanceFlags, PropagationFlags};
    use crate::kind::SecurableObjectKind;
    use crate::rights::file_system;

    fn full_control() -> Rights {
        Rights::new(SecurableObjectKind::FileSystem, file_system::FULL_CONTROL)
    }

    #[test]
    fn test_identity_case_insensitive() {
        assert_eq!(Identity::new("G\\Eng"), Identity::new("g\\ENG"));
        assert_ne!(Identity::new("G\\Eng"), Identity::new("G\\Ops"));

        let mut set = std::collections::HashSet::new();
        set.insert(Identity::new("BUILTIN\\Users"));
        assert!(set.contains(&Identity::new("builtin\\users")));
    }

    #[test]
    fn test_entry_builders() {
        let entry = AccessControlEntry::deny(Identity::new("G\\Eng"), full_control())
            .with_flags(to_flags(ApplyTo::SubcontainersOnly, false))
            .inherited();
        assert_eq!(entry.access_type, AccessType::Deny);
        assert!(entry.is_inherited);
        assert!(!entry.is_explicit());
        assert_eq!(entry.flags.inheritance, InheritanceFlags::CONTAINER_INHERIT);
    }

    #[test]
    fn test_summary_with_scope() {
        let entry = AccessControlEntry::allow(Identity::new("G\\Eng"), full_control())
            .with_flags(to_flags(ApplyTo::ContainerAndLeaves, true));
        let summary = entry.summary();
        assert_eq!(summary.rights, vec!["FullControl"]);
        assert_eq!(summary.apply_to, Some(ApplyTo::ContainerAndLeaves));
        assert_eq!(summary.only_apply_to_children, Some(true));
        assert_eq!(summary.inheritance_flags, "ObjectInherit");
    }

    #[test]
    fn test_summary_omits_ambiguous_scope() {
        let entry = AccessControlEntry::allow(Identity::new("G\\Eng"), full_control()).with_flags(
            EntryFlags::new(InheritanceFlags::NONE, PropagationFlags::INHERIT_ONLY),
        );
        let summary = entry.summary();
        assert_eq!(summary.apply_to, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("apply_to").is_none());
        assert_eq!(json["access_type"], "Allow");
    }

    #[test]
    fn test_access_type_parse() {
        assert_eq!(AccessType::parse("DENY"), Some(AccessType::Deny));
        assert_eq!(AccessType::parse("maybe"), None);
        assert_eq!(AccessType::default(), AccessType::Allow);
    }
}
