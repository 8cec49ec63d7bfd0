//! # Rule Matcher
//!
//! Decides whether an identity's existing entries already grant a
//! requested set of rights.
//!
//! Entries pass through four filters in order:
//!
//! 1. access type (allow, unless the criteria ask for deny)
//! 2. inherited or explicit, per the caller's choice
//! 3. rights: exact equality in strict mode, superset otherwise
//! 4. inheritance/propagation flags, when a scope was given and the
//!    object is a container
//!
//! The object matches if any entry survives.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::diagnostic::Diagnostic;
use crate::entry::{AccessControlEntry, AccessType};
use crate::error::AclResult;
use crate::flags::{ApplyScope, EntryFlags};
use crate::kind::SecurableObject;
use crate::rights::Rights;

/// What to look for in an entry collection.
///
/// # Example
///
/// ```
/// use acl_core::flags::{ApplyScope, ApplyTo};
/// use acl_core::kind::SecurableObjectKind;
/// use acl_core::matcher::MatchCriteria;
/// use acl_core::rights::Rights;
///
/// let rights = Rights::parse(SecurableObjectKind::FileSystem, &["FullControl"]).unwrap();
/// let criteria = MatchCriteria::new(rights)
///     .strict(true)
///     .with_scope(ApplyScope::new(ApplyTo::ContainerOnly, false));
/// assert!(criteria.flags.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Requested rights.
    pub rights: Rights,
    /// Require exact rights equality instead of containment.
    pub strict: bool,
    /// Consider inherited entries instead of explicit ones.
    pub include_inherited: bool,
    /// Required flags; `None` means flags are not compared.
    pub flags: Option<EntryFlags>,
    /// Entry type to consider.
    pub access_type: AccessType,
}

impl MatchCriteria {
    /// Non-strict criteria over explicit allow entries, ignoring flags.
    pub fn new(rights: Rights) -> Self {
        Self {
            rights,
            strict: false,
            include_inherited: false,
            flags: None,
            access_type: AccessType::Allow,
        }
    }

    /// Set strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Choose inherited entries over explicit ones.
    pub fn include_inherited(mut self, include_inherited: bool) -> Self {
        self.include_inherited = include_inherited;
        self
    }

    /// Require the flags of a scope.
    pub fn with_scope(mut self, scope: ApplyScope) -> Self {
        self.flags = Some(scope.flags());
        self
    }

    /// Require an exact flag pair.
    pub fn with_flags(mut self, flags: Option<EntryFlags>) -> Self {
        self.flags = flags;
        self
    }

    /// Look at entries of the given type.
    pub fn access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
        self
    }

    /// The mask an entry is compared against.
    ///
    /// The platform forces some rights onto allow entries, so strict
    /// comparisons add them to the request.
    fn effective_rights(&self) -> Rights {
        if self.strict && self.access_type == AccessType::Allow {
            self.rights.with_forced()
        } else {
            self.rights
        }
    }
}

/// Result of matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether any entry satisfied the criteria.
    pub matched: bool,
    /// Conditions noticed while matching.
    pub diagnostics: Vec<Diagnostic>,
}

/// Drop flag requirements that make no sense for a leaf object.
///
/// Returns the flags to compare and, for a leaf, the warning to surface.
pub fn effective_flags(
    object: &SecurableObject,
    flags: Option<EntryFlags>,
) -> (Option<EntryFlags>, Option<Diagnostic>) {
    match flags {
        Some(_) if object.is_leaf() => {
            warn!(
                path = %object.path,
                kind = %object.kind,
                "ApplyTo/OnlyApplyToChildren ignored for leaf object"
            );
            let diagnostic = Diagnostic::LeafFlagMismatch {
                path: object.path.clone(),
                kind: object.kind,
            };
            (None, Some(diagnostic))
        }
        other => (other, None),
    }
}

/// Check whether `entries` already satisfy `criteria` on `object`.
///
/// `entries` should be the entries of a single identity. Testing never
/// changes anything.
///
/// # Errors
///
/// Returns `KindMismatch` if an entry's rights come from a different
/// vocabulary than the requested rights.
pub fn matches(
    entries: &[AccessControlEntry],
    criteria: &MatchCriteria,
    object: &SecurableObject,
) -> AclResult<MatchOutcome> {
    let (flags, diagnostic) = effective_flags(object, criteria.flags);
    let desired = criteria.effective_rights();

    let mut matched = false;
    for entry in entries
        .iter()
        .filter(|e| e.access_type == criteria.access_type)
        .filter(|e| e.is_inherited == criteria.include_inherited)
    {
        let rights_ok = if criteria.strict {
            entry.rights.contains(&desired)? && desired.contains(&entry.rights)?
        } else {
            entry.rights.contains(&desired)?
        };

        if rights_ok && flags.map_or(true, |f| f == entry.flags) {
            matched = true;
            break;
        }
    }

    Ok(MatchOutcome {
        matched,
        diagnostics: diagnostic.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Identity;
    use crate::flags::{to_flags, ApplyTo};
    use crate::kind::SecurableObjectKind;
    use crate::rights::{file_system, registry, RightsMask};

    const FS: SecurableObjectKind = SecurableObjectKind::FileSystem;

    fn dir() -> SecurableObject {
        SecurableObject::new("C:\\X", FS, true)
    }

    fn file() -> SecurableObject {
        SecurableObject::new("C:\\X\\a.txt", FS, false)
    }

    fn fs(mask: RightsMask) -> Rights {
        Rights::new(FS, mask)
    }

    fn eng() -> Identity {
        Identity::new("G\\Eng")
    }

    #[test]
    fn test_superset_matches_non_strict() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::FULL_CONTROL))];
        let outcome = matches(&entries, &MatchCriteria::new(fs(file_system::READ)), &dir()).unwrap();
        assert!(outcome.matched);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_bit_fails_non_strict() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::READ))];
        let criteria = MatchCriteria::new(fs(file_system::READ | file_system::WRITE_DATA));
        assert!(!matches(&entries, &criteria, &dir()).unwrap().matched);
    }

    #[test]
    fn test_strict_requires_equality_with_synchronize() {
        let read_sync = fs(file_system::READ | file_system::SYNCHRONIZE);
        let entries = vec![AccessControlEntry::allow(eng(), read_sync)];

        let criteria = MatchCriteria::new(fs(file_system::READ)).strict(true);
        assert!(matches(&entries, &criteria, &dir()).unwrap().matched);

        // Extra rights beyond the request fail strict mode
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::FULL_CONTROL))];
        assert!(!matches(&entries, &criteria, &dir()).unwrap().matched);
    }

    #[test]
    fn test_strict_registry_has_no_forced_bits() {
        let reg = |m| Rights::new(SecurableObjectKind::Registry, m);
        let key = SecurableObject::new("hklm:\\Software\\X", SecurableObjectKind::Registry, true);
        let entries = vec![AccessControlEntry::allow(eng(), reg(registry::READ_KEY))];
        let criteria = MatchCriteria::new(reg(registry::READ_KEY)).strict(true);
        assert!(matches(&entries, &criteria, &key).unwrap().matched);
    }

    #[test]
    fn test_deny_entries_ignored_by_default() {
        let entries = vec![AccessControlEntry::deny(eng(), fs(file_system::FULL_CONTROL))];
        let criteria = MatchCriteria::new(fs(file_system::READ));
        assert!(!matches(&entries, &criteria, &dir()).unwrap().matched);

        let criteria = criteria.access_type(AccessType::Deny);
        assert!(matches(&entries, &criteria, &dir()).unwrap().matched);
    }

    #[test]
    fn test_inherited_selection() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::FULL_CONTROL)).inherited()];
        let criteria = MatchCriteria::new(fs(file_system::READ));
        assert!(!matches(&entries, &criteria, &dir()).unwrap().matched);

        let criteria = criteria.include_inherited(true);
        assert!(matches(&entries, &criteria, &dir()).unwrap().matched);
    }

    #[test]
    fn test_flags_compared_for_containers() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::FULL_CONTROL))
            .with_flags(to_flags(ApplyTo::ContainerOnly, false))];

        let same = MatchCriteria::new(fs(file_system::FULL_CONTROL))
            .strict(true)
            .with_scope(ApplyScope::new(ApplyTo::ContainerOnly, false));
        // FullControl already includes Synchronize
        assert!(matches(&entries, &same, &dir()).unwrap().matched);

        let different = MatchCriteria::new(fs(file_system::FULL_CONTROL))
            .strict(true)
            .with_scope(ApplyScope::new(ApplyTo::ContainerAndSubcontainers, false));
        assert!(!matches(&entries, &different, &dir()).unwrap().matched);
    }

    #[test]
    fn test_flags_skipped_for_leaves_with_warning() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::READ))];
        let criteria = MatchCriteria::new(fs(file_system::READ))
            .with_scope(ApplyScope::new(ApplyTo::LeavesOnly, true));

        let outcome = matches(&entries, &criteria, &file()).unwrap();
        assert!(outcome.matched);
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::LeafFlagMismatch {
                path: "C:\\X\\a.txt".to_string(),
                kind: FS,
            }]
        );
    }

    #[test]
    fn test_no_scope_ignores_flags() {
        let entries = vec![AccessControlEntry::allow(eng(), fs(file_system::READ))
            .with_flags(to_flags(ApplyTo::SubcontainersOnly, true))];
        let criteria = MatchCriteria::new(fs(file_system::READ));
        assert!(matches(&entries, &criteria, &dir()).unwrap().matched);
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let entries = vec![AccessControlEntry::allow(
            eng(),
            Rights::new(SecurableObjectKind::Registry, registry::FULL_CONTROL),
        )];
        let criteria = MatchCriteria::new(fs(file_system::READ));
        assert!(matches(&entries, &criteria, &dir()).is_err());
    }

    #[test]
    fn test_empty_entries() {
        let outcome = matches(&[], &MatchCriteria::new(fs(file_system::READ)), &dir()).unwrap();
        assert!(!outcome.matched);
    }
}
