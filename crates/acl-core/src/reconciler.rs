//! # Rule Reconciler
//!
//! Computes the entries to add and remove so that an object's entry
//! collection reaches the state a grant or revoke asks for.
//!
//! Planning is the same for every kind: the kind only flows through
//! [`Rights`] and [`SecurableObject`]. Applying a plan yields the full entry
//! set that the host writes back in one call.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::entry::{AccessControlEntry, AccessType, Identity};
use crate::error::{AclError, AclResult};
use crate::flags::{ApplyScope, ApplyTo, EntryFlags};
use crate::kind::SecurableObject;
use crate::matcher::{effective_flags, matches, MatchCriteria};
use crate::rights::Rights;

/// Scope used for container grants that don't name one.
pub const DEFAULT_CONTAINER_SCOPE: ApplyTo = ApplyTo::ContainerSubcontainersAndLeaves;

/// A desired grant for one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantRequest {
    /// Who to grant to.
    pub identity: Identity,
    /// What to grant.
    pub rights: Rights,
    /// How the entry is inherited; containers default to
    /// [`DEFAULT_CONTAINER_SCOPE`].
    pub scope: Option<ApplyScope>,
    /// Allow or deny.
    pub access_type: AccessType,
    /// Add the entry alongside the identity's existing ones instead of
    /// replacing them.
    pub append: bool,
    /// Also remove explicit entries for every other identity.
    pub clear: bool,
    /// Write even if the desired entry is already present.
    pub force: bool,
}

impl GrantRequest {
    /// Create an allow grant with default options.
    pub fn new(identity: Identity, rights: Rights) -> Self {
        Self {
            identity,
            rights,
            scope: None,
            access_type: AccessType::Allow,
            append: false,
            clear: false,
            force: false,
        }
    }

    /// Set the inheritance scope.
    pub fn with_scope(mut self, scope: Option<ApplyScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Set allow or deny.
    pub fn access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
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

    /// Skip the already-granted check.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Flags the new entry will carry on `object`, plus a leaf warning when
    /// the caller's scope had to be dropped.
    fn desired_flags(&self, object: &SecurableObject) -> (EntryFlags, Option<Diagnostic>) {
        let (flags, diagnostic) = effective_flags(object, self.scope.map(|s| s.flags()));
        let flags = match flags {
            Some(flags) => flags,
            None if object.is_leaf() => EntryFlags::NONE,
            None => ApplyScope::new(DEFAULT_CONTAINER_SCOPE, false).flags(),
        };
        (flags, diagnostic)
    }
}

/// Changes to make to one object's entry collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    /// Entries to add.
    pub to_add: Vec<AccessControlEntry>,
    /// Existing entries to remove.
    pub to_remove: Vec<AccessControlEntry>,
    /// Conditions noticed while planning.
    pub diagnostics: Vec<Diagnostic>,
}

impl Plan {
    /// Check if the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Produce the entry set that results from applying the plan.
    ///
    /// Each entry in `to_remove` removes one equal entry from `existing`.
    pub fn apply(&self, existing: &[AccessControlEntry]) -> Vec<AccessControlEntry> {
        let mut result = existing.to_vec();
        for entry in &self.to_remove {
            if let Some(pos) = result.iter().position(|e| e == entry) {
                result.remove(pos);
            }
        }
        result.extend(self.to_add.iter().cloned());
        result
    }

    /// Human-readable lines describing the change.
    pub fn describe(&self) -> Vec<String> {
        self.to_remove
            .iter()
            .map(|e| format!("remove {}", e))
            .chain(self.to_add.iter().map(|e| format!("add {}", e)))
            .collect()
    }
}

/// Plan a grant.
///
/// When an explicit entry with exactly the desired rights and flags already
/// exists, the plan leaves it alone and only carries the removals `clear`
/// asks for; with nothing to clear it is empty. `force` always rewrites.
///
/// # Errors
///
/// Returns `KindMismatch` if the requested rights don't belong to the
/// object's vocabulary or an existing entry's rights don't.
pub fn plan_grant(
    existing: &[AccessControlEntry],
    request: &GrantRequest,
    object: &SecurableObject,
) -> AclResult<Plan> {
    if request.rights.kind != object.kind {
        return Err(AclError::KindMismatch {
            left: object.kind,
            right: request.rights.kind,
        });
    }

    let (flags, diagnostic) = request.desired_flags(object);
    let mut plan = Plan {
        diagnostics: diagnostic.into_iter().collect(),
        ..Plan::default()
    };

    let own: Vec<AccessControlEntry> = existing
        .iter()
        .filter(|e| e.identity == request.identity)
        .cloned()
        .collect();

    let cleared: Vec<AccessControlEntry> = if request.clear {
        existing
            .iter()
            .filter(|e| e.is_explicit() && e.identity != request.identity)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    if !request.force {
        // Leaf objects never carry flags, so compare them only on containers.
        let criteria = MatchCriteria::new(request.rights)
            .strict(true)
            .access_type(request.access_type)
            .with_flags((!object.is_leaf()).then_some(flags));
        if matches(&own, &criteria, object)?.matched {
            debug!(
                path = %object.path,
                identity = %request.identity,
                rights = %request.rights,
                clear = cleared.len(),
                "Permission already granted"
            );
            plan.to_remove = cleared;
            return Ok(plan);
        }
    }

    if !request.append {
        plan.to_remove.extend(
            own.iter()
                .filter(|e| e.is_explicit() && e.access_type == request.access_type)
                .cloned(),
        );
    }
    plan.to_remove.extend(cleared);

    let rights = match request.access_type {
        AccessType::Allow => request.rights.with_forced(),
        AccessType::Deny => request.rights,
    };
    plan.to_add.push(AccessControlEntry {
        identity: request.identity.clone(),
        access_type: request.access_type,
        rights,
        flags,
        is_inherited: false,
    });

    debug!(
        path = %object.path,
        identity = %request.identity,
        add = plan.to_add.len(),
        remove = plan.to_remove.len(),
        "Planned grant"
    );
    Ok(plan)
}

/// Plan a revoke: remove every explicit entry for `identity`.
///
/// Inherited entries are left alone. An identity with no explicit entries
/// yields an empty plan.
pub fn plan_revoke(existing: &[AccessControlEntry], identity: &Identity) -> Plan {
    let to_remove: Vec<AccessControlEntry> = existing
        .iter()
        .filter(|e| e.is_explicit() && &e.identity == identity)
        .cloned()
        .collect();

    debug!(identity = %identity, remove = to_remove.len(), "Planned revoke");
    Plan {
        to_remove,
        ..Plan::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::to_flags;
    use crate::kind::SecurableObjectKind;
    use crate::rights::{file_system, private_key, RightsMask};

    const FS: SecurableObjectKind = SecurableObjectKind::FileSystem;

    fn dir() -> SecurableObject {
        SecurableObject::new("C:\\X", FS, true)
    }

    fn fs(mask: RightsMask) -> Rights {
        Rights::new(FS, mask)
    }

    fn eng() -> Identity {
        Identity::new("G\\Eng")
    }

    fn ops() -> Identity {
        Identity::new("G\\Ops")
    }

    #[test]
    fn test_grant_adds_entry_with_default_scope() {
        let request = GrantRequest::new(eng(), fs(file_system::READ));
        let plan = plan_grant(&[], &request, &dir()).unwrap();

        assert_eq!(plan.to_add.len(), 1);
        assert!(plan.to_remove.is_empty());
        assert_eq!(
            plan.to_add[0].flags,
            to_flags(ApplyTo::ContainerSubcontainersAndLeaves, false)
        );
    }

    #[test]
    fn test_grant_is_idempotent() {
        let scope = Some(ApplyScope::new(ApplyTo::ContainerOnly, false));
        let request = GrantRequest::new(eng(), fs(file_system::FULL_CONTROL)).with_scope(scope);

        let first = plan_grant(&[], &request, &dir()).unwrap();
        let entries = first.apply(&[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rights.mask, file_system::FULL_CONTROL);

        let second = plan_grant(&entries, &request, &dir()).unwrap();
        assert!(second.is_empty());
        assert_eq!(second.apply(&entries), entries);
    }

    #[test]
    fn test_grant_replaces_weaker_entry() {
        let existing = vec![
            AccessControlEntry::allow(eng(), fs(file_system::READ)),
            AccessControlEntry::allow(ops(), fs(file_system::READ)),
        ];
        let request = GrantRequest::new(eng(), fs(file_system::MODIFY))
            .with_scope(Some(ApplyScope::new(ApplyTo::ContainerOnly, false)));

        let plan = plan_grant(&existing, &request, &dir()).unwrap();
        assert_eq!(plan.to_remove, vec![existing[0].clone()]);

        let result = plan.apply(&existing);
        assert_eq!(result.len(), 2);
        assert!(result.iter().any(|e| e.identity == ops()));
        assert!(result
            .iter()
            .any(|e| e.identity == eng() && e.rights.mask.contains(file_system::MODIFY)));
    }

    #[test]
    fn test_grant_append_keeps_existing() {
        let existing = vec![AccessControlEntry::allow(eng(), fs(file_system::READ))];
        let request = GrantRequest::new(eng(), fs(file_system::WRITE)).append(true);
        let plan = plan_grant(&existing, &request, &dir()).unwrap();
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.apply(&existing).len(), 2);
    }

    #[test]
    fn test_grant_clear_removes_other_explicit_entries() {
        let inherited = AccessControlEntry::allow(ops(), fs(file_system::READ)).inherited();
        let existing = vec![
            AccessControlEntry::allow(ops(), fs(file_system::FULL_CONTROL)),
            inherited.clone(),
        ];
        let request = GrantRequest::new(eng(), fs(file_system::READ)).clear(true);
        let result = plan_grant(&existing, &request, &dir()).unwrap().apply(&existing);

        assert_eq!(result.len(), 2);
        assert!(result.contains(&inherited));
        assert!(result.iter().any(|e| e.identity == eng()));
    }

    #[test]
    fn test_grant_clear_when_already_granted() {
        let read = fs(file_system::READ | file_system::SYNCHRONIZE);
        let granted = AccessControlEntry::allow(eng(), read)
            .with_flags(to_flags(ApplyTo::ContainerSubcontainersAndLeaves, false));
        let other = AccessControlEntry::allow(ops(), fs(file_system::READ));
        let existing = vec![granted.clone(), other.clone()];

        let request = GrantRequest::new(eng(), fs(file_system::READ)).clear(true);
        let plan = plan_grant(&existing, &request, &dir()).unwrap();
        assert_eq!(plan.to_remove, vec![other]);
        assert!(plan.to_add.is_empty());
        assert_eq!(plan.apply(&existing), vec![granted]);

        // Nothing left to clear: the second run is a no-op
        let existing = plan.apply(&existing);
        assert!(plan_grant(&existing, &request, &dir()).unwrap().is_empty());
    }

    #[test]
    fn test_grant_deny_leaves_allow_entries() {
        let existing = vec![AccessControlEntry::allow(eng(), fs(file_system::READ))];
        let request = GrantRequest::new(eng(), fs(file_system::WRITE)).access_type(AccessType::Deny);
        let plan = plan_grant(&existing, &request, &dir()).unwrap();
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.to_add[0].access_type, AccessType::Deny);
    }

    #[test]
    fn test_grant_force_rewrites() {
        let request = GrantRequest::new(eng(), fs(file_system::READ));
        let entries = plan_grant(&[], &request, &dir()).unwrap().apply(&[]);

        let plan = plan_grant(&entries, &request.clone().force(true), &dir()).unwrap();
        assert!(!plan.is_empty());
        assert_eq!(plan.apply(&entries), entries);
    }

    #[test]
    fn test_grant_on_leaf_drops_scope_and_warns() {
        let file = SecurableObject::new("C:\\X\\a.txt", FS, false);
        let request = GrantRequest::new(eng(), fs(file_system::READ))
            .with_scope(Some(ApplyScope::new(ApplyTo::LeavesOnly, false)));
        let plan = plan_grant(&[], &request, &file).unwrap();

        assert_eq!(plan.to_add[0].flags, EntryFlags::NONE);
        assert!(matches!(
            plan.diagnostics.as_slice(),
            [Diagnostic::LeafFlagMismatch { .. }]
        ));

        // Second grant sees the flagless entry as satisfying the request
        let entries = plan.apply(&[]);
        assert_eq!(entries[0].rights.mask, file_system::READ | file_system::SYNCHRONIZE);
        assert!(plan_grant(&entries, &request, &file).unwrap().is_empty());
    }

    #[test]
    fn test_grant_private_key_uses_same_planning() {
        let key = SecurableObject::new("cert:\\My\\ABC", SecurableObjectKind::PrivateKey, false);
        let rights = Rights::new(SecurableObjectKind::PrivateKey, private_key::GENERIC_READ);
        let request = GrantRequest::new(eng(), rights);

        let entries = plan_grant(&[], &request, &key).unwrap().apply(&[]);
        assert_eq!(entries[0].flags, EntryFlags::NONE);
        assert!(plan_grant(&entries, &request, &key).unwrap().is_empty());
    }

    #[test]
    fn test_grant_rejects_foreign_rights() {
        let key = SecurableObject::new("cert:\\My\\ABC", SecurableObjectKind::PrivateKey, false);
        let request = GrantRequest::new(eng(), fs(file_system::READ));
        assert!(matches!(
            plan_grant(&[], &request, &key),
            Err(AclError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_revoke_removes_only_explicit_entries() {
        let inherited = AccessControlEntry::allow(eng(), fs(file_system::READ)).inherited();
        let existing = vec![
            AccessControlEntry::allow(eng(), fs(file_system::FULL_CONTROL)),
            AccessControlEntry::deny(eng(), fs(file_system::DELETE)),
            AccessControlEntry::allow(ops(), fs(file_system::READ)),
            inherited.clone(),
        ];
        let plan = plan_revoke(&existing, &eng());
        assert_eq!(plan.to_remove.len(), 2);

        let result = plan.apply(&existing);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&inherited));
    }

    #[test]
    fn test_revoke_nothing_is_noop() {
        let existing = vec![AccessControlEntry::allow(ops(), fs(file_system::READ))];
        let plan = plan_revoke(&existing, &eng());
        assert!(plan.is_empty());
        assert!(plan.describe().is_empty());
    }
}
