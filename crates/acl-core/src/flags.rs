//! # Inheritance Flags
//!
//! Translates the human-facing `ApplyTo` scopes into the platform's
//! inheritance and propagation flag pair, and back.
//!
//! ```text
//! ApplyTo                          Children-only  Inheritance       Propagation
//! ContainerOnly                    any            none              none
//! ContainerSubcontainersAndLeaves  no / yes       container+object  none / no-propagate
//! ContainerAndSubcontainers        no / yes       container         none / no-propagate
//! ContainerAndLeaves               no / yes       object            none / no-propagate
//! SubcontainersAndLeavesOnly       no / yes       container+object  inherit-only (+ no-propagate)
//! SubcontainersOnly                no / yes       container         inherit-only (+ no-propagate)
//! LeavesOnly                       no / yes       object            inherit-only (+ no-propagate)
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AclError, AclResult};

bitflags! {
    /// Which children inherit an entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InheritanceFlags: u8 {
        /// Subcontainers inherit.
        const CONTAINER_INHERIT = 0x1;
        /// Leaves inherit.
        const OBJECT_INHERIT    = 0x2;
    }
}

impl InheritanceFlags {
    pub const NONE: InheritanceFlags = InheritanceFlags::empty();
}

impl Default for InheritanceFlags {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for InheritanceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            0 => f.write_str("None"),
            1 => f.write_str("ContainerInherit"),
            2 => f.write_str("ObjectInherit"),
            _ => f.write_str("ContainerInherit, ObjectInherit"),
        }
    }
}

bitflags! {
    /// How an inherited entry propagates below the first generation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PropagationFlags: u8 {
        /// Only direct children inherit.
        const NO_PROPAGATE_INHERIT = 0x1;
        /// The entry does not apply to the object itself.
        const INHERIT_ONLY         = 0x2;
    }
}

impl PropagationFlags {
    pub const NONE: PropagationFlags = PropagationFlags::empty();
}

impl Default for PropagationFlags {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for PropagationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            0 => f.write_str("None"),
            1 => f.write_str("NoPropagateInherit"),
            2 => f.write_str("InheritOnly"),
            _ => f.write_str("NoPropagateInherit, InheritOnly"),
        }
    }
}

/// An inheritance/propagation flag pair as stored on an entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntryFlags {
    /// Which children inherit.
    pub inheritance: InheritanceFlags,
    /// How inheritance propagates.
    pub propagation: PropagationFlags,
}

impl EntryFlags {
    /// No inheritance: the entry applies to the object only.
    pub const NONE: EntryFlags = EntryFlags {
        inheritance: InheritanceFlags::NONE,
        propagation: PropagationFlags::NONE,
    };

    /// Create a flag pair.
    pub const fn new(inheritance: InheritanceFlags, propagation: PropagationFlags) -> Self {
        Self {
            inheritance,
            propagation,
        }
    }
}

/// Which combination of a container, its subcontainers, and its leaves an
/// entry affects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ApplyTo {
    /// The container itself only.
    ContainerOnly,
    /// The container, its subcontainers, and its leaves.
    ContainerSubcontainersAndLeaves,
    /// The container and its subcontainers.
    ContainerAndSubcontainers,
    /// The container and its leaves.
    ContainerAndLeaves,
    /// Subcontainers and leaves, not the container.
    SubcontainersAndLeavesOnly,
    /// Subcontainers, not the container.
    SubcontainersOnly,
    /// Leaves, not the container.
    LeavesOnly,
}

impl ApplyTo {
    /// Get the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyTo::ContainerOnly => "ContainerOnly",
            ApplyTo::ContainerSubcontainersAndLeaves => "ContainerSubcontainersAndLeaves",
            ApplyTo::ContainerAndSubcontainers => "ContainerAndSubcontainers",
            ApplyTo::ContainerAndLeaves => "ContainerAndLeaves",
            ApplyTo::SubcontainersAndLeavesOnly => "SubcontainersAndLeavesOnly",
            ApplyTo::SubcontainersOnly => "SubcontainersOnly",
            ApplyTo::LeavesOnly => "LeavesOnly",
        }
    }

    /// Parse a scope name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `UnknownApplyTo` for anything outside the seven scopes.
    pub fn parse(s: &str) -> AclResult<Self> {
        Self::all()
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AclError::UnknownApplyTo(s.to_string()))
    }

    /// Get all scopes.
    pub fn all() -> Vec<Self> {
        vec![
            ApplyTo::ContainerOnly,
            ApplyTo::ContainerSubcontainersAndLeaves,
            ApplyTo::ContainerAndSubcontainers,
            ApplyTo::ContainerAndLeaves,
            ApplyTo::SubcontainersAndLeavesOnly,
            ApplyTo::SubcontainersOnly,
            ApplyTo::LeavesOnly,
        ]
    }

    /// Check if the container itself is excluded.
    pub fn is_inherit_only(&self) -> bool {
        matches!(
            self,
            ApplyTo::SubcontainersAndLeavesOnly | ApplyTo::SubcontainersOnly | ApplyTo::LeavesOnly
        )
    }

    fn inheritance(&self) -> InheritanceFlags {
        match self {
            ApplyTo::ContainerOnly => InheritanceFlags::NONE,
            ApplyTo::ContainerSubcontainersAndLeaves | ApplyTo::SubcontainersAndLeavesOnly => {
                InheritanceFlags::CONTAINER_INHERIT | InheritanceFlags::OBJECT_INHERIT
            }
            ApplyTo::ContainerAndSubcontainers | ApplyTo::SubcontainersOnly => {
                InheritanceFlags::CONTAINER_INHERIT
            }
            ApplyTo::ContainerAndLeaves | ApplyTo::LeavesOnly => InheritanceFlags::OBJECT_INHERIT,
        }
    }
}

impl fmt::Display for ApplyTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `ApplyTo` scope with its children-only switch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ApplyScope {
    /// The scope.
    pub apply_to: ApplyTo,
    /// Limit inheritance to direct children.
    pub only_apply_to_children: bool,
}

impl ApplyScope {
    /// Create a scope.
    pub fn new(apply_to: ApplyTo, only_apply_to_children: bool) -> Self {
        Self {
            apply_to,
            only_apply_to_children,
        }
    }

    /// Translate to the platform flag pair.
    pub fn flags(&self) -> EntryFlags {
        to_flags(self.apply_to, self.only_apply_to_children)
    }
}

/// Translate a scope into its inheritance/propagation flags.
///
/// # Example
///
/// ```
/// use acl_core::flags::{to_flags, ApplyTo, InheritanceFlags, PropagationFlags};
///
/// let flags = to_flags(ApplyTo::LeavesOnly, true);
/// assert_eq!(flags.inheritance, InheritanceFlags::OBJECT_INHERIT);
/// assert_eq!(
///     flags.propagation,
///     PropagationFlags::NO_PROPAGATE_INHERIT | PropagationFlags::INHERIT_ONLY
/// );
/// ```
pub fn to_flags(apply_to: ApplyTo, only_apply_to_children: bool) -> EntryFlags {
    let inheritance = apply_to.inheritance();

    // Without inheritance there is nothing to propagate, children-only or not.
    if inheritance.is_empty() {
        return EntryFlags::NONE;
    }

    let mut propagation = PropagationFlags::NONE;
    if only_apply_to_children {
        propagation = propagation | PropagationFlags::NO_PROPAGATE_INHERIT;
    }
    if apply_to.is_inherit_only() {
        propagation = propagation | PropagationFlags::INHERIT_ONLY;
    }

    EntryFlags::new(inheritance, propagation)
}

/// Translate a flag pair back into a scope.
///
/// Returns `None` when no row of the table produces the pair. A pair of
/// `(none, none)` reads back as `ContainerOnly` without the children-only
/// switch, since both rows share it.
pub fn to_apply_to(flags: EntryFlags) -> Option<ApplyScope> {
    let EntryFlags {
        inheritance,
        propagation,
    } = flags;

    if inheritance.is_empty() {
        return propagation
            .is_empty()
            .then(|| ApplyScope::new(ApplyTo::ContainerOnly, false));
    }

    let inherit_only = propagation.contains(PropagationFlags::INHERIT_ONLY);
    let only_children = propagation.contains(PropagationFlags::NO_PROPAGATE_INHERIT);
    let container = inheritance.contains(InheritanceFlags::CONTAINER_INHERIT);
    let object = inheritance.contains(InheritanceFlags::OBJECT_INHERIT);

    let apply_to = match (container, object, inherit_only) {
        (true, true, false) => ApplyTo::ContainerSubcontainersAndLeaves,
        (true, false, false) => ApplyTo::ContainerAndSubcontainers,
        (false, true, false) => ApplyTo::ContainerAndLeaves,
        (true, true, true) => ApplyTo::SubcontainersAndLeavesOnly,
        (true, false, true) => ApplyTo::SubcontainersOnly,
        (false, true, true) => ApplyTo::LeavesOnly,
        (false, false, _) => return None,
    };

    Some(ApplyScope::new(apply_to, only_children))
}
