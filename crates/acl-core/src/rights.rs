//! # Rights
//!
//! Per-kind rights vocabularies and the bitmask they name.
//!
//! Every kind has its own enumeration of right names, with values taken
//! from the Windows access mask layout. A [`RightsMask`] is meaningless
//! without its kind, so most code works with [`Rights`], which carries
//! both and refuses to mix vocabularies.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AclError, AclResult};
use crate::kind::SecurableObjectKind;

bitflags! {
    /// An access mask.
    ///
    /// Only the standard and generic bits mean the same thing for every
    /// kind; the low sixteen bits are object-specific and are named in the
    /// per-kind modules below.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RightsMask: u32 {
        /// Delete the object.
        const DELETE       = 0x0001_0000;
        /// Read the security descriptor.
        const READ_CONTROL = 0x0002_0000;
        /// Change the discretionary ACL.
        const WRITE_DAC    = 0x0004_0000;
        /// Change the owner.
        const WRITE_OWNER  = 0x0008_0000;
        /// Wait on the object.
        const SYNCHRONIZE  = 0x0010_0000;
        /// Generic all access.
        const GENERIC_ALL     = 0x1000_0000;
        /// Generic execute access.
        const GENERIC_EXECUTE = 0x2000_0000;
        /// Generic write access.
        const GENERIC_WRITE   = 0x4000_0000;
        /// Generic read access.
        const GENERIC_READ    = 0x8000_0000;

        // Object-specific bits are defined outside this type.
        const _ = !0;
    }
}

impl RightsMask {
    /// The empty mask.
    pub const EMPTY: RightsMask = RightsMask::empty();
}

impl Default for RightsMask {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// File and directory rights.
pub mod file_system {
    use super::RightsMask;

    pub const READ_DATA: RightsMask = RightsMask::from_bits_retain(0x0000_0001);
    pub const LIST_DIRECTORY: RightsMask = READ_DATA;
    pub const WRITE_DATA: RightsMask = RightsMask::from_bits_retain(0x0000_0002);
    pub const CREATE_FILES: RightsMask = WRITE_DATA;
    pub const APPEND_DATA: RightsMask = RightsMask::from_bits_retain(0x0000_0004);
    pub const CREATE_DIRECTORIES: RightsMask = APPEND_DATA;
    pub const READ_EXTENDED_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0008);
    pub const WRITE_EXTENDED_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0010);
    pub const EXECUTE_FILE: RightsMask = RightsMask::from_bits_retain(0x0000_0020);
    pub const TRAVERSE: RightsMask = EXECUTE_FILE;
    pub const DELETE_SUBDIRECTORIES_AND_FILES: RightsMask = RightsMask::from_bits_retain(0x0000_0040);
    pub const READ_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0080);
    pub const WRITE_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0100);
    pub const DELETE: RightsMask = RightsMask::DELETE;
    pub const READ_PERMISSIONS: RightsMask = RightsMask::READ_CONTROL;
    pub const CHANGE_PERMISSIONS: RightsMask = RightsMask::WRITE_DAC;
    pub const TAKE_OWNERSHIP: RightsMask = RightsMask::WRITE_OWNER;
    pub const SYNCHRONIZE: RightsMask = RightsMask::SYNCHRONIZE;

    pub const READ: RightsMask = RightsMask::from_bits_retain(0x0002_0089);
    pub const WRITE: RightsMask = RightsMask::from_bits_retain(0x0000_0116);
    pub const READ_AND_EXECUTE: RightsMask = RightsMask::from_bits_retain(0x0002_00A9);
    pub const MODIFY: RightsMask = RightsMask::from_bits_retain(0x0003_01BF);
    pub const FULL_CONTROL: RightsMask = RightsMask::from_bits_retain(0x001F_01FF);
}

/// Registry key rights.
pub mod registry {
    use super::RightsMask;

    pub const QUERY_VALUES: RightsMask = RightsMask::from_bits_retain(0x0000_0001);
    pub const SET_VALUE: RightsMask = RightsMask::from_bits_retain(0x0000_0002);
    pub const CREATE_SUB_KEY: RightsMask = RightsMask::from_bits_retain(0x0000_0004);
    pub const ENUMERATE_SUB_KEYS: RightsMask = RightsMask::from_bits_retain(0x0000_0008);
    pub const NOTIFY: RightsMask = RightsMask::from_bits_retain(0x0000_0010);
    pub const CREATE_LINK: RightsMask = RightsMask::from_bits_retain(0x0000_0020);
    pub const DELETE: RightsMask = RightsMask::DELETE;
    pub const READ_PERMISSIONS: RightsMask = RightsMask::READ_CONTROL;
    pub const CHANGE_PERMISSIONS: RightsMask = RightsMask::WRITE_DAC;
    pub const TAKE_OWNERSHIP: RightsMask = RightsMask::WRITE_OWNER;

    pub const READ_KEY: RightsMask = RightsMask::from_bits_retain(0x0002_0019);
    pub const EXECUTE_KEY: RightsMask = READ_KEY;
    pub const WRITE_KEY: RightsMask = RightsMask::from_bits_retain(0x0002_0006);
    pub const FULL_CONTROL: RightsMask = RightsMask::from_bits_retain(0x000F_003F);
}

/// Private-key container rights.
pub mod private_key {
    use super::RightsMask;

    pub const READ_DATA: RightsMask = RightsMask::from_bits_retain(0x0000_0001);
    pub const WRITE_DATA: RightsMask = RightsMask::from_bits_retain(0x0000_0002);
    pub const READ_EXTENDED_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0008);
    pub const WRITE_EXTENDED_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0010);
    pub const READ_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0080);
    pub const WRITE_ATTRIBUTES: RightsMask = RightsMask::from_bits_retain(0x0000_0100);
    pub const DELETE: RightsMask = RightsMask::DELETE;
    pub const READ_PERMISSIONS: RightsMask = RightsMask::READ_CONTROL;
    pub const CHANGE_PERMISSIONS: RightsMask = RightsMask::WRITE_DAC;
    pub const TAKE_OWNERSHIP: RightsMask = RightsMask::WRITE_OWNER;
    pub const SYNCHRONIZE: RightsMask = RightsMask::SYNCHRONIZE;
    pub const FULL_CONTROL: RightsMask = RightsMask::from_bits_retain(0x001F_019B);
    pub const GENERIC_ALL: RightsMask = RightsMask::GENERIC_ALL;
    pub const GENERIC_EXECUTE: RightsMask = RightsMask::GENERIC_EXECUTE;
    pub const GENERIC_WRITE: RightsMask = RightsMask::GENERIC_WRITE;
    pub const GENERIC_READ: RightsMask = RightsMask::GENERIC_READ;
}

/// Rights the file system sets on every entry whether asked or not.
///
/// Strict comparisons against file-system entries add these to the
/// requested mask before testing for equality.
pub const FILE_SYSTEM_FORCED_RIGHTS: RightsMask = file_system::SYNCHRONIZE;

/// A named right in a kind's vocabulary.
#[derive(Debug, Clone, Copy)]
struct NamedRight {
    name: &'static str,
    mask: RightsMask,
    /// Aliases parse but are never used when rendering.
    alias: bool,
}

const fn named(name: &'static str, mask: RightsMask) -> NamedRight {
    NamedRight {
        name,
        mask,
        alias: false,
    }
}

const fn alias(name: &'static str, mask: RightsMask) -> NamedRight {
    NamedRight {
        name,
        mask,
        alias: true,
    }
}

// Composites come first so rendering prefers the widest name.
const FILE_SYSTEM_VOCABULARY: &[NamedRight] = &[
    named("FullControl", file_system::FULL_CONTROL),
    named("Modify", file_system::MODIFY),
    named("ReadAndExecute", file_system::READ_AND_EXECUTE),
    named("Read", file_system::READ),
    named("Write", file_system::WRITE),
    named("ReadData", file_system::READ_DATA),
    alias("ListDirectory", file_system::LIST_DIRECTORY),
    named("WriteData", file_system::WRITE_DATA),
    alias("CreateFiles", file_system::CREATE_FILES),
    named("AppendData", file_system::APPEND_DATA),
    alias("CreateDirectories", file_system::CREATE_DIRECTORIES),
    named("ReadExtendedAttributes", file_system::READ_EXTENDED_ATTRIBUTES),
    named("WriteExtendedAttributes", file_system::WRITE_EXTENDED_ATTRIBUTES),
    named("ExecuteFile", file_system::EXECUTE_FILE),
    alias("Traverse", file_system::TRAVERSE),
    named("DeleteSubdirectoriesAndFiles", file_system::DELETE_SUBDIRECTORIES_AND_FILES),
    named("ReadAttributes", file_system::READ_ATTRIBUTES),
    named("WriteAttributes", file_system::WRITE_ATTRIBUTES),
    named("Delete", file_system::DELETE),
    named("ReadPermissions", file_system::READ_PERMISSIONS),
    named("ChangePermissions", file_system::CHANGE_PERMISSIONS),
    named("TakeOwnership", file_system::TAKE_OWNERSHIP),
    named("Synchronize", file_system::SYNCHRONIZE),
];

const REGISTRY_VOCABULARY: &[NamedRight] = &[
    named("FullControl", registry::FULL_CONTROL),
    named("ReadKey", registry::READ_KEY),
    alias("ExecuteKey", registry::EXECUTE_KEY),
    named("WriteKey", registry::WRITE_KEY),
    named("QueryValues", registry::QUERY_VALUES),
    named("SetValue", registry::SET_VALUE),
    named("CreateSubKey", registry::CREATE_SUB_KEY),
    named("EnumerateSubKeys", registry::ENUMERATE_SUB_KEYS),
    named("Notify", registry::NOTIFY),
    named("CreateLink", registry::CREATE_LINK),
    named("Delete", registry::DELETE),
    named("ReadPermissions", registry::READ_PERMISSIONS),
    named("ChangePermissions", registry::CHANGE_PERMISSIONS),
    named("TakeOwnership", registry::TAKE_OWNERSHIP),
];

const PRIVATE_KEY_VOCABULARY: &[NamedRight] = &[
    named("FullControl", private_key::FULL_CONTROL),
    named("GenericAll", private_key::GENERIC_ALL),
    named("GenericRead", private_key::GENERIC_READ),
    named("GenericWrite", private_key::GENERIC_WRITE),
    named("GenericExecute", private_key::GENERIC_EXECUTE),
    named("ReadData", private_key::READ_DATA),
    named("WriteData", private_key::WRITE_DATA),
    named("ReadExtendedAttributes", private_key::READ_EXTENDED_ATTRIBUTES),
    named("WriteExtendedAttributes", private_key::WRITE_EXTENDED_ATTRIBUTES),
    named("ReadAttributes", private_key::READ_ATTRIBUTES),
    named("WriteAttributes", private_key::WRITE_ATTRIBUTES),
    named("Delete", private_key::DELETE),
    named("ReadPermissions", private_key::READ_PERMISSIONS),
    named("ChangePermissions", private_key::CHANGE_PERMISSIONS),
    named("TakeOwnership", private_key::TAKE_OWNERSHIP),
    named("Synchronize", private_key::SYNCHRONIZE),
];

fn vocabulary(kind: SecurableObjectKind) -> &'static [NamedRight] {
    match kind {
        SecurableObjectKind::FileSystem => FILE_SYSTEM_VOCABULARY,
        SecurableObjectKind::Registry => REGISTRY_VOCABULARY,
        SecurableObjectKind::PrivateKey => PRIVATE_KEY_VOCABULARY,
    }
}

/// Rights the platform forces onto every entry of `kind`.
///
/// Only the file system is known to do this; the other kinds return an
/// empty mask.
pub fn forced_rights(kind: SecurableObjectKind) -> RightsMask {
    match kind {
        SecurableObjectKind::FileSystem => FILE_SYSTEM_FORCED_RIGHTS,
        SecurableObjectKind::Registry | SecurableObjectKind::PrivateKey => RightsMask::EMPTY,
    }
}

/// A rights mask tagged with the vocabulary it belongs to.
///
/// # Example
///
/// ```
/// use acl_core::kind::SecurableObjectKind;
/// use acl_core::rights::Rights;
///
/// let rights = Rights::parse(SecurableObjectKind::FileSystem, &["Read", "Write"]).unwrap();
/// let read = Rights::parse(SecurableObjectKind::FileSystem, &["read"]).unwrap();
/// assert!(rights.contains(&read).unwrap());
/// assert_eq!(rights.names(), vec!["Read", "Write"]);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rights {
    /// Vocabulary of the mask.
    pub kind: SecurableObjectKind,
    /// The bits.
    pub mask: RightsMask,
}

impl Rights {
    /// Create rights from a raw mask.
    pub fn new(kind: SecurableObjectKind, mask: RightsMask) -> Self {
        Self { kind, mask }
    }

    /// Parse one or more right names into a single mask.
    ///
    /// Names are case-insensitive. Each item may itself be a
    /// comma-separated list, so `["Read, Write"]` and `["Read", "Write"]`
    /// are equivalent.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRight` for a name outside the kind's vocabulary and
    /// `EmptyRights` when no names are given.
    pub fn parse<S: AsRef<str>>(kind: SecurableObjectKind, names: &[S]) -> AclResult<Self> {
        let mut mask = RightsMask::EMPTY;
        let mut seen = false;

        for item in names {
            for name in item.as_ref().split(',').map(str::trim).filter(|n| !n.is_empty()) {
                mask |= Self::lookup(kind, name)?;
                seen = true;
            }
        }

        if !seen {
            return Err(AclError::EmptyRights(kind));
        }
        Ok(Self { kind, mask })
    }

    fn lookup(kind: SecurableObjectKind, name: &str) -> AclResult<RightsMask> {
        vocabulary(kind)
            .iter()
            .find(|right| right.name.eq_ignore_ascii_case(name))
            .map(|right| right.mask)
            .ok_or_else(|| AclError::UnknownRight {
                kind,
                name: name.to_string(),
            })
    }

    fn check_kind(&self, other: &Rights) -> AclResult<()> {
        if self.kind != other.kind {
            return Err(AclError::KindMismatch {
                left: self.kind,
                right: other.kind,
            });
        }
        Ok(())
    }

    /// Union with rights of the same kind.
    pub fn union(&self, other: &Rights) -> AclResult<Rights> {
        self.check_kind(other)?;
        Ok(Rights::new(self.kind, self.mask | other.mask))
    }

    /// Check that every right in `other` is granted by `self`.
    pub fn contains(&self, other: &Rights) -> AclResult<bool> {
        self.check_kind(other)?;
        Ok(self.mask.contains(other.mask))
    }

    /// These rights plus whatever the platform forces for the kind.
    pub fn with_forced(&self) -> Rights {
        Rights::new(self.kind, self.mask | forced_rights(self.kind))
    }

    /// Render the mask as the shortest list of vocabulary names.
    ///
    /// Bits no name covers are appended as a hex literal.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut covered = RightsMask::EMPTY;

        for right in vocabulary(self.kind).iter().filter(|r| !r.alias) {
            if self.mask.contains(right.mask) && !covered.contains(right.mask) {
                names.push(right.name.to_string());
                covered |= right.mask;
            }
        }

        let rest = self.mask.difference(covered);
        if !rest.is_empty() {
            names.push(format!("{:#x}", rest.bits()));
        }
        names
    }
}

impl fmt::Display for Rights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: SecurableObjectKind = SecurableObjectKind::FileSystem;

    #[test]
    fn test_mask_operations() {
        let read = file_system::READ;
        let full = file_system::FULL_CONTROL;
        assert!(full.contains(read));
        assert!(!read.contains(full));
        assert!(read.intersects(full));
        assert_eq!((read | file_system::SYNCHRONIZE).bits(), 0x0012_0089);
        assert_eq!((full & read), read);
        assert!(RightsMask::EMPTY.is_empty());
        assert_eq!(full.difference(full), RightsMask::EMPTY);
    }

    #[test]
    fn test_parse_case_insensitive_and_lists() {
        let a = Rights::parse(FS, &["read", "WRITE"]).unwrap();
        let b = Rights::parse(FS, &["Read, Write"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mask, file_system::READ | file_system::WRITE);
    }

    #[test]
    fn test_parse_alias() {
        let rights = Rights::parse(FS, &["ListDirectory"]).unwrap();
        assert_eq!(rights.mask, file_system::READ_DATA);

        let rights = Rights::parse(SecurableObjectKind::Registry, &["ExecuteKey"]).unwrap();
        assert_eq!(rights.mask, registry::READ_KEY);
    }

    #[test]
    fn test_parse_unknown_right_is_per_kind() {
        // ReadKey exists only in the registry vocabulary
        let err = Rights::parse(FS, &["ReadKey"]).unwrap_err();
        assert_eq!(
            err,
            AclError::UnknownRight {
                kind: FS,
                name: "ReadKey".to_string()
            }
        );
        assert!(Rights::parse(SecurableObjectKind::Registry, &["ReadKey"]).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(Rights::parse(FS, &empty).unwrap_err(), AclError::EmptyRights(FS));
        assert_eq!(Rights::parse(FS, &[" , "]).unwrap_err(), AclError::EmptyRights(FS));
    }

    #[test]
    fn test_kind_mismatch() {
        let fs = Rights::new(FS, file_system::READ);
        let reg = Rights::new(SecurableObjectKind::Registry, registry::READ_KEY);
        assert!(matches!(fs.contains(&reg), Err(AclError::KindMismatch { .. })));
        assert!(matches!(fs.union(&reg), Err(AclError::KindMismatch { .. })));
    }

    #[test]
    fn test_names_prefer_composites() {
        assert_eq!(Rights::new(FS, file_system::FULL_CONTROL).names(), vec!["FullControl"]);
        assert_eq!(
            Rights::new(FS, file_system::READ | file_system::SYNCHRONIZE).names(),
            vec!["Read", "Synchronize"]
        );
        assert_eq!(
            Rights::new(FS, file_system::MODIFY | file_system::SYNCHRONIZE).names(),
            vec!["Modify", "Synchronize"]
        );
    }

    #[test]
    fn test_names_unnamed_bits() {
        let rights = Rights::new(FS, file_system::DELETE | RightsMask::from_bits_retain(0x0100_0000));
        assert_eq!(rights.names(), vec!["Delete", "0x1000000"]);
    }

    #[test]
    fn test_object_specific_bits_are_kept() {
        let modify = file_system::MODIFY;
        assert_eq!(modify.bits(), 0x0003_01BF);
        assert_eq!(modify.difference(file_system::DELETE).bits(), 0x0002_01BF);
        assert_eq!(RightsMask::from_bits_truncate(0x0000_0001).bits(), 0x0000_0001);

        let json = serde_json::to_string(&modify).unwrap();
        let back: RightsMask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, modify);

        let rights = Rights::new(FS, modify | file_system::SYNCHRONIZE);
        let back: Rights = serde_json::from_str(&serde_json::to_string(&rights).unwrap()).unwrap();
        assert_eq!(back, rights);
    }

    #[test]
    fn test_forced_rights_only_for_file_system() {
        assert_eq!(forced_rights(FS), file_system::SYNCHRONIZE);
        assert!(forced_rights(SecurableObjectKind::Registry).is_empty());
        assert!(forced_rights(SecurableObjectKind::PrivateKey).is_empty());

        let rights = Rights::new(FS, file_system::READ).with_forced();
        assert_eq!(rights.mask, file_system::READ | file_system::SYNCHRONIZE);
    }

    #[test]
    fn test_display() {
        let rights = Rights::parse(SecurableObjectKind::PrivateKey, &["GenericRead"]).unwrap();
        assert_eq!(rights.to_string(), "GenericRead");
    }
}
