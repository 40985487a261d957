//! Permission checking utilities for the VFS layer.

use warden_abi::Errno;

use crate::core::{Credentials, FileMode, NodeType};

/// Requested access to a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermMask {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl PermMask {
    /// Read access only.
    pub const READ: Self = Self {
        read: true,
        write: false,
        execute: false,
    };

    /// Write access only.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
        execute: false,
    };

    /// Execute (directory traversal) only.
    pub const EXECUTE: Self = Self {
        read: false,
        write: false,
        execute: true,
    };

    /// As `rwx` bits (`0o4`, `0o2`, `0o1`).
    pub fn bits(self) -> u16 {
        (self.read as u16) << 2 | (self.write as u16) << 1 | self.execute as u16
    }
}

/// Check `mask` against a node's owner, group and mode.
///
/// Privileged credentials bypass read and write bits; execute still needs
/// a directory or at least one execute bit.
pub fn check_access(
    creds: &Credentials,
    node_type: NodeType,
    owner: u32,
    group: u32,
    mode: FileMode,
    mask: PermMask,
) -> Result<(), Errno> {
    if creds.privileged {
        if mask.execute && !node_type.is_directory() && !mode.any_execute() {
            return Err(Errno::Eacces);
        }
        return Ok(());
    }

    let granted = if creds.uid == owner {
        mode.owner()
    } else if creds.in_group(group) {
        mode.group()
    } else {
        mode.other()
    };

    if mask.bits() & !granted != 0 {
        return Err(Errno::Eacces);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(creds: &Credentials, mode: u16, mask: PermMask) -> Result<(), Errno> {
        check_access(creds, NodeType::Regular, 1000, 100, FileMode::new(mode), mask)
    }

    #[test]
    fn test_owner_class() {
        let owner = Credentials::user(1000, 1);
        assert!(check(&owner, 0o600, PermMask::READ).is_ok());
        assert!(check(&owner, 0o600, PermMask::WRITE).is_ok());
        assert_eq!(check(&owner, 0o400, PermMask::WRITE), Err(Errno::Eacces));
        // Owner bits apply even when the world bits are wider.
        assert_eq!(check(&owner, 0o066, PermMask::READ), Err(Errno::Eacces));
    }

    #[test]
    fn test_group_and_other_classes() {
        let member = Credentials::user(2000, 5).with_groups(&[100]);
        assert!(check(&member, 0o640, PermMask::READ).is_ok());
        assert_eq!(check(&member, 0o640, PermMask::WRITE), Err(Errno::Eacces));

        let stranger = Credentials::user(3000, 3000);
        assert_eq!(check(&stranger, 0o640, PermMask::READ), Err(Errno::Eacces));
        assert!(check(&stranger, 0o644, PermMask::READ).is_ok());
    }

    #[test]
    fn test_privileged_bypass() {
        let root = Credentials::root();
        assert!(check(&root, 0o000, PermMask::WRITE).is_ok());
        assert_eq!(check(&root, 0o644, PermMask::EXECUTE), Err(Errno::Eacces));
        assert!(check_access(
            &root,
            NodeType::Directory,
            0,
            0,
            FileMode::new(0),
            PermMask::EXECUTE
        )
        .is_ok());
    }

    #[test]
    fn test_mask_bits() {
        assert_eq!(PermMask::READ.bits(), 0o4);
        assert_eq!(PermMask::WRITE.bits(), 0o2);
        assert_eq!(PermMask::EXECUTE.bits(), 0o1);
        assert_eq!(PermMask::default().bits(), 0);
    }
}
