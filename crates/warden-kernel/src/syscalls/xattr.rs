//! Extended attribute syscalls.
//!
//! `getxattr(2)`/`lgetxattr(2)` and `setxattr(2)`/`lsetxattr(2)`. Only the
//! `user.` namespace is supported, and only on regular files and
//! directories.
//!
//! The order of checks is observable (which errno wins when several apply)
//! and is kept exactly:
//!
//! ```text
//! get: path → resolve → ENOTDIR → perm{read}  → name → EOPNOTSUPP → object get → ERANGE → copy-out
//! set: path → EINVAL(flags) → resolve → ENOTDIR → perm{write} → name → E2BIG → copy-in → EOPNOTSUPP → object set
//! ```

use alloc::string::String;

use warden_abi::{Errno, SyscallArguments, SyscallResult, XattrFlags};
use warden_abi::{XATTR_NAME_MAX, XATTR_SIZE_MAX, XATTR_USER_PREFIX};
use warden_usermem::Addr;
use warden_vfs::{FilesystemObject, PermMask};

use super::copy_in_path;
use crate::Task;

/// An attribute name copied in from the process: non-empty and at most
/// `XATTR_NAME_MAX` bytes. The namespace is checked separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XattrName(String);

impl XattrName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// getxattr(path, name, value, size)
pub fn getxattr(task: &Task, args: &SyscallArguments) -> SyscallResult {
    get_xattr_at(task, args, true)
}

/// lgetxattr(path, name, value, size): does not follow a final symlink.
pub fn lgetxattr(task: &Task, args: &SyscallArguments) -> SyscallResult {
    get_xattr_at(task, args, false)
}

/// setxattr(path, name, value, size, flags)
pub fn setxattr(task: &Task, args: &SyscallArguments) -> SyscallResult {
    set_xattr_at(task, args, true)
}

/// lsetxattr(path, name, value, size, flags): does not follow a final symlink.
pub fn lsetxattr(task: &Task, args: &SyscallArguments) -> SyscallResult {
    set_xattr_at(task, args, false)
}

fn get_xattr_at(task: &Task, args: &SyscallArguments, follow: bool) -> SyscallResult {
    let path_addr = Addr(args.pointer(0));
    let name_addr = Addr(args.pointer(1));
    let value_addr = Addr(args.pointer(2));
    let size = args.size_t(3);

    let (path, dir_hint) = copy_in_path(task, path_addr)?;
    log::debug!("[xattr] get {:?} size={} follow={}", path, size, follow);

    let object = task.resolve(&path, follow)?;
    get_xattr(task, object.as_ref(), dir_hint, name_addr, value_addr, size)
}

fn set_xattr_at(task: &Task, args: &SyscallArguments, follow: bool) -> SyscallResult {
    let path_addr = Addr(args.pointer(0));
    let name_addr = Addr(args.pointer(1));
    let value_addr = Addr(args.pointer(2));
    let size = args.size_t(3);
    let flags = args.uint(4);

    let (path, dir_hint) = copy_in_path(task, path_addr)?;
    log::debug!("[xattr] set {:?} size={} flags={:#x} follow={}", path, size, flags, follow);

    if XattrFlags::from_raw(flags).is_none() {
        return Err(Errno::Einval);
    }

    let object = task.resolve(&path, follow)?;
    set_xattr(task, object.as_ref(), dir_hint, name_addr, value_addr, size, flags)?;
    Ok(0)
}

/// Read attribute `name_addr` from a resolved object into `value_addr`.
///
/// A `size` of zero returns the value's length without copying anything
/// out; zero or anything above `XATTR_SIZE_MAX` bounds the read at
/// `XATTR_SIZE_MAX`.
pub fn get_xattr(
    task: &Task,
    object: &dyn FilesystemObject,
    dir_hint: bool,
    name_addr: Addr,
    value_addr: Addr,
    size: usize,
) -> SyscallResult {
    if dir_hint && !object.node_type().is_directory() {
        return Err(Errno::Enotdir);
    }

    check_xattr_permissions(task, object, PermMask::READ)?;

    let name = copy_in_xattr_name(task, name_addr)?;
    require_user_namespace(&name)?;

    let bound = if size == 0 || size > XATTR_SIZE_MAX {
        XATTR_SIZE_MAX
    } else {
        size
    };

    let value = object.get_xattr(name.as_str(), bound)?;
    if value.len() > bound {
        return Err(Errno::Erange);
    }

    if size != 0 {
        task.copy_out_bytes(value_addr, &value)?;
    }
    Ok(value.len())
}

/// Write attribute `name_addr` on a resolved object.
///
/// The value is copied in before the namespace check, so a fault on the
/// value wins over `EOPNOTSUPP`.
pub fn set_xattr(
    task: &Task,
    object: &dyn FilesystemObject,
    dir_hint: bool,
    name_addr: Addr,
    value_addr: Addr,
    size: usize,
    flags: u32,
) -> Result<(), Errno> {
    let flags = XattrFlags::from_raw(flags).ok_or(Errno::Einval)?;

    if dir_hint && !object.node_type().is_directory() {
        return Err(Errno::Enotdir);
    }

    check_xattr_permissions(task, object, PermMask::WRITE)?;

    let name = copy_in_xattr_name(task, name_addr)?;

    if size > XATTR_SIZE_MAX {
        return Err(Errno::E2big);
    }
    let value = task.copy_in_bytes(value_addr, size)?;

    require_user_namespace(&name)?;

    object.set_xattr(name.as_str(), &value, flags)
}

/// Copy in an attribute name.
///
/// Both an empty name and one longer than `XATTR_NAME_MAX` are `ERANGE`.
pub fn copy_in_xattr_name(task: &Task, addr: Addr) -> Result<XattrName, Errno> {
    let name = task
        .copy_in_string(addr, XATTR_NAME_MAX + 1)
        .map_err(|e| match e {
            Errno::Enametoolong => Errno::Erange,
            other => other,
        })?;
    if name.is_empty() {
        return Err(Errno::Erange);
    }
    Ok(XattrName(name))
}

/// `EOPNOTSUPP` unless the name is in the `user.` namespace.
pub fn require_user_namespace(name: &XattrName) -> Result<(), Errno> {
    if name.as_str().starts_with(XATTR_USER_PREFIX) {
        Ok(())
    } else {
        Err(Errno::Eopnotsupp)
    }
}

/// Xattrs live only on regular files and directories; anything else
/// reports `EPERM` for writes and `ENODATA` for reads without consulting
/// the object.
pub fn check_xattr_permissions(
    task: &Task,
    object: &dyn FilesystemObject,
    mask: PermMask,
) -> Result<(), Errno> {
    let node_type = object.node_type();
    if !node_type.is_regular() && !node_type.is_directory() {
        return Err(if mask.write {
            Errno::Eperm
        } else {
            Errno::Enodata
        });
    }

    object.check_permission(task.credentials(), mask)
}
