//! Syscall handlers and dispatch.
//!
//! Handlers take the calling [`Task`] and the raw argument registers and
//! return the value for the return register or an errno.

pub mod xattr;

use alloc::string::String;

use warden_abi::syscall::{self, SYS_GETXATTR, SYS_LGETXATTR, SYS_LSETXATTR, SYS_SETXATTR};
use warden_abi::{Errno, SyscallArguments, SyscallResult, PATH_MAX};
use warden_usermem::Addr;
use warden_vfs::trim_trailing_slashes;

use crate::Task;

/// Signature shared by every syscall handler.
pub type SyscallFn = fn(&Task, &SyscallArguments) -> SyscallResult;

/// Syscall number → handler.
const TABLE: &[(u64, SyscallFn)] = &[
    (SYS_SETXATTR, xattr::setxattr),
    (SYS_LSETXATTR, xattr::lsetxattr),
    (SYS_GETXATTR, xattr::getxattr),
    (SYS_LGETXATTR, xattr::lgetxattr),
];

/// Handler for `sysno`, if the kernel implements it.
pub fn lookup(sysno: u64) -> Option<SyscallFn> {
    TABLE
        .iter()
        .find(|(number, _)| *number == sysno)
        .map(|&(_, handler)| handler)
}

/// Run syscall `sysno` for `task`. Unknown numbers fail with `ENOSYS`.
pub fn dispatch(task: &Task, sysno: u64, args: &SyscallArguments) -> SyscallResult {
    let Some(handler) = lookup(sysno) else {
        log::debug!("[syscall] unimplemented syscall {}", sysno);
        return Err(Errno::Enosys);
    };

    let result = handler(task, args);
    if let Err(errno) = result {
        log::debug!("[syscall] {} failed: {:?}", syscall::name(sysno), errno);
    }
    result
}

/// Copy in a path argument.
///
/// Returns the path with trailing slashes removed and whether any were
/// removed (the caller then requires a directory). An empty path is
/// `ENOENT`.
pub fn copy_in_path(task: &Task, addr: Addr) -> Result<(String, bool), Errno> {
    let path = task.copy_in_string(addr, PATH_MAX)?;
    if path.is_empty() {
        return Err(Errno::Enoent);
    }
    let (trimmed, dir_hint) = trim_trailing_slashes(&path);
    Ok((String::from(trimmed), dir_hint))
}
