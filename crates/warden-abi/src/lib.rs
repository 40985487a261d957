//! Warden ABI
//!
//! The Linux-facing surface shared by every Warden crate:
//!
//! - `errno` - the error taxonomy returned to the sandboxed process
//! - `constants` - xattr and path limits
//! - `syscall` - syscall numbers and raw argument registers
//! - `xattr` - the `setxattr(2)` flag bits
//!
//! This crate has no behavior of its own; it is the single source of truth
//! for numbers that must match the host kernel bit-for-bit.

#![no_std]

pub mod constants;
pub mod errno;
pub mod syscall;
pub mod xattr;

pub use constants::{NAME_MAX, PATH_MAX, XATTR_NAME_MAX, XATTR_SIZE_MAX, XATTR_USER_PREFIX};
pub use errno::{Errno, SyscallResult};
pub use syscall::SyscallArguments;
pub use xattr::XattrFlags;
