//! Warden Kernel
//!
//! The sentry side of the sandbox: it receives a trapped syscall from the
//! sandboxed process and services it against kernel objects.
//!
//! - [`Task`] - the calling thread: credentials, address space, filesystem
//! - [`syscalls`] - handlers and the number → handler dispatch table
//! - [`checkpoint`] - saving and restoring the kernel's stateful objects
//!
//! Handlers never touch process memory directly; every read and write goes
//! through the task's [`UserMemory`](warden_usermem::UserMemory).

#![no_std]
extern crate alloc;

pub mod checkpoint;
pub mod syscalls;
mod task;

pub use checkpoint::{install_kernel_registry, kernel_registry, KernelObjects};
pub use syscalls::{dispatch, lookup, SyscallFn};
pub use task::Task;
