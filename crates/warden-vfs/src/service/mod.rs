//! Filesystem object contract and permission checking

mod permissions;
mod trait_def;

pub use permissions::{check_access, PermMask};
pub use trait_def::{FilesystemObject, Resolver};
