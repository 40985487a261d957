//! The two seams between the syscall layer and a filesystem.

use alloc::sync::Arc;
use alloc::vec::Vec;

use warden_abi::{Errno, XattrFlags};

use crate::core::{Credentials, NodeType};
use crate::service::PermMask;

/// A resolved filesystem node, borrowed for the duration of one syscall.
pub trait FilesystemObject: Send + Sync {
    /// Kind of node.
    fn node_type(&self) -> NodeType;

    /// `Ok` if `creds` may access the node with `mask`, else `EACCES`.
    fn check_permission(&self, creds: &Credentials, mask: PermMask) -> Result<(), Errno>;

    /// Value of attribute `name`.
    ///
    /// `ENODATA` if absent, `ERANGE` if longer than `max_size`.
    fn get_xattr(&self, name: &str, max_size: usize) -> Result<Vec<u8>, Errno>;

    /// Store attribute `name`.
    ///
    /// `EEXIST` for `CREATE` on an existing name, `ENODATA` for `REPLACE`
    /// on a missing one.
    fn set_xattr(&self, name: &str, value: &[u8], flags: XattrFlags) -> Result<(), Errno>;
}

/// Path resolution.
pub trait Resolver: Send + Sync {
    /// Resolve an absolute path on behalf of `creds`.
    ///
    /// Intermediate symlinks are always followed; the final one only if
    /// `follow_final` is set.
    fn resolve(
        &self,
        creds: &Credentials,
        path: &str,
        follow_final: bool,
    ) -> Result<Arc<dyn FilesystemObject>, Errno>;
}
