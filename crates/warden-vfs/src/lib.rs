//! Warden Virtual Filesystem Contract
//!
//! The xattr pathway never looks inside a filesystem. It sees two seams:
//!
//! - **Resolver**: turns an absolute path into a filesystem object, with or
//!   without following a final symlink
//! - **FilesystemObject**: node type, permission predicate, xattr storage
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐  resolve(creds, path, follow)  ┌─────────────────────┐
//! │ syscall (warden-kernel)│ ─────────────────────────────▶ │ Resolver            │
//! └───────────┬───────────┘                                └──────────┬──────────┘
//!             │ node_type / check_permission / get_xattr / set_xattr  │
//!             ▼                                                       ▼
//! ┌──────────────────────────────────────────────────────────────────────────────┐
//! │ Arc<dyn FilesystemObject>  (MemoryInode over ObjectRef<MemoryNode> in tests) │
//! └──────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`MemoryFs`] is the reference filesystem. Its nodes are [`Stateful`]
//! objects, so a whole tree (hard links and symlinks included) can be
//! checkpointed and restored by `warden-state`.
//!
//! [`Stateful`]: warden_state::Stateful

#![no_std]
extern crate alloc;

pub mod core;
pub mod service;
pub mod testing;

pub use self::core::{components, filename, join_path, parent_path, trim_trailing_slashes};
pub use self::core::{Credentials, FileMode, NodeType};
pub use service::{check_access, FilesystemObject, PermMask, Resolver};
pub use testing::{MemoryFs, MemoryInode, MemoryNode, MAX_SYMLINK_HOPS};
