//! Reference implementations for tests and the sentry's scratch mounts.

mod memory_fs;

pub use memory_fs::{MemoryFs, MemoryInode, MemoryNode, MAX_SYMLINK_HOPS};
