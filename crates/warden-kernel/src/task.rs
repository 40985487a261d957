//! Per-thread syscall context.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use warden_abi::Errno;
use warden_usermem::{Addr, UserMemory};
use warden_vfs::{join_path, Credentials, FilesystemObject, Resolver};

/// The thread on whose behalf a syscall runs.
///
/// Passed explicitly to every handler; nothing in the syscall path reads
/// ambient per-thread state.
pub struct Task {
    credentials: Credentials,
    memory: Arc<dyn UserMemory>,
    fs: Arc<dyn Resolver>,
    cwd: String,
}

impl Task {
    /// Create a task whose working directory is `/`.
    pub fn new(credentials: Credentials, memory: Arc<dyn UserMemory>, fs: Arc<dyn Resolver>) -> Self {
        Self {
            credentials,
            memory,
            fs,
            cwd: String::from("/"),
        }
    }

    /// Set the working directory used for relative paths.
    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = String::from(cwd);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn copy_in_string(&self, addr: Addr, max_len: usize) -> Result<String, Errno> {
        self.memory.copy_in_string(addr, max_len)
    }

    pub fn copy_in_bytes(&self, addr: Addr, len: usize) -> Result<Vec<u8>, Errno> {
        self.memory.copy_in_bytes(addr, len)
    }

    pub fn copy_out_bytes(&self, addr: Addr, src: &[u8]) -> Result<(), Errno> {
        self.memory.copy_out_bytes(addr, src)
    }

    /// Resolve `path` relative to the working directory.
    pub fn resolve(&self, path: &str, follow_final: bool) -> Result<Arc<dyn FilesystemObject>, Errno> {
        let path = join_path(&self.cwd, path);
        self.fs.resolve(&self.credentials, &path, follow_final)
    }
}
