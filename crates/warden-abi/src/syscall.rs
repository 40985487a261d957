//! Syscall numbers (x86_64 Linux ABI) handled by the sentry.

/// Set an extended attribute, following symlinks.
pub const SYS_SETXATTR: u64 = 188;
/// Set an extended attribute without following a final symlink.
pub const SYS_LSETXATTR: u64 = 189;
/// Get an extended attribute, following symlinks.
pub const SYS_GETXATTR: u64 = 191;
/// Get an extended attribute without following a final symlink.
pub const SYS_LGETXATTR: u64 = 192;

/// Human-readable name for a syscall number (used in logs).
pub fn name(sysno: u64) -> &'static str {
    match sysno {
        SYS_SETXATTR => "setxattr",
        SYS_LSETXATTR => "lsetxattr",
        SYS_GETXATTR => "getxattr",
        SYS_LGETXATTR => "lgetxattr",
        _ => "unknown",
    }
}

/// The six argument registers of a syscall, as raw values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyscallArguments([u64; 6]);

impl SyscallArguments {
    /// Wrap raw register values.
    pub const fn new(regs: [u64; 6]) -> Self {
        Self(regs)
    }

    /// Argument `index` as a user address.
    pub fn pointer(&self, index: usize) -> u64 {
        self.raw(index)
    }

    /// Argument `index` as a `size_t`.
    pub fn size_t(&self, index: usize) -> usize {
        self.raw(index) as usize
    }

    /// Argument `index` as an `unsigned int` (upper half discarded).
    pub fn uint(&self, index: usize) -> u32 {
        self.raw(index) as u32
    }

    /// Argument `index` as an `int` (upper half discarded).
    pub fn int(&self, index: usize) -> i32 {
        self.raw(index) as u32 as i32
    }

    fn raw(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}
