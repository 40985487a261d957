//! Node metadata types shared by every filesystem implementation.

use alloc::vec::Vec;
use warden_state::{Decoder, Encoder, StateError, StateValue, Value};

/// Kind of filesystem node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Regular file
    #[default]
    Regular,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Character device
    CharDevice,
    /// Block device
    BlockDevice,
    /// Named pipe
    Pipe,
    /// Unix domain socket
    Socket,
}

impl NodeType {
    /// Check if this is a regular file.
    pub fn is_regular(self) -> bool {
        self == NodeType::Regular
    }

    /// Check if this is a directory.
    pub fn is_directory(self) -> bool {
        self == NodeType::Directory
    }

    /// Check if this is a symbolic link.
    pub fn is_symlink(self) -> bool {
        self == NodeType::Symlink
    }

    fn code(self) -> u8 {
        match self {
            NodeType::Regular => 0,
            NodeType::Directory => 1,
            NodeType::Symlink => 2,
            NodeType::CharDevice => 3,
            NodeType::BlockDevice => 4,
            NodeType::Pipe => 5,
            NodeType::Socket => 6,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => NodeType::Regular,
            1 => NodeType::Directory,
            2 => NodeType::Symlink,
            3 => NodeType::CharDevice,
            4 => NodeType::BlockDevice,
            5 => NodeType::Pipe,
            6 => NodeType::Socket,
            _ => return None,
        })
    }
}

impl StateValue for NodeType {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        self.code().encode(enc)
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        NodeType::from_code(u8::decode(value, dec)?).ok_or(StateError::InvalidValue {
            expected: "node type",
            found: "unknown node type code",
        })
    }
}

/// Unix permission bits (`rwxrwxrwx`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileMode(u16);

impl FileMode {
    /// Wrap the low nine bits of `bits`.
    pub const fn new(bits: u16) -> Self {
        Self(bits & 0o777)
    }

    /// Raw permission bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// `rwx` bits for the owner, shifted down to `0o7`.
    pub const fn owner(self) -> u16 {
        (self.0 >> 6) & 0o7
    }

    /// `rwx` bits for the group.
    pub const fn group(self) -> u16 {
        (self.0 >> 3) & 0o7
    }

    /// `rwx` bits for everyone else.
    pub const fn other(self) -> u16 {
        self.0 & 0o7
    }

    /// Whether any execute bit is set.
    pub const fn any_execute(self) -> bool {
        self.0 & 0o111 != 0
    }
}

impl StateValue for FileMode {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        self.0.encode(enc)
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        u16::decode(value, dec).map(FileMode::new)
    }
}

/// Identity a task presents to permission checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// Effective user ID
    pub uid: u32,
    /// Effective group ID
    pub gid: u32,
    /// Supplementary groups
    pub groups: Vec<u32>,
    /// Bypasses read/write permission bits (`CAP_DAC_OVERRIDE`)
    pub privileged: bool,
}

impl Credentials {
    /// Create superuser credentials.
    pub fn root() -> Self {
        Self {
            uid: 0,
            gid: 0,
            groups: Vec::new(),
            privileged: true,
        }
    }

    /// Create unprivileged credentials.
    pub fn user(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            gid,
            groups: Vec::new(),
            privileged: false,
        }
    }

    /// Add supplementary groups.
    pub fn with_groups(mut self, groups: &[u32]) -> Self {
        self.groups.extend_from_slice(groups);
        self
    }

    /// Whether `gid` is the effective or a supplementary group.
    pub fn in_group(&self, gid: u32) -> bool {
        self.gid == gid || self.groups.contains(&gid)
    }
}
