//! In-memory filesystem for tests.
//!
//! A tree of [`MemoryNode`]s linked by [`ObjectRef`]s. Hard links share one
//! node; symlinks store their target string and are followed during walks.
//! Every node is [`Stateful`], so the tree checkpoints like any other
//! kernel object.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use warden_abi::{Errno, XattrFlags, NAME_MAX};
use warden_state::{new_object, ObjectRef, Sink, Source, StateError, Stateful};

use crate::core::{components, filename, parent_path, Credentials, FileMode, NodeType};
use crate::service::{check_access, FilesystemObject, PermMask, Resolver};

/// Symlinks followed in one walk before giving up with `ELOOP`.
pub const MAX_SYMLINK_HOPS: usize = 40;

/// One node of the in-memory tree.
#[derive(Debug, Default)]
pub struct MemoryNode {
    /// Type of node
    pub node_type: NodeType,
    /// Permission bits
    pub mode: FileMode,
    /// Owner user ID
    pub uid: u32,
    /// Owner group ID
    pub gid: u32,
    /// Link target (symlinks only)
    pub target: Option<String>,
    /// Directory entries (directories only)
    pub children: BTreeMap<String, ObjectRef<MemoryNode>>,
    /// Extended attributes
    pub xattrs: BTreeMap<String, Vec<u8>>,
}

impl MemoryNode {
    /// Create a root-owned node.
    pub fn new(node_type: NodeType, mode: FileMode) -> Self {
        Self {
            node_type,
            mode,
            ..Self::default()
        }
    }

    fn check(&self, creds: &Credentials, mask: PermMask) -> Result<(), Errno> {
        check_access(creds, self.node_type, self.uid, self.gid, self.mode, mask)
    }
}

impl Stateful for MemoryNode {
    const TYPE_NAME: &'static str = "vfs.MemoryNode";
    const FIELDS: &'static [&'static str] = &[
        "node_type",
        "mode",
        "uid",
        "gid",
        "target",
        "children",
        "xattrs",
    ];

    fn save(&self, sink: &mut Sink<'_>) -> Result<(), StateError> {
        sink.save("node_type", &self.node_type)?;
        sink.save("mode", &self.mode)?;
        sink.save("uid", &self.uid)?;
        sink.save("gid", &self.gid)?;
        sink.save("target", &self.target)?;
        sink.save("children", &self.children)?;
        sink.save("xattrs", &self.xattrs)
    }

    fn load(&mut self, source: &mut Source<'_>) -> Result<(), StateError> {
        self.node_type = source.load("node_type")?;
        self.mode = source.load("mode")?;
        self.uid = source.load("uid")?;
        self.gid = source.load("gid")?;
        self.target = source.load("target")?;
        self.children = source.load("children")?;
        self.xattrs = source.load("xattrs")?;
        Ok(())
    }
}

/// [`FilesystemObject`] view of a [`MemoryNode`].
#[derive(Clone)]
pub struct MemoryInode {
    node: ObjectRef<MemoryNode>,
}

impl MemoryInode {
    /// Wrap a node.
    pub fn new(node: ObjectRef<MemoryNode>) -> Self {
        Self { node }
    }

    /// The underlying node.
    pub fn node(&self) -> &ObjectRef<MemoryNode> {
        &self.node
    }
}

impl FilesystemObject for MemoryInode {
    fn node_type(&self) -> NodeType {
        self.node.lock().node_type
    }

    fn check_permission(&self, creds: &Credentials, mask: PermMask) -> Result<(), Errno> {
        self.node.lock().check(creds, mask)
    }

    fn get_xattr(&self, name: &str, max_size: usize) -> Result<Vec<u8>, Errno> {
        let node = self.node.lock();
        let value = node.xattrs.get(name).ok_or(Errno::Enodata)?;
        if value.len() > max_size {
            return Err(Errno::Erange);
        }
        Ok(value.clone())
    }

    fn set_xattr(&self, name: &str, value: &[u8], flags: XattrFlags) -> Result<(), Errno> {
        let mut node = self.node.lock();
        let exists = node.xattrs.contains_key(name);
        if flags.contains(XattrFlags::CREATE) && exists {
            return Err(Errno::Eexist);
        }
        if flags.contains(XattrFlags::REPLACE) && !exists {
            return Err(Errno::Enodata);
        }
        node.xattrs.insert(String::from(name), Vec::from(value));
        Ok(())
    }
}

/// In-memory filesystem rooted at a single directory node.
pub struct MemoryFs {
    root: ObjectRef<MemoryNode>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a filesystem with an empty, world-traversable root.
    pub fn new() -> Self {
        Self {
            root: new_object(MemoryNode::new(NodeType::Directory, FileMode::new(0o755))),
        }
    }

    /// Rebuild a filesystem around an existing (for example restored) root.
    pub fn from_root(root: ObjectRef<MemoryNode>) -> Self {
        Self { root }
    }

    /// The root directory node.
    pub fn root(&self) -> &ObjectRef<MemoryNode> {
        &self.root
    }

    /// Create a directory.
    pub fn mkdir(&self, path: &str, mode: u16) -> Result<ObjectRef<MemoryNode>, Errno> {
        self.insert(path, MemoryNode::new(NodeType::Directory, FileMode::new(mode)))
    }

    /// Create an empty regular file.
    pub fn create_file(&self, path: &str, mode: u16) -> Result<ObjectRef<MemoryNode>, Errno> {
        self.insert(path, MemoryNode::new(NodeType::Regular, FileMode::new(mode)))
    }

    /// Create a symbolic link at `path` pointing to `target`.
    pub fn symlink(&self, path: &str, target: &str) -> Result<ObjectRef<MemoryNode>, Errno> {
        let mut node = MemoryNode::new(NodeType::Symlink, FileMode::new(0o777));
        node.target = Some(String::from(target));
        self.insert(path, node)
    }

    /// Create a device, pipe or socket node.
    pub fn mknod(
        &self,
        path: &str,
        node_type: NodeType,
        mode: u16,
    ) -> Result<ObjectRef<MemoryNode>, Errno> {
        if node_type.is_directory() || node_type.is_symlink() {
            return Err(Errno::Einval);
        }
        self.insert(path, MemoryNode::new(node_type, FileMode::new(mode)))
    }

    /// Add a second name for an existing non-directory node.
    pub fn link(&self, existing: &str, path: &str) -> Result<ObjectRef<MemoryNode>, Errno> {
        let node = self.walk(&Credentials::root(), existing, false)?;
        if node.lock().node_type.is_directory() {
            return Err(Errno::Eperm);
        }
        self.attach(path, node)
    }

    /// Change the owner of the node at `path` (final symlink not followed).
    pub fn chown(&self, path: &str, uid: u32, gid: u32) -> Result<(), Errno> {
        let node = self.walk(&Credentials::root(), path, false)?;
        let mut node = node.lock();
        node.uid = uid;
        node.gid = gid;
        Ok(())
    }

    /// Change the permission bits of the node at `path`.
    pub fn chmod(&self, path: &str, mode: u16) -> Result<(), Errno> {
        let node = self.walk(&Credentials::root(), path, false)?;
        node.lock().mode = FileMode::new(mode);
        Ok(())
    }

    fn insert(&self, path: &str, node: MemoryNode) -> Result<ObjectRef<MemoryNode>, Errno> {
        self.attach(path, new_object(node))
    }

    fn attach(
        &self,
        path: &str,
        node: ObjectRef<MemoryNode>,
    ) -> Result<ObjectRef<MemoryNode>, Errno> {
        let name = filename(path);
        if name.is_empty() || name == "." || name == ".." {
            return Err(Errno::Eexist);
        }
        if name.len() > NAME_MAX {
            return Err(Errno::Enametoolong);
        }

        let parent = self.walk(&Credentials::root(), &parent_path(path), true)?;
        let mut parent = parent.lock();
        if !parent.node_type.is_directory() {
            return Err(Errno::Enotdir);
        }
        if parent.children.contains_key(name) {
            return Err(Errno::Eexist);
        }
        parent.children.insert(String::from(name), node.clone());
        Ok(node)
    }

    /// Walk an absolute path from the root.
    ///
    /// Each directory passed through needs execute permission. `..` at the
    /// root stays at the root.
    fn walk(
        &self,
        creds: &Credentials,
        path: &str,
        follow_final: bool,
    ) -> Result<ObjectRef<MemoryNode>, Errno> {
        if !path.starts_with('/') {
            return Err(Errno::Enoent);
        }

        // Components still to visit, last one on top.
        let mut pending: Vec<String> = components(path).rev().map(String::from).collect();
        let mut ancestors: Vec<ObjectRef<MemoryNode>> = Vec::new();
        let mut current = self.root.clone();
        let mut hops = 0;

        while let Some(name) = pending.pop() {
            if name.len() > NAME_MAX {
                return Err(Errno::Enametoolong);
            }

            let child = {
                let dir = current.lock();
                if !dir.node_type.is_directory() {
                    return Err(Errno::Enotdir);
                }
                dir.check(creds, PermMask::EXECUTE)?;
                match name.as_str() {
                    "." => continue,
                    ".." => None,
                    _ => Some(dir.children.get(&name).cloned().ok_or(Errno::Enoent)?),
                }
            };

            let Some(child) = child else {
                current = ancestors.pop().unwrap_or_else(|| self.root.clone());
                continue;
            };

            let target = {
                let node = child.lock();
                match &node.target {
                    Some(target) if node.node_type.is_symlink() => Some(target.clone()),
                    _ => None,
                }
            };

            match target {
                Some(target) if !pending.is_empty() || follow_final => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(Errno::Eloop);
                    }
                    if target.starts_with('/') {
                        ancestors.clear();
                        current = self.root.clone();
                    }
                    pending.extend(components(&target).rev().map(String::from));
                }
                _ => {
                    ancestors.push(current);
                    current = child;
                }
            }
        }

        Ok(current)
    }
}

impl Resolver for MemoryFs {
    fn resolve(
        &self,
        creds: &Credentials,
        path: &str,
        follow_final: bool,
    ) -> Result<Arc<dyn FilesystemObject>, Errno> {
        let node = self.walk(creds, path, follow_final).inspect_err(|e| {
            log::trace!("[vfs] resolve {:?} failed: {:?}", path, e);
        })?;
        Ok(Arc::new(MemoryInode::new(node)))
    }
}
