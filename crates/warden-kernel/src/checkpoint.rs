//! Checkpoint and restore of kernel state.
//!
//! Callers stop every task before calling in; the engine itself takes no
//! locks beyond the per-object ones it briefly holds.

use warden_netlink::PortManager;
use warden_state::{
    install_global, load, new_object, save, AnyObject, ObjectRef, Snapshot, StateError,
    TypeRegistry,
};
use warden_vfs::{MemoryFs, MemoryNode};

/// Registry of every stateful kernel type.
pub fn kernel_registry() -> Result<TypeRegistry, StateError> {
    Ok(TypeRegistry::builder()
        .register::<PortManager>()?
        .register::<MemoryNode>()?
        .build())
}

/// Build [`kernel_registry`] and install it as the process-wide registry.
pub fn install_kernel_registry() -> Result<&'static TypeRegistry, StateError> {
    install_global(kernel_registry()?)
}

/// The kernel's checkpoint roots.
pub struct KernelObjects {
    /// Netlink port allocations
    pub ports: ObjectRef<PortManager>,
    /// Root of the sandbox filesystem
    pub fs_root: ObjectRef<MemoryNode>,
}

impl Default for KernelObjects {
    fn default() -> Self {
        Self::new(&MemoryFs::new())
    }
}

impl KernelObjects {
    /// Fresh port manager over an existing filesystem.
    pub fn new(fs: &MemoryFs) -> Self {
        Self {
            ports: new_object(PortManager::new()),
            fs_root: fs.root().clone(),
        }
    }

    /// Filesystem view over the restored or live root.
    pub fn filesystem(&self) -> MemoryFs {
        MemoryFs::from_root(self.fs_root.clone())
    }

    fn roots(&self) -> [AnyObject; 2] {
        [
            AnyObject::from_ref(&self.ports),
            AnyObject::from_ref(&self.fs_root),
        ]
    }

    /// Save every kernel object.
    pub fn checkpoint(&self, registry: &TypeRegistry) -> Result<Snapshot, StateError> {
        let snapshot = save(registry, &self.roots()).inspect_err(|e| {
            log::warn!("[state] checkpoint failed: {}", e);
        })?;
        log::info!(
            "[state] checkpoint complete: {} objects",
            snapshot.object_count()
        );
        Ok(snapshot)
    }

    /// Rebuild the kernel objects from a snapshot taken by [`checkpoint`].
    ///
    /// [`checkpoint`]: KernelObjects::checkpoint
    pub fn restore(registry: &TypeRegistry, snapshot: &Snapshot) -> Result<Self, StateError> {
        let restored = load(registry, snapshot).inspect_err(|e| {
            log::warn!("[state] restore aborted: {}", e);
        })?;
        let objects = Self {
            ports: restored.root::<PortManager>(0)?,
            fs_root: restored.root::<MemoryNode>(1)?,
        };
        log::info!(
            "[state] restore complete: {} objects",
            restored.object_count()
        );
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contents() {
        let registry = kernel_registry().unwrap();
        assert!(registry.contains("pkg/sentry/socket/netlink/port.Manager"));
        assert!(registry.contains("vfs.MemoryNode"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_restore_rejects_swapped_roots() {
        let registry = kernel_registry().unwrap();
        let objects = KernelObjects::default();
        let mut snapshot = objects.checkpoint(&registry).unwrap();
        snapshot.roots.swap(0, 1);

        assert!(matches!(
            KernelObjects::restore(&registry, &snapshot),
            Err(StateError::TypeMismatch { .. })
        ));
    }
}
