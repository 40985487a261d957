//! Registry of stateful types, keyed by type name.
//!
//! Built once at startup and frozen; the loader uses it to turn a stored
//! type name back into a zero value of the right Rust type.

use alloc::collections::BTreeMap;
use core::any::TypeId;
use spin::Once;

use crate::error::StateError;
use crate::object::{AnyObject, Stateful};

/// Registration data for one type.
#[derive(Clone, Copy)]
pub struct TypeEntry {
    name: &'static str,
    fields: &'static [&'static str],
    type_id: TypeId,
    construct: fn() -> AnyObject,
}

impl TypeEntry {
    fn of<T: Stateful>() -> Self {
        Self {
            name: T::TYPE_NAME,
            fields: T::FIELDS,
            type_id: TypeId::of::<T>(),
            construct: zero_value::<T>,
        }
    }

    /// Registered type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registered field names in save order.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Allocate a zero value of the type.
    pub fn construct(&self) -> AnyObject {
        (self.construct)()
    }
}

impl core::fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

fn zero_value<T: Stateful>() -> AnyObject {
    AnyObject::new(T::default())
}

/// Accumulates registrations before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<&'static str, TypeEntry>,
}

impl RegistryBuilder {
    /// Register `T` under `T::TYPE_NAME`.
    pub fn register<T: Stateful>(mut self) -> Result<Self, StateError> {
        if self.entries.contains_key(T::TYPE_NAME) {
            return Err(StateError::DuplicateType(T::TYPE_NAME));
        }
        self.entries.insert(T::TYPE_NAME, TypeEntry::of::<T>());
        Ok(self)
    }

    /// Freeze the registrations.
    pub fn build(self) -> TypeRegistry {
        log::debug!("[state] registry frozen with {} types", self.entries.len());
        TypeRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable name → type mapping.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: BTreeMap<&'static str, TypeEntry>,
}

impl TypeRegistry {
    /// Start a new registration.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Entry for `name`, or `UnregisteredType`.
    pub fn lookup(&self, name: &str) -> Result<&TypeEntry, StateError> {
        self.entries
            .get(name)
            .ok_or_else(|| StateError::UnregisteredType(name.into()))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether `object` is of the Rust type registered under its name.
    ///
    /// Two types sharing a `TYPE_NAME` only match the one registered.
    pub(crate) fn admits(&self, object: &AnyObject) -> bool {
        self.entries
            .get(object.type_name())
            .is_some_and(|entry| entry.type_id == object.value_type())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered type names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

static GLOBAL: Once<TypeRegistry> = Once::new();

/// Install the process-wide registry. Only the first call succeeds.
pub fn install_global(registry: TypeRegistry) -> Result<&'static TypeRegistry, StateError> {
    let mut installed = false;
    let global = GLOBAL.call_once(|| {
        installed = true;
        registry
    });
    if installed {
        Ok(global)
    } else {
        Err(StateError::AlreadyInstalled)
    }
}

/// The process-wide registry, if installed.
pub fn global() -> Option<&'static TypeRegistry> {
    GLOBAL.get()
}
