//! Stateful objects and type-erased handles to them.

use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use spin::Mutex;

use crate::engine::{Sink, Source};
use crate::error::StateError;

/// Shared, mutable handle to a stateful object.
///
/// Two handles refer to the same object iff they point at the same
/// allocation; the engine preserves that identity across save and load.
pub type ObjectRef<T> = Arc<Mutex<T>>;

/// Wrap a value into a fresh [`ObjectRef`].
pub fn new_object<T: Stateful>(value: T) -> ObjectRef<T> {
    Arc::new(Mutex::new(value))
}

/// A kernel object type that takes part in checkpoint/restore.
///
/// `load` runs on the registered zero value (`Default`) and must read back
/// exactly the fields `save` wrote, in the same order.
pub trait Stateful: Default + Send + 'static {
    /// Stable type name recorded in snapshots.
    const TYPE_NAME: &'static str;

    /// Field names in save order.
    const FIELDS: &'static [&'static str];

    /// Normalize state before its fields are read.
    fn before_save(&mut self) {}

    /// Emit every field in `FIELDS` order.
    fn save(&self, sink: &mut Sink<'_>) -> Result<(), StateError>;

    /// Rebuild derived state once the whole graph is populated.
    fn after_load(&mut self) {}

    /// Consume every field in `FIELDS` order.
    fn load(&mut self, source: &mut Source<'_>) -> Result<(), StateError>;
}

pub(crate) trait ErasedObject: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn fields(&self) -> &'static [&'static str];
    fn value_type(&self) -> TypeId;
    fn save_fields(&self, sink: &mut Sink<'_>) -> Result<(), StateError>;
    fn load_fields(&self, source: &mut Source<'_>) -> Result<(), StateError>;
    fn after_load(&self);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Stateful> ErasedObject for Mutex<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn fields(&self) -> &'static [&'static str] {
        T::FIELDS
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn save_fields(&self, sink: &mut Sink<'_>) -> Result<(), StateError> {
        let mut guard = self.lock();
        guard.before_save();
        guard.save(sink)
    }

    fn load_fields(&self, source: &mut Source<'_>) -> Result<(), StateError> {
        self.lock().load(source)
    }

    fn after_load(&self) {
        self.lock().after_load();
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A stateful object of any registered type.
#[derive(Clone)]
pub struct AnyObject {
    inner: Arc<dyn ErasedObject>,
}

impl AnyObject {
    /// Wrap a fresh value.
    pub fn new<T: Stateful>(value: T) -> Self {
        Self::from_ref(&new_object(value))
    }

    /// Erase the type of an existing handle, keeping its identity.
    pub fn from_ref<T: Stateful>(object: &ObjectRef<T>) -> Self {
        Self {
            inner: object.clone(),
        }
    }

    /// Registered type name of the underlying object.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    /// Recover the typed handle, or `None` if the object is not a `T`.
    pub fn downcast<T: Stateful>(&self) -> Option<ObjectRef<T>> {
        self.inner.clone().into_any().downcast::<Mutex<T>>().ok()
    }

    /// Whether both handles refer to the same object.
    pub fn same_object(&self, other: &AnyObject) -> bool {
        self.identity() == other.identity()
    }

    /// Rust type of the underlying value.
    pub(crate) fn value_type(&self) -> TypeId {
        self.inner.value_type()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn erased(&self) -> &dyn ErasedObject {
        &*self.inner
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyObject")
            .field("type_name", &self.type_name())
            .field("identity", &format_args!("{:#x}", self.identity()))
            .finish()
    }
}
