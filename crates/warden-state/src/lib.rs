//! Warden State - Checkpoint/Restore for Kernel Objects
//!
//! Every stateful kernel object implements [`Stateful`]: a stable type name,
//! an ordered field list, `save`/`load` of those fields, and the optional
//! `before_save`/`after_load` hooks. The engine saves an arbitrary object
//! graph into a [`Snapshot`] and reconstructs it later with the same
//! sharing and cycles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   register::<T>()   ┌──────────────────────────────┐
//! │ startup code │ ──────────────────▶ │ TypeRegistry (frozen)        │
//! └──────────────┘                     │  name -> fields, constructor │
//!                                      └──────────────┬───────────────┘
//!                                                     │
//!        save(roots)                                  │          load(snapshot)
//! ┌───────────────────────────┐                       │   ┌─────────────────────────────┐
//! │ identity table (ptr -> id)│                       └──▶│ 1. allocate zero values     │
//! │ worklist in id order      │ ──▶ Snapshot ──────────▶  │ 2. populate fields in order │
//! │ before_save + fields      │   (records + roots)       │ 3. after_load in id order   │
//! └───────────────────────────┘                           └─────────────────────────────┘
//! ```
//!
//! Object references are [`ObjectRef<T>`] (`Arc<spin::Mutex<T>>`). The first
//! time the saver meets a reference it assigns the next sequence number and
//! queues the object; every later meeting emits only `Value::Ref(id)`. On
//! load every object is allocated before any field is populated, so a
//! reference to an object that is not yet populated (a cycle) still resolves
//! to the single reconstructed instance.
//!
//! Save and load are stop-the-world: the caller guarantees that no task
//! mutates a participating object while the engine runs.

#![no_std]
extern crate alloc;

mod engine;
mod error;
mod object;
mod registry;
mod snapshot;
mod value;

pub use engine::{load, save, Lifecycle, Restored, Sink, Source};
pub use error::StateError;
pub use object::{new_object, AnyObject, ObjectRef, Stateful};
pub use registry::{global, install_global, RegistryBuilder, TypeEntry, TypeRegistry};
pub use snapshot::{FieldRecord, ObjectId, ObjectRecord, Snapshot};
pub use value::{Decoder, Encoder, StateValue, Value};
