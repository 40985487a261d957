//! Errors from checkpoint and restore.
//!
//! None of these are recoverable: a failed save aborts the checkpoint and a
//! failed load aborts the restore before any reconstructed object escapes.

use alloc::string::String;
use alloc::vec::Vec;

use crate::engine::Lifecycle;
use crate::snapshot::ObjectId;

/// Checkpoint/restore failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A type name was registered twice.
    #[error("type {0:?} registered twice")]
    DuplicateType(&'static str),

    /// The global registry was already installed.
    #[error("global type registry already installed")]
    AlreadyInstalled,

    /// A type name is not in the registry (build/snapshot version mismatch).
    #[error("type {0:?} is not registered")]
    UnregisteredType(String),

    /// The field list stored for a record differs from the registered one.
    #[error("field mismatch for {type_name}: expected {expected:?}, found {found:?}")]
    FieldMismatch {
        type_name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A value has the wrong shape for the field being loaded.
    #[error("invalid value: expected {expected}, found {found}")]
    InvalidValue {
        expected: &'static str,
        found: &'static str,
    },

    /// A reference points at an object of a different type.
    #[error("object {id} is a {found}, expected {expected}")]
    TypeMismatch {
        id: ObjectId,
        expected: &'static str,
        found: &'static str,
    },

    /// A reference points at a sequence number with no record.
    #[error("dangling reference to object {0}")]
    DanglingReference(ObjectId),

    /// An object moved through its lifecycle out of order.
    #[error("object {id}: illegal transition {from:?} -> {to:?}")]
    Lifecycle {
        id: ObjectId,
        from: Lifecycle,
        to: Lifecycle,
    },

    /// Structural problem in the snapshot itself.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Snapshot was produced by a newer format version.
    #[error("unsupported snapshot version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Encoding(String),
}
