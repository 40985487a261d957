//! The persisted snapshot layout.
//!
//! A snapshot is an ordered list of records, one per object, in sequence
//! number order. Each record carries the object's type name and its fields
//! (name and value) in the order the type emitted them. Shared and cyclic
//! references are `Value::Ref(id)` back-references into the same list.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::value::Value;

/// Sequence number of an object within one snapshot.
pub type ObjectId = u64;

/// One saved field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Field name
    pub name: String,
    /// Field value
    pub value: Value,
}

/// One saved object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Sequence number (equals the record's index)
    pub id: ObjectId,
    /// Registered type name used to reconstruct the object
    pub type_name: String,
    /// Fields in emission order
    pub fields: Vec<FieldRecord>,
}

impl ObjectRecord {
    /// Field names in stored order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// A complete checkpoint of an object graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for migration support
    pub version: u32,
    /// Sequence numbers of the root objects, in the order they were given
    pub roots: Vec<ObjectId>,
    /// Object records in sequence number order
    pub records: Vec<ObjectRecord>,
}

impl Snapshot {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty snapshot at the current version.
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            roots: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Number of objects in the snapshot.
    pub fn object_count(&self) -> usize {
        self.records.len()
    }

    /// Check the version and the id/index correspondence of every record.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.version > Self::CURRENT_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }

        for (index, record) in self.records.iter().enumerate() {
            if record.id != index as ObjectId {
                return Err(StateError::MalformedSnapshot(alloc::format!(
                    "record {} carries id {}",
                    index,
                    record.id
                )));
            }
        }

        if let Some(&root) = self
            .roots
            .iter()
            .find(|&&root| root >= self.records.len() as ObjectId)
        {
            return Err(StateError::DanglingReference(root));
        }

        Ok(())
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec(self).map_err(|e| StateError::Encoding(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StateError> {
        serde_json::from_slice(bytes).map_err(|e| StateError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn record(id: ObjectId) -> ObjectRecord {
        ObjectRecord {
            id,
            type_name: String::from("test.Node"),
            fields: vec![FieldRecord {
                name: String::from("value"),
                value: Value::Uint(7),
            }],
        }
    }

    #[test]
    fn test_snapshot_creation() {
        let snapshot = Snapshot::new();
        assert_eq!(snapshot.version, Snapshot::CURRENT_VERSION);
        assert_eq!(snapshot.object_count(), 0);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut snapshot = Snapshot::new();
        snapshot.records.push(record(0));
        snapshot.roots.push(0);

        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(restored.records[0].field_names(), vec![String::from("value")]);
    }

    #[test]
    fn test_snapshot_rejects_newer_version() {
        let mut snapshot = Snapshot::new();
        snapshot.version = Snapshot::CURRENT_VERSION + 1;
        assert!(matches!(
            snapshot.validate(),
            Err(StateError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_snapshot_rejects_out_of_order_ids() {
        let mut snapshot = Snapshot::new();
        snapshot.records.push(record(1));
        assert!(matches!(
            snapshot.validate(),
            Err(StateError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_dangling_root() {
        let mut snapshot = Snapshot::new();
        snapshot.records.push(record(0));
        snapshot.roots.push(3);
        assert_eq!(snapshot.validate(), Err(StateError::DanglingReference(3)));
    }

    #[test]
    fn test_garbage_json_is_an_encoding_error() {
        assert!(matches!(
            Snapshot::from_json(b"{not json"),
            Err(StateError::Encoding(_))
        ));
    }
}
