//! Graph save and load.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::StateError;
use crate::object::{AnyObject, ObjectRef, Stateful};
use crate::registry::{TypeEntry, TypeRegistry};
use crate::snapshot::{FieldRecord, ObjectId, ObjectRecord, Snapshot};
use crate::value::{Decoder, Encoder, IdentityTable, StateValue};

/// Where an object is in one save or load pass.
///
/// Save walks `Unseen → Identified → FieldsPopulated → PostProcessed`,
/// load walks `Unseen → Allocated → FieldsPopulated → PostProcessed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unseen,
    Identified,
    Allocated,
    FieldsPopulated,
    PostProcessed,
}

impl Lifecycle {
    fn can_advance_to(self, to: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, to),
            (Unseen, Identified)
                | (Unseen, Allocated)
                | (Identified, FieldsPopulated)
                | (Allocated, FieldsPopulated)
                | (FieldsPopulated, PostProcessed)
        )
    }
}

#[derive(Default)]
struct LifecycleTable {
    states: Vec<Lifecycle>,
}

impl LifecycleTable {
    fn with_len(len: usize) -> Self {
        Self {
            states: alloc::vec![Lifecycle::Unseen; len],
        }
    }

    fn track(&mut self) -> ObjectId {
        self.states.push(Lifecycle::Unseen);
        (self.states.len() - 1) as ObjectId
    }

    fn advance(&mut self, id: ObjectId, to: Lifecycle) -> Result<(), StateError> {
        let state = self
            .states
            .get_mut(id as usize)
            .ok_or(StateError::DanglingReference(id))?;
        if !state.can_advance_to(to) {
            return Err(StateError::Lifecycle {
                id,
                from: *state,
                to,
            });
        }
        *state = to;
        Ok(())
    }
}

/// Receives the fields of one object while it is saved.
pub struct Sink<'a> {
    enc: Encoder<'a>,
    fields: Vec<FieldRecord>,
}

impl<'a> Sink<'a> {
    fn new(enc: Encoder<'a>) -> Self {
        Self {
            enc,
            fields: Vec::new(),
        }
    }

    /// Emit the next field.
    pub fn save<V: StateValue>(&mut self, name: &'static str, value: &V) -> Result<(), StateError> {
        let value = value.encode(&mut self.enc)?;
        self.fields.push(FieldRecord {
            name: name.into(),
            value,
        });
        Ok(())
    }

    fn into_fields(self) -> Vec<FieldRecord> {
        self.fields
    }
}

/// Yields the stored fields of one object while it is loaded.
pub struct Source<'a> {
    type_name: &'static str,
    expected: &'static [&'static str],
    fields: &'a [FieldRecord],
    cursor: usize,
    dec: Decoder<'a>,
}

impl<'a> Source<'a> {
    fn new(entry: &TypeEntry, fields: &'a [FieldRecord], dec: Decoder<'a>) -> Self {
        Self {
            type_name: entry.name(),
            expected: entry.fields(),
            fields,
            cursor: 0,
            dec,
        }
    }

    /// Consume the next field, which must be called `name`.
    pub fn load<V: StateValue>(&mut self, name: &'static str) -> Result<V, StateError> {
        let field = match self.fields.get(self.cursor) {
            Some(field) if field.name == name => field,
            other => {
                return Err(self.mismatch(name, other.map(|f| f.name.clone())));
            }
        };
        self.cursor += 1;
        V::decode(&field.value, &self.dec)
    }

    /// Fails unless `load` consumed every stored field. `found` lists the
    /// fields that were consumed.
    fn finish(&self) -> Result<(), StateError> {
        if self.cursor == self.fields.len() {
            return Ok(());
        }
        Err(StateError::FieldMismatch {
            type_name: self.type_name.into(),
            expected: self.expected.iter().map(|&name| name.into()).collect(),
            found: self.fields[..self.cursor]
                .iter()
                .map(|f| f.name.clone())
                .collect(),
        })
    }

    fn mismatch(&self, expected: &str, found: Option<String>) -> StateError {
        StateError::FieldMismatch {
            type_name: self.type_name.into(),
            expected: alloc::vec![expected.into()],
            found: found.into_iter().collect(),
        }
    }
}

struct SaveContext<'r> {
    registry: &'r TypeRegistry,
    /// Allocation address → sequence number
    ids: BTreeMap<usize, ObjectId>,
    /// Holds every identified object alive so addresses stay unique
    objects: Vec<AnyObject>,
    lifecycle: LifecycleTable,
}

impl IdentityTable for SaveContext<'_> {
    fn identify(&mut self, object: AnyObject) -> Result<ObjectId, StateError> {
        if let Some(&id) = self.ids.get(&object.identity()) {
            return Ok(id);
        }
        if !self.registry.admits(&object) {
            return Err(StateError::UnregisteredType(object.type_name().into()));
        }

        let id = self.lifecycle.track();
        self.lifecycle.advance(id, Lifecycle::Identified)?;
        self.ids.insert(object.identity(), id);
        self.objects.push(object);
        Ok(id)
    }
}

fn check_fields(
    type_name: &str,
    expected: &[&'static str],
    found: &[FieldRecord],
) -> Result<(), StateError> {
    if expected.iter().copied().eq(found.iter().map(|f| f.name.as_str())) {
        return Ok(());
    }
    Err(StateError::FieldMismatch {
        type_name: type_name.into(),
        expected: expected.iter().map(|&name| name.into()).collect(),
        found: found.iter().map(|f| f.name.clone()).collect(),
    })
}

/// Save the graph reachable from `roots`.
///
/// Objects are numbered in discovery order starting at the roots. Every
/// reachable type must be registered in `registry`.
pub fn save(registry: &TypeRegistry, roots: &[AnyObject]) -> Result<Snapshot, StateError> {
    let mut ctx = SaveContext {
        registry,
        ids: BTreeMap::new(),
        objects: Vec::new(),
        lifecycle: LifecycleTable::default(),
    };
    let mut snapshot = Snapshot::new();

    for root in roots {
        let id = ctx.identify(root.clone())?;
        snapshot.roots.push(id);
    }

    let mut cursor = 0;
    while cursor < ctx.objects.len() {
        let object = ctx.objects[cursor].clone();
        let id = cursor as ObjectId;

        let mut sink = Sink::new(Encoder::new(&mut ctx));
        object.erased().save_fields(&mut sink)?;
        let fields = sink.into_fields();

        check_fields(object.type_name(), object.erased().fields(), &fields)?;
        ctx.lifecycle.advance(id, Lifecycle::FieldsPopulated)?;
        snapshot.records.push(ObjectRecord {
            id,
            type_name: object.type_name().into(),
            fields,
        });
        ctx.lifecycle.advance(id, Lifecycle::PostProcessed)?;
        cursor += 1;
    }

    log::debug!(
        "[state] saved {} objects from {} roots",
        snapshot.records.len(),
        snapshot.roots.len()
    );
    Ok(snapshot)
}

/// Objects reconstructed by [`load`].
#[derive(Debug)]
pub struct Restored {
    roots: Vec<(ObjectId, AnyObject)>,
    object_count: usize,
}

impl Restored {
    /// Root objects in the order they were saved.
    pub fn roots(&self) -> impl Iterator<Item = &AnyObject> + '_ {
        self.roots.iter().map(|(_, object)| object)
    }

    /// Number of objects reconstructed.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Typed handle to root `index`.
    pub fn root<T: Stateful>(&self, index: usize) -> Result<ObjectRef<T>, StateError> {
        let (id, object) = self
            .roots
            .get(index)
            .ok_or(StateError::DanglingReference(index as ObjectId))?;
        object.downcast::<T>().ok_or(StateError::TypeMismatch {
            id: *id,
            expected: T::TYPE_NAME,
            found: object.type_name(),
        })
    }
}

/// Reconstruct the graph stored in `snapshot`.
///
/// All objects are allocated first, then populated in sequence order, then
/// given `after_load` in sequence order. Nothing is returned unless every
/// phase succeeds.
pub fn load(registry: &TypeRegistry, snapshot: &Snapshot) -> Result<Restored, StateError> {
    snapshot.validate()?;

    let count = snapshot.records.len();
    let mut lifecycle = LifecycleTable::with_len(count);
    let mut arena = Vec::with_capacity(count);
    let mut entries = Vec::with_capacity(count);

    for record in &snapshot.records {
        let entry = registry.lookup(&record.type_name)?;
        check_fields(entry.name(), entry.fields(), &record.fields)?;
        arena.push(entry.construct());
        entries.push(entry);
        lifecycle.advance(record.id, Lifecycle::Allocated)?;
    }

    for (record, entry) in snapshot.records.iter().zip(&entries) {
        let mut source = Source::new(entry, &record.fields, Decoder::new(&arena));
        arena[record.id as usize].erased().load_fields(&mut source)?;
        source.finish()?;
        lifecycle.advance(record.id, Lifecycle::FieldsPopulated)?;
    }

    for (index, object) in arena.iter().enumerate() {
        object.erased().after_load();
        lifecycle.advance(index as ObjectId, Lifecycle::PostProcessed)?;
    }

    let roots = snapshot
        .roots
        .iter()
        .map(|&id| (id, arena[id as usize].clone()))
        .collect();

    log::debug!("[state] restored {} objects", count);
    Ok(Restored {
        roots,
        object_count: count,
    })
}
