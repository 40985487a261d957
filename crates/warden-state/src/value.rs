//! Field values and their encoding.
//!
//! [`StateValue`] converts a Rust field into a [`Value`] tree and back.
//! Object references are the only values that need the engine: encoding one
//! goes through the saver's identity table, decoding one goes through the
//! loader's arena of pre-allocated objects.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::object::{AnyObject, ObjectRef, Stateful};
use crate::snapshot::ObjectId;

/// A saved field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent optional value
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Str(String),
    Seq(Vec<Value>),
    /// Ordered key/value pairs
    Map(Vec<(Value, Value)>),
    /// Back-reference to an object record
    Ref(ObjectId),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Ref(_) => "reference",
        }
    }

    fn invalid(&self, expected: &'static str) -> StateError {
        StateError::InvalidValue {
            expected,
            found: self.kind(),
        }
    }
}

/// Assigns sequence numbers to objects met while saving.
pub(crate) trait IdentityTable {
    fn identify(&mut self, object: AnyObject) -> Result<ObjectId, StateError>;
}

/// Save-side view of the engine handed to [`StateValue::encode`].
pub struct Encoder<'a> {
    table: &'a mut dyn IdentityTable,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(table: &'a mut dyn IdentityTable) -> Self {
        Self { table }
    }

    /// Sequence number for `object`, queueing it for saving on first sight.
    pub fn reference<T: Stateful>(&mut self, object: &ObjectRef<T>) -> Result<ObjectId, StateError> {
        self.table.identify(AnyObject::from_ref(object))
    }
}

/// Load-side view of the engine handed to [`StateValue::decode`].
pub struct Decoder<'a> {
    arena: &'a [AnyObject],
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(arena: &'a [AnyObject]) -> Self {
        Self { arena }
    }

    /// The reconstructed instance for sequence number `id`.
    ///
    /// The instance may not be populated yet when `id` is part of a cycle.
    pub fn object<T: Stateful>(&self, id: ObjectId) -> Result<ObjectRef<T>, StateError> {
        let object = self
            .arena
            .get(id as usize)
            .ok_or(StateError::DanglingReference(id))?;
        object.downcast::<T>().ok_or(StateError::TypeMismatch {
            id,
            expected: T::TYPE_NAME,
            found: object.type_name(),
        })
    }
}

/// A field type that can be saved and loaded.
pub trait StateValue: Sized {
    /// Convert to a snapshot value.
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError>;

    /// Rebuild from a snapshot value.
    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError>;
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl StateValue for $t {
            fn encode(&self, _: &mut Encoder<'_>) -> Result<Value, StateError> {
                Ok(Value::Uint(*self as u64))
            }

            fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, StateError> {
                match value {
                    Value::Uint(v) => <$t>::try_from(*v).map_err(|_| StateError::InvalidValue {
                        expected: stringify!($t),
                        found: "out of range uint",
                    }),
                    other => Err(other.invalid(stringify!($t))),
                }
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl StateValue for $t {
            fn encode(&self, _: &mut Encoder<'_>) -> Result<Value, StateError> {
                Ok(Value::Int(*self as i64))
            }

            fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, StateError> {
                match value {
                    Value::Int(v) => <$t>::try_from(*v).map_err(|_| StateError::InvalidValue {
                        expected: stringify!($t),
                        found: "out of range int",
                    }),
                    other => Err(other.invalid(stringify!($t))),
                }
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, usize);
impl_signed!(i8, i16, i32, i64);

impl StateValue for bool {
    fn encode(&self, _: &mut Encoder<'_>) -> Result<Value, StateError> {
        Ok(Value::Bool(*self))
    }

    fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(other.invalid("bool")),
        }
    }
}

impl StateValue for String {
    fn encode(&self, _: &mut Encoder<'_>) -> Result<Value, StateError> {
        Ok(Value::Str(self.clone()))
    }

    fn decode(value: &Value, _: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(other.invalid("string")),
        }
    }
}

impl<T: StateValue> StateValue for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        match self {
            Some(inner) => inner.encode(enc),
            None => Ok(Value::Null),
        }
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, dec).map(Some),
        }
    }
}

impl<T: StateValue> StateValue for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        self.iter()
            .map(|item| item.encode(enc))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq)
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Seq(items) => items.iter().map(|item| T::decode(item, dec)).collect(),
            other => Err(other.invalid("sequence")),
        }
    }
}

impl<T: StateValue + Ord> StateValue for BTreeSet<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        self.iter()
            .map(|item| item.encode(enc))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq)
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Seq(items) => items.iter().map(|item| T::decode(item, dec)).collect(),
            other => Err(other.invalid("sequence")),
        }
    }
}

impl<K: StateValue + Ord, V: StateValue> StateValue for BTreeMap<K, V> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        let mut pairs = Vec::with_capacity(self.len());
        for (k, v) in self {
            pairs.push((k.encode(enc)?, v.encode(enc)?));
        }
        Ok(Value::Map(pairs))
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| Ok((K::decode(k, dec)?, V::decode(v, dec)?)))
                .collect(),
            other => Err(other.invalid("map")),
        }
    }
}

impl<T: Stateful> StateValue for ObjectRef<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<Value, StateError> {
        enc.reference(self).map(Value::Ref)
    }

    fn decode(value: &Value, dec: &Decoder<'_>) -> Result<Self, StateError> {
        match value {
            Value::Ref(id) => dec.object::<T>(*id),
            other => Err(other.invalid("reference")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    struct NoObjects;

    impl IdentityTable for NoObjects {
        fn identify(&mut self, _: AnyObject) -> Result<ObjectId, StateError> {
            Err(StateError::MalformedSnapshot(String::from("no objects expected")))
        }
    }

    fn encode<V: StateValue>(value: &V) -> Value {
        let mut table = NoObjects;
        value.encode(&mut Encoder::new(&mut table)).unwrap()
    }

    fn decode<V: StateValue>(value: &Value) -> Result<V, StateError> {
        V::decode(value, &Decoder::new(&[]))
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&42u32), Value::Uint(42));
        assert_eq!(encode(&-3i32), Value::Int(-3));
        assert_eq!(encode(&true), Value::Bool(true));
        assert_eq!(encode(&String::from("x")), Value::Str(String::from("x")));
        assert_eq!(decode::<u16>(&Value::Uint(7)).unwrap(), 7);
        assert_eq!(decode::<i64>(&Value::Int(-9)).unwrap(), -9);
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        assert!(matches!(
            decode::<u8>(&Value::Uint(300)),
            Err(StateError::InvalidValue { expected: "u8", .. })
        ));
        assert!(matches!(
            decode::<i8>(&Value::Int(-200)),
            Err(StateError::InvalidValue { expected: "i8", .. })
        ));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        assert_eq!(
            decode::<bool>(&Value::Uint(1)),
            Err(StateError::InvalidValue {
                expected: "bool",
                found: "uint"
            })
        );
    }

    #[test]
    fn test_containers() {
        let mut map = BTreeMap::new();
        map.insert(1i32, BTreeSet::from([0i32, 5]));
        let value = encode(&map);
        assert_eq!(
            value,
            Value::Map(vec![(
                Value::Int(1),
                Value::Seq(vec![Value::Int(0), Value::Int(5)])
            )])
        );
        assert_eq!(decode::<BTreeMap<i32, BTreeSet<i32>>>(&value).unwrap(), map);

        assert_eq!(encode(&Option::<u8>::None), Value::Null);
        assert_eq!(decode::<Option<u8>>(&Value::Uint(4)).unwrap(), Some(4));
        assert_eq!(decode::<Vec<u8>>(&encode(&vec![1u8, 2])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_reference_without_arena_is_dangling() {
        #[derive(Default)]
        struct Leaf;

        impl Stateful for Leaf {
            const TYPE_NAME: &'static str = "test.Leaf";
            const FIELDS: &'static [&'static str] = &[];

            fn save(&self, _: &mut crate::Sink<'_>) -> Result<(), StateError> {
                Ok(())
            }

            fn load(&mut self, _: &mut crate::Source<'_>) -> Result<(), StateError> {
                Ok(())
            }
        }

        assert!(matches!(
            decode::<ObjectRef<Leaf>>(&Value::Ref(0)),
            Err(StateError::DanglingReference(0))
        ));
    }
}
