//! Serde deserializer for converting ColferValue to Rust types.

use serde::de::value::{BorrowedStrDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};

use super::error::SerdeError;
use crate::value::{ColferValue, Record, Timestamp};

/// Deserializer over one field value.
pub struct ValueDeserializer<'de> {
    value: &'de ColferValue,
}

impl<'de> ValueDeserializer<'de> {
    pub fn new(value: &'de ColferValue) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = SerdeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            ColferValue::Bool(v) => visitor.visit_bool(*v),
            ColferValue::Uint32(v) => visitor.visit_u32(*v),
            ColferValue::Int32(v) => visitor.visit_i32(*v),
            ColferValue::Uint64(v) => visitor.visit_u64(*v),
            ColferValue::Int64(v) => visitor.visit_i64(*v),
            ColferValue::Float32(v) => visitor.visit_f32(*v),
            ColferValue::Float64(v) => visitor.visit_f64(*v),
            ColferValue::Timestamp(t) => visitor.visit_map(TimestampAccess::new(*t)),
            ColferValue::Text(v) => visitor.visit_borrowed_str(v),
            ColferValue::Binary(v) => visitor.visit_borrowed_bytes(v),
            ColferValue::Record(r) => RecordDeserializer::new(r.as_deref()).deserialize_any(visitor),
            ColferValue::List(items) => visitor.visit_seq(ListAccess { items, index: 0 }),
        }
    }

    /// Zero values read as `None`.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.value.is_zero() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            ColferValue::Binary(v) => {
                let mut seq = SeqDeserializer::<_, SerdeError>::new(v.iter().copied());
                let out = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(out)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf tuple tuple_struct map struct enum identifier ignored_any
    }
}

/// Deserializer over a record reference, present or not.
pub struct RecordDeserializer<'de> {
    record: Option<&'de Record>,
}

impl<'de> RecordDeserializer<'de> {
    pub fn new(record: Option<&'de Record>) -> Self {
        RecordDeserializer { record }
    }
}

impl<'de> de::Deserializer<'de> for RecordDeserializer<'de> {
    type Error = SerdeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.record {
            Some(record) => visitor.visit_map(RecordAccess { record, index: 0 }),
            None => visitor.visit_none(),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.record {
            Some(_) => visitor.visit_some(self),
            None => visitor.visit_none(),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}

/// Field-by-field access to a record, in index order.
struct RecordAccess<'de> {
    record: &'de Record,
    index: usize,
}

impl<'de> MapAccess<'de> for RecordAccess<'de> {
    type Error = SerdeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.record.field_at(self.index) {
            Some((name, _)) => seed
                .deserialize(BorrowedStrDeserializer::<SerdeError>::new(name))
                .map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        let (_, value) = self
            .record
            .field_at(self.index)
            .ok_or_else(|| SerdeError::Custom("value requested past the last field".into()))?;
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.record.len() - self.index)
    }
}

struct ListAccess<'de> {
    items: &'de [Option<Record>],
    index: usize,
}

impl<'de> SeqAccess<'de> for ListAccess<'de> {
    type Error = SerdeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        match self.items.get(self.index) {
            Some(item) => {
                self.index += 1;
                seed.deserialize(RecordDeserializer::new(item.as_ref()))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len() - self.index)
    }
}

/// Presents a timestamp as a `{ seconds, nanos }` map.
struct TimestampAccess {
    value: Timestamp,
    index: usize,
}

impl TimestampAccess {
    fn new(value: Timestamp) -> Self {
        TimestampAccess { value, index: 0 }
    }
}

impl<'de> MapAccess<'de> for TimestampAccess {
    type Error = SerdeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let key = match self.index {
            0 => "seconds",
            1 => "nanos",
            _ => return Ok(None),
        };
        seed.deserialize(BorrowedStrDeserializer::<SerdeError>::new(key)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        self.index += 1;
        match self.index {
            1 => seed.deserialize(<i64 as IntoDeserializer<'de, SerdeError>>::into_deserializer(
                self.value.seconds(),
            )),
            _ => seed.deserialize(<u32 as IntoDeserializer<'de, SerdeError>>::into_deserializer(
                self.value.nanos(),
            )),
        }
    }
}
