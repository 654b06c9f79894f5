//! Serde serializer for converting Rust types to ColferValue.
//!
//! Serialization is directed by the schema: each value is produced for a known
//! field kind, so integers are range-checked into the declared width and
//! `None` becomes the kind's zero value.

use serde::ser::{self, Impossible, Serialize};

use super::error::SerdeError;
use crate::error::SchemaError;
use crate::types::{FieldKind, Schema, StructType};
use crate::value::{ColferValue, Record, Timestamp};

/// Serializer that produces the value of one schema field.
#[derive(Clone, Copy)]
pub struct ValueSerializer<'a> {
    schema: &'a Schema,
    kind: FieldKind,
    field: &'a str,
}

impl<'a> ValueSerializer<'a> {
    pub fn new(schema: &'a Schema, kind: FieldKind, field: &'a str) -> Self {
        ValueSerializer {
            schema,
            kind,
            field,
        }
    }

    fn mismatch(&self, actual: &'static str) -> SerdeError {
        SerdeError::TypeMismatch {
            field: self.field.to_string(),
            expected: self.kind.name(),
            actual,
        }
    }

    fn integer(&self, v: i128) -> Result<ColferValue, SerdeError> {
        let out_of_range = || SerdeError::OutOfRange {
            field: self.field.to_string(),
            kind: self.kind.name(),
            value: v,
        };
        match self.kind {
            FieldKind::Uint32 => u32::try_from(v)
                .map(ColferValue::Uint32)
                .map_err(|_| out_of_range()),
            FieldKind::Int32 => i32::try_from(v)
                .map(ColferValue::Int32)
                .map_err(|_| out_of_range()),
            FieldKind::Uint64 => u64::try_from(v)
                .map(ColferValue::Uint64)
                .map_err(|_| out_of_range()),
            FieldKind::Int64 => i64::try_from(v)
                .map(ColferValue::Int64)
                .map_err(|_| out_of_range()),
            _ => Err(self.mismatch("integer")),
        }
    }

    fn float(&self, v: f64) -> Result<ColferValue, SerdeError> {
        match self.kind {
            FieldKind::Float32 => Ok(ColferValue::Float32(v as f32)),
            FieldKind::Float64 => Ok(ColferValue::Float64(v)),
            _ => Err(self.mismatch("float")),
        }
    }

    fn text(&self, v: String) -> Result<ColferValue, SerdeError> {
        match self.kind {
            FieldKind::Text => Ok(ColferValue::Text(v)),
            _ => Err(self.mismatch("string")),
        }
    }

    fn unsupported(&self, what: &str) -> SerdeError {
        SerdeError::UnsupportedType(format!("{} for field '{}'", what, self.field))
    }
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = ColferValue;
    type Error = SerdeError;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = SeqSerializer<'a>;
    type SerializeTupleVariant = Impossible<ColferValue, SerdeError>;
    type SerializeMap = Impossible<ColferValue, SerdeError>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = Impossible<ColferValue, SerdeError>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        match self.kind {
            FieldKind::Bool => Ok(ColferValue::Bool(v)),
            _ => Err(self.mismatch("bool")),
        }
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        self.integer(v as i128)
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        self.float(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        self.float(v)
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        self.text(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        self.text(v.to_string())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        match self.kind {
            FieldKind::Binary => Ok(ColferValue::Binary(v.to_vec())),
            _ => Err(self.mismatch("bytes")),
        }
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(ColferValue::zero(self.kind))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(ColferValue::zero(self.kind))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        self.integer(variant_index as i128)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        Err(self.unsupported("enum variant with data"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        match self.kind {
            FieldKind::Binary | FieldKind::List(_) => Ok(SeqSerializer {
                schema: self.schema,
                kind: self.kind,
                field: self.field,
                bytes: Vec::new(),
                items: Vec::with_capacity(len.unwrap_or(0)),
            }),
            _ => Err(self.mismatch("sequence")),
        }
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(self.unsupported("enum tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(self.unsupported("map"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        match self.kind {
            FieldKind::Record(idx) => {
                let ty = self.schema.target(idx);
                Ok(StructSerializer::Record {
                    schema: self.schema,
                    ty,
                    record: Record::new(ty),
                })
            }
            FieldKind::Timestamp => Ok(StructSerializer::Timestamp {
                schema: self.schema,
                field: self.field,
                seconds: 0,
                nanos: 0,
            }),
            _ => Err(self.mismatch("struct")),
        }
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(self.unsupported("enum struct variant"))
    }
}

/// Collects a binary payload or the elements of a record list.
pub struct SeqSerializer<'a> {
    schema: &'a Schema,
    kind: FieldKind,
    field: &'a str,
    bytes: Vec<u8>,
    items: Vec<Option<Record>>,
}

impl<'a> ser::SerializeSeq for SeqSerializer<'a> {
    type Ok = ColferValue;
    type Error = SerdeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        match self.kind {
            FieldKind::List(idx) => {
                let elem = ValueSerializer::new(self.schema, FieldKind::Record(idx), self.field);
                match value.serialize(elem)? {
                    ColferValue::Record(slot) => self.items.push(slot.map(|r| *r)),
                    other => return Err(elem.mismatch(other.kind_name())),
                }
            }
            _ => {
                let elem = ValueSerializer::new(self.schema, FieldKind::Uint32, self.field);
                let v = value.serialize(elem)?;
                let b = v
                    .as_u32()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| SerdeError::TypeMismatch {
                        field: self.field.to_string(),
                        expected: "byte",
                        actual: v.kind_name(),
                    })?;
                self.bytes.push(b);
            }
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        match self.kind {
            FieldKind::List(_) => Ok(ColferValue::List(self.items)),
            _ => Ok(ColferValue::Binary(self.bytes)),
        }
    }
}

impl<'a> ser::SerializeTuple for SeqSerializer<'a> {
    type Ok = ColferValue;
    type Error = SerdeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleStruct for SeqSerializer<'a> {
    type Ok = ColferValue;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

/// Serializer for structs: schema records, or the timestamp pair.
pub enum StructSerializer<'a> {
    Record {
        schema: &'a Schema,
        ty: &'a StructType,
        record: Record,
    },
    Timestamp {
        schema: &'a Schema,
        field: &'a str,
        seconds: i64,
        nanos: u32,
    },
}

impl<'a> ser::SerializeStruct for StructSerializer<'a> {
    type Ok = ColferValue;
    type Error = SerdeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        match self {
            StructSerializer::Record { schema, ty, record } => {
                let field = ty
                    .find_field_by_name(key)
                    .ok_or_else(|| SchemaError::UnknownField {
                        type_name: ty.qualified_name(),
                        field_name: key.to_string(),
                    })?;
                let v = value.serialize(ValueSerializer::new(*schema, field.kind, &field.name))?;
                record.set(key, v)?;
            }
            StructSerializer::Timestamp {
                schema,
                field,
                seconds,
                nanos,
            } => match key {
                "seconds" => {
                    let v = value.serialize(ValueSerializer::new(*schema, FieldKind::Int64, *field))?;
                    *seconds = v.as_i64().unwrap_or_default();
                }
                "nanos" => {
                    let v = value.serialize(ValueSerializer::new(*schema, FieldKind::Uint32, *field))?;
                    *nanos = v.as_u32().unwrap_or_default();
                }
                other => {
                    return Err(SerdeError::Custom(format!(
                        "unknown timestamp component '{}' for field '{}'",
                        other, field
                    )))
                }
            },
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        match self {
            StructSerializer::Record { record, .. } => {
                Ok(ColferValue::Record(Some(Box::new(record))))
            }
            StructSerializer::Timestamp { seconds, nanos, .. } => {
                Ok(ColferValue::Timestamp(Timestamp::new(seconds, nanos)))
            }
        }
    }
}
