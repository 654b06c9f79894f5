//! Field writers and the schema-driven record encoder.
//!
//! The `put_*` functions are the shared runtime core: the dynamic
//! [`marshal_record`] dispatches to them per field kind, and code generated by
//! `#[derive(Colfer)]` calls them directly. Each one writes nothing for a zero
//! value.

use crate::error::EncodeError;
use crate::limits::Limits;
use crate::types::{FieldKind, Schema, StructType};
use crate::value::{ColferValue, Record, Timestamp};

use super::wire::*;

/// Initial scratch size for the growing encoders.
const INITIAL_CAPACITY: usize = 256;

pub fn put_bool(w: &mut Writer<'_>, index: u8, v: bool) -> Result<(), EncodeError> {
    if v {
        w.put_header(index, false)?;
    }
    Ok(())
}

pub fn put_uint32(w: &mut Writer<'_>, index: u8, v: u32) -> Result<(), EncodeError> {
    if v == 0 {
        return Ok(());
    }
    if v >= UINT32_FIXED_MIN {
        w.put_header(index, true)?;
        w.put_u32_be(v)
    } else {
        w.put_header(index, false)?;
        w.put_varint32(v)
    }
}

pub fn put_uint64(w: &mut Writer<'_>, index: u8, v: u64) -> Result<(), EncodeError> {
    if v == 0 {
        return Ok(());
    }
    if v >= UINT64_FIXED_MIN {
        w.put_header(index, true)?;
        w.put_u64_be(v)
    } else {
        w.put_header(index, false)?;
        w.put_varint64(v)
    }
}

/// The variant flag carries the sign; the payload is the magnitude.
pub fn put_int32(w: &mut Writer<'_>, index: u8, v: i32) -> Result<(), EncodeError> {
    if v == 0 {
        return Ok(());
    }
    w.put_header(index, v < 0)?;
    w.put_varint32(v.unsigned_abs())
}

pub fn put_int64(w: &mut Writer<'_>, index: u8, v: i64) -> Result<(), EncodeError> {
    if v == 0 {
        return Ok(());
    }
    w.put_header(index, v < 0)?;
    w.put_varint64(v.unsigned_abs())
}

pub fn put_float32(w: &mut Writer<'_>, index: u8, v: f32) -> Result<(), EncodeError> {
    if v == 0.0 {
        return Ok(());
    }
    w.put_header(index, false)?;
    w.put_u32_be(v.to_bits())
}

pub fn put_float64(w: &mut Writer<'_>, index: u8, v: f64) -> Result<(), EncodeError> {
    if v == 0.0 {
        return Ok(());
    }
    w.put_header(index, false)?;
    w.put_u64_be(v.to_bits())
}

/// Seconds in `0..2^32` take 4 bytes; anything else takes 8 with the variant flag.
pub fn put_timestamp(w: &mut Writer<'_>, index: u8, v: &Timestamp) -> Result<(), EncodeError> {
    if v.is_zero() {
        return Ok(());
    }
    let seconds = v.seconds();
    if (0..1i64 << 32).contains(&seconds) {
        w.put_header(index, false)?;
        w.put_u32_be(seconds as u32)?;
    } else {
        w.put_header(index, true)?;
        w.put_u64_be(seconds as u64)?;
    }
    w.put_u32_be(v.nanos())
}

pub fn put_text(w: &mut Writer<'_>, index: u8, v: &str, field: &str) -> Result<(), EncodeError> {
    put_bytes(w, index, v.as_bytes(), field)
}

pub fn put_binary(w: &mut Writer<'_>, index: u8, v: &[u8], field: &str) -> Result<(), EncodeError> {
    put_bytes(w, index, v, field)
}

fn put_bytes(w: &mut Writer<'_>, index: u8, v: &[u8], field: &str) -> Result<(), EncodeError> {
    if v.is_empty() {
        return Ok(());
    }
    let max = w.limits().size_max.min(u32::MAX as usize);
    if v.len() > max {
        log::debug!("colfer: field {} size {} exceeds {} bytes", field, v.len(), max);
        return Err(EncodeError::FieldSizeExceeded {
            field: field.to_string(),
            size: v.len(),
            max,
        });
    }
    w.put_header(index, false)?;
    w.put_varint32(v.len() as u32)?;
    w.put_slice(v)
}

/// Write the header and element count of a non-empty list.
pub fn put_list_header(
    w: &mut Writer<'_>,
    index: u8,
    len: usize,
    field: &str,
) -> Result<(), EncodeError> {
    let max = w.limits().list_max.min(u32::MAX as usize);
    if len > max {
        log::debug!("colfer: field {} length {} exceeds {} elements", field, len, max);
        return Err(EncodeError::ListLengthExceeded {
            field: field.to_string(),
            len,
            max,
        });
    }
    w.put_header(index, false)?;
    w.put_varint32(len as u32)
}

/// Encode `record` as a value of `ty`, including the trailing sentinel.
///
/// `None` slots in list fields are replaced in place with zero-valued records
/// before they are written.
pub fn marshal_record(
    schema: &Schema,
    ty: &StructType,
    record: &mut Record,
    w: &mut Writer<'_>,
) -> Result<(), EncodeError> {
    if !ty.is_named(record.type_name()) || record.len() != ty.fields.len() {
        return Err(EncodeError::RecordTypeMismatch {
            expected: ty.qualified_name(),
            actual: record.type_name().to_string(),
        });
    }

    for (field, value) in ty.fields.iter().zip(record.values_mut()) {
        let index = field.index;
        match (field.kind, value) {
            (FieldKind::Bool, ColferValue::Bool(v)) => put_bool(w, index, *v)?,
            (FieldKind::Uint32, ColferValue::Uint32(v)) => put_uint32(w, index, *v)?,
            (FieldKind::Int32, ColferValue::Int32(v)) => put_int32(w, index, *v)?,
            (FieldKind::Uint64, ColferValue::Uint64(v)) => put_uint64(w, index, *v)?,
            (FieldKind::Int64, ColferValue::Int64(v)) => put_int64(w, index, *v)?,
            (FieldKind::Float32, ColferValue::Float32(v)) => put_float32(w, index, *v)?,
            (FieldKind::Float64, ColferValue::Float64(v)) => put_float64(w, index, *v)?,
            (FieldKind::Timestamp, ColferValue::Timestamp(v)) => put_timestamp(w, index, v)?,
            (FieldKind::Text, ColferValue::Text(v)) => put_text(w, index, v, &field.name)?,
            (FieldKind::Binary, ColferValue::Binary(v)) => put_binary(w, index, v, &field.name)?,
            (FieldKind::Record(idx), ColferValue::Record(slot)) => {
                if let Some(child) = slot {
                    w.put_header(index, false)?;
                    let child_ty = schema.target(idx);
                    w.nested(|w| marshal_record(schema, child_ty, child, w))?;
                }
            }
            (FieldKind::List(idx), ColferValue::List(items)) => {
                if !items.is_empty() {
                    put_list_header(w, index, items.len(), &field.name)?;
                    let elem_ty = schema.target(idx);
                    for slot in items.iter_mut() {
                        let child = slot.get_or_insert_with(|| Record::new(elem_ty));
                        w.nested(|w| marshal_record(schema, elem_ty, child, w))?;
                    }
                }
            }
            (kind, value) => {
                return Err(EncodeError::TypeMismatch {
                    field: field.name.clone(),
                    expected: kind.name(),
                    actual: value.kind_name(),
                });
            }
        }
    }

    w.put_sentinel()
}

/// Run `marshal` against a scratch buffer, doubling it on overflow.
///
/// The limit check in [`Writer`] precedes the capacity check, so the buffer
/// never needs to grow much past `limits.size_max`.
pub fn marshal_to_vec<F>(limits: &Limits, mut marshal: F) -> Result<Vec<u8>, EncodeError>
where
    F: FnMut(&mut Writer<'_>) -> Result<(), EncodeError>,
{
    let mut capacity = INITIAL_CAPACITY;
    loop {
        let mut buf = vec![0u8; capacity];
        let mut w = Writer::new(&mut buf, 0, *limits);
        match marshal(&mut w) {
            Ok(()) => {
                let n = w.position();
                buf.truncate(n);
                return Ok(buf);
            }
            Err(EncodeError::BufferOverflow { needed, .. }) => {
                capacity = capacity.saturating_mul(2).max(needed);
            }
            Err(e) => return Err(e),
        }
    }
}
