//! Field readers and the schema-driven record decoder.
//!
//! Decoding is a single forward merge between the declared fields and the
//! headers found in the data. Every reader takes the current header byte; when
//! it belongs to the reader's field the payload is consumed and the next header
//! is read in its place. Whatever header remains after the last declared field
//! must be the sentinel.

use crate::error::DecodeError;
use crate::types::{FieldKind, Schema, StructType};
use crate::value::{ColferValue, Record, Timestamp};

use super::wire::*;

const MAX_LIST_PREALLOCATION: usize = 1024;

fn matches_plain(header: u8, index: u8) -> bool {
    header == index
}

/// Returns `Some(variant)` when `header` belongs to `index`.
fn matches_variant(header: u8, index: u8) -> Option<bool> {
    if header == index {
        Some(false)
    } else if header == index | VARIANT_FLAG {
        Some(true)
    } else {
        None
    }
}

pub fn get_bool(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<bool>, DecodeError> {
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    *header = r.get_u8()?;
    Ok(Some(true))
}

pub fn get_uint32(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<u32>, DecodeError> {
    let v = match matches_variant(*header, index) {
        None => return Ok(None),
        Some(true) => r.get_u32_be()?,
        Some(false) => r.get_varint32()?,
    };
    *header = r.get_u8()?;
    Ok(Some(v))
}

pub fn get_uint64(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<u64>, DecodeError> {
    let v = match matches_variant(*header, index) {
        None => return Ok(None),
        Some(true) => r.get_u64_be()?,
        Some(false) => r.get_varint64()?,
    };
    *header = r.get_u8()?;
    Ok(Some(v))
}

pub fn get_int32(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<i32>, DecodeError> {
    let negative = match matches_variant(*header, index) {
        None => return Ok(None),
        Some(flag) => flag,
    };
    let magnitude = r.get_varint32()? as i32;
    *header = r.get_u8()?;
    Ok(Some(if negative { magnitude.wrapping_neg() } else { magnitude }))
}

pub fn get_int64(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<i64>, DecodeError> {
    let negative = match matches_variant(*header, index) {
        None => return Ok(None),
        Some(flag) => flag,
    };
    let magnitude = r.get_varint64()? as i64;
    *header = r.get_u8()?;
    Ok(Some(if negative { magnitude.wrapping_neg() } else { magnitude }))
}

pub fn get_float32(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<f32>, DecodeError> {
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let v = f32::from_bits(r.get_u32_be()?);
    *header = r.get_u8()?;
    Ok(Some(v))
}

pub fn get_float64(r: &mut Reader<'_>, header: &mut u8, index: u8) -> Result<Option<f64>, DecodeError> {
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let v = f64::from_bits(r.get_u64_be()?);
    *header = r.get_u8()?;
    Ok(Some(v))
}

/// Nanoseconds of a second or more are carried into the seconds.
pub fn get_timestamp(
    r: &mut Reader<'_>,
    header: &mut u8,
    index: u8,
) -> Result<Option<Timestamp>, DecodeError> {
    let seconds = match matches_variant(*header, index) {
        None => return Ok(None),
        Some(true) => r.get_u64_be()? as i64,
        Some(false) => r.get_u32_be()? as i64,
    };
    let nanos = r.get_u32_be()?;
    *header = r.get_u8()?;
    Ok(Some(Timestamp::new(seconds, nanos)))
}

pub fn get_text(
    r: &mut Reader<'_>,
    header: &mut u8,
    index: u8,
    field: &str,
) -> Result<Option<String>, DecodeError> {
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let data = get_payload(r, field)?;
    let s = std::str::from_utf8(data).map_err(|source| DecodeError::InvalidUtf8 {
        field: field.to_string(),
        source,
    })?;
    let v = s.to_owned();
    *header = r.get_u8()?;
    Ok(Some(v))
}

pub fn get_binary(
    r: &mut Reader<'_>,
    header: &mut u8,
    index: u8,
    field: &str,
) -> Result<Option<Vec<u8>>, DecodeError> {
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let v = get_payload(r, field)?.to_vec();
    *header = r.get_u8()?;
    Ok(Some(v))
}

/// Length-prefixed payload, checked against the size limit before any copy.
fn get_payload<'a>(r: &mut Reader<'a>, field: &str) -> Result<&'a [u8], DecodeError> {
    let size = r.get_varint32()? as usize;
    let max = r.limits().size_max;
    if size > max {
        log::debug!("colfer: field {} size {} exceeds {} bytes", field, size, max);
        return Err(DecodeError::FieldSizeExceeded {
            field: field.to_string(),
            size,
            max,
        });
    }
    r.take(size)
}

/// Read a nested record with `read` when the header belongs to `index`.
pub fn get_nested<T, F>(
    r: &mut Reader<'_>,
    header: &mut u8,
    index: u8,
    read: F,
) -> Result<Option<T>, DecodeError>
where
    F: FnOnce(&mut Reader<'_>) -> Result<T, DecodeError>,
{
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let v = r.nested(read)?;
    *header = r.get_u8()?;
    Ok(Some(v))
}

/// Read a list of nested records, one call to `read` per element.
pub fn get_list<T, F>(
    r: &mut Reader<'_>,
    header: &mut u8,
    index: u8,
    field: &str,
    mut read: F,
) -> Result<Option<Vec<T>>, DecodeError>
where
    F: FnMut(&mut Reader<'_>) -> Result<T, DecodeError>,
{
    if !matches_plain(*header, index) {
        return Ok(None);
    }
    let len = get_list_len(r, field)?;
    let mut items = Vec::with_capacity(list_preallocation(len, r.remaining()));
    for _ in 0..len {
        items.push(r.nested(&mut read)?);
    }
    *header = r.get_u8()?;
    Ok(Some(items))
}

/// Elements reserved before any is read. Every element takes at least its
/// sentinel byte, and larger lists grow as elements arrive.
fn list_preallocation(len: usize, remaining: usize) -> usize {
    len.min(remaining).min(MAX_LIST_PREALLOCATION)
}

fn get_list_len(r: &mut Reader<'_>, field: &str) -> Result<usize, DecodeError> {
    let len = r.get_varint32()? as usize;
    let max = r.limits().list_max;
    if len > max {
        log::debug!("colfer: field {} length {} exceeds {} elements", field, len, max);
        return Err(DecodeError::ListLengthExceeded {
            field: field.to_string(),
            len,
            max,
        });
    }
    Ok(len)
}

/// Fail unless the header left over after the last field is the sentinel.
pub fn expect_sentinel(r: &Reader<'_>, header: u8) -> Result<(), DecodeError> {
    if header == SENTINEL {
        return Ok(());
    }
    let offset = r.position() - 1;
    log::debug!("colfer: unknown header 0x{:02x} at byte {}", header, offset);
    Err(DecodeError::UnknownHeader { header, offset })
}

/// Decode one record of type `ty`, including its sentinel.
pub fn unmarshal_record(
    schema: &Schema,
    ty: &StructType,
    r: &mut Reader<'_>,
) -> Result<Record, DecodeError> {
    let mut record = Record::new(ty);
    let mut header = r.get_u8()?;

    for (field, value) in ty.fields.iter().zip(record.values_mut()) {
        let index = field.index;
        let h = &mut header;
        let decoded = match field.kind {
            FieldKind::Bool => get_bool(r, h, index)?.map(ColferValue::Bool),
            FieldKind::Uint32 => get_uint32(r, h, index)?.map(ColferValue::Uint32),
            FieldKind::Int32 => get_int32(r, h, index)?.map(ColferValue::Int32),
            FieldKind::Uint64 => get_uint64(r, h, index)?.map(ColferValue::Uint64),
            FieldKind::Int64 => get_int64(r, h, index)?.map(ColferValue::Int64),
            FieldKind::Float32 => get_float32(r, h, index)?.map(ColferValue::Float32),
            FieldKind::Float64 => get_float64(r, h, index)?.map(ColferValue::Float64),
            FieldKind::Timestamp => get_timestamp(r, h, index)?.map(ColferValue::Timestamp),
            FieldKind::Text => get_text(r, h, index, &field.name)?.map(ColferValue::Text),
            FieldKind::Binary => get_binary(r, h, index, &field.name)?.map(ColferValue::Binary),
            FieldKind::Record(idx) => {
                let child_ty = schema.target(idx);
                get_nested(r, h, index, |r| unmarshal_record(schema, child_ty, r))?
                    .map(|child| ColferValue::Record(Some(Box::new(child))))
            }
            FieldKind::List(idx) => {
                let elem_ty = schema.target(idx);
                get_list(r, h, index, &field.name, |r| {
                    unmarshal_record(schema, elem_ty, r).map(Some)
                })?
                .map(ColferValue::List)
            }
        };
        if let Some(v) = decoded {
            *value = v;
        }
    }

    expect_sentinel(r, header)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;

    fn reader(data: &[u8]) -> Reader<'_> {
        Reader::new(data, 0, Limits::default())
    }

    #[test]
    fn test_absent_field_consumes_nothing() {
        let data = [0x7f];
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        assert_eq!(get_uint32(&mut r, &mut header, 0).unwrap(), None);
        assert_eq!(get_text(&mut r, &mut header, 1, "s").unwrap(), None);
        assert_eq!(r.position(), 1);
        assert!(expect_sentinel(&r, header).is_ok());
    }

    #[test]
    fn test_uint32_both_variants() {
        let data = [0x00, 0x05, 0x81, 0x00, 0x20, 0x00, 0x00, 0x7f];
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        assert_eq!(get_uint32(&mut r, &mut header, 0).unwrap(), Some(5));
        assert_eq!(get_uint32(&mut r, &mut header, 1).unwrap(), Some(0x0020_0000));
        assert_eq!(header, SENTINEL);
    }

    #[test]
    fn test_signed_flag() {
        let data = [0x80, 0x2a, 0x7f];
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        assert_eq!(get_int32(&mut r, &mut header, 0).unwrap(), Some(-42));

        let min = [0x80, 0x80, 0x80, 0x80, 0x80, 0x08, 0x7f];
        let mut r = reader(&min);
        let mut header = r.get_u8().unwrap();
        assert_eq!(get_int32(&mut r, &mut header, 0).unwrap(), Some(i32::MIN));
    }

    #[test]
    fn test_timestamp_nanos_carry() {
        // 1.5e9 nanos carries one second.
        let data = [0x00, 0, 0, 0, 1, 0x59, 0x68, 0x2f, 0x00, 0x7f];
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        let t = get_timestamp(&mut r, &mut header, 0).unwrap().unwrap();
        assert_eq!(t, Timestamp::new(2, 500_000_000));
    }

    #[test]
    fn test_text_size_checked_before_allocation() {
        // Length prefix claims 2^32 - 1 bytes.
        let data = [0x00, 0xff, 0xff, 0xff, 0xff, 0x0f];
        let mut r = Reader::new(&data, 0, Limits::new(1024, 16));
        let mut header = r.get_u8().unwrap();
        assert!(matches!(
            get_text(&mut r, &mut header, 0, "name"),
            Err(DecodeError::FieldSizeExceeded { size: 0xffff_ffff, max: 1024, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let data = [0x00, 0x02, 0xc3, 0x28, 0x7f];
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        assert!(matches!(
            get_text(&mut r, &mut header, 0, "name"),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_list_count_limit() {
        let data = [0x00, 0x09, 0x7f];
        let mut r = Reader::new(&data, 0, Limits::new(1024, 8));
        let mut header = r.get_u8().unwrap();
        let res = get_list(&mut r, &mut header, 0, "kids", |r| r.get_u8());
        assert!(matches!(
            res,
            Err(DecodeError::ListLengthExceeded { len: 9, max: 8, .. })
        ));
    }

    #[test]
    fn test_list_preallocation_is_capped() {
        assert_eq!(list_preallocation(3, 100), 3);
        assert_eq!(list_preallocation(100, 3), 3);
        assert_eq!(list_preallocation(65_536, 70_000), MAX_LIST_PREALLOCATION);
    }

    #[test]
    fn test_large_list_grows_past_preallocation() {
        let mut data = vec![0x00, 0x80, 0x10];
        data.extend(std::iter::repeat(0x7f).take(2048 + 1));
        let mut r = reader(&data);
        let mut header = r.get_u8().unwrap();
        let items = get_list(&mut r, &mut header, 0, "kids", |r| r.get_u8())
            .unwrap()
            .unwrap();
        assert_eq!(items.len(), 2048);
        assert_eq!(header, SENTINEL);
    }

    #[test]
    fn test_list_elements_count_towards_depth() {
        // Two levels of single-element lists under index 0.
        let data = [0x00, 0x01, 0x00, 0x01, 0x7f, 0x7f, 0x7f];
        fn read_level(r: &mut Reader<'_>) -> Result<usize, DecodeError> {
            let mut header = r.get_u8()?;
            let inner = get_list(r, &mut header, 0, "kids", read_level)?;
            expect_sentinel(r, header)?;
            Ok(inner.map_or(0, |items| 1 + items[0]))
        }

        let mut r = Reader::new(&data, 0, Limits::default().with_depth_max(2));
        assert_eq!(read_level(&mut r).unwrap(), 2);

        let mut r = Reader::new(&data, 0, Limits::default().with_depth_max(1));
        assert!(matches!(
            read_level(&mut r),
            Err(DecodeError::DepthExceeded { max: 1, .. })
        ));
    }

    #[test]
    fn test_unexpected_header() {
        let data = [0x05, 0x01];
        let mut r = reader(&data);
        let header = r.get_u8().unwrap();
        assert!(matches!(
            expect_sentinel(&r, header),
            Err(DecodeError::UnknownHeader { header: 0x05, offset: 0 })
        ));
    }
}
