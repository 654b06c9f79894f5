//! Schema-driven encoding and decoding of [`Record`] values.
//!
//! [`Codec`] pairs a schema with the [`Limits`] to enforce. The free functions
//! [`encode`] and [`decode`] use the process-wide limits.

pub mod wire;
pub mod encoder;
pub mod decoder;

pub use wire::{Reader, Writer};

use crate::error::{DecodeError, EncodeError};
use crate::limits::Limits;
use crate::types::{Schema, StructType};
use crate::value::Record;

/// Encoder and decoder bound to a schema and a set of limits.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'s> {
    schema: &'s Schema,
    limits: Limits,
}

impl<'s> Codec<'s> {
    /// Bind to `schema` with a snapshot of the process-wide limits.
    pub fn new(schema: &'s Schema) -> Self {
        Codec {
            schema,
            limits: Limits::current(),
        }
    }

    pub fn with_limits(schema: &'s Schema, limits: Limits) -> Self {
        Codec { schema, limits }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Encode `record` into `buf` starting at `offset`, returning the end
    /// position.
    ///
    /// Fails with [`EncodeError::BufferOverflow`] when `buf` is too small; the
    /// bytes written so far are unspecified. `None` slots in list fields are
    /// replaced with zero-valued records.
    pub fn marshal(
        &self,
        ty: &StructType,
        record: &mut Record,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize, EncodeError> {
        self.check_encode_type(ty)?;
        let mut w = Writer::new(buf, offset, self.limits);
        encoder::marshal_record(self.schema, ty, record, &mut w)?;
        log::trace!(
            "colfer: marshalled {} in {} bytes",
            record.type_name(),
            w.written()
        );
        Ok(w.position())
    }

    /// Decode one record from `buf` starting at `offset`.
    ///
    /// Returns the record and the position just past its sentinel. Bytes after
    /// that position are left alone.
    pub fn unmarshal(
        &self,
        ty: &StructType,
        buf: &[u8],
        offset: usize,
    ) -> Result<(Record, usize), DecodeError> {
        if !self.schema.contains(ty) {
            return Err(DecodeError::ForeignType {
                type_name: ty.qualified_name(),
            });
        }
        let mut r = Reader::new(buf, offset, self.limits);
        let record = decoder::unmarshal_record(self.schema, ty, &mut r)?;
        log::trace!(
            "colfer: unmarshalled {} from {} bytes",
            record.type_name(),
            r.position() - offset
        );
        Ok((record, r.position()))
    }

    /// Encode `record` into a new buffer of exactly the serial size.
    pub fn encode(&self, ty: &StructType, record: &mut Record) -> Result<Vec<u8>, EncodeError> {
        self.check_encode_type(ty)?;
        let schema = self.schema;
        let data = encoder::marshal_to_vec(&self.limits, |w| {
            encoder::marshal_record(schema, ty, record, w)
        })?;
        log::trace!("colfer: encoded {} in {} bytes", ty.qualified_name(), data.len());
        Ok(data)
    }

    /// Decode a record that must span all of `data`.
    pub fn decode(&self, ty: &StructType, data: &[u8]) -> Result<Record, DecodeError> {
        let (record, end) = self.unmarshal(ty, data, 0)?;
        if end != data.len() {
            log::debug!(
                "colfer: {} trailing bytes after {}",
                data.len() - end,
                ty.qualified_name()
            );
            return Err(DecodeError::TrailingData {
                offset: end,
                len: data.len(),
            });
        }
        Ok(record)
    }
}

impl Codec<'_> {
    /// Types from another schema, or from a clone of this one, would resolve
    /// their references against the wrong type list.
    fn check_encode_type(&self, ty: &StructType) -> Result<(), EncodeError> {
        if self.schema.contains(ty) {
            Ok(())
        } else {
            Err(EncodeError::ForeignType {
                type_name: ty.qualified_name(),
            })
        }
    }
}

/// Encode `record` as `ty` with the process-wide limits.
pub fn encode(schema: &Schema, ty: &StructType, record: &mut Record) -> Result<Vec<u8>, EncodeError> {
    Codec::new(schema).encode(ty, record)
}

/// Decode `data` as `ty` with the process-wide limits.
pub fn decode(schema: &Schema, ty: &StructType, data: &[u8]) -> Result<Record, DecodeError> {
    Codec::new(schema).decode(ty, data)
}
