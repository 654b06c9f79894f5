//! Traits for derive macro-based serialization.
//!
//! These traits are implemented by `#[derive(Colfer)]` from the
//! `colfer-derive` crate. The generated code writes and reads fields directly
//! with the helpers in [`codec::encoder`](crate::codec::encoder) and
//! [`codec::decoder`](crate::codec::decoder), so no runtime schema is needed.

use crate::codec::encoder::marshal_to_vec;
use crate::codec::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::Limits;

/// Types that can be written in the colfer binary format.
///
/// # Example
///
/// ```rust,ignore
/// use colfer::{Colfer, ColferMarshal};
///
/// #[derive(Colfer, Default)]
/// struct Course {
///     code: u64,
///     name: String,
/// }
///
/// let mut course = Course { code: 7, name: "Algebra".into() };
/// let bytes = course.colfer_encode().unwrap();
/// ```
pub trait ColferMarshal {
    /// Write every present field and the trailing sentinel.
    ///
    /// Takes `&mut self` because `None` slots in `Vec<Option<T>>` lists are
    /// filled with default values before they are written.
    fn marshal_into(&mut self, w: &mut Writer<'_>) -> Result<(), EncodeError>;

    /// Encode into `buf` at `offset` with the process-wide limits, returning
    /// the end position.
    fn marshal(&mut self, buf: &mut [u8], offset: usize) -> Result<usize, EncodeError> {
        self.marshal_with(buf, offset, &Limits::current())
    }

    fn marshal_with(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        limits: &Limits,
    ) -> Result<usize, EncodeError> {
        let mut w = Writer::new(buf, offset, *limits);
        self.marshal_into(&mut w)?;
        Ok(w.position())
    }

    /// Encode into a new buffer of exactly the serial size.
    fn colfer_encode(&mut self) -> Result<Vec<u8>, EncodeError> {
        marshal_to_vec(&Limits::current(), |w| self.marshal_into(w))
    }
}

/// Types that can be read from the colfer binary format.
///
/// # Example
///
/// ```rust,ignore
/// use colfer::{Colfer, ColferUnmarshal};
///
/// let course = Course::colfer_decode(&bytes).unwrap();
/// ```
pub trait ColferUnmarshal: Sized {
    /// Read one value including its sentinel.
    fn unmarshal_from(r: &mut Reader<'_>) -> Result<Self, DecodeError>;

    /// Decode from `buf` at `offset` with the process-wide limits, returning
    /// the value and the position just past it.
    fn unmarshal(buf: &[u8], offset: usize) -> Result<(Self, usize), DecodeError> {
        Self::unmarshal_with(buf, offset, &Limits::current())
    }

    fn unmarshal_with(
        buf: &[u8],
        offset: usize,
        limits: &Limits,
    ) -> Result<(Self, usize), DecodeError> {
        let mut r = Reader::new(buf, offset, *limits);
        let v = Self::unmarshal_from(&mut r)?;
        Ok((v, r.position()))
    }

    /// Decode a value that must span all of `data`.
    fn colfer_decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (v, end) = Self::unmarshal(data, 0)?;
        if end != data.len() {
            return Err(DecodeError::TrailingData {
                offset: end,
                len: data.len(),
            });
        }
        Ok(v)
    }
}
