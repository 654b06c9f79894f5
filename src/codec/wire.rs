//! Wire format cursors and primitives.
//!
//! Multi-byte fixed-width payloads are big-endian. Varints are base-128 with
//! the least significant group first and `0x80` as continuation bit.

use crate::error::{DecodeError, EncodeError};
use crate::limits::Limits;

/// End-of-record marker; doubles as the reserved field index 127.
pub const SENTINEL: u8 = 0x7f;

/// Header bit selecting the alternative payload variant.
pub const VARIANT_FLAG: u8 = 0x80;

/// Values at or above this take the fixed 4-byte uint32 payload.
pub const UINT32_FIXED_MIN: u32 = 1 << 21;

/// Values at or above this take the fixed 8-byte uint64 payload.
pub const UINT64_FIXED_MIN: u64 = 1 << 49;

/// Cursor over a caller-owned destination buffer.
///
/// Every write is checked against the serial size limit first and the buffer
/// capacity second, so the two failures stay distinguishable and nothing past
/// the end of the buffer is touched.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
    start: usize,
    depth: usize,
    limits: Limits,
}

impl<'a> Writer<'a> {
    /// Start writing at `offset`.
    pub fn new(buf: &'a mut [u8], offset: usize, limits: Limits) -> Self {
        Writer {
            buf,
            pos: offset,
            start: offset,
            depth: 0,
            limits,
        }
    }

    /// Run `write` one nesting level deeper, failing once the depth limit
    /// is passed.
    pub fn nested<F>(&mut self, write: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        if self.depth >= self.limits.depth_max {
            log::debug!(
                "colfer: records nested deeper than {} levels at byte {}",
                self.limits.depth_max,
                self.pos
            );
            return Err(EncodeError::DepthExceeded {
                max: self.limits.depth_max,
            });
        }
        self.depth += 1;
        let result = write(self);
        self.depth -= 1;
        result
    }

    /// Index of the next byte to write.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes written since the start offset.
    pub fn written(&self) -> usize {
        self.pos - self.start
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn reserve(&mut self, n: usize) -> Result<usize, EncodeError> {
        let end = self.pos.saturating_add(n);
        if end - self.start > self.limits.size_max {
            log::debug!(
                "colfer: serial exceeds {} bytes at byte {}",
                self.limits.size_max,
                self.pos
            );
            return Err(EncodeError::SerialSizeExceeded {
                max: self.limits.size_max,
            });
        }
        if end > self.buf.len() {
            return Err(EncodeError::BufferOverflow {
                needed: end,
                capacity: self.buf.len(),
            });
        }
        let at = self.pos;
        self.pos = end;
        Ok(at)
    }

    pub fn put_u8(&mut self, b: u8) -> Result<(), EncodeError> {
        let at = self.reserve(1)?;
        self.buf[at] = b;
        Ok(())
    }

    pub fn put_slice(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let at = self.reserve(data.len())?;
        self.buf[at..at + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Write a field header: the index with the optional variant flag.
    pub fn put_header(&mut self, index: u8, variant: bool) -> Result<(), EncodeError> {
        debug_assert!(index < SENTINEL, "field index {} out of range", index);
        self.put_u8(if variant { index | VARIANT_FLAG } else { index })
    }

    /// Write the end-of-record marker.
    pub fn put_sentinel(&mut self) -> Result<(), EncodeError> {
        self.put_u8(SENTINEL)
    }

    pub fn put_u32_be(&mut self, v: u32) -> Result<(), EncodeError> {
        self.put_slice(&v.to_be_bytes())
    }

    pub fn put_u64_be(&mut self, v: u64) -> Result<(), EncodeError> {
        self.put_slice(&v.to_be_bytes())
    }

    /// Write a varint of up to 5 groups.
    pub fn put_varint32(&mut self, mut x: u32) -> Result<(), EncodeError> {
        while x >= 0x80 {
            self.put_u8(x as u8 | 0x80)?;
            x >>= 7;
        }
        self.put_u8(x as u8)
    }

    /// Write a varint of up to 8 groups of 7 bits; a ninth byte carries the
    /// remaining 8 bits without continuation.
    pub fn put_varint64(&mut self, mut x: u64) -> Result<(), EncodeError> {
        let mut n = 0;
        while n < 8 && x >= 0x80 {
            self.put_u8(x as u8 | 0x80)?;
            x >>= 7;
            n += 1;
        }
        self.put_u8(x as u8)
    }
}

/// Cursor over a caller-owned source buffer.
///
/// Reads are checked against the serial size limit and the buffer end before
/// any byte is consumed.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    start: usize,
    depth: usize,
    limits: Limits,
}

impl<'a> Reader<'a> {
    /// Start reading at `offset`.
    pub fn new(buf: &'a [u8], offset: usize, limits: Limits) -> Self {
        Reader {
            buf,
            pos: offset,
            start: offset,
            depth: 0,
            limits,
        }
    }

    /// Run `read` one nesting level deeper, failing once the depth limit
    /// is passed.
    pub fn nested<T, F>(&mut self, read: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&mut Self) -> Result<T, DecodeError>,
    {
        if self.depth >= self.limits.depth_max {
            log::debug!(
                "colfer: records nested deeper than {} levels at byte {}",
                self.limits.depth_max,
                self.pos
            );
            return Err(DecodeError::DepthExceeded {
                max: self.limits.depth_max,
                offset: self.pos,
            });
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Index of the next byte to read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Consume `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.saturating_add(n);
        if end - self.start > self.limits.size_max {
            log::debug!(
                "colfer: serial exceeds {} bytes at byte {}",
                self.limits.size_max,
                self.pos
            );
            return Err(DecodeError::SerialSizeExceeded {
                max: self.limits.size_max,
            });
        }
        if end > self.buf.len() {
            return Err(DecodeError::Underflow {
                needed: end,
                available: self.buf.len(),
            });
        }
        let data = &self.buf[self.pos..end];
        self.pos = end;
        Ok(data)
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u32_be(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64_be(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a varint of at most 5 bytes; bits past 32 are dropped.
    pub fn get_varint32(&mut self) -> Result<u32, DecodeError> {
        let mut x: u32 = 0;
        let mut shift = 0;
        loop {
            let b = self.get_u8()?;
            x |= ((b & 0x7f) as u32) << shift;
            if shift == 28 || b < 0x80 {
                return Ok(x);
            }
            shift += 7;
        }
    }

    /// Read a varint of at most 9 bytes; the ninth byte contributes all 8 bits.
    pub fn get_varint64(&mut self) -> Result<u64, DecodeError> {
        let mut x: u64 = 0;
        let mut shift = 0;
        loop {
            let b = self.get_u8()?;
            if shift == 56 || b < 0x80 {
                x |= (b as u64) << shift;
                return Ok(x);
            }
            x |= ((b & 0x7f) as u64) << shift;
            shift += 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_with(cap: usize, f: impl FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>) -> Vec<u8> {
        let mut buf = vec![0u8; cap];
        let mut w = Writer::new(&mut buf, 0, Limits::default());
        f(&mut w).unwrap();
        let n = w.position();
        buf.truncate(n);
        buf
    }

    #[test]
    fn test_varint32() {
        assert_eq!(write_with(8, |w| w.put_varint32(1)), [0x01]);
        assert_eq!(write_with(8, |w| w.put_varint32(300)), [0xac, 0x02]);
        assert_eq!(
            write_with(8, |w| w.put_varint32(u32::MAX)),
            [0xff, 0xff, 0xff, 0xff, 0x0f]
        );

        let data = [0xac, 0x02];
        let mut r = Reader::new(&data, 0, Limits::default());
        assert_eq!(r.get_varint32().unwrap(), 300);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_varint32_stops_after_five_bytes() {
        // The fifth byte ends the varint even with its continuation bit set.
        let data = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut r = Reader::new(&data, 0, Limits::default());
        assert_eq!(r.get_varint32().unwrap(), u32::MAX);
        assert_eq!(r.position(), 5);
    }

    #[test]
    fn test_varint64_ninth_byte() {
        let encoded = write_with(16, |w| w.put_varint64(u64::MAX));
        assert_eq!(encoded.len(), 9);
        assert_eq!(encoded[8], 0xff);

        let mut r = Reader::new(&encoded, 0, Limits::default());
        assert_eq!(r.get_varint64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_fixed_big_endian() {
        assert_eq!(
            write_with(8, |w| w.put_u32_be(0x12345678)),
            [0x12, 0x34, 0x56, 0x78]
        );
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut r = Reader::new(&data, 0, Limits::default());
        assert_eq!(r.get_u64_be().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_overflow_and_limit_are_distinct() {
        let mut small = [0u8; 2];
        let mut w = Writer::new(&mut small, 0, Limits::default());
        assert!(matches!(
            w.put_u32_be(7),
            Err(EncodeError::BufferOverflow { needed: 4, capacity: 2 })
        ));

        let mut big = [0u8; 16];
        let mut w = Writer::new(&mut big, 0, Limits::new(3, 8));
        assert!(matches!(
            w.put_u32_be(7),
            Err(EncodeError::SerialSizeExceeded { max: 3 })
        ));
    }

    #[test]
    fn test_writer_offset() {
        let mut buf = [0xaau8; 4];
        let mut w = Writer::new(&mut buf, 2, Limits::new(2, 1));
        w.put_u8(1).unwrap();
        w.put_sentinel().unwrap();
        assert_eq!(w.position(), 4);
        assert_eq!(w.written(), 2);
        assert_eq!(buf, [0xaa, 0xaa, 0x01, 0x7f]);
    }

    #[test]
    fn test_reader_underflow() {
        let data = [0x80, 0x80];
        let mut r = Reader::new(&data, 0, Limits::default());
        assert!(matches!(
            r.get_varint32(),
            Err(DecodeError::Underflow { needed: 3, available: 2 })
        ));
    }

    #[test]
    fn test_reader_limit_precedes_underflow() {
        let data = [0u8; 4];
        let mut r = Reader::new(&data, 0, Limits::new(2, 1));
        assert!(matches!(
            r.take(100),
            Err(DecodeError::SerialSizeExceeded { max: 2 })
        ));
    }

    #[test]
    fn test_nesting_depth() {
        let limits = Limits::default().with_depth_max(2);

        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf, 0, limits);
        w.nested(|w| w.nested(|w| w.put_sentinel())).unwrap();
        assert!(matches!(
            w.nested(|w| w.nested(|w| w.nested(|w| w.put_sentinel()))),
            Err(EncodeError::DepthExceeded { max: 2 })
        ));

        let data = [0x7f, 0x7f];
        let mut r = Reader::new(&data, 0, limits);
        assert_eq!(r.nested(|r| r.nested(|r| r.get_u8())).unwrap(), 0x7f);
        // The depth unwinds after each nested read.
        assert_eq!(r.nested(|r| r.nested(|r| r.get_u8())).unwrap(), 0x7f);
        assert!(matches!(
            r.nested(|r| r.nested(|r| r.nested(|r| r.get_u8()))),
            Err(DecodeError::DepthExceeded { max: 2, offset: 2 })
        ));
    }
}
