//! Bounds-checked little-endian reader over metafile bytes

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{DecodeError, DecodeResult};

/// Sequential reader over a byte slice.
///
/// Every read advances the position and fails with
/// [`DecodeError::TruncatedStream`] when fewer bytes remain than requested.
/// `base` is the absolute stream offset of the slice start, so errors raised
/// while reading a record payload still point into the whole metafile.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    inner: Cursor<&'a [u8]>,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Reader over `data`, reporting offsets relative to `base`.
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self {
            inner: Cursor::new(data),
            base,
        }
    }

    /// Position within the underlying slice.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Absolute position within the metafile stream.
    pub fn offset(&self) -> usize {
        self.base + self.position()
    }

    pub fn remaining(&self) -> usize {
        self.inner.get_ref().len().saturating_sub(self.position())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> DecodeResult<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(DecodeError::TruncatedStream {
                offset: self.offset(),
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedStream {
            offset: self.offset(),
            needed,
            remaining: self.remaining(),
        }
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        self.ensure(1)?;
        self.inner.read_u8().map_err(|_| self.truncated(1))
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        self.ensure(2)?;
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(2))
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        self.ensure(2)?;
        self.inner
            .read_i16::<LittleEndian>()
            .map_err(|_| self.truncated(2))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.ensure(4)?;
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(4))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        self.ensure(4)?;
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(4))
    }

    /// Borrow the next `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        self.ensure(n)?;
        let start = self.position();
        let data: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position((start + n) as u64);
        Ok(&data[start..start + n])
    }

    /// Everything that has not been read yet.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.position().min(self.inner.get_ref().len());
        let data: &'a [u8] = *self.inner.get_ref();
        self.inner.set_position(data.len() as u64);
        &data[start..]
    }

    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.ensure(n)?;
        let pos = self.position() + n;
        self.inner.set_position(pos as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let data = [0x34, 0x12, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12, 0xAA];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 0x12345678);
        assert_eq!(cursor.read_u8().unwrap(), 0xAA);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let data = [0u8; 3];
        let mut cursor = ByteCursor::with_base(&data, 100);
        cursor.skip(2).unwrap();
        let err = cursor.read_u16().unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedStream {
                offset: 102,
                needed: 2,
                remaining: 1
            }
        );
        // Failed reads do not advance
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_read_bytes_and_rest() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_bytes(2).unwrap(), &[1, 2]);
        assert!(cursor.read_bytes(4).is_err());
        assert_eq!(cursor.read_rest(), &[3, 4, 5]);
        assert!(cursor.is_empty());
    }
}
