//! Byte-level reader with bounded operations.

use crate::error::{ByteError, ByteResult};

/// A byte cursor for decoding patch buffers.
///
/// The cursor offset is the patch iterator: every decode helper advances the
/// same offset. All reads are bounds-checked and the reader never panics on
/// malformed input.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Creates a reader positioned at `offset`.
    ///
    /// An offset past the end yields an empty reader.
    #[must_use]
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            offset: offset.min(data.len()),
        }
    }

    /// Returns the underlying buffer.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the current byte offset.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the cursor to `offset`, clamped to the buffer length.
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.data.len());
    }

    /// Returns the total buffer length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of bytes remaining to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Returns `true` if there are no more bytes to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the byte at the cursor without consuming it.
    #[must_use]
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Advances the cursor by `count` bytes.
    pub fn skip(&mut self, count: usize) -> ByteResult<()> {
        self.ensure(count)?;
        self.offset += count;
        Ok(())
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> ByteResult<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Reads an `i8`.
    pub fn read_i8(&mut self) -> ByteResult<i8> {
        Ok(i8::from_le_bytes(self.read_array::<1>()?))
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> ByteResult<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads a little-endian `i16`.
    pub fn read_i16(&mut self) -> ByteResult<i16> {
        Ok(i16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> ByteResult<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a little-endian `i32`.
    pub fn read_i32(&mut self) -> ByteResult<i32> {
        Ok(i32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> ByteResult<u64> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }

    /// Reads a little-endian `i64`.
    pub fn read_i64(&mut self) -> ByteResult<i64> {
        Ok(i64::from_le_bytes(self.read_array::<8>()?))
    }

    /// Reads a little-endian `f32`.
    pub fn read_f32(&mut self) -> ByteResult<f32> {
        Ok(f32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a little-endian `f64`.
    pub fn read_f64(&mut self) -> ByteResult<f64> {
        Ok(f64::from_le_bytes(self.read_array::<8>()?))
    }

    /// Reads a boolean encoded as a `u8` (non-zero is `true`).
    pub fn read_bool(&mut self) -> ByteResult<bool> {
        Ok(self.read_u8()? > 0)
    }

    /// Reads a `number`: a prefix byte selects fixint, fixed-width integer or
    /// float encodings.
    pub fn read_number(&mut self) -> ByteResult<f64> {
        let offset = self.offset;
        let prefix = self.read_u8()?;
        let value = match prefix {
            0x00..=0x7f => f64::from(prefix),
            0xca => f64::from(self.read_f32()?),
            0xcb => self.read_f64()?,
            0xcc => f64::from(self.read_u8()?),
            0xcd => f64::from(self.read_u16()?),
            0xce => f64::from(self.read_u32()?),
            #[allow(clippy::cast_precision_loss)]
            0xcf => self.read_u64()? as f64,
            0xd0 => f64::from(self.read_i8()?),
            0xd1 => f64::from(self.read_i16()?),
            0xd2 => f64::from(self.read_i32()?),
            #[allow(clippy::cast_precision_loss)]
            0xd3 => self.read_i64()? as f64,
            0xe0..=0xff => -f64::from(0xff - prefix + 1),
            _ => return Err(ByteError::InvalidNumberPrefix { offset, prefix }),
        };
        Ok(value)
    }

    /// Reads a length-prefixed UTF-8 string, borrowing from the buffer.
    pub fn read_str(&mut self) -> ByteResult<&'a str> {
        let offset = self.offset;
        let prefix = self.read_u8()?;
        let len = match prefix {
            0x00..=0xbf => usize::from(prefix & 0x1f),
            0xd9 => usize::from(self.read_u8()?),
            0xda => usize::from(self.read_u16()?),
            0xdb => self.read_u32()? as usize,
            _ => return Err(ByteError::InvalidStringPrefix { offset, prefix }),
        };
        let start = self.offset;
        let bytes = self.read_slice(len)?;
        std::str::from_utf8(bytes).map_err(|_| ByteError::InvalidUtf8 { offset: start })
    }

    /// Reads a length-prefixed UTF-8 string into an owned `String`.
    pub fn read_string(&mut self) -> ByteResult<String> {
        self.read_str().map(str::to_owned)
    }

    /// Reads `len` raw bytes.
    pub fn read_slice(&mut self, len: usize) -> ByteResult<&'a [u8]> {
        self.ensure(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(&self.data[start..start + len])
    }

    fn ensure(&self, requested: usize) -> ByteResult<()> {
        let available = self.remaining();
        if requested > available {
            return Err(ByteError::UnexpectedEof {
                offset: self.offset,
                requested,
                available,
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> ByteResult<[u8; N]> {
        let bytes = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}
