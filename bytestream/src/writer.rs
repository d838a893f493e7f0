//! Byte-level writer for building patch buffers.

/// A byte writer producing the patch primitive encodings.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty `ByteWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `ByteWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    /// Writes a `number` using the smallest encoding that represents it.
    ///
    /// Non-integral values are written as `f64`; `NaN` is written as `0`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn write_number(&mut self, value: f64) {
        if value.is_nan() {
            self.write_u8(0);
            return;
        }
        if value.fract() != 0.0 || value.abs() > 9_007_199_254_740_991.0 {
            self.write_u8(0xcb);
            self.write_f64(value);
            return;
        }
        if value >= 0.0 {
            let value = value as u64;
            if value < 0x80 {
                self.write_u8(value as u8);
            } else if value < 0x100 {
                self.write_u8(0xcc);
                self.write_u8(value as u8);
            } else if value < 0x1_0000 {
                self.write_u8(0xcd);
                self.write_u16(value as u16);
            } else if value < 0x1_0000_0000 {
                self.write_u8(0xce);
                self.write_u32(value as u32);
            } else {
                self.write_u8(0xcf);
                self.write_u64(value);
            }
        } else {
            let value = value as i64;
            if value >= -0x20 {
                self.write_u8(0xe0 | (value + 0x20) as u8);
            } else if value >= -0x80 {
                self.write_u8(0xd0);
                self.write_i8(value as i8);
            } else if value >= -0x8000 {
                self.write_u8(0xd1);
                self.write_i16(value as i16);
            } else if value >= -0x8000_0000 {
                self.write_u8(0xd2);
                self.write_i32(value as i32);
            } else {
                self.write_u8(0xd3);
                self.write_i64(value);
            }
        }
    }

    /// Writes a length-prefixed UTF-8 string.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_str(&mut self, value: &str) {
        let len = value.len();
        if len < 0x20 {
            self.write_u8(0xa0 | len as u8);
        } else if len < 0x100 {
            self.write_u8(0xd9);
            self.write_u8(len as u8);
        } else if len < 0x1_0000 {
            self.write_u8(0xda);
            self.write_u16(len as u16);
        } else {
            self.write_u8(0xdb);
            self.write_u32(len as u32);
        }
        self.bytes.extend_from_slice(value.as_bytes());
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Finishes writing and returns the byte buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
