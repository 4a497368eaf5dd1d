//! Fixed-width little-endian integer helpers.
//!
//! The search data format stores integers in 1, 2, 3 or 4 bytes depending on
//! the width class picked for the file, so the helpers take the byte count as
//! a parameter instead of being specialised per type.

use crate::error::{Result, SearchError};

/// Append the low `bytes` bytes of `value` in little-endian order
pub fn write_uint(buf: &mut Vec<u8>, value: u64, bytes: usize) {
    debug_assert!(bytes <= 8);
    debug_assert!(bytes == 8 || value >> (bytes * 8) == 0, "{value} does not fit {bytes} bytes");
    buf.extend_from_slice(&value.to_le_bytes()[..bytes]);
}

/// Write a u32 in little-endian format
pub fn write_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Read a `bytes`-wide little-endian integer at `pos`
pub fn read_uint(data: &[u8], pos: usize, bytes: usize) -> Option<u64> {
    let slice = data.get(pos..pos.checked_add(bytes)?)?;
    let mut value = 0u64;
    for (i, &byte) in slice.iter().enumerate() {
        value |= (byte as u64) << (i * 8);
    }
    Some(value)
}

/// Bounds-checked cursor over a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_uint(&mut self, bytes: usize) -> Result<u64> {
        let value = read_uint(self.data, self.pos, bytes).ok_or_else(|| self.truncated())?;
        self.pos += bytes;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_uint(1)? as u8)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_uint(4)? as u32)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated())?;
        let slice = self.data.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(slice)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_str(&mut self, len_bytes: usize) -> Result<&'a str> {
        let len = self.read_uint(len_bytes)? as usize;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map_err(|_| SearchError::corrupt(format!("invalid UTF-8 at offset {}", self.pos - len)))
    }

    fn truncated(&self) -> SearchError {
        SearchError::corrupt(format!("unexpected end of data at offset {}", self.pos))
    }
}
