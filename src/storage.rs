//! Byte-level storage primitives the codecs serialize into and out of.
//!
//! Two halves, with independent pointers:
//!
//! - [`ByteBuf`]: growable writer (put pointer = current length).
//! - [`ByteView`]: reader over shared immutable [`Bytes`] with its own get
//!   pointer. Sub-ranges are zero-copy.
//!
//! Fixed-width integers are big-endian. Variable-width integers are LEB128
//! (7 payload bits per byte, high bit = continuation): at most 5 bytes for a
//! `u32`, 10 for a `u64`.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use bytes::Bytes;

use crate::error::{IndexError, Result};

/// Maximum encoded length of a `u32` varint.
pub const MAX_VARINT_U32_LEN: usize = 5;
/// Maximum encoded length of a `u64` varint.
pub const MAX_VARINT_U64_LEN: usize = 10;

/// Append `value` as a varint.
#[inline]
pub fn put_varint_u64(out: &mut Vec<u8>, value: u64) {
    let mut val = value;
    while val >= 0x80 {
        out.push((val as u8) | 0x80);
        val >>= 7;
    }
    out.push(val as u8);
}

/// Append `value` as a varint.
#[inline]
pub fn put_varint_u32(out: &mut Vec<u8>, value: u32) {
    put_varint_u64(out, u64::from(value));
}

/// Number of bytes `value` occupies as a varint.
#[inline]
pub fn varint_len_u64(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Number of bytes `value` occupies as a varint.
#[inline]
pub fn varint_len_u32(value: u32) -> usize {
    varint_len_u64(u64::from(value))
}

/// Decode a varint starting at `*offset`, advancing the offset past it.
#[inline]
pub fn read_varint_u64(buf: &[u8], offset: &mut usize) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut pos = *offset;

    loop {
        let byte = *buf
            .get(pos)
            .ok_or_else(|| IndexError::corrupt("unexpected end of varint"))?;
        pos += 1;

        if shift == 63 && byte > 1 {
            return Err(IndexError::corrupt("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 63 {
            return Err(IndexError::corrupt("varint longer than 10 bytes"));
        }
    }

    *offset = pos;
    Ok(value)
}

/// Decode a 32-bit varint starting at `*offset`, advancing the offset past it.
#[inline]
pub fn read_varint_u32(buf: &[u8], offset: &mut usize) -> Result<u32> {
    let start = *offset;
    let value = read_varint_u64(buf, offset)?;
    if *offset - start > MAX_VARINT_U32_LEN || value > u64::from(u32::MAX) {
        *offset = start;
        return Err(IndexError::corrupt("varint overflows 32 bits"));
    }
    Ok(value as u32)
}

/// Growable write buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteBuf {
    buf: Vec<u8>,
}

impl ByteBuf {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current put pointer (number of bytes written).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append one byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a big-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        // Writing into a Vec never fails.
        let _ = self.buf.write_u16::<BigEndian>(value);
    }

    /// Append a big-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        let _ = self.buf.write_u32::<BigEndian>(value);
    }

    /// Append a big-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        let _ = self.buf.write_u64::<BigEndian>(value);
    }

    /// Append a varint.
    pub fn put_varint_u32(&mut self, value: u32) {
        put_varint_u32(&mut self.buf, value);
    }

    /// Append a varint.
    pub fn put_varint_u64(&mut self, value: u64) {
        put_varint_u64(&mut self.buf, value);
    }

    /// Append raw bytes.
    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Mutable access to the underlying vector, for codecs that write in bulk.
    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    /// Freeze into shared immutable bytes.
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

/// Read cursor over shared immutable bytes.
#[derive(Debug, Clone, Default)]
pub struct ByteView {
    data: Bytes,
    get_ptr: usize,
}

impl ByteView {
    /// View over `data` with the get pointer at 0.
    pub fn new(data: Bytes) -> Self {
        Self { data, get_ptr: 0 }
    }

    /// Total number of bytes in the view.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the view holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current get pointer.
    pub fn tell(&self) -> usize {
        self.get_ptr
    }

    /// Move the get pointer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(IndexError::corrupt(format!(
                "seek to {} past end of {} bytes",
                pos,
                self.data.len()
            )));
        }
        self.get_ptr = pos;
        Ok(())
    }

    /// Bytes left after the get pointer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.get_ptr
    }

    /// True if at least one byte is left to read.
    pub fn has_next(&self) -> bool {
        self.get_ptr < self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(IndexError::corrupt(format!(
                "need {} bytes at offset {}, only {} left",
                n,
                self.get_ptr,
                self.remaining()
            )));
        }
        let start = self.get_ptr;
        self.get_ptr += n;
        Ok(&self.data[start..start + n])
    }

    /// Read one byte.
    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian `u16`.
    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    /// Read a big-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    /// Read a big-endian `u64`.
    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Read a 32-bit varint.
    pub fn get_varint_u32(&mut self) -> Result<u32> {
        read_varint_u32(&self.data, &mut self.get_ptr)
    }

    /// Read a 64-bit varint.
    pub fn get_varint_u64(&mut self) -> Result<u64> {
        read_varint_u64(&self.data, &mut self.get_ptr)
    }

    /// Zero-copy view of `len` bytes starting at `start`, get pointer at 0.
    pub fn slice(&self, start: usize, len: usize) -> Result<ByteView> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                IndexError::corrupt(format!(
                    "range {}+{} exceeds {} bytes",
                    start,
                    len,
                    self.data.len()
                ))
            })?;
        Ok(ByteView::new(self.data.slice(start..end)))
    }

    /// Drop everything before the get pointer; the get pointer becomes 0.
    pub fn shrink_to_get_ptr(&mut self) {
        self.data = self.data.slice(self.get_ptr..);
        self.get_ptr = 0;
    }

    /// Skip `n` bytes.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// The whole underlying buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Bytes from the get pointer to the end, sharing the allocation.
    pub fn rest(&self) -> Bytes {
        self.data.slice(self.get_ptr..)
    }
}
