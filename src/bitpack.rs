//! Fixed-width bit packing.
//!
//! Values are packed MSB-first into a big-endian bit stream: value `i` of a
//! `b`-bit array occupies stream bits `[i*b, (i+1)*b)`, and a trailing partial
//! byte is zero-padded on the right.
//!
//! Unpacking has three paths:
//!
//! - byte-aligned widths (8, 16, 32) read whole bytes;
//! - every other width walks "superblocks" of `64 / gcd(b, 64)` values
//!   (exactly `8b / gcd(b, 64)` bytes) using precomputed per-position byte
//!   offsets and shifts, one 64-bit load per value;
//! - whatever is left (the tail near the end of the buffer where a full
//!   64-bit load would overrun) goes through the generic per-value path.

use byteorder::{BigEndian, ByteOrder};

/// Widest supported value width.
pub const MAX_BITS: u32 = 32;

/// Minimum width able to hold `max_val`; never less than 1.
#[inline]
pub fn bits_needed(max_val: u32) -> u32 {
    (32 - max_val.leading_zeros()).max(1)
}

/// Bytes occupied by `count` values of `bits` width.
#[inline]
pub fn packed_len(bits: u32, count: usize) -> usize {
    (count * bits as usize).div_ceil(8)
}

#[inline]
fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Append `values` packed at `bits` width to `out`.
///
/// Bits above `bits` in each value are discarded.
pub fn pack(values: &[u32], bits: u32, out: &mut Vec<u8>) {
    debug_assert!(bits <= MAX_BITS);
    if bits == 0 {
        return;
    }
    out.reserve(packed_len(bits, values.len()));

    let m = mask(bits);
    let mut acc = 0u64;
    let mut filled = 0u32;
    for &v in values {
        acc = (acc << bits) | (u64::from(v) & m);
        filled += bits;
        while filled >= 8 {
            filled -= 8;
            out.push((acc >> filled) as u8);
        }
    }
    if filled > 0 {
        out.push((acc << (8 - filled)) as u8);
    }
}

/// Unpack `out.len()` values of `bits` width from the front of `input`.
///
/// The caller guarantees `input.len() >= packed_len(bits, out.len())`.
pub fn unpack(input: &[u8], bits: u32, out: &mut [u32]) {
    debug_assert!(bits <= MAX_BITS);
    debug_assert!(input.len() >= packed_len(bits, out.len()));
    match bits {
        0 => out.fill(0),
        8 => unpack_8(input, out),
        16 => unpack_16(input, out),
        32 => unpack_32(input, out),
        _ => {
            let done = unpack_superblocks(input, bits, out);
            unpack_generic(input, bits, done, &mut out[done..]);
        }
    }
}

#[inline]
fn unpack_8(input: &[u8], out: &mut [u32]) {
    for (o, &b) in out.iter_mut().zip(input) {
        *o = u32::from(b);
    }
}

#[inline]
fn unpack_16(input: &[u8], out: &mut [u32]) {
    for (o, chunk) in out.iter_mut().zip(input.chunks_exact(2)) {
        *o = u32::from(BigEndian::read_u16(chunk));
    }
}

#[inline]
fn unpack_32(input: &[u8], out: &mut [u32]) {
    for (o, chunk) in out.iter_mut().zip(input.chunks_exact(4)) {
        *o = BigEndian::read_u32(chunk);
    }
}

/// Load 8 bytes big-endian from `pos`, zero-padding past the end.
#[inline]
fn load_be_u64(input: &[u8], pos: usize) -> u64 {
    match input.get(pos..pos + 8) {
        Some(word) => BigEndian::read_u64(word),
        None => {
            let mut word = [0u8; 8];
            if let Some(tail) = input.get(pos..) {
                word[..tail.len()].copy_from_slice(tail);
            }
            u64::from_be_bytes(word)
        }
    }
}

/// Per-value path for values `first..first + out.len()` of the stream.
fn unpack_generic(input: &[u8], bits: u32, first: usize, out: &mut [u32]) {
    let m = mask(bits);
    let mut bit_pos = first * bits as usize;
    for o in out.iter_mut() {
        let word = load_be_u64(input, bit_pos / 8);
        let shift = 64 - (bit_pos % 8) as u32 - bits;
        *o = ((word >> shift) & m) as u32;
        bit_pos += bits as usize;
    }
}

#[derive(Clone, Copy)]
struct SuperBlock {
    /// Values per superblock.
    len: usize,
    /// Bytes per superblock.
    bytes: usize,
    offsets: [u16; 64],
    shifts: [u8; 64],
}

const EMPTY_SUPERBLOCK: SuperBlock = SuperBlock {
    len: 0,
    bytes: 0,
    offsets: [0; 64],
    shifts: [0; 64],
};

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

const fn superblock(bits: u32) -> SuperBlock {
    let g = gcd(bits, 64);
    let len = (64 / g) as usize;
    let mut sb = SuperBlock {
        len,
        bytes: (8 * bits / g) as usize,
        offsets: [0; 64],
        shifts: [0; 64],
    };
    let mut j = 0;
    while j < len {
        let bit_pos = j as u32 * bits;
        sb.offsets[j] = (bit_pos / 8) as u16;
        sb.shifts[j] = (64 - bit_pos % 8 - bits) as u8;
        j += 1;
    }
    sb
}

const fn superblock_table() -> [SuperBlock; 33] {
    let mut table = [EMPTY_SUPERBLOCK; 33];
    let mut b = 1;
    while b <= 32 {
        table[b] = superblock(b as u32);
        b += 1;
    }
    table
}

static SUPERBLOCKS: [SuperBlock; 33] = superblock_table();

/// Decode whole superblocks; returns how many values were written.
fn unpack_superblocks(input: &[u8], bits: u32, out: &mut [u32]) -> usize {
    let sb = &SUPERBLOCKS[bits as usize];
    let m = mask(bits);
    let mut done = 0;
    let mut start = 0;
    while done + sb.len <= out.len() && start + sb.bytes + 7 <= input.len() {
        let block = &input[start..];
        for j in 0..sb.len {
            let word = BigEndian::read_u64(&block[sb.offsets[j] as usize..]);
            out[done + j] = ((word >> sb.shifts[j]) & m) as u32;
        }
        done += sb.len;
        start += sb.bytes;
    }
    done
}
