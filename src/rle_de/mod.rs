//! Run-length + delta encoding (RLE-DE).
//!
//! # Format
//!
//! ```text
//! varint(count) | varint(payload_len) | payload
//! ```
//!
//! The payload is a stream of varint tokens over the deltas between
//! consecutive ids (the first delta is taken from 0):
//!
//! - low bit 0: one delta, `token >> 1`;
//! - low bit 1: a run of `token >> 1` equal deltas, followed by a low-bit-0
//!   token carrying the delta.
//!
//! Every maximal sequence of equal deltas collapses into a single run, so
//! `1, 2, 3, 4, 5` encodes as two tokens no matter how long it grows.
//!
//! Decoding is streaming: no blocks, no random access. [`RleDeIndex::at`]
//! amortizes forward access with a per-handle cache of decoded ids.

mod cursor;
mod merge;
mod nary;

use std::cell::RefCell;
use std::fmt;

use bytes::Bytes;

use crate::config::IndexType;
use crate::error::{IndexError, Result};
use crate::storage::{put_varint_u64, ByteBuf, ByteView};
use crate::traits::{bit_set_ids, validate_ids, DenseBitSet, IdSet, IndexCreator};

pub(crate) use cursor::RunCursor;
pub(crate) use merge::merge;
pub use nary::{constrained_intersect, fused_intersect_difference};

/// Streaming RLE-DE builder.
#[derive(Debug, Default, Clone)]
pub struct RleDeCreator {
    payload: Vec<u8>,
    run: u32,
    last_delta: u32,
    count: u32,
    prev: u32,
}

impl RleDeCreator {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last id pushed (0 before the first push).
    pub fn current_id(&self) -> u32 {
        self.prev
    }

    /// Delta of the pending run.
    pub fn current_delta(&self) -> u32 {
        self.last_delta
    }

    fn flush_run(&mut self) {
        match self.run {
            0 => {}
            1 => put_varint_u64(&mut self.payload, u64::from(self.last_delta) << 1),
            n => {
                put_varint_u64(&mut self.payload, (u64::from(n) << 1) | 1);
                put_varint_u64(&mut self.payload, u64::from(self.last_delta) << 1);
            }
        }
        self.run = 0;
    }

    /// Push `next_id` followed by `extra` ids spaced `delta` apart.
    pub fn push_run(&mut self, next_id: u32, delta: u32, extra: u32) {
        self.push(next_id);
        if extra == 0 {
            return;
        }
        debug_assert!(delta > 0);
        self.push(next_id + delta);
        let more = extra - 1;
        self.run += more;
        self.prev += delta * more;
        self.count += more;
    }

    /// Seal the builder after appending a raw payload holding `count` ids.
    ///
    /// The first token of `tail` is a delta against the last pushed id. Leading
    /// tokens that continue the pending run are folded into it, so the result
    /// encodes the same as pushing every id.
    pub fn finish_with_tail(mut self, tail: &[u8], count: u32) -> RleDeIndex {
        let mut pos = 0;
        let mut copied_from = 0;
        while self.run > 0 {
            match cursor::read_token(tail, &mut pos) {
                Ok(token) if token.delta == self.last_delta => {
                    self.run += token.run;
                    copied_from = pos;
                }
                _ => break,
            }
        }
        self.flush_run();
        self.payload.extend_from_slice(&tail[copied_from..]);
        RleDeIndex::from_parts(self.count + count, &self.payload)
    }
}

impl IndexCreator for RleDeCreator {
    type Output = RleDeIndex;

    fn push(&mut self, id: u32) {
        debug_assert!(
            self.count == 0 || id > self.prev,
            "ids must be pushed strictly ascending: {} after {}",
            id,
            self.prev
        );
        let delta = id.wrapping_sub(self.prev);
        if delta == self.last_delta {
            self.run += 1;
        } else {
            self.flush_run();
            self.run = 1;
            self.last_delta = delta;
        }
        self.prev = id;
        self.count += 1;
    }

    fn size(&self) -> u32 {
        self.count
    }

    fn finish(mut self) -> RleDeIndex {
        self.flush_run();
        RleDeIndex::from_parts(self.count, &self.payload)
    }
}

#[derive(Debug, Default)]
struct AtCache {
    ids: Vec<u32>,
    cursor: Option<RunCursor>,
}

/// Immutable RLE-DE encoded id set.
///
/// The bytes are shared; the positional cache is per handle, so clones start
/// with an empty cache and a handle is not `Sync`.
pub struct RleDeIndex {
    data: Bytes,
    payload: Bytes,
    size: u32,
    cache: RefCell<AtCache>,
}

impl RleDeIndex {
    /// Empty set.
    pub fn empty() -> Self {
        Self::from_parts(0, &[])
    }

    fn from_parts(size: u32, payload: &[u8]) -> Self {
        let mut buf = ByteBuf::with_capacity(payload.len() + 10);
        buf.put_varint_u32(size);
        buf.put_varint_u32(payload.len() as u32);
        let header_len = buf.len();
        buf.put_slice(payload);
        let data = buf.freeze();
        Self {
            payload: data.slice(header_len..),
            data,
            size,
            cache: RefCell::default(),
        }
    }

    /// Encode strictly ascending `ids`.
    pub fn create(ids: &[u32]) -> Result<Self> {
        validate_ids(ids)?;
        let mut creator = RleDeCreator::new();
        for &id in ids {
            creator.push(id);
        }
        Ok(creator.finish())
    }

    /// Encode the ids of all set bits.
    pub fn from_bit_set(bits: &DenseBitSet) -> Self {
        let mut creator = RleDeCreator::new();
        for id in bit_set_ids(bits) {
            creator.push(id);
        }
        creator.finish()
    }

    /// Open serialized bytes, checking the whole token stream.
    ///
    /// Bytes after the declared payload are ignored.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        Self::open(data).inspect_err(|e| log::warn!("rejecting RLE-DE index: {}", e))
    }

    fn open(data: Bytes) -> Result<Self> {
        let mut view = ByteView::new(data);
        let size = view.get_varint_u32()?;
        let payload_len = view.get_varint_u32()? as usize;
        let header_len = view.tell();
        let payload = view.slice(header_len, payload_len)?.bytes().clone();
        Self::check_payload(&payload, size)?;
        Ok(Self {
            data: view.bytes().slice(..header_len + payload_len),
            payload,
            size,
            cache: RefCell::default(),
        })
    }

    fn check_payload(payload: &[u8], size: u32) -> Result<()> {
        let mut pos = 0;
        let mut seen = 0u64;
        let mut last = 0u64;
        while pos < payload.len() {
            let token = cursor::read_token(payload, &mut pos)?;
            let run = u64::from(token.run);
            let delta = u64::from(token.delta);
            if delta == 0 && !(seen == 0 && run == 1) {
                return Err(IndexError::corrupt(format!(
                    "zero delta after {} ids",
                    seen
                )));
            }
            seen += run;
            last += delta * run;
            if seen > u64::from(size) {
                return Err(IndexError::corrupt(format!(
                    "payload holds more than the declared {} ids",
                    size
                )));
            }
            if last > u64::from(u32::MAX) {
                return Err(IndexError::corrupt("id exceeds 32 bits"));
            }
        }
        if seen != u64::from(size) {
            return Err(IndexError::corrupt(format!(
                "payload holds {} ids, header declares {}",
                seen, size
            )));
        }
        Ok(())
    }

    /// Serialized bytes (header and payload).
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub(crate) fn cursor(&self) -> RunCursor {
        RunCursor::new(self.payload.clone(), self.size)
    }

    /// Id at `pos`, or 0 when `pos` is out of range.
    pub fn at(&self, pos: u32) -> u32 {
        if pos >= self.size {
            return 0;
        }
        let mut cache = self.cache.borrow_mut();
        let AtCache { ids, cursor } = &mut *cache;
        let cursor = cursor.get_or_insert_with(|| self.cursor());
        while ids.len() <= pos as usize && cursor.valid() {
            ids.push(cursor.id());
            cursor.advance();
        }
        ids.get(pos as usize).copied().unwrap_or(0)
    }

    /// Smallest id, or 0 for an empty set.
    pub fn first(&self) -> u32 {
        self.at(0)
    }

    /// Largest id, or 0 for an empty set.
    pub fn last(&self) -> u32 {
        match self.size {
            0 => 0,
            n => self.at(n - 1),
        }
    }
}

impl Clone for RleDeIndex {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            payload: self.payload.clone(),
            size: self.size,
            cache: RefCell::default(),
        }
    }
}

impl fmt::Debug for RleDeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RleDeIndex")
            .field("size", &self.size)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Default for RleDeIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl IdSet for RleDeIndex {
    type Iter = RleDeIter;

    fn index_type(&self) -> IndexType {
        IndexType::RleDe
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn byte_size(&self) -> usize {
        self.data.len()
    }

    fn iter(&self) -> RleDeIter {
        RleDeIter {
            cursor: self.cursor(),
        }
    }

    fn find(&self, id: u32) -> Option<u32> {
        let mut cursor = self.cursor();
        let before = cursor.left();
        cursor.seek(id);
        (cursor.valid() && cursor.id() == id).then(|| before - cursor.left())
    }
}

/// Streaming iterator over an [`RleDeIndex`].
#[derive(Debug, Clone)]
pub struct RleDeIter {
    cursor: RunCursor,
}

impl Iterator for RleDeIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if !self.cursor.valid() {
            return None;
        }
        let id = self.cursor.id();
        self.cursor.advance();
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.cursor.left() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RleDeIter {}
