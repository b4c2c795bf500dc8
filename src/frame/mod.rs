//! Block-oriented frame-of-reference codecs (FoR and PFoR).
//!
//! # Format
//!
//! ```text
//! varint(count) | varint(block_data_len) | block_0 .. block_n | descriptor
//! ```
//!
//! Ids are turned into deltas (the first against 0) and cut into blocks of
//! one preset size taken from [`BLOCK_SIZES`]; only the last block may be
//! shorter. Each block is bit-packed at its own width. How a width is chosen
//! and how a block is laid out is up to the [`BlockCodec`]:
//!
//! - [`ForBlocks`]: the width of the largest delta, nothing else.
//! - [`PforBlocks`]: a cost-optimal width; deltas that do not fit are stored
//!   as 0 in the packed array and appended as varints after it.
//!
//! The descriptor is a packed array of 5-bit entries: entry 0 is the offset
//! of the block size in [`BLOCK_SIZES`], entry `i + 1` the width of block `i`
//! (width 32 is stored as 0). Its length follows from `count` and entry 0.
//!
//! Opening an index decodes every block once to check the structure and to
//! record where each block starts and which id precedes it. Positional
//! access then decodes a single block.

mod for_codec;
mod pfor;

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;

use crate::bitpack::{self, packed_len};
use crate::config::{BlockSizePolicy, IndexType};
use crate::error::{IndexError, Result};
use crate::set_ops::{self, Difference, Intersect, SetOp, SymmetricDifference, Unite};
use crate::storage::{ByteBuf, ByteView};
use crate::traits::{bit_set_ids, validate_ids, DenseBitSet, IdSet, IndexCreator};

pub use for_codec::ForBlocks;
pub use pfor::PforBlocks;

/// Preset block sizes addressable from the descriptor.
pub const BLOCK_SIZES: [u32; 32] = [
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, //
    3, 6, 12, 24, 48, 96, 192, 384, 768, 1536, 3072, 6144, 12288, 24576, 49152, 98304,
];

/// Offset of the 128-id preset, used by streaming creators.
pub const DEFAULT_BLOCK_SIZE_OFFSET: u8 = 7;

/// Bits per descriptor entry.
pub const BLOCK_DESC_BIT_WIDTH: u32 = 5;

/// Width chosen for one block and the bytes the encoded block will take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWidth {
    /// Bits per packed value (1..=32).
    pub bits: u32,
    /// Encoded block size in bytes.
    pub bytes: usize,
}

/// Per-block encoding strategy of a frame codec.
pub trait BlockCodec {
    /// Tag of indexes using this codec.
    const INDEX_TYPE: IndexType;

    /// Pick the width for a block of deltas.
    fn block_width(deltas: &[u32]) -> BlockWidth;

    /// Append the block of `deltas` at `bits` width.
    fn encode(deltas: &[u32], bits: u32, out: &mut Vec<u8>);

    /// Decode `out.len()` deltas from the front of `data`; returns the bytes
    /// the block occupies.
    fn decode(data: &[u8], bits: u32, out: &mut [u32]) -> Result<usize>;
}

/// Where a block lives and what precedes it.
#[derive(Debug, Clone, Copy)]
struct BlockMeta {
    /// Byte offset in the block data.
    offset: usize,
    /// Id before the block's first id (0 for the first block).
    base: u32,
    bits: u8,
}

fn block_size(offset: u8) -> usize {
    BLOCK_SIZES[offset as usize] as usize
}

/// Total encoded size with the preset at `offset`, or `None` once it reaches `bound`.
fn encoded_size<C: BlockCodec>(deltas: &[u32], offset: u8, bound: usize) -> Option<usize> {
    let size = block_size(offset);
    let blocks = deltas.len().div_ceil(size);
    let mut total = packed_len(BLOCK_DESC_BIT_WIDTH, blocks + 1);
    for chunk in deltas.chunks(size) {
        total += C::block_width(chunk).bytes;
        if total >= bound {
            return None;
        }
    }
    Some(total)
}

/// Block size offset giving the smallest encoding; the first preset wins ties.
pub fn optimal_block_size_offset<C: BlockCodec>(deltas: &[u32]) -> u8 {
    let mut best = (0u8, usize::MAX);
    for offset in 0..BLOCK_SIZES.len() as u8 {
        if let Some(total) = encoded_size::<C>(deltas, offset, best.1) {
            best = (offset, total);
        }
    }
    log::debug!(
        "{:?}: block size {} ({} bytes) for {} ids",
        C::INDEX_TYPE,
        block_size(best.0),
        best.1,
        deltas.len()
    );
    best.0
}

fn deltas_of(ids: &[u32]) -> Vec<u32> {
    let mut prev = 0;
    ids.iter()
        .map(|&id| {
            let d = id - prev;
            prev = id;
            d
        })
        .collect()
}

/// Streaming builder with a fixed block size.
pub struct FrameCreator<C: BlockCodec> {
    block_size_offset: u8,
    pending: Vec<u32>,
    blocks: Vec<u8>,
    metas: Vec<BlockMeta>,
    block_base: u32,
    prev: u32,
    count: u32,
    _codec: PhantomData<C>,
}

impl<C: BlockCodec> FrameCreator<C> {
    /// Builder using 128-id blocks.
    pub fn new() -> Self {
        Self::with_block_size_offset(DEFAULT_BLOCK_SIZE_OFFSET)
    }

    /// Builder using the preset at `offset`.
    ///
    /// # Panics
    ///
    /// If `offset` is not below `BLOCK_SIZES.len()`.
    pub fn with_block_size_offset(offset: u8) -> Self {
        assert!(
            (offset as usize) < BLOCK_SIZES.len(),
            "block size offset {} out of range",
            offset
        );
        Self {
            block_size_offset: offset,
            pending: Vec::with_capacity(block_size(offset).min(4096)),
            blocks: Vec::new(),
            metas: Vec::new(),
            block_base: 0,
            prev: 0,
            count: 0,
            _codec: PhantomData,
        }
    }

    fn push_delta(&mut self, delta: u32) {
        self.pending.push(delta);
        if self.pending.len() == block_size(self.block_size_offset) {
            self.flush_block();
        }
    }

    fn flush_block(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let width = C::block_width(&self.pending);
        self.metas.push(BlockMeta {
            offset: self.blocks.len(),
            base: self.block_base,
            bits: width.bits as u8,
        });
        C::encode(&self.pending, width.bits, &mut self.blocks);
        debug_assert_eq!(
            self.blocks.len() - self.metas[self.metas.len() - 1].offset,
            width.bytes
        );
        self.block_base = self.prev;
        self.pending.clear();
    }
}

impl<C: BlockCodec> Default for FrameCreator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BlockCodec> IndexCreator for FrameCreator<C> {
    type Output = FrameIndex<C>;

    fn push(&mut self, id: u32) {
        debug_assert!(
            self.count == 0 || id > self.prev,
            "ids must be pushed strictly ascending: {} after {}",
            id,
            self.prev
        );
        let delta = id.wrapping_sub(self.prev);
        self.prev = id;
        self.count += 1;
        self.push_delta(delta);
    }

    fn size(&self) -> u32 {
        self.count
    }

    fn finish(mut self) -> FrameIndex<C> {
        self.flush_block();
        FrameIndex::from_parts(self.count, self.block_size_offset, self.blocks, self.metas)
    }
}

#[derive(Debug, Default)]
struct BlockCache {
    block: Option<usize>,
    ids: Vec<u32>,
}

/// Immutable frame-of-reference encoded id set.
///
/// Bytes and block table are shared between clones; the decoded-block cache
/// is per handle.
pub struct FrameIndex<C: BlockCodec> {
    data: Bytes,
    blocks: Bytes,
    size: u32,
    block_size_offset: u8,
    metas: Arc<[BlockMeta]>,
    cache: RefCell<BlockCache>,
    _codec: PhantomData<C>,
}

/// Frame of reference index.
pub type ForIndex = FrameIndex<ForBlocks>;
/// Patched frame of reference index.
pub type PforIndex = FrameIndex<PforBlocks>;
/// Streaming FoR builder.
pub type ForCreator = FrameCreator<ForBlocks>;
/// Streaming PFoR builder.
pub type PforCreator = FrameCreator<PforBlocks>;
/// Iterator over a [`ForIndex`].
pub type ForIter = FrameIter<ForBlocks>;
/// Iterator over a [`PforIndex`].
pub type PforIter = FrameIter<PforBlocks>;

impl<C: BlockCodec> FrameIndex<C> {
    fn from_parts(size: u32, block_size_offset: u8, blocks: Vec<u8>, metas: Vec<BlockMeta>) -> Self {
        let mut entries = Vec::with_capacity(metas.len() + 1);
        entries.push(u32::from(block_size_offset));
        entries.extend(metas.iter().map(|m| u32::from(m.bits) % 32));

        let mut buf = ByteBuf::with_capacity(blocks.len() + entries.len() + 10);
        buf.put_varint_u32(size);
        buf.put_varint_u32(blocks.len() as u32);
        let header_len = buf.len();
        buf.put_slice(&blocks);
        bitpack::pack(&entries, BLOCK_DESC_BIT_WIDTH, buf.as_mut_vec());
        let data = buf.freeze();

        Self {
            blocks: data.slice(header_len..header_len + blocks.len()),
            data,
            size,
            block_size_offset,
            metas: metas.into(),
            cache: RefCell::default(),
            _codec: PhantomData,
        }
    }

    /// Empty set.
    pub fn empty() -> Self {
        FrameCreator::with_block_size_offset(0).finish()
    }

    /// Encode strictly ascending `ids`, picking the smallest block size.
    pub fn create(ids: &[u32]) -> Result<Self> {
        Self::create_with(ids, BlockSizePolicy::Optimized)
    }

    /// Encode strictly ascending `ids` under `policy`.
    pub fn create_with(ids: &[u32], policy: BlockSizePolicy) -> Result<Self> {
        validate_ids(ids)?;
        let deltas = deltas_of(ids);
        let offset = match policy {
            BlockSizePolicy::Optimized => optimal_block_size_offset::<C>(&deltas),
            BlockSizePolicy::Fixed { offset } if (offset as usize) < BLOCK_SIZES.len() => offset,
            BlockSizePolicy::Fixed { offset } => {
                return Err(IndexError::InvalidInput(format!(
                    "block size offset {} out of range",
                    offset
                )))
            }
        };
        let mut creator = FrameCreator::<C>::with_block_size_offset(offset);
        for &id in ids {
            creator.push(id);
        }
        Ok(creator.finish())
    }

    /// Encode the ids of all set bits.
    pub fn from_bit_set(bits: &DenseBitSet) -> Self {
        let ids: Vec<u32> = bit_set_ids(bits).collect();
        let deltas = deltas_of(&ids);
        let mut creator =
            FrameCreator::<C>::with_block_size_offset(optimal_block_size_offset::<C>(&deltas));
        for id in ids {
            creator.push(id);
        }
        creator.finish()
    }

    /// Open serialized bytes, decoding every block once.
    ///
    /// Bytes after the descriptor are ignored.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        Self::open(data)
            .inspect_err(|e| log::warn!("rejecting {:?} index: {}", C::INDEX_TYPE, e))
    }

    fn open(data: Bytes) -> Result<Self> {
        let mut view = ByteView::new(data);
        let size = view.get_varint_u32()?;
        let blocks_len = view.get_varint_u32()? as usize;
        let header_len = view.tell();
        let blocks = view.slice(header_len, blocks_len)?.bytes().clone();

        let desc_start = header_len + blocks_len;
        let desc = view.slice(desc_start, view.len() - desc_start)?;
        let desc = desc.bytes();
        let first = *desc
            .first()
            .ok_or_else(|| IndexError::corrupt("missing block descriptor"))?;
        let block_size_offset = first >> (8 - BLOCK_DESC_BIT_WIDTH);
        let block_count = (size as usize).div_ceil(block_size(block_size_offset));
        let desc_len = packed_len(BLOCK_DESC_BIT_WIDTH, block_count + 1);
        if desc.len() < desc_len {
            return Err(IndexError::corrupt(format!(
                "descriptor for {} blocks needs {} bytes, {} left",
                block_count,
                desc_len,
                desc.len()
            )));
        }
        let mut entries = vec![0u32; block_count + 1];
        bitpack::unpack(desc, BLOCK_DESC_BIT_WIDTH, &mut entries);

        let metas = Self::check_blocks(&blocks, size, block_size_offset, &entries[1..])?;
        Ok(Self {
            data: view.bytes().slice(..desc_start + desc_len),
            blocks,
            size,
            block_size_offset,
            metas: metas.into(),
            cache: RefCell::default(),
            _codec: PhantomData,
        })
    }

    fn check_blocks(blocks: &[u8], size: u32, offset: u8, widths: &[u32]) -> Result<Vec<BlockMeta>> {
        let per_block = block_size(offset);
        let mut scratch = vec![0u32; per_block.min(size as usize)];
        let mut metas = Vec::with_capacity(widths.len());
        let mut pos = 0usize;
        let mut last = 0u64;
        let mut remaining = size as usize;

        for (i, &entry) in widths.iter().enumerate() {
            let bits = if entry == 0 { 32 } else { entry };
            let n = remaining.min(per_block);
            let data = blocks.get(pos..).unwrap_or_default();
            let used = C::decode(data, bits, &mut scratch[..n])
                .map_err(|e| IndexError::corrupt(format!("block {}: {}", i, e)))?;
            metas.push(BlockMeta {
                offset: pos,
                base: last as u32,
                bits: bits as u8,
            });
            for (j, &d) in scratch[..n].iter().enumerate() {
                if d == 0 && !(i == 0 && j == 0) {
                    return Err(IndexError::corrupt(format!(
                        "zero delta at position {}",
                        i * per_block + j
                    )));
                }
                last += u64::from(d);
            }
            if last > u64::from(u32::MAX) {
                return Err(IndexError::corrupt(format!("block {}: id exceeds 32 bits", i)));
            }
            pos += used;
            remaining -= n;
        }
        if pos != blocks.len() {
            return Err(IndexError::corrupt(format!(
                "blocks use {} bytes, header declares {}",
                pos,
                blocks.len()
            )));
        }
        Ok(metas)
    }

    /// Serialized bytes (header, blocks, descriptor).
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Offset of the block size in [`BLOCK_SIZES`].
    pub fn block_size_offset(&self) -> u8 {
        self.block_size_offset
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.metas.len()
    }

    /// Bit width of every block, in order.
    pub fn block_widths(&self) -> Vec<u32> {
        self.metas.iter().map(|m| u32::from(m.bits)).collect()
    }

    /// Id at `pos`.
    pub fn at(&self, pos: u32) -> Result<u32> {
        if pos >= self.size {
            return Err(IndexError::OutOfRange {
                pos,
                size: self.size,
            });
        }
        let per_block = block_size(self.block_size_offset);
        let block = pos as usize / per_block;
        let mut cache = self.cache.borrow_mut();
        if cache.block != Some(block) {
            cache.block = None;
            self.decode_block(block, &mut cache.ids)?;
            cache.block = Some(block);
        }
        Ok(cache.ids[pos as usize % per_block])
    }

    fn block_len(&self, block: usize) -> usize {
        let per_block = block_size(self.block_size_offset);
        per_block.min(self.size as usize - block * per_block)
    }

    /// Decode block `block` into absolute ids.
    fn decode_block(&self, block: usize, out: &mut Vec<u32>) -> Result<()> {
        decode_block::<C>(&self.blocks, &self.metas[block], self.block_len(block), out)
    }

    /// Merge under `Op` into a fresh 128-id-block index.
    pub(crate) fn op<Op: SetOp>(&self, other: &Self, limit: Option<u32>) -> Self {
        let mut creator = FrameCreator::<C>::new();
        set_ops::execute::<Op, _, _, _>(self.iter(), other.iter(), &mut creator, limit);
        creator.finish()
    }

    /// `self ∪ other`.
    pub fn unite(&self, other: &Self) -> Self {
        self.op::<Unite>(other, None)
    }

    /// `self ∩ other`.
    pub fn intersect(&self, other: &Self) -> Self {
        self.op::<Intersect>(other, None)
    }

    /// `self \ other`.
    pub fn difference(&self, other: &Self) -> Self {
        self.op::<Difference>(other, None)
    }

    /// `self △ other`.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.op::<SymmetricDifference>(other, None)
    }

    /// The `k` smallest ids of `self ∪ other`.
    pub fn unite_k(&self, other: &Self, k: u32) -> Self {
        self.op::<Unite>(other, Some(k))
    }
}

fn decode_block<C: BlockCodec>(blocks: &Bytes, meta: &BlockMeta, n: usize, out: &mut Vec<u32>) -> Result<()> {
    out.clear();
    out.resize(n, 0);
    let data = blocks.get(meta.offset..).unwrap_or_default();
    C::decode(data, u32::from(meta.bits), out)?;
    let mut id = meta.base;
    for v in out.iter_mut() {
        id = id.wrapping_add(*v);
        *v = id;
    }
    Ok(())
}

impl<C: BlockCodec> Clone for FrameIndex<C> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            blocks: self.blocks.clone(),
            size: self.size,
            block_size_offset: self.block_size_offset,
            metas: Arc::clone(&self.metas),
            cache: RefCell::default(),
            _codec: PhantomData,
        }
    }
}

impl<C: BlockCodec> fmt::Debug for FrameIndex<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameIndex")
            .field("type", &C::INDEX_TYPE)
            .field("size", &self.size)
            .field("block_size", &block_size(self.block_size_offset))
            .field("blocks", &self.metas.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl<C: BlockCodec> Default for FrameIndex<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: BlockCodec> IdSet for FrameIndex<C> {
    type Iter = FrameIter<C>;

    fn index_type(&self) -> IndexType {
        C::INDEX_TYPE
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn byte_size(&self) -> usize {
        self.data.len()
    }

    fn iter(&self) -> FrameIter<C> {
        FrameIter {
            blocks: self.blocks.clone(),
            metas: Arc::clone(&self.metas),
            per_block: block_size(self.block_size_offset),
            left: self.size as usize,
            next_block: 0,
            buf: Vec::new(),
            pos: 0,
            _codec: PhantomData,
        }
    }

    fn find(&self, id: u32) -> Option<u32> {
        if self.metas.is_empty() {
            return None;
        }
        // last block whose base lies below `id`; id 0 can only be in block 0
        let block = self.metas.partition_point(|m| m.base < id).saturating_sub(1);
        let mut cache = self.cache.borrow_mut();
        if cache.block != Some(block) {
            cache.block = None;
            self.decode_block(block, &mut cache.ids).ok()?;
            cache.block = Some(block);
        }
        let pos = cache.ids.binary_search(&id).ok()?;
        Some((block * block_size(self.block_size_offset) + pos) as u32)
    }
}

/// Block-at-a-time iterator over a [`FrameIndex`].
pub struct FrameIter<C: BlockCodec> {
    blocks: Bytes,
    metas: Arc<[BlockMeta]>,
    per_block: usize,
    left: usize,
    next_block: usize,
    buf: Vec<u32>,
    pos: usize,
    _codec: PhantomData<C>,
}

impl<C: BlockCodec> Iterator for FrameIter<C> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.pos == self.buf.len() {
            if self.left == 0 {
                return None;
            }
            let meta = self.metas.get(self.next_block)?;
            let n = self.left.min(self.per_block);
            if let Err(e) = decode_block::<C>(&self.blocks, meta, n, &mut self.buf) {
                log::warn!("{:?} block {} unreadable: {}", C::INDEX_TYPE, self.next_block, e);
                self.left = 0;
                self.buf.clear();
                self.pos = 0;
                return None;
            }
            self.next_block += 1;
            self.pos = 0;
        }
        let id = self.buf[self.pos];
        self.pos += 1;
        self.left -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.left, Some(self.left))
    }
}

impl<C: BlockCodec> ExactSizeIterator for FrameIter<C> {}

impl<C: BlockCodec> fmt::Debug for FrameIter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameIter")
            .field("type", &C::INDEX_TYPE)
            .field("left", &self.left)
            .finish()
    }
}

impl<C: BlockCodec> Clone for FrameIter<C> {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks.clone(),
            metas: Arc::clone(&self.metas),
            per_block: self.per_block,
            left: self.left,
            next_block: self.next_block,
            buf: self.buf.clone(),
            pos: self.pos,
            _codec: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_with_gaps(n: u32) -> Vec<u32> {
        (0..n).map(|i| i * 3 + (i % 7) * 100 + i / 10 * 1000).collect::<Vec<_>>()
    }

    fn sorted(n: u32) -> Vec<u32> {
        let mut ids = ids_with_gaps(n);
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    #[test]
    fn test_block_size_table() {
        assert_eq!(BLOCK_SIZES[DEFAULT_BLOCK_SIZE_OFFSET as usize], 128);
        let mut seen = BLOCK_SIZES.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 32);
    }

    #[test]
    fn test_round_trip_both_codecs() {
        let ids = sorted(5000);
        let f = ForIndex::create(&ids).unwrap();
        let p = PforIndex::create(&ids).unwrap();
        assert_eq!(f.to_vec(), ids);
        assert_eq!(p.to_vec(), ids);
        assert_eq!(ForIndex::from_bytes(f.data().clone()).unwrap().to_vec(), ids);
        assert_eq!(PforIndex::from_bytes(p.data().clone()).unwrap().to_vec(), ids);
    }

    #[test]
    fn test_default_creator_block_split() {
        let mut creator = ForCreator::new();
        for id in 1..=129 {
            creator.push(id);
        }
        let index = creator.finish();
        assert_eq!(index.block_count(), 2);
        assert_eq!(index.block_size_offset(), DEFAULT_BLOCK_SIZE_OFFSET);
        assert_eq!(index.at(128).unwrap(), 129);
        assert_eq!(index.iter().len(), 129);

        let reopened = ForIndex::from_bytes(index.data().clone()).unwrap();
        assert_eq!(reopened.block_count(), 2);
        assert_eq!(reopened.block_len(1), 1);
        assert_eq!(reopened.to_vec(), (1..=129).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_layout() {
        let index = ForIndex::empty();
        assert_eq!(index.data().as_ref(), &[0, 0, 0]);
        assert_eq!(index.iter().next(), None);
        let reopened = PforIndex::from_bytes(index.data().clone()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_width_32_descriptor() {
        let ids = [0, u32::MAX];
        let index = ForIndex::create_with(&ids, BlockSizePolicy::Fixed { offset: 1 }).unwrap();
        assert_eq!(index.block_widths(), vec![32]);
        let reopened = ForIndex::from_bytes(index.data().clone()).unwrap();
        assert_eq!(reopened.block_widths(), vec![32]);
        assert_eq!(reopened.to_vec(), ids.to_vec());
    }

    #[test]
    fn test_at_and_find() {
        let ids = sorted(1000);
        let index = PforIndex::create_with(&ids, BlockSizePolicy::fixed_default()).unwrap();
        for (i, &id) in ids.iter().enumerate().step_by(37) {
            assert_eq!(index.at(i as u32).unwrap(), id);
            assert_eq!(index.find(id), Some(i as u32));
        }
        assert_eq!(
            index.at(ids.len() as u32),
            Err(IndexError::OutOfRange {
                pos: ids.len() as u32,
                size: ids.len() as u32
            })
        );
        assert_eq!(index.find(ids[0] + 1), None);
        assert_eq!(index.find(u32::MAX), None);
    }

    #[test]
    fn test_optimizer_prefers_smaller() {
        let ids = sorted(3000);
        let deltas = deltas_of(&ids);
        let best = optimal_block_size_offset::<ForBlocks>(&deltas);
        let best_size = ForIndex::create(&ids).unwrap().byte_size();
        assert_eq!(ForIndex::create(&ids).unwrap().block_size_offset(), best);
        for offset in 0..BLOCK_SIZES.len() as u8 {
            let fixed = ForIndex::create_with(&ids, BlockSizePolicy::Fixed { offset }).unwrap();
            assert!(best_size <= fixed.byte_size(), "offset {}", offset);
        }
    }

    #[test]
    fn test_set_ops() {
        let a = ForIndex::create(&[1, 2, 3, 100, 101, 102]).unwrap();
        let b = ForIndex::create(&[2, 4, 100, 103]).unwrap();
        assert_eq!(a.unite(&b).to_vec(), vec![1, 2, 3, 4, 100, 101, 102, 103]);
        assert_eq!(a.intersect(&b).to_vec(), vec![2, 100]);
        assert_eq!(a.difference(&b).to_vec(), vec![1, 3, 101, 102]);
        assert_eq!(a.symmetric_difference(&b).to_vec(), vec![1, 3, 4, 101, 102, 103]);
    }

    #[test]
    fn test_corrupt_data() {
        let index = ForIndex::create_with(&sorted(300), BlockSizePolicy::fixed_default()).unwrap();
        let bytes = index.data().clone();

        // descriptor cut short
        let cut = bytes.slice(..bytes.len() - 1);
        assert!(matches!(
            ForIndex::from_bytes(cut),
            Err(IndexError::CorruptData(_))
        ));

        // widen the first block: block data no longer adds up
        let mut raw = bytes.to_vec();
        let desc = raw.len() - packed_len(BLOCK_DESC_BIT_WIDTH, index.block_count() + 1);
        raw[desc] ^= 0x01;
        assert!(ForIndex::from_bytes(Bytes::from(raw)).is_err());

        // count 300 -> 16383, same varint length, far more blocks than described
        let mut raw = bytes.to_vec();
        raw[0] = 0xFF;
        raw[1] = 0x7F;
        assert!(ForIndex::from_bytes(Bytes::from(raw)).is_err());
    }

    #[test]
    fn test_bit_set_round_trip() {
        let ids = sorted(200);
        let index = PforIndex::create(&ids).unwrap();
        let mut bits = DenseBitSet::new();
        index.put_into_bit_set(&mut bits);
        assert_eq!(PforIndex::from_bit_set(&bits).to_vec(), ids);
    }
}
