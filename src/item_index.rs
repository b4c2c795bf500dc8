//! The `ItemIndex` handle: one type over every codec.
//!
//! Set operations dispatch in two tiers. Two operands of the same codec use
//! that codec's own merge (RLE-DE works on the token streams directly; FoR and
//! PFoR re-encode into their own creator). Operands of different codecs go
//! through the generic executor and produce an in-memory [`VectorIndex`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Sub};

use bytes::Bytes;

use crate::config::{IndexConfig, IndexType};
use crate::error::{IndexError, Result};
use crate::frame::{ForIndex, ForIter, PforIndex, PforIter};
use crate::rle_de::{self, RleDeCreator, RleDeIndex, RleDeIter};
use crate::set_ops::{self, Difference, Intersect, SetOp, SetOpKind, SymmetricDifference, Unite};
use crate::storage::{ByteBuf, ByteView};
use crate::traits::{DenseBitSet, IdSet, IndexCreator, ItemFilter};
use crate::vector::{VectorCreator, VectorIndex, VectorIter};

/// Largest result size for which the bounded N-ary operations run directly
/// on RLE-DE streams.
pub const RLE_DE_FAST_PATH_MAX_RESULTS: u32 = 1024;

#[derive(Debug, Clone, Default)]
enum Repr {
    #[default]
    Empty,
    RleDe(RleDeIndex),
    For(ForIndex),
    PFor(PforIndex),
    Vector(VectorIndex),
}

/// Handle to an immutable ascending id set.
///
/// Cloning shares the encoded bytes and gives the clone its own decode caches.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    repr: Repr,
}

impl From<RleDeIndex> for ItemIndex {
    fn from(index: RleDeIndex) -> Self {
        Self {
            repr: Repr::RleDe(index),
        }
    }
}

impl From<ForIndex> for ItemIndex {
    fn from(index: ForIndex) -> Self {
        Self {
            repr: Repr::For(index),
        }
    }
}

impl From<PforIndex> for ItemIndex {
    fn from(index: PforIndex) -> Self {
        Self {
            repr: Repr::PFor(index),
        }
    }
}

impl From<VectorIndex> for ItemIndex {
    fn from(index: VectorIndex) -> Self {
        Self {
            repr: Repr::Vector(index),
        }
    }
}

impl ItemIndex {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Encode strictly ascending `ids` with `index_type`.
    pub fn build(ids: &[u32], index_type: IndexType) -> Result<Self> {
        Self::build_with(ids, &IndexConfig::new(index_type))
    }

    /// Encode strictly ascending `ids` as described by `config`.
    pub fn build_with(ids: &[u32], config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        match config.index_type {
            IndexType::RleDe => RleDeIndex::create(ids).map(Self::from),
            IndexType::For => ForIndex::create_with(ids, config.block_size).map(Self::from),
            IndexType::PFor => PforIndex::create_with(ids, config.block_size).map(Self::from),
            IndexType::Vector => VectorIndex::new(ids.to_vec()).map(Self::from),
            IndexType::Empty if ids.is_empty() => Ok(Self::empty()),
            IndexType::Empty => Err(IndexError::InvalidInput(format!(
                "cannot store {} ids in an empty index",
                ids.len()
            ))),
        }
    }

    /// Encode the ids of all set bits with `index_type`.
    pub fn from_bit_set(bits: &DenseBitSet, index_type: IndexType) -> Result<Self> {
        match index_type {
            IndexType::RleDe => Ok(RleDeIndex::from_bit_set(bits).into()),
            IndexType::For => Ok(ForIndex::from_bit_set(bits).into()),
            IndexType::PFor => Ok(PforIndex::from_bit_set(bits).into()),
            IndexType::Vector => Ok(VectorIndex::from_bit_set(bits).into()),
            IndexType::Empty if bits.not_any() => Ok(Self::empty()),
            IndexType::Empty => Err(IndexError::InvalidInput(
                "cannot store set bits in an empty index".into(),
            )),
        }
    }

    /// Open serialized bytes of a codec.
    pub fn from_bytes(data: Bytes, index_type: IndexType) -> Result<Self> {
        match index_type {
            IndexType::RleDe => RleDeIndex::from_bytes(data).map(Self::from),
            IndexType::For => ForIndex::from_bytes(data).map(Self::from),
            IndexType::PFor => PforIndex::from_bytes(data).map(Self::from),
            IndexType::Empty => Ok(Self::empty()),
            IndexType::Vector => Err(IndexError::UnsupportedType(
                "vector indexes have no byte format".into(),
            )),
        }
    }

    /// Open serialized bytes of the codec whose flag bit is `bits`.
    pub fn from_bytes_with_bits(data: Bytes, bits: u32) -> Result<Self> {
        Self::from_bytes(data, IndexType::from_bits(bits)?)
    }

    /// Codec tag and serialized bytes. The empty set serializes as RLE-DE.
    pub fn data(&self) -> Result<(IndexType, Bytes)> {
        match &self.repr {
            Repr::Empty => Ok((IndexType::RleDe, RleDeIndex::empty().data().clone())),
            Repr::RleDe(index) => Ok((IndexType::RleDe, index.data().clone())),
            Repr::For(index) => Ok((IndexType::For, index.data().clone())),
            Repr::PFor(index) => Ok((IndexType::PFor, index.data().clone())),
            Repr::Vector(_) => Err(IndexError::UnsupportedType(
                "vector indexes have no byte format".into(),
            )),
        }
    }

    /// Append a one-byte codec discriminant and the serialized bytes.
    pub fn write_tagged(&self, buf: &mut ByteBuf) -> Result<()> {
        let (index_type, data) = self.data()?;
        buf.put_u8(index_type.to_discriminant());
        buf.put_slice(&data);
        Ok(())
    }

    /// Read an index written by [`ItemIndex::write_tagged`], advancing `view`
    /// past it.
    pub fn read_tagged(view: &mut ByteView) -> Result<Self> {
        let index_type = IndexType::from_discriminant(view.get_u8()?)?;
        if index_type == IndexType::Empty {
            return Ok(Self::empty());
        }
        let index = Self::from_bytes(view.rest(), index_type)?;
        view.advance(index.byte_size())?;
        Ok(index)
    }

    /// Re-encode with another codec.
    pub fn convert(&self, index_type: IndexType) -> Result<Self> {
        if index_type == self.index_type() {
            return Ok(self.clone());
        }
        match index_type {
            IndexType::RleDe => {
                let mut creator = RleDeCreator::new();
                for id in self.iter() {
                    creator.push(id);
                }
                Ok(creator.finish().into())
            }
            IndexType::For => ForIndex::create(&self.to_vec()).map(Self::from),
            IndexType::PFor => PforIndex::create(&self.to_vec()).map(Self::from),
            IndexType::Vector => Ok(VectorIndex::from_sorted(self.to_vec()).into()),
            IndexType::Empty if self.is_empty() => Ok(Self::empty()),
            IndexType::Empty => Err(IndexError::InvalidInput(format!(
                "cannot convert {} ids to an empty index",
                self.size()
            ))),
        }
    }

    /// Id at `pos`.
    ///
    /// RLE-DE and empty indexes answer 0 past the end; FoR, PFoR and vector
    /// indexes report [`IndexError::OutOfRange`].
    pub fn at(&self, pos: u32) -> Result<u32> {
        match &self.repr {
            Repr::Empty => Ok(0),
            Repr::RleDe(index) => Ok(index.at(pos)),
            Repr::For(index) => index.at(pos),
            Repr::PFor(index) => index.at(pos),
            Repr::Vector(index) => index.at(pos),
        }
    }

    /// Smallest id (see [`ItemIndex::at`] for empty sets).
    pub fn front(&self) -> Result<u32> {
        self.at(0)
    }

    /// Largest id (see [`ItemIndex::at`] for empty sets).
    pub fn back(&self) -> Result<u32> {
        self.at(self.size().wrapping_sub(1))
    }

    /// True if `id` is in the set.
    pub fn contains(&self, id: u32) -> bool {
        self.find(id).is_some()
    }

    /// Copy ids into `out` from the front; returns how many were written.
    pub fn put_into_slice(&self, out: &mut [u32]) -> usize {
        let mut written = 0;
        for (slot, id) in out.iter_mut().zip(self.iter()) {
            *slot = id;
            written += 1;
        }
        written
    }

    fn binary<Op: SetOp>(&self, other: &ItemIndex, limit: Option<u32>) -> ItemIndex {
        if let Some(result) = self.empty_operand::<Op>(other, limit) {
            return result;
        }
        match (&self.repr, &other.repr) {
            (Repr::RleDe(a), Repr::RleDe(b)) => rle_de::merge::<Op>(a, b, limit).into(),
            (Repr::For(a), Repr::For(b)) => a.op::<Op>(b, limit).into(),
            (Repr::PFor(a), Repr::PFor(b)) => a.op::<Op>(b, limit).into(),
            (Repr::Vector(_), Repr::Vector(_)) => generic::<Op>(self, other, limit),
            _ => {
                log::trace!(
                    "{:?} of {:?} and {:?} falls back to the generic executor",
                    Op::KIND,
                    self.index_type(),
                    other.index_type()
                );
                generic::<Op>(self, other, limit)
            }
        }
    }

    /// Result of `self Op other` when an operand is empty, without decoding.
    fn empty_operand<Op: SetOp>(&self, other: &ItemIndex, limit: Option<u32>) -> Option<ItemIndex> {
        let fits = |index: &ItemIndex| limit.map_or(true, |k| index.size() <= k);
        match (self.is_empty(), other.is_empty()) {
            (false, false) => None,
            (true, true) => Some(ItemIndex::empty()),
            (a_empty, _) => match Op::KIND {
                SetOpKind::Intersect => Some(ItemIndex::empty()),
                SetOpKind::Difference if a_empty => Some(ItemIndex::empty()),
                SetOpKind::Difference => fits(self).then(|| self.clone()),
                SetOpKind::Unite | SetOpKind::SymmetricDifference => {
                    let rest = if a_empty { other } else { self };
                    fits(rest).then(|| rest.clone())
                }
            },
        }
    }

    /// `self ∪ other`.
    pub fn unite(&self, other: &ItemIndex) -> ItemIndex {
        self.binary::<Unite>(other, None)
    }

    /// `self ∩ other`.
    pub fn intersect(&self, other: &ItemIndex) -> ItemIndex {
        self.binary::<Intersect>(other, None)
    }

    /// `self \ other`.
    pub fn difference(&self, other: &ItemIndex) -> ItemIndex {
        self.binary::<Difference>(other, None)
    }

    /// `self △ other`.
    pub fn symmetric_difference(&self, other: &ItemIndex) -> ItemIndex {
        self.binary::<SymmetricDifference>(other, None)
    }

    /// The `k` smallest ids of `self ∪ other`.
    pub fn unite_k(&self, other: &ItemIndex, k: u32) -> ItemIndex {
        self.binary::<Unite>(other, Some(k))
    }

    /// Union of all `indexes`, combined as a balanced tree.
    pub fn unite_all(indexes: &[ItemIndex]) -> ItemIndex {
        tree::<Unite>(indexes)
    }

    /// Intersection of all `indexes`, combined as a balanced tree. Empty for
    /// an empty slice.
    pub fn intersect_all(indexes: &[ItemIndex]) -> ItemIndex {
        tree::<Intersect>(indexes)
    }

    /// Up to `max_results` ids present in every index and accepted by
    /// `filter`, as a vector index.
    pub fn constrained_intersect(
        indexes: &[ItemIndex],
        max_results: u32,
        filter: Option<&dyn ItemFilter>,
    ) -> ItemIndex {
        Self::fused_intersect_difference(indexes, &[], max_results, filter)
    }

    /// Up to `max_results` ids present in every `intersect` index, absent
    /// from every `subtract` index and accepted by `filter`, as a vector
    /// index.
    pub fn fused_intersect_difference(
        intersect: &[ItemIndex],
        subtract: &[ItemIndex],
        max_results: u32,
        filter: Option<&dyn ItemFilter>,
    ) -> ItemIndex {
        if intersect.is_empty() || max_results == 0 || intersect.iter().any(IdSet::is_empty) {
            return ItemIndex::empty();
        }
        let subtract: Vec<&ItemIndex> = subtract.iter().filter(|s| !s.is_empty()).collect();

        let mut out = VectorCreator::new();
        if max_results <= RLE_DE_FAST_PATH_MAX_RESULTS {
            let inter: Option<Vec<&RleDeIndex>> = intersect.iter().map(ItemIndex::as_rle_de).collect();
            let sub: Option<Vec<&RleDeIndex>> = subtract.iter().map(|s| s.as_rle_de()).collect();
            if let (Some(inter), Some(sub)) = (inter, sub) {
                rle_de::fused_intersect_difference(&inter, &sub, max_results, filter, &mut out);
                return out.finish().into();
            }
        }

        let mut candidates = Self::intersect_all(intersect);
        if !subtract.is_empty() {
            let owned: Vec<ItemIndex> = subtract.into_iter().cloned().collect();
            candidates = candidates.difference(&Self::unite_all(&owned));
        }
        for id in candidates.iter() {
            if filter.map_or(true, |f| f.matches(id)) {
                out.push(id);
                if out.size() >= max_results {
                    break;
                }
            }
        }
        out.finish().into()
    }

    fn as_rle_de(&self) -> Option<&RleDeIndex> {
        match &self.repr {
            Repr::RleDe(index) => Some(index),
            _ => None,
        }
    }
}

/// Merge through the generic executor into a vector index.
fn generic<Op: SetOp>(a: &ItemIndex, b: &ItemIndex, limit: Option<u32>) -> ItemIndex {
    let capacity = Op::max_size(a.size(), b.size()).min(limit.unwrap_or(u32::MAX));
    let mut out = VectorCreator::with_capacity(capacity as usize);
    set_ops::execute::<Op, _, _, _>(a.iter(), b.iter(), &mut out, limit);
    out.finish().into()
}

fn tree<Op: SetOp>(indexes: &[ItemIndex]) -> ItemIndex {
    match indexes {
        [] => ItemIndex::empty(),
        [one] => one.clone(),
        _ => {
            let mid = indexes.len() / 2;
            tree::<Op>(&indexes[..mid]).binary::<Op>(&tree::<Op>(&indexes[mid..]), None)
        }
    }
}

impl IdSet for ItemIndex {
    type Iter = ItemIndexIter;

    fn index_type(&self) -> IndexType {
        match &self.repr {
            Repr::Empty => IndexType::Empty,
            Repr::RleDe(index) => index.index_type(),
            Repr::For(index) => index.index_type(),
            Repr::PFor(index) => index.index_type(),
            Repr::Vector(index) => index.index_type(),
        }
    }

    fn size(&self) -> u32 {
        match &self.repr {
            Repr::Empty => 0,
            Repr::RleDe(index) => index.size(),
            Repr::For(index) => index.size(),
            Repr::PFor(index) => index.size(),
            Repr::Vector(index) => index.size(),
        }
    }

    fn byte_size(&self) -> usize {
        match &self.repr {
            Repr::Empty => 0,
            Repr::RleDe(index) => index.byte_size(),
            Repr::For(index) => index.byte_size(),
            Repr::PFor(index) => index.byte_size(),
            Repr::Vector(index) => index.byte_size(),
        }
    }

    fn iter(&self) -> ItemIndexIter {
        let inner = match &self.repr {
            Repr::Empty => IterRepr::Empty,
            Repr::RleDe(index) => IterRepr::RleDe(index.iter()),
            Repr::For(index) => IterRepr::For(index.iter()),
            Repr::PFor(index) => IterRepr::PFor(index.iter()),
            Repr::Vector(index) => IterRepr::Vector(index.iter()),
        };
        ItemIndexIter { inner }
    }

    fn find(&self, id: u32) -> Option<u32> {
        match &self.repr {
            Repr::Empty => None,
            Repr::RleDe(index) => index.find(id),
            Repr::For(index) => index.find(id),
            Repr::PFor(index) => index.find(id),
            Repr::Vector(index) => index.find(id),
        }
    }
}

#[derive(Debug, Clone)]
enum IterRepr {
    Empty,
    RleDe(RleDeIter),
    For(ForIter),
    PFor(PforIter),
    Vector(VectorIter),
}

/// Ascending iterator over an [`ItemIndex`].
#[derive(Debug, Clone)]
pub struct ItemIndexIter {
    inner: IterRepr,
}

impl Iterator for ItemIndexIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match &mut self.inner {
            IterRepr::Empty => None,
            IterRepr::RleDe(it) => it.next(),
            IterRepr::For(it) => it.next(),
            IterRepr::PFor(it) => it.next(),
            IterRepr::Vector(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterRepr::Empty => (0, Some(0)),
            IterRepr::RleDe(it) => it.size_hint(),
            IterRepr::For(it) => it.size_hint(),
            IterRepr::PFor(it) => it.size_hint(),
            IterRepr::Vector(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for ItemIndexIter {}

impl<'a> IntoIterator for &'a ItemIndex {
    type Item = u32;
    type IntoIter = ItemIndexIter;

    fn into_iter(self) -> ItemIndexIter {
        self.iter()
    }
}

impl PartialEq for ItemIndex {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && self.iter().eq(other.iter())
    }
}

impl Eq for ItemIndex {}

impl fmt::Display for ItemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemIndex<{}>[", self.size())?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", id)?;
        }
        f.write_str("]")
    }
}

impl BitOr for &ItemIndex {
    type Output = ItemIndex;

    fn bitor(self, rhs: &ItemIndex) -> ItemIndex {
        self.unite(rhs)
    }
}

impl BitAnd for &ItemIndex {
    type Output = ItemIndex;

    fn bitand(self, rhs: &ItemIndex) -> ItemIndex {
        self.intersect(rhs)
    }
}

impl Sub for &ItemIndex {
    type Output = ItemIndex;

    fn sub(self, rhs: &ItemIndex) -> ItemIndex {
        self.difference(rhs)
    }
}

impl BitXor for &ItemIndex {
    type Output = ItemIndex;

    fn bitxor(self, rhs: &ItemIndex) -> ItemIndex {
        self.symmetric_difference(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockSizePolicy;

    const CODECS: [IndexType; 4] = [
        IndexType::RleDe,
        IndexType::For,
        IndexType::PFor,
        IndexType::Vector,
    ];

    fn build(ids: &[u32], t: IndexType) -> ItemIndex {
        ItemIndex::build(ids, t).unwrap()
    }

    #[test]
    fn test_every_pairing() {
        let a = [1, 2, 3, 100, 101, 102];
        let b = [2, 4, 100, 103];
        for ta in CODECS {
            for tb in CODECS {
                let (x, y) = (build(&a, ta), build(&b, tb));
                assert_eq!(x.unite(&y).to_vec(), vec![1, 2, 3, 4, 100, 101, 102, 103]);
                assert_eq!((&x & &y).to_vec(), vec![2, 100]);
                assert_eq!((&x - &y).to_vec(), vec![1, 3, 101, 102]);
                assert_eq!((&x ^ &y).to_vec(), vec![1, 3, 4, 101, 102, 103]);
                assert_eq!(x.unite_k(&y, 3).to_vec(), vec![1, 2, 3]);
            }
        }
    }

    #[test]
    fn test_result_types() {
        let a = build(&[1, 2, 3], IndexType::RleDe);
        let b = build(&[2, 3, 4], IndexType::PFor);
        assert_eq!((&a | &a).index_type(), IndexType::RleDe);
        assert_eq!((&b | &b).index_type(), IndexType::PFor);
        assert_eq!((&a | &b).index_type(), IndexType::Vector);
    }

    #[test]
    fn test_empty_operand_rules() {
        let a = build(&[5, 6, 7], IndexType::For);
        let e = ItemIndex::empty();
        assert!(a.intersect(&e).is_empty());
        assert_eq!(e.unite(&a).index_type(), IndexType::For);
        assert_eq!(e.unite(&a), a);
        assert_eq!(a.difference(&e), a);
        assert!(e.difference(&a).is_empty());
        assert_eq!(e.symmetric_difference(&a), a);
        assert_eq!(a.unite_k(&e, 2).to_vec(), vec![5, 6]);
        assert!(e.unite(&e).is_empty());
    }

    #[test]
    fn test_accessor_asymmetry() {
        let ids = [10, 20, 30];
        assert_eq!(build(&ids, IndexType::RleDe).at(3), Ok(0));
        assert_eq!(ItemIndex::empty().at(0), Ok(0));
        assert_eq!(ItemIndex::empty().back(), Ok(0));
        for t in [IndexType::For, IndexType::PFor, IndexType::Vector] {
            let index = build(&ids, t);
            assert_eq!(index.front(), Ok(10));
            assert_eq!(index.back(), Ok(30));
            assert_eq!(index.at(3), Err(IndexError::OutOfRange { pos: 3, size: 3 }));
        }
    }

    #[test]
    fn test_tree_ops() {
        let sets: Vec<ItemIndex> = (1..=5u32)
            .map(|k| {
                let ids: Vec<u32> = (0..200).filter(|i| i % k == 0).collect();
                build(&ids, CODECS[k as usize % CODECS.len()])
            })
            .collect();
        let inter = ItemIndex::intersect_all(&sets);
        assert_eq!(
            inter.to_vec(),
            (0..200).filter(|i| i % 60 == 0).collect::<Vec<_>>()
        );
        assert_eq!(ItemIndex::unite_all(&sets).size(), 200);
        assert!(ItemIndex::intersect_all(&[]).is_empty());
        assert_eq!(ItemIndex::unite_all(&sets[..1]), sets[0]);
    }

    #[test]
    fn test_bounded_nary() {
        let evens: Vec<u32> = (0..2000).map(|i| i * 2).collect();
        let threes: Vec<u32> = (0..2000).map(|i| i * 3).collect();
        let tens: Vec<u32> = (0..500).map(|i| i * 10).collect();
        let not_big = |id: u32| id < 600;

        for t in CODECS {
            let inter = [build(&evens, t), build(&threes, IndexType::RleDe)];
            let sub = [build(&tens, t)];
            let got = ItemIndex::fused_intersect_difference(&inter, &sub, 10, Some(&not_big));
            let want: Vec<u32> = (0..600).filter(|i| i % 6 == 0 && i % 10 != 0).take(10).collect();
            assert_eq!(got.to_vec(), want, "{:?}", t);
            assert_eq!(got.index_type(), IndexType::Vector);

            let capped = ItemIndex::constrained_intersect(&inter, 2000, None);
            let want: Vec<u32> = (0..4000).filter(|i| i % 6 == 0).take(2000).collect();
            assert_eq!(capped.to_vec(), want);
        }

        let with_empty = [build(&evens, IndexType::RleDe), ItemIndex::empty()];
        assert!(ItemIndex::constrained_intersect(&with_empty, 10, None).is_empty());
    }

    #[test]
    fn test_tagged_round_trip() {
        let ids = [3, 9, 27, 81];
        let mut buf = ByteBuf::new();
        for t in [IndexType::RleDe, IndexType::For, IndexType::PFor] {
            build(&ids, t).write_tagged(&mut buf).unwrap();
        }
        ItemIndex::empty().write_tagged(&mut buf).unwrap();
        assert!(build(&ids, IndexType::Vector).write_tagged(&mut buf).is_err());

        let mut view = ByteView::new(buf.freeze());
        for t in [IndexType::RleDe, IndexType::For, IndexType::PFor] {
            let index = ItemIndex::read_tagged(&mut view).unwrap();
            assert_eq!(index.index_type(), t);
            assert_eq!(index.to_vec(), ids.to_vec());
        }
        let empty = ItemIndex::read_tagged(&mut view).unwrap();
        assert!(empty.is_empty());
        assert!(!view.has_next());
    }

    #[test]
    fn test_convert_and_config() {
        let ids: Vec<u32> = (0..500).map(|i| i * i).collect();
        let config = IndexConfig::new(IndexType::For).with_block_size(BlockSizePolicy::fixed_default());
        let f = ItemIndex::build_with(&ids, &config).unwrap();
        for t in CODECS {
            let c = f.convert(t).unwrap();
            assert_eq!(c.index_type(), t);
            assert_eq!(c, f);
        }
        assert!(f.convert(IndexType::Empty).is_err());
        assert!(ItemIndex::build(&[2, 1], IndexType::PFor).is_err());
        assert!(ItemIndex::build(&[1], IndexType::Empty).is_err());
    }

    #[test]
    fn test_bits_and_slices() {
        let index = build(&[1, 64, 65, 1000], IndexType::PFor);
        let mut bits = DenseBitSet::new();
        index.put_into_bit_set(&mut bits);
        let back = ItemIndex::from_bit_set(&bits, IndexType::RleDe).unwrap();
        assert_eq!(back, index);

        let mut out = [0u32; 3];
        assert_eq!(index.put_into_slice(&mut out), 3);
        assert_eq!(out, [1, 64, 65]);
        assert!(index.contains(1000));
        assert!(!index.contains(999));
    }

    #[test]
    fn test_display() {
        let index = build(&[1, 2, 3], IndexType::RleDe);
        assert_eq!(index.to_string(), "ItemIndex<3>[1, 2, 3]");
        assert_eq!(ItemIndex::empty().to_string(), "ItemIndex<0>[]");
    }

    #[test]
    fn test_bits_per_id() {
        let ids: Vec<u32> = (0..10_000).collect();
        let index = build(&ids, IndexType::RleDe);
        assert!(index.bits_per_id() < 0.1);
        assert_eq!(ItemIndex::empty().bits_per_id(), 0.0);
    }
}
