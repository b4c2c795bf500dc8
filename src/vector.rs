//! Uncompressed in-memory id set.
//!
//! Destination of set operations between different codecs and of the bounded
//! N-ary operations. Never serialized.

use std::sync::Arc;

use crate::config::IndexType;
use crate::error::{IndexError, Result};
use crate::traits::{bit_set_ids, validate_ids, DenseBitSet, IdSet, IndexCreator};

/// Ascending ids in a shared slice.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    ids: Arc<[u32]>,
}

impl VectorIndex {
    /// Wrap `ids`, which must be strictly ascending.
    pub fn new(ids: Vec<u32>) -> Result<Self> {
        validate_ids(&ids)?;
        Ok(Self::from_sorted(ids))
    }

    pub(crate) fn from_sorted(ids: Vec<u32>) -> Self {
        Self { ids: ids.into() }
    }

    /// Ids of all set bits.
    pub fn from_bit_set(bits: &DenseBitSet) -> Self {
        Self::from_sorted(bit_set_ids(bits).collect())
    }

    /// Id at `pos`.
    pub fn at(&self, pos: u32) -> Result<u32> {
        self.ids
            .get(pos as usize)
            .copied()
            .ok_or(IndexError::OutOfRange {
                pos,
                size: self.size(),
            })
    }

    /// The ids.
    pub fn as_slice(&self) -> &[u32] {
        &self.ids
    }
}

impl IdSet for VectorIndex {
    type Iter = VectorIter;

    fn index_type(&self) -> IndexType {
        IndexType::Vector
    }

    fn size(&self) -> u32 {
        self.ids.len() as u32
    }

    fn byte_size(&self) -> usize {
        self.ids.len() * std::mem::size_of::<u32>()
    }

    fn iter(&self) -> VectorIter {
        VectorIter {
            ids: Arc::clone(&self.ids),
            pos: 0,
        }
    }

    fn find(&self, id: u32) -> Option<u32> {
        self.ids.binary_search(&id).ok().map(|p| p as u32)
    }

    fn to_vec(&self) -> Vec<u32> {
        self.ids.to_vec()
    }
}

/// Iterator over a [`VectorIndex`].
#[derive(Debug, Clone)]
pub struct VectorIter {
    ids: Arc<[u32]>,
    pos: usize,
}

impl Iterator for VectorIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let id = self.ids.get(self.pos).copied()?;
        self.pos += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.ids.len() - self.pos;
        (n, Some(n))
    }
}

impl ExactSizeIterator for VectorIter {}

/// Builder for [`VectorIndex`].
#[derive(Debug, Default)]
pub struct VectorCreator {
    ids: Vec<u32>,
}

impl VectorCreator {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty builder with room for `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }
}

impl IndexCreator for VectorCreator {
    type Output = VectorIndex;

    fn push(&mut self, id: u32) {
        debug_assert!(
            self.ids.last().map_or(true, |&last| last < id),
            "ids must be pushed strictly ascending"
        );
        self.ids.push(id);
    }

    fn size(&self) -> u32 {
        self.ids.len() as u32
    }

    fn finish(self) -> VectorIndex {
        VectorIndex::from_sorted(self.ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_out_of_range() {
        let index = VectorIndex::new(vec![3, 9]).unwrap();
        assert_eq!(index.at(1).unwrap(), 9);
        assert_eq!(
            index.at(2).unwrap_err(),
            IndexError::OutOfRange { pos: 2, size: 2 }
        );
    }

    #[test]
    fn test_rejects_unsorted() {
        assert!(VectorIndex::new(vec![3, 3]).is_err());
    }

    #[test]
    fn test_find_and_bits() {
        let index = VectorIndex::new(vec![1, 4, 9]).unwrap();
        assert_eq!(index.find(4), Some(1));
        assert_eq!(index.find(5), None);

        let mut bits = DenseBitSet::new();
        index.put_into_bit_set(&mut bits);
        assert_eq!(bits.len(), 10);
        assert_eq!(VectorIndex::from_bit_set(&bits).to_vec(), vec![1, 4, 9]);
    }
}
