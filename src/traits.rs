//! Contracts shared by every codec.

use bitvec::prelude::{BitVec, Lsb0};

use crate::config::IndexType;
use crate::error::{IndexError, Result};

/// Dense bit-vector view of an id set: bit `i` set means id `i` is present.
pub type DenseBitSet = BitVec<u64, Lsb0>;

/// Append-only builder producing one immutable index.
///
/// Ids must be pushed strictly ascending. This is checked in debug builds
/// only; bulk constructors taking a slice validate and report
/// [`IndexError::InvalidInput`] instead.
pub trait IndexCreator {
    /// Index produced by [`IndexCreator::finish`].
    type Output;

    /// Append one id.
    fn push(&mut self, id: u32);

    /// Number of ids pushed so far.
    fn size(&self) -> u32;

    /// Seal the builder.
    fn finish(self) -> Self::Output;
}

/// Read-only view of an ascending id set, implemented by every codec.
pub trait IdSet {
    /// Ascending iterator over the ids. Owns a handle to the shared bytes.
    type Iter: Iterator<Item = u32>;

    /// Codec tag.
    fn index_type(&self) -> IndexType;

    /// Number of ids.
    fn size(&self) -> u32;

    /// Serialized size in bytes (heap size for in-memory sets).
    fn byte_size(&self) -> usize;

    /// Iterate ids in ascending order.
    fn iter(&self) -> Self::Iter;

    /// True if the set holds no ids.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Position of `id`, if present.
    fn find(&self, id: u32) -> Option<u32> {
        self.iter()
            .take_while(|&x| x <= id)
            .position(|x| x == id)
            .map(|p| p as u32)
    }

    /// Decode every id into a vector.
    fn to_vec(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.size() as usize);
        out.extend(self.iter());
        out
    }

    /// Set the bit of every id, growing `bits` as needed.
    fn put_into_bit_set(&self, bits: &mut DenseBitSet) {
        for id in self.iter() {
            let i = id as usize;
            if i >= bits.len() {
                bits.resize(i + 1, false);
            }
            bits.set(i, true);
        }
    }

    /// Average encoded bits per id; 0 for an empty set.
    fn bits_per_id(&self) -> f64 {
        match self.size() {
            0 => 0.0,
            n => (self.byte_size() * 8) as f64 / n as f64,
        }
    }
}

/// Per-candidate predicate for the bounded N-ary operations.
pub trait ItemFilter {
    /// Keep `id` in the result?
    fn matches(&self, id: u32) -> bool;
}

impl<F> ItemFilter for F
where
    F: Fn(u32) -> bool,
{
    fn matches(&self, id: u32) -> bool {
        self(id)
    }
}

/// Reject input that is not strictly ascending.
pub(crate) fn validate_ids(ids: &[u32]) -> Result<()> {
    for (i, pair) in ids.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(IndexError::InvalidInput(format!(
                "IDs must be sorted and unique: ids[{}]={} >= ids[{}]={}",
                i,
                pair[0],
                i + 1,
                pair[1]
            )));
        }
    }
    Ok(())
}

/// Ids of all set bits, ascending.
pub(crate) fn bit_set_ids(bits: &DenseBitSet) -> impl Iterator<Item = u32> + '_ {
    bits.iter_ones().map(|i| i as u32)
}
