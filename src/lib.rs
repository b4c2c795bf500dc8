//! Compressed sorted ID sets with set algebra.
//!
//! `itemindex` stores strictly ascending `u32` ids (posting lists, filter
//! results, item sets) in one of several encodings and answers positional
//! access, membership and set operations on them:
//!
//! - intersection, union, difference and symmetric difference
//! - bounded union (the `k` smallest ids)
//! - bounded N-ary intersection with exclusions and a per-id filter
//!
//! # Codecs
//!
//! - **RLE-DE**: run-length encoded deltas. Runs of equal gaps collapse to a
//!   single token, and set operations run on the token streams directly.
//! - **FoR**: frame of reference. Deltas bit-packed in blocks at the width of
//!   the largest delta.
//! - **PFoR**: patched FoR. Each block picks the width minimizing its size and
//!   stores wider deltas as varint outliers.
//! - **Vector**: plain in-memory ids. The result type of mixed-codec
//!   operations.
//!
//! All byte formats are big-endian and use LEB128 varints for counts.
//!
//! # Example
//!
//! ```rust
//! use itemindex::{IdSet, IndexType, ItemIndex};
//!
//! let a = ItemIndex::build(&[1, 2, 3, 100, 101, 102], IndexType::RleDe).unwrap();
//! let b = ItemIndex::build(&[2, 4, 100, 103], IndexType::PFor).unwrap();
//!
//! assert_eq!((&a & &b).to_vec(), vec![2, 100]);
//! assert_eq!(a.unite_k(&b, 3).to_vec(), vec![1, 2, 3]);
//!
//! let (index_type, bytes) = a.data().unwrap();
//! let reopened = ItemIndex::from_bytes(bytes, index_type).unwrap();
//! assert_eq!(reopened, a);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitpack;
mod config;
mod error;
pub mod frame;
mod item_index;
pub mod rle_de;
pub mod set_ops;
pub mod storage;
mod traits;
mod vector;

pub use config::{BlockSizePolicy, IndexConfig, IndexType};
pub use error::{IndexError, Result};
pub use frame::{ForCreator, ForIndex, PforCreator, PforIndex};
pub use item_index::{ItemIndex, ItemIndexIter, RLE_DE_FAST_PATH_MAX_RESULTS};
pub use rle_de::{RleDeCreator, RleDeIndex};
pub use storage::{ByteBuf, ByteView};
pub use traits::{DenseBitSet, IdSet, IndexCreator, ItemFilter};
pub use vector::{VectorCreator, VectorIndex, VectorIter};
