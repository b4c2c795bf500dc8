//! Codec selection and build configuration.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::frame::{BLOCK_SIZES, DEFAULT_BLOCK_SIZE_OFFSET};

/// Codec backing an [`ItemIndex`](crate::ItemIndex).
///
/// Each variant owns one bit of a flag word (see [`IndexType::bits`]) so that
/// callers may combine several types into a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Run-length + delta varint encoding.
    #[default]
    RleDe,
    /// Patched frame of reference.
    #[serde(rename = "pfor")]
    PFor,
    /// Frame of reference.
    For,
    /// Set with no elements.
    Empty,
    /// Plain in-memory array, never serialized.
    Vector,
}

impl IndexType {
    /// All variants in tag order.
    pub const ALL: [IndexType; 5] = [
        IndexType::RleDe,
        IndexType::PFor,
        IndexType::For,
        IndexType::Empty,
        IndexType::Vector,
    ];

    /// Flag bit of this type.
    pub const fn bits(self) -> u32 {
        match self {
            IndexType::RleDe => 0x10,
            IndexType::PFor => 0x80,
            IndexType::For => 0x100,
            IndexType::Empty => 0x400,
            IndexType::Vector => 0x2000,
        }
    }

    /// Type whose flag bit equals `bits` exactly.
    pub fn from_bits(bits: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.bits() == bits)
            .ok_or_else(|| IndexError::UnsupportedType(format!("type bits {:#x}", bits)))
    }

    /// One-byte discriminant written in front of embedded indexes.
    pub const fn to_discriminant(self) -> u8 {
        self.bits().trailing_zeros() as u8
    }

    /// Inverse of [`IndexType::to_discriminant`].
    pub fn from_discriminant(byte: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_discriminant() == byte)
            .ok_or_else(|| IndexError::UnsupportedType(format!("discriminant {}", byte)))
    }

    /// True for codecs with a byte format of their own.
    pub const fn is_serializable(self) -> bool {
        matches!(self, IndexType::RleDe | IndexType::PFor | IndexType::For)
    }
}

/// How FoR/PFoR builders choose the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSizePolicy {
    /// Try every preset and keep the smallest encoding.
    #[default]
    Optimized,
    /// Always use the preset at `offset` in the block size table.
    Fixed {
        /// Index into the 32-entry block size table.
        offset: u8,
    },
}

impl BlockSizePolicy {
    /// Fixed policy at the 128-id preset.
    pub const fn fixed_default() -> Self {
        BlockSizePolicy::Fixed {
            offset: DEFAULT_BLOCK_SIZE_OFFSET,
        }
    }
}

/// Build configuration consumed by [`ItemIndex::build_with`](crate::ItemIndex::build_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Codec to encode with.
    pub index_type: IndexType,
    /// Block size policy; ignored by RLE-DE.
    pub block_size: BlockSizePolicy,
}

impl IndexConfig {
    /// Config for `index_type` with the optimized block size policy.
    pub fn new(index_type: IndexType) -> Self {
        Self {
            index_type,
            block_size: BlockSizePolicy::Optimized,
        }
    }

    /// Replace the block size policy.
    pub fn with_block_size(mut self, block_size: BlockSizePolicy) -> Self {
        self.block_size = block_size;
        self
    }

    /// Check that the config names a buildable codec and a valid preset.
    pub fn validate(&self) -> Result<()> {
        if let BlockSizePolicy::Fixed { offset } = self.block_size {
            if offset as usize >= BLOCK_SIZES.len() {
                return Err(IndexError::InvalidInput(format!(
                    "block size offset {} exceeds table of {}",
                    offset,
                    BLOCK_SIZES.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_distinct_bits() {
        let mut seen = 0u32;
        for t in IndexType::ALL {
            assert_eq!(t.bits().count_ones(), 1);
            assert_eq!(seen & t.bits(), 0);
            seen |= t.bits();
            assert_eq!(IndexType::from_bits(t.bits()).unwrap(), t);
            assert_eq!(IndexType::from_discriminant(t.to_discriminant()).unwrap(), t);
        }
        assert_eq!(IndexType::RleDe.to_discriminant(), 4);
        assert_eq!(IndexType::PFor.to_discriminant(), 7);
        assert_eq!(IndexType::For.to_discriminant(), 8);
    }

    #[test]
    fn test_unknown_tags() {
        assert!(matches!(
            IndexType::from_bits(0x30),
            Err(IndexError::UnsupportedType(_))
        ));
        assert!(IndexType::from_discriminant(0).is_err());
    }

    #[test]
    fn test_validate_offset() {
        let ok = IndexConfig::new(IndexType::For).with_block_size(BlockSizePolicy::fixed_default());
        assert!(ok.validate().is_ok());

        let bad = ok.with_block_size(BlockSizePolicy::Fixed { offset: 32 });
        assert!(matches!(bad.validate(), Err(IndexError::InvalidInput(_))));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = IndexConfig::new(IndexType::PFor)
            .with_block_size(BlockSizePolicy::Fixed { offset: 3 });
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"index_type":"pfor","block_size":{"fixed":{"offset":3}}}"#
        );
        let back: IndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let defaults: IndexConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, IndexConfig::default());
        assert_eq!(defaults.index_type, IndexType::RleDe);
    }
}
