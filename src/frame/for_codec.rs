//! Plain frame of reference blocks: every delta at the width of the largest.

use super::{BlockCodec, BlockWidth};
use crate::bitpack::{self, bits_needed, packed_len};
use crate::config::IndexType;
use crate::error::{IndexError, Result};

/// FoR block strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForBlocks;

impl BlockCodec for ForBlocks {
    const INDEX_TYPE: IndexType = IndexType::For;

    fn block_width(deltas: &[u32]) -> BlockWidth {
        // OR has the same highest bit as the maximum
        let bits = bits_needed(deltas.iter().fold(0, |acc, &d| acc | d));
        BlockWidth {
            bits,
            bytes: packed_len(bits, deltas.len()),
        }
    }

    fn encode(deltas: &[u32], bits: u32, out: &mut Vec<u8>) {
        bitpack::pack(deltas, bits, out);
    }

    fn decode(data: &[u8], bits: u32, out: &mut [u32]) -> Result<usize> {
        let len = packed_len(bits, out.len());
        if data.len() < len {
            return Err(IndexError::corrupt(format!(
                "{} values at {} bits need {} bytes, {} left",
                out.len(),
                bits,
                len,
                data.len()
            )));
        }
        bitpack::unpack(data, bits, out);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_of_largest() {
        let w = ForBlocks::block_width(&[1, 3, 200, 7]);
        assert_eq!(w, BlockWidth { bits: 8, bytes: 4 });
        assert_eq!(ForBlocks::block_width(&[1; 9]).bytes, 2);
    }

    #[test]
    fn test_encode_decode() {
        let deltas = [5, 1, 17, 2, 9];
        let w = ForBlocks::block_width(&deltas);
        let mut out = Vec::new();
        ForBlocks::encode(&deltas, w.bits, &mut out);
        assert_eq!(out.len(), w.bytes);

        let mut decoded = [0u32; 5];
        assert_eq!(ForBlocks::decode(&out, w.bits, &mut decoded).unwrap(), w.bytes);
        assert_eq!(decoded, deltas);
        assert!(ForBlocks::decode(&out[..1], w.bits, &mut decoded).is_err());
    }
}
