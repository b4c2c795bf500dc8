//! Patched frame of reference blocks.
//!
//! A block is packed at the width minimizing its total size. Deltas wider
//! than that width are "outliers": their packed slot holds 0 and their value
//! follows the packed array as a varint, in block order. Real deltas are never
//! 0 (the first delta of a set starting at id 0 aside, which is simply always
//! escaped), so 0 is free to serve as the sentinel.

use super::{BlockCodec, BlockWidth};
use crate::bitpack::{self, packed_len, MAX_BITS};
use crate::config::IndexType;
use crate::error::{IndexError, Result};
use crate::storage::{put_varint_u32, read_varint_u32, varint_len_u32};

/// PFoR block strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PforBlocks;

/// Significant bits of `v`, 0 for 0.
#[inline]
fn significant_bits(v: u32) -> u32 {
    32 - v.leading_zeros()
}

#[inline]
fn is_outlier(v: u32, bits: u32) -> bool {
    v == 0 || significant_bits(v) > bits
}

impl BlockCodec for PforBlocks {
    const INDEX_TYPE: IndexType = IndexType::PFor;

    fn block_width(deltas: &[u32]) -> BlockWidth {
        // varint bytes of all deltas, bucketed by significant bits
        let mut escaped = [0usize; MAX_BITS as usize + 1];
        for &d in deltas {
            escaped[significant_bits(d) as usize] += varint_len_u32(d);
        }
        let zeros = escaped[0];
        let min_bits = (1..=MAX_BITS).find(|&b| escaped[b as usize] > 0).unwrap_or(1);
        let max_bits = (1..=MAX_BITS).rev().find(|&b| escaped[b as usize] > 0).unwrap_or(1);

        // outlier bytes at width b = zeros + everything wider than b
        let mut wider = [0usize; MAX_BITS as usize + 2];
        for b in (0..=MAX_BITS as usize).rev() {
            wider[b] = wider[b + 1] + if b == MAX_BITS as usize { 0 } else { escaped[b + 1] };
        }

        let mut best = BlockWidth {
            bits: max_bits,
            bytes: usize::MAX,
        };
        for bits in min_bits..=max_bits {
            let bytes = packed_len(bits, deltas.len()) + zeros + wider[bits as usize];
            if bytes < best.bytes {
                best = BlockWidth { bits, bytes };
            }
        }
        best
    }

    fn encode(deltas: &[u32], bits: u32, out: &mut Vec<u8>) {
        let slots: Vec<u32> = deltas
            .iter()
            .map(|&d| if is_outlier(d, bits) { 0 } else { d })
            .collect();
        bitpack::pack(&slots, bits, out);
        for &d in deltas.iter().filter(|&&d| is_outlier(d, bits)) {
            put_varint_u32(out, d);
        }
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
        let mut pos = len;
        for slot in out.iter_mut().filter(|slot| **slot == 0) {
            *slot = read_varint_u32(data, &mut pos)
                .map_err(|e| IndexError::corrupt(format!("outlier list: {}", e)))?;
        }
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ForBlocks;

    fn round_trip(deltas: &[u32]) -> BlockWidth {
        let w = PforBlocks::block_width(deltas);
        let mut out = Vec::new();
        PforBlocks::encode(deltas, w.bits, &mut out);
        assert_eq!(out.len(), w.bytes, "deltas {:?}", deltas);

        let mut decoded = vec![0u32; deltas.len()];
        assert_eq!(PforBlocks::decode(&out, w.bits, &mut decoded).unwrap(), out.len());
        assert_eq!(decoded, deltas);
        w
    }

    #[test]
    fn test_single_outlier() {
        let mut deltas = vec![1u32; 127];
        deltas.insert(60, 3_000_000_000);
        let w = round_trip(&deltas);
        assert_eq!(w.bits, 1);
        assert!(w.bytes < ForBlocks::block_width(&deltas).bytes);
    }

    #[test]
    fn test_never_wider_than_for() {
        let inputs: [&[u32]; 4] = [
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &[100, 100, 100, 100, 1 << 20],
            &[7; 64],
            &[1, u32::MAX],
        ];
        for deltas in inputs {
            let p = round_trip(deltas);
            let f = ForBlocks::block_width(deltas);
            assert!(p.bits <= f.bits, "deltas {:?}", deltas);
            assert!(p.bytes <= f.bytes, "deltas {:?}", deltas);
        }
    }

    #[test]
    fn test_zero_first_delta_escapes() {
        let w = round_trip(&[0, 1, 1, 1]);
        assert_eq!(w.bits, 1);
        // 4 slots in one byte plus the varint 0
        assert_eq!(w.bytes, 2);
    }

    #[test]
    fn test_missing_outliers() {
        let deltas = [1, 1, 1 << 30];
        let w = PforBlocks::block_width(&deltas);
        let mut out = Vec::new();
        PforBlocks::encode(&deltas, w.bits, &mut out);
        out.pop();
        let mut decoded = [0u32; 3];
        assert!(matches!(
            PforBlocks::decode(&out, w.bits, &mut decoded),
            Err(IndexError::CorruptData(_))
        ));
    }
}
