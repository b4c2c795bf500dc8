//! Token-level decoding shared by the iterator, the merge and the N-ary ops.

use bytes::Bytes;

use crate::error::{IndexError, Result};
use crate::storage::read_varint_u64;

/// Decoded token: `run` consecutive ids, each `delta` above the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub run: u32,
    pub delta: u32,
}

fn narrow(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| IndexError::corrupt(format!("{} {} exceeds 32 bits", what, value)))
}

/// Parse the token at `*pos`: a single delta, or a run count followed by a delta.
pub(crate) fn read_token(payload: &[u8], pos: &mut usize) -> Result<Token> {
    let head = read_varint_u64(payload, pos)?;
    if head & 1 == 0 {
        return Ok(Token {
            run: 1,
            delta: narrow(head >> 1, "delta")?,
        });
    }
    let run = narrow(head >> 1, "run length")?;
    if run == 0 {
        return Err(IndexError::corrupt("run token with length 0"));
    }
    let tail = read_varint_u64(payload, pos)?;
    if tail & 1 != 0 {
        return Err(IndexError::corrupt("run token not followed by a delta"));
    }
    Ok(Token {
        run,
        delta: narrow(tail >> 1, "delta")?,
    })
}

/// Position inside an RLE-DE payload.
///
/// `id` is the current element; `run_left` counts the elements after it that
/// still belong to the current run; `left` counts the current element and
/// everything after it.
#[derive(Debug, Clone)]
pub(crate) struct RunCursor {
    payload: Bytes,
    pos: usize,
    id: u32,
    delta: u32,
    run_left: u32,
    left: u32,
}

impl RunCursor {
    pub(crate) fn new(payload: Bytes, count: u32) -> Self {
        let mut cursor = Self {
            payload,
            pos: 0,
            id: 0,
            delta: 0,
            run_left: 0,
            left: count,
        };
        if count > 0 {
            cursor.load_token();
        }
        cursor
    }

    fn load_token(&mut self) {
        match read_token(&self.payload, &mut self.pos) {
            Ok(token) => {
                self.run_left = token.run - 1;
                self.delta = token.delta;
                self.id = self.id.wrapping_add(token.delta);
            }
            Err(e) => {
                log::warn!("RLE-DE stream ended with {} ids unread: {}", self.left, e);
                self.left = 0;
            }
        }
    }

    #[inline]
    pub(crate) fn valid(&self) -> bool {
        self.left > 0
    }

    #[inline]
    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub(crate) fn delta(&self) -> u32 {
        self.delta
    }

    #[inline]
    pub(crate) fn run_left(&self) -> u32 {
        self.run_left
    }

    #[inline]
    pub(crate) fn left(&self) -> u32 {
        self.left
    }

    /// Step to the next element.
    pub(crate) fn advance(&mut self) {
        if self.left == 0 {
            return;
        }
        self.left -= 1;
        if self.left == 0 {
            return;
        }
        if self.run_left > 0 {
            self.run_left -= 1;
            self.id = self.id.wrapping_add(self.delta);
        } else {
            self.load_token();
        }
    }

    /// Step over `k` elements of the current run (`1 <= k <= run_left + 1`).
    pub(crate) fn skip_in_run(&mut self, k: u32) {
        debug_assert!(k >= 1 && k <= self.run_left + 1);
        if k <= self.run_left {
            self.run_left -= k;
            self.id = self.id.wrapping_add(k.wrapping_mul(self.delta));
            self.left -= k;
        } else {
            self.id = self
                .id
                .wrapping_add(self.run_left.wrapping_mul(self.delta));
            self.left -= self.run_left;
            self.run_left = 0;
            self.advance();
        }
    }

    /// Advance to the first element `>= target`, jumping over runs.
    pub(crate) fn seek(&mut self, target: u32) {
        while self.left > 0 && self.id < target {
            if self.run_left == 0 {
                self.advance();
                continue;
            }
            let run_end = u64::from(self.id) + u64::from(self.run_left) * u64::from(self.delta);
            if run_end < u64::from(target) {
                self.skip_in_run(self.run_left + 1);
            } else {
                let k = u64::from(target - self.id).div_ceil(u64::from(self.delta));
                self.skip_in_run(k as u32);
            }
        }
    }

    /// Payload bytes after the token of the current element.
    pub(crate) fn tail(&self) -> Bytes {
        self.payload.slice(self.pos..)
    }
}
