//! Pairwise set operations directly on two RLE-DE token streams.
//!
//! Both streams are decoded in lock step and re-encoded into a fresh creator.
//! Long runs are handled whole: a run lying entirely below the other side's
//! current id is pushed (or dropped) with one `push_run`, as is a run shared
//! by both sides with the same delta. Once one side is exhausted and the
//! policy keeps the other side's remainder, its undecoded payload is copied
//! verbatim since its deltas do not change; leading tokens that continue the
//! pending run are folded into it first.

use super::{RleDeCreator, RleDeIndex, RunCursor};
use crate::set_ops::{Difference, Intersect, SetOp, SymmetricDifference, Unite};
use crate::traits::IndexCreator;

/// A run needs at least this many elements after the current one to be
/// handled in bulk.
const MIN_BULK_RUN: u32 = 4;

/// Consume the current element of `c`, known to be below `bound`.
fn step_smaller(c: &mut RunCursor, bound: u32, push: bool, room: u32, out: &mut RleDeCreator) {
    let delta = u64::from(c.delta());
    if c.run_left() >= MIN_BULK_RUN && u64::from(c.id()) + 3 * delta < u64::from(bound) {
        let below = u64::from(bound - c.id()).div_ceil(delta);
        let mut k = below.min(u64::from(c.run_left()) + 1) as u32;
        if push {
            k = k.min(room);
            out.push_run(c.id(), c.delta(), k - 1);
        }
        c.skip_in_run(k);
    } else {
        if push {
            out.push(c.id());
        }
        c.advance();
    }
}

/// Consume the element both cursors share.
fn step_equal(x: &mut RunCursor, y: &mut RunCursor, push: bool, room: u32, out: &mut RleDeCreator) {
    if x.run_left() >= MIN_BULK_RUN && y.run_left() >= MIN_BULK_RUN && x.delta() == y.delta() {
        let mut k = x.run_left().min(y.run_left()) + 1;
        if push {
            k = k.min(room);
            out.push_run(x.id(), x.delta(), k - 1);
        }
        x.skip_in_run(k);
        y.skip_in_run(k);
    } else {
        if push {
            out.push(x.id());
        }
        x.advance();
        y.advance();
    }
}

/// Emit the rest of `c`, copying the undecoded payload when it fits.
fn drain(mut c: RunCursor, mut out: RleDeCreator, limit: u32) -> RleDeIndex {
    if c.left() <= limit - out.size() {
        let extra = c.run_left();
        out.push_run(c.id(), c.delta(), extra);
        let rest = c.left() - extra - 1;
        return out.finish_with_tail(&c.tail(), rest);
    }
    while c.valid() && out.size() < limit {
        let room = limit - out.size();
        step_smaller(&mut c, u32::MAX, true, room, &mut out);
    }
    out.finish()
}

/// Merge-join `a` and `b` under `Op`, stopping once `limit` ids are emitted.
pub(crate) fn merge<Op: SetOp>(a: &RleDeIndex, b: &RleDeIndex, limit: Option<u32>) -> RleDeIndex {
    let limit = limit.unwrap_or(u32::MAX);
    let mut out = RleDeCreator::new();
    let mut x = a.cursor();
    let mut y = b.cursor();

    while x.valid() && y.valid() {
        if out.size() >= limit {
            return out.finish();
        }
        let room = limit - out.size();
        if x.id() < y.id() {
            step_smaller(&mut x, y.id(), Op::PUSH_FIRST_SMALLER, room, &mut out);
        } else if y.id() < x.id() {
            step_smaller(&mut y, x.id(), Op::PUSH_SECOND_SMALLER, room, &mut out);
        } else {
            step_equal(&mut x, &mut y, Op::PUSH_EQUAL, room, &mut out);
        }
    }

    if out.size() >= limit {
        return out.finish();
    }
    if Op::PUSH_FIRST_REMAINDER && x.valid() {
        return drain(x, out, limit);
    }
    if Op::PUSH_SECOND_REMAINDER && y.valid() {
        return drain(y, out, limit);
    }
    out.finish()
}

impl RleDeIndex {
    /// `self ∪ other`.
    pub fn unite(&self, other: &RleDeIndex) -> RleDeIndex {
        merge::<Unite>(self, other, None)
    }

    /// `self ∩ other`.
    pub fn intersect(&self, other: &RleDeIndex) -> RleDeIndex {
        merge::<Intersect>(self, other, None)
    }

    /// `self \ other`.
    pub fn difference(&self, other: &RleDeIndex) -> RleDeIndex {
        merge::<Difference>(self, other, None)
    }

    /// `self △ other`.
    pub fn symmetric_difference(&self, other: &RleDeIndex) -> RleDeIndex {
        merge::<SymmetricDifference>(self, other, None)
    }

    /// The `k` smallest ids of `self ∪ other`.
    pub fn unite_k(&self, other: &RleDeIndex, k: u32) -> RleDeIndex {
        merge::<Unite>(self, other, Some(k))
    }
}
