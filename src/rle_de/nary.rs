//! Bounded N-ary intersection over RLE-DE streams.
//!
//! One cursor per operand. The cursors of the intersect group are repeatedly
//! moved up to the largest current id among them until they all agree; the
//! agreed id is emitted unless a cursor of the subtract group also sits on it
//! or the filter rejects it. Runs are skipped in bulk while seeking.

use super::{RleDeIndex, RunCursor};
use crate::traits::{IndexCreator, ItemFilter};

/// Move every cursor to the smallest id all of them hold. `None` once any
/// cursor is exhausted.
fn align(cursors: &mut [RunCursor]) -> Option<u32> {
    let mut target = cursors.iter().map(RunCursor::id).max()?;
    loop {
        let mut agreed = true;
        for c in cursors.iter_mut() {
            c.seek(target);
            if !c.valid() {
                return None;
            }
            if c.id() > target {
                target = c.id();
                agreed = false;
            }
        }
        if agreed {
            return Some(target);
        }
    }
}

/// Push into `out` up to `max_results` ids present in every `intersect`
/// operand, absent from every `subtract` operand and accepted by `filter`.
pub fn fused_intersect_difference<C, F>(
    intersect: &[&RleDeIndex],
    subtract: &[&RleDeIndex],
    max_results: u32,
    filter: Option<&F>,
    out: &mut C,
) where
    C: IndexCreator,
    F: ItemFilter + ?Sized,
{
    if intersect.is_empty() || max_results == 0 {
        return;
    }
    let mut cursors: Vec<RunCursor> = intersect.iter().map(|index| index.cursor()).collect();
    if cursors.iter().any(|c| !c.valid()) {
        return;
    }
    let mut excluded: Vec<RunCursor> = subtract.iter().map(|index| index.cursor()).collect();

    while let Some(id) = align(&mut cursors) {
        let subtracted = excluded.iter_mut().any(|c| {
            c.seek(id);
            c.valid() && c.id() == id
        });
        if !subtracted && filter.map_or(true, |f| f.matches(id)) {
            out.push(id);
            if out.size() >= max_results {
                return;
            }
        }
        for c in cursors.iter_mut() {
            c.advance();
        }
    }
}

/// Push into `out` up to `max_results` ids present in every operand and
/// accepted by `filter`.
pub fn constrained_intersect<C, F>(
    indexes: &[&RleDeIndex],
    max_results: u32,
    filter: Option<&F>,
    out: &mut C,
) where
    C: IndexCreator,
    F: ItemFilter + ?Sized,
{
    fused_intersect_difference(indexes, &[], max_results, filter, out);
}
