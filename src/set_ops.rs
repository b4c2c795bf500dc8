//! Codec-agnostic set operations.
//!
//! Set semantics live in one place: a [`SetOp`] policy says, for each outcome
//! of a sorted merge-join step, whether the current id is emitted. The
//! [`execute`] loop drives any two ascending iterators into any
//! [`IndexCreator`], so every codec pairing shares the same semantics.

use crate::traits::IndexCreator;

/// Which binary operation a policy implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOpKind {
    /// `A ∪ B`
    Unite,
    /// `A ∩ B`
    Intersect,
    /// `A \ B`
    Difference,
    /// `A △ B`
    SymmetricDifference,
}

/// Merge-join emission policy.
pub trait SetOp {
    /// Operation tag.
    const KIND: SetOpKind;
    /// Emit the left id when it is the smaller one.
    const PUSH_FIRST_SMALLER: bool;
    /// Emit the id when both sides hold it.
    const PUSH_EQUAL: bool;
    /// Emit the right id when it is the smaller one.
    const PUSH_SECOND_SMALLER: bool;
    /// Emit what is left of the left side once the right side is exhausted.
    const PUSH_FIRST_REMAINDER: bool;
    /// Emit what is left of the right side once the left side is exhausted.
    const PUSH_SECOND_REMAINDER: bool;

    /// Upper bound on the result size.
    fn max_size(a: u32, b: u32) -> u32;
}

/// Union policy.
#[derive(Debug, Clone, Copy)]
pub struct Unite;

/// Intersection policy.
#[derive(Debug, Clone, Copy)]
pub struct Intersect;

/// Difference policy (`A \ B`).
#[derive(Debug, Clone, Copy)]
pub struct Difference;

/// Symmetric difference policy.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricDifference;

impl SetOp for Unite {
    const KIND: SetOpKind = SetOpKind::Unite;
    const PUSH_FIRST_SMALLER: bool = true;
    const PUSH_EQUAL: bool = true;
    const PUSH_SECOND_SMALLER: bool = true;
    const PUSH_FIRST_REMAINDER: bool = true;
    const PUSH_SECOND_REMAINDER: bool = true;

    fn max_size(a: u32, b: u32) -> u32 {
        a.saturating_add(b)
    }
}

impl SetOp for Intersect {
    const KIND: SetOpKind = SetOpKind::Intersect;
    const PUSH_FIRST_SMALLER: bool = false;
    const PUSH_EQUAL: bool = true;
    const PUSH_SECOND_SMALLER: bool = false;
    const PUSH_FIRST_REMAINDER: bool = false;
    const PUSH_SECOND_REMAINDER: bool = false;

    fn max_size(a: u32, b: u32) -> u32 {
        a.min(b)
    }
}

impl SetOp for Difference {
    const KIND: SetOpKind = SetOpKind::Difference;
    const PUSH_FIRST_SMALLER: bool = true;
    const PUSH_EQUAL: bool = false;
    const PUSH_SECOND_SMALLER: bool = false;
    const PUSH_FIRST_REMAINDER: bool = true;
    const PUSH_SECOND_REMAINDER: bool = false;

    fn max_size(a: u32, _b: u32) -> u32 {
        a
    }
}

impl SetOp for SymmetricDifference {
    const KIND: SetOpKind = SetOpKind::SymmetricDifference;
    const PUSH_FIRST_SMALLER: bool = true;
    const PUSH_EQUAL: bool = false;
    const PUSH_SECOND_SMALLER: bool = true;
    const PUSH_FIRST_REMAINDER: bool = true;
    const PUSH_SECOND_REMAINDER: bool = true;

    fn max_size(a: u32, b: u32) -> u32 {
        a.saturating_add(b)
    }
}

#[inline]
fn emit<C: IndexCreator>(creator: &mut C, id: u32, limit: u32) -> bool {
    creator.push(id);
    creator.size() >= limit
}

/// Merge two ascending id streams into `creator` under policy `Op`.
///
/// With `limit`, stops as soon as the creator holds that many ids.
pub fn execute<Op, A, B, C>(a: A, b: B, creator: &mut C, limit: Option<u32>)
where
    Op: SetOp,
    A: IntoIterator<Item = u32>,
    B: IntoIterator<Item = u32>,
    C: IndexCreator,
{
    let limit = limit.unwrap_or(u32::MAX);
    if creator.size() >= limit {
        return;
    }

    let mut a = a.into_iter();
    let mut b = b.into_iter();
    let mut x = a.next();
    let mut y = b.next();

    loop {
        match (x, y) {
            (Some(i), Some(j)) if i < j => {
                if Op::PUSH_FIRST_SMALLER && emit(creator, i, limit) {
                    return;
                }
                x = a.next();
            }
            (Some(i), Some(j)) if j < i => {
                if Op::PUSH_SECOND_SMALLER && emit(creator, j, limit) {
                    return;
                }
                y = b.next();
            }
            (Some(i), Some(_)) => {
                if Op::PUSH_EQUAL && emit(creator, i, limit) {
                    return;
                }
                x = a.next();
                y = b.next();
            }
            (Some(i), None) => {
                if !Op::PUSH_FIRST_REMAINDER || emit(creator, i, limit) {
                    return;
                }
                x = a.next();
            }
            (None, Some(j)) => {
                if !Op::PUSH_SECOND_REMAINDER || emit(creator, j, limit) {
                    return;
                }
                y = b.next();
            }
            (None, None) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::VectorCreator;

    fn run<Op: SetOp>(a: &[u32], b: &[u32], limit: Option<u32>) -> Vec<u32> {
        let mut creator = VectorCreator::new();
        execute::<Op, _, _, _>(a.iter().copied(), b.iter().copied(), &mut creator, limit);
        creator.finish().as_slice().to_vec()
    }

    const A: [u32; 6] = [1, 2, 3, 100, 101, 102];
    const B: [u32; 4] = [2, 4, 100, 103];

    #[test]
    fn test_policies() {
        assert_eq!(run::<Unite>(&A, &B, None), vec![1, 2, 3, 4, 100, 101, 102, 103]);
        assert_eq!(run::<Intersect>(&A, &B, None), vec![2, 100]);
        assert_eq!(run::<Difference>(&A, &B, None), vec![1, 3, 101, 102]);
        assert_eq!(
            run::<SymmetricDifference>(&A, &B, None),
            vec![1, 3, 4, 101, 102, 103]
        );
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(run::<Unite>(&[], &B, None), B.to_vec());
        assert_eq!(run::<Intersect>(&A, &[], None), Vec::<u32>::new());
        assert_eq!(run::<Difference>(&[], &B, None), Vec::<u32>::new());
        assert_eq!(run::<SymmetricDifference>(&A, &[], None), A.to_vec());
    }

    #[test]
    fn test_limit() {
        assert_eq!(run::<Unite>(&A, &B, Some(3)), vec![1, 2, 3]);
        assert_eq!(run::<Unite>(&A, &B, Some(0)), Vec::<u32>::new());
        assert_eq!(run::<Unite>(&A, &B, Some(100)).len(), 8);
        assert_eq!(run::<Intersect>(&A, &B, Some(1)), vec![2]);
    }

    #[test]
    fn test_max_size() {
        assert_eq!(Unite::max_size(3, 4), 7);
        assert_eq!(Intersect::max_size(3, 4), 3);
        assert_eq!(Difference::max_size(3, 4), 3);
        assert_eq!(SymmetricDifference::max_size(u32::MAX, 1), u32::MAX);
    }
}
