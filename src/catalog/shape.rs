//! Shapes and the canonical subset order.

use super::CapSet;

/// Descriptor of one synthesized shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeInfo {
    /// Type name of the shape, e.g. `Shape0110`.
    pub name: &'static str,
    /// Optional capabilities the shape exposes on top of the base.
    pub capabilities: CapSet,
}

/// One element of the power set, tagged with its shape index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combination {
    pub index: usize,
    pub set: CapSet,
}

/// Iterator over all `2^n` subsets of `n` optional capabilities,
/// counting `0..2^n` with the first capability as the high bit.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    next: usize,
}

impl Combinations {
    pub(crate) fn new(n: usize) -> Self {
        debug_assert!(n <= super::MAX_OPTIONAL);
        Combinations { n, next: 0 }
    }

    fn total(&self) -> usize {
        1 << self.n
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.next >= self.total() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(Combination {
            index,
            set: CapSet::from_shape_index(index, self.n),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Combinations {}
