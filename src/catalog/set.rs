//! Capability subsets.
//!
//! A [`CapSet`] records which *optional* capabilities of a catalog an
//! object satisfies. Bit `j` stands for the optional capability at
//! position `j` in catalog order; the base capability is implicit and
//! never stored.
//!
//! ## Two orders
//!
//! ```text
//! storage bit:   cap0 -> bit 0, cap1 -> bit 1, ...        (LSB-first)
//! shape index:   cap0 -> bit n-1, cap1 -> bit n-2, ...    (MSB-first)
//! ```
//!
//! Shapes are enumerated as an n-bit counter with the first capability
//! in the most significant position, so `shape_index` / `from_shape_index`
//! convert between the two.

use core::fmt;

/// Largest number of optional capabilities a single catalog may declare.
///
/// Eight capabilities already mean 256 synthesized shapes.
pub const MAX_OPTIONAL: usize = 8;

/// Positions a `CapSet` can hold.
const CAPACITY: usize = u32::BITS as usize;

/// Set of optional capabilities, keyed by catalog position.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapSet(u32);

impl CapSet {
    /// No optional capability.
    pub const EMPTY: CapSet = CapSet(0);

    /// Build from raw storage bits (bit `j` = capability `j`).
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        CapSet(bits)
    }

    /// Raw storage bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Return a copy with capability `index` added.
    ///
    /// # Panics
    ///
    /// If `index` is 32 or more.
    #[inline]
    #[track_caller]
    pub const fn with(self, index: usize) -> Self {
        assert!(index < CAPACITY, "capability index out of range for CapSet");
        CapSet(self.0 | (1 << index))
    }

    /// Add capability `index`. Panics like [`CapSet::with`].
    #[inline]
    #[track_caller]
    pub fn insert(&mut self, index: usize) {
        *self = self.with(index);
    }

    #[inline]
    pub const fn contains(self, index: usize) -> bool {
        index < CAPACITY && self.0 & (1 << index) != 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every member is below `n`, i.e. the set is meaningful for
    /// a catalog with `n` optional capabilities.
    #[inline]
    pub const fn fits(self, n: usize) -> bool {
        n >= CAPACITY || self.0 >> n == 0
    }

    /// Canonical shape index of this set in a catalog of `n` optional
    /// capabilities (first capability = most significant bit).
    ///
    /// # Panics
    ///
    /// If `n` exceeds [`MAX_OPTIONAL`].
    #[track_caller]
    pub const fn shape_index(self, n: usize) -> usize {
        assert!(n <= MAX_OPTIONAL, "more optional capabilities than a catalog may declare");
        let mut index = 0usize;
        let mut j = 0;
        while j < n {
            if self.contains(j) {
                index |= 1 << (n - j - 1);
            }
            j += 1;
        }
        index
    }

    /// Inverse of [`CapSet::shape_index`]. Panics like it.
    #[track_caller]
    pub const fn from_shape_index(index: usize, n: usize) -> Self {
        assert!(n <= MAX_OPTIONAL, "more optional capabilities than a catalog may declare");
        let mut bits = 0u32;
        let mut j = 0;
        while j < n {
            if index & (1 << (n - j - 1)) != 0 {
                bits |= 1 << j;
            }
            j += 1;
        }
        CapSet(bits)
    }

    /// Member positions in ascending (catalog) order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..CAPACITY).filter(move |&j| self.contains(j))
    }
}

impl fmt::Debug for CapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for CapSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = CapSet::EMPTY;
        for index in iter {
            set.insert(index);
        }
        set
    }
}
