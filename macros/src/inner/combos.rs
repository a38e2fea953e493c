//! Combination enumerator.
//!
//! Produces the power set of the optional capabilities, as an n-bit
//! counter running `0..2^n` with the first capability in the most
//! significant position:
//!
//! ```text
//! n = 2    index  bits  members
//!          0      00    {}
//!          1      01    {cap1}
//!          2      10    {cap0}
//!          3      11    {cap0, cap1}
//! ```
//!
//! Each combination lists its members in catalog order, so the exposed
//! surface of a shape is `base` followed by `members`.

use proc_macro2::Ident;

use crate::common::{shape_ident, shape_name};

pub struct Combination {
    /// Position in the canonical order, and the shape's binary tag.
    pub index: usize,
    /// Number of optional capabilities in the catalog.
    pub width: usize,
    /// Optional capability positions present in this subset, ascending.
    pub members: Vec<usize>,
}

impl Combination {
    /// Storage bits of the matching `tola_snoop::CapSet` (bit j = capability j).
    pub fn set_bits(&self) -> u32 {
        self.members.iter().fold(0, |bits, &j| bits | (1 << j))
    }

    pub fn name(&self) -> String {
        shape_name(self.index, self.width)
    }

    pub fn ident(&self) -> Ident {
        shape_ident(self.index, self.width)
    }
}

/// All `2^n` subsets of `n` optional capabilities, in canonical order.
pub fn enumerate(n: usize) -> Vec<Combination> {
    (0..1usize << n)
        .map(|index| Combination {
            index,
            width: n,
            members: (0..n).filter(|&j| index & (1 << (n - j - 1)) != 0).collect(),
        })
        .collect()
}
