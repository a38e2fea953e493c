//! # Catalog Descriptors
//!
//! Every `intercept!` invocation emits a `CATALOG` static describing the
//! capabilities it was generated from, and a `SHAPES` table listing the
//! shape synthesized for each capability subset. This module holds the
//! descriptor types and the queries over them.
//!
//! ```text
//! Catalog
//! ├── base: CapabilityInfo          (always exposed)
//! └── optional: [CapabilityInfo]    (bit j of a CapSet)
//!       └── operations: [OperationInfo]
//!             └── params: [ParamInfo], returns
//! ```
//!
//! The descriptors are pure data. They exist for introspection, logging
//! and tests; wrapping never consults them to decide behavior.

mod set;
mod shape;

pub use set::{CapSet, MAX_OPTIONAL};
pub use shape::{Combination, Combinations, ShapeInfo};

use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// A single named parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: &'static str,
    /// Rendered Rust type, e.g. `&[u8]`.
    pub ty: &'static str,
}

/// One callable operation of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationInfo {
    pub name: &'static str,
    /// `true` for `&mut self` receivers.
    pub mutable: bool,
    pub params: &'static [ParamInfo],
    /// Rendered return type, `()` when the operation returns nothing.
    pub returns: &'static str,
}

/// A named set of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityInfo {
    pub name: &'static str,
    pub operations: &'static [OperationInfo],
}

/// Closed, ordered capability catalog: one base plus the optional
/// capabilities in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    /// Name of the generated module.
    pub name: &'static str,
    pub base: CapabilityInfo,
    pub optional: &'static [CapabilityInfo],
}

/// Errors from catalog queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog `{catalog}` declares {count} optional capabilities, at most {max} are supported")]
    TooManyCapabilities {
        catalog: &'static str,
        count: usize,
        max: usize,
    },

    #[error("catalog `{catalog}` declares capability `{name}` more than once")]
    DuplicateCapability {
        catalog: &'static str,
        name: &'static str,
    },

    #[error("catalog `{catalog}` declares operation `{name}` more than once")]
    DuplicateOperation {
        catalog: &'static str,
        name: &'static str,
    },

    #[error("catalog `{catalog}` has no optional capability named `{name}`")]
    UnknownCapability { catalog: &'static str, name: String },

    #[error("capability set {bits:#b} does not fit catalog `{catalog}`")]
    OutOfRange { catalog: &'static str, bits: u32 },
}

impl Catalog {
    /// Number of synthesized shapes, `2^N`, saturating at `usize::MAX`
    /// for hand-built descriptors too large to enumerate.
    #[inline]
    pub const fn shape_count(&self) -> usize {
        let n = self.optional.len();
        if n >= usize::BITS as usize {
            usize::MAX
        } else {
            1 << n
        }
    }

    /// Every capability subset in canonical shape order.
    ///
    /// Fails if the catalog does not pass [`Catalog::validate`].
    pub fn combinations(&self) -> Result<Combinations, CatalogError> {
        self.validate()?;
        Ok(Combinations::new(self.optional.len()))
    }

    /// Position of the optional capability called `name`.
    pub fn capability_index(&self, name: &str) -> Option<usize> {
        self.optional.iter().position(|cap| cap.name == name)
    }

    /// Build a set from optional capability names.
    pub fn set_of(&self, names: &[&str]) -> Result<CapSet, CatalogError> {
        self.validate()?;
        names
            .iter()
            .map(|name| {
                self.capability_index(name)
                    .ok_or_else(|| CatalogError::UnknownCapability {
                        catalog: self.name,
                        name: String::from(*name),
                    })
            })
            .collect()
    }

    /// Capabilities a shape for `set` exposes: base first, then the
    /// members of `set` in catalog order.
    pub fn exposed(&self, set: CapSet) -> Result<Vec<&CapabilityInfo>, CatalogError> {
        self.check(set)?;
        let mut exposed = Vec::with_capacity(1 + set.len());
        exposed.push(&self.base);
        exposed.extend(set.iter().map(|j| &self.optional[j]));
        Ok(exposed)
    }

    /// Human-readable surface, e.g. `ResponseWriter + Flusher`.
    pub fn describe(&self, set: CapSet) -> Result<String, CatalogError> {
        let exposed = self.exposed(set)?;
        let names: Vec<&str> = exposed.iter().map(|cap| cap.name).collect();
        Ok(names.join(" + "))
    }

    /// Find an operation anywhere in the catalog.
    pub fn operation(&self, name: &str) -> Option<(&CapabilityInfo, &OperationInfo)> {
        core::iter::once(&self.base)
            .chain(self.optional.iter())
            .find_map(|cap| {
                cap.operations
                    .iter()
                    .find(|op| op.name == name)
                    .map(|op| (cap, op))
            })
    }

    /// Structural checks. Generated catalogs always pass; hand-built
    /// descriptors may not.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.optional.len() > MAX_OPTIONAL {
            return Err(CatalogError::TooManyCapabilities {
                catalog: self.name,
                count: self.optional.len(),
                max: MAX_OPTIONAL,
            });
        }

        let caps: Vec<&CapabilityInfo> =
            core::iter::once(&self.base).chain(self.optional.iter()).collect();
        for (i, cap) in caps.iter().enumerate() {
            if caps[..i].iter().any(|seen| seen.name == cap.name) {
                return Err(CatalogError::DuplicateCapability {
                    catalog: self.name,
                    name: cap.name,
                });
            }
        }

        let ops: Vec<&OperationInfo> = caps.iter().flat_map(|cap| cap.operations).collect();
        for (i, op) in ops.iter().enumerate() {
            if ops[..i].iter().any(|seen| seen.name == op.name) {
                return Err(CatalogError::DuplicateOperation {
                    catalog: self.name,
                    name: op.name,
                });
            }
        }
        Ok(())
    }

    fn check(&self, set: CapSet) -> Result<(), CatalogError> {
        if set.fits(self.optional.len()) {
            Ok(())
        } else {
            Err(CatalogError::OutOfRange {
                catalog: self.name,
                bits: set.bits(),
            })
        }
    }
}
