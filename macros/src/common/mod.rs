// Common utilities shared by the generators
//
// This module contains:
// - catalog: catalog model and parser
// - validate: cross-item catalog rules
// - naming: identifiers derived from catalog names
// - parse_utils: keyword helpers

pub mod catalog;
pub mod naming;
mod parse_utils;
pub mod validate;

pub use catalog::*;
pub use naming::*;
pub use parse_utils::*;
pub use validate::*;
