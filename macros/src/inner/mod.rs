// Generators, one per piece of the expansion
//
// This module contains:
// - combos: subset enumeration and shape naming
// - traits: capability traits, queries, detector, catalog descriptors
// - hooks: hook aliases and the Hooks table
// - interceptor: the generic interceptor shared by all shapes
// - shapes: per-subset shapes, SHAPES and Wrapped

pub mod combos;
pub mod hooks;
pub mod interceptor;
pub mod shapes;
pub mod traits;
