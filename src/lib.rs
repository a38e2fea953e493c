#![cfg_attr(not(feature = "std"), no_std)]

// Feature flags handled:
// - std: default, enables std library
// - tracing: default, logs wrap decisions and contract violations

//! # tola-snoop
//!
//! **Capability-preserving interception layers.**
//!
//! Wrapping an object to observe or rewrite its method calls usually loses
//! information: the wrapper implements the base trait, and every optional
//! extension trait the object *also* had disappears behind it. `tola-snoop`
//! generates wrappers that expose exactly the capabilities of the wrapped
//! object, no more and no less, while any individual operation can be
//! hooked.
//!
//! ## Architecture
//!
//! ```text
//! intercept! { mod NAME { base B {..} optional O1 {..} .. optional On {..} } }
//!        |
//!        |  (macro expansion = generation time)
//!        v
//! +-------------------------------------------------------------------+
//! |  Catalog      traits B, O1..On; query methods as_oi() on B       |
//! |  Hooks        one Option<hook> per operation                      |
//! |  Enumerator   2^n subsets, counted first-capability-high          |
//! |  Synthesizer  Shape<bits><W>: B + exactly the subset's traits     |
//! |  Wrapped<W>   one variant per shape                               |
//! +-------------------------------------------------------------------+
//!        |
//!        |  wrap(object, hooks)   (use time)
//!        v
//!   detect(&object) -> CapSet -> select shape -> Wrapped::ShapeXXXX
//! ```
//!
//! Every shape holds the same generic interceptor, so operation bodies are
//! written once; shapes differ only in which traits they implement.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::io;
//!
//! tola_snoop::intercept! {
//!     pub mod sink {
//!         base Sink {
//!             fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
//!         }
//!         optional Flush {
//!             fn flush(&mut self) -> io::Result<()>;
//!         }
//!     }
//! }
//!
//! struct File;
//!
//! impl sink::Sink for File {
//!     fn write(&mut self, buf: &[u8]) -> io::Result<usize> { Ok(buf.len()) }
//!     // Report the optional capability.
//!     fn as_flush(&self) -> Option<&dyn sink::Flush> { Some(self) }
//!     fn as_flush_mut(&mut self) -> Option<&mut dyn sink::Flush> { Some(self) }
//! }
//!
//! impl sink::Flush for File {
//!     fn flush(&mut self) -> io::Result<()> { Ok(()) }
//! }
//!
//! let hooks = sink::Hooks::new().on_write(|mut next| {
//!     Box::new(move |buf: &[u8]| {
//!         println!("writing {} bytes", buf.len());
//!         next(buf)
//!     })
//! });
//!
//! let mut wrapped = sink::wrap(File, hooks);
//! assert!(sink::Sink::as_flush(&wrapped).is_some());
//! ```

// Allow `::tola_snoop` to work inside the crate itself
extern crate self as tola_snoop;

extern crate alloc;

pub mod catalog;
mod trace;

pub use catalog::{
    CapSet, CapabilityInfo, Catalog, CatalogError, Combination, Combinations, OperationInfo,
    ParamInfo, ShapeInfo, MAX_OPTIONAL,
};

// Re-export proc-macros
pub use macros::intercept;

/// Items referenced by generated code. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use alloc::boxed::Box;
    pub use alloc::sync::Arc;
    pub use core::fmt;
    pub use core::option::Option::{self, None, Some};

    pub use crate::trace::{capability_missing, selector_exhausted, wrapped};
}

/// Common items for working with generated interception layers.
pub mod prelude {
    pub use crate::catalog::{CapSet, Catalog, CatalogError, ShapeInfo};
    pub use macros::intercept;
}
