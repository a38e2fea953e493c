//! Procedural macros for tola-snoop capability-preserving interception
//!
//! ## Example
//!
//! ```ignore
//! tola_snoop::intercept! {
//!     pub mod sink {
//!         base Sink {
//!             fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
//!         }
//!         optional Flush {
//!             fn flush(&mut self) -> std::io::Result<()>;
//!         }
//!     }
//! }
//!
//! let wrapped = sink::wrap(file, sink::Hooks::new().on_write(|mut next| {
//!     Box::new(move |buf: &[u8]| next(buf))
//! }));
//! ```

use proc_macro::TokenStream;
use syn::parse_macro_input;

// =============================================================================
// Module Declarations (Three-tier: inner / common / user)
// =============================================================================

mod inner;
mod common;
mod user;

// =============================================================================
// User-facing Macros (user/)
// =============================================================================

/// Generate an interception layer for a capability catalog.
///
/// # Syntax
///
/// ```ignore
/// intercept! {
///     /// Docs and attributes land on the generated module.
///     pub mod NAME {
///         base Base {
///             fn op(&self, arg: Arg) -> Ret;
///             fn op_mut(&mut self);
///         }
///         optional Extra {
///             fn extra(&mut self) -> Ret;
///         }
///         // up to 8 optional capabilities
///     }
/// }
/// ```
///
/// Exactly one `base` capability, listed first. Operations take `&self`
/// or `&mut self`, have no generics and no default body.
///
/// # Generates (inside `mod NAME`)
///
/// | Item | Purpose |
/// |------|---------|
/// | `trait Base` | base operations plus `as_extra` / `as_extra_mut` queries |
/// | `trait Extra` | one per optional capability |
/// | `type OpFn<'a>` / `type OpHook` | bound original and its interceptor, per operation |
/// | `struct Hooks` | one optional hook per operation, `on_op` builders |
/// | `struct ShapeXXX<W>` | one per subset of optional capabilities |
/// | `enum Wrapped<W>` | the shape chosen for an object |
/// | `fn detect` | which optional capabilities an object provides |
/// | `fn wrap` | wrap an object, preserving exactly its capabilities |
/// | `enum OptionalCapability` | names of the optional capabilities |
/// | `static CATALOG` / `static SHAPES` | the catalog and its shapes as data |
#[proc_macro]
pub fn intercept(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as common::CatalogDef);
    user::expand_intercept(input).into()
}
