//! User-facing macro implementations
//!
//! | Macro | Usage | Purpose |
//! |-------|-------|---------|
//! | `intercept!` | function macro | Generate an interception layer for a capability catalog |

mod intercept;

pub use intercept::expand_intercept;
