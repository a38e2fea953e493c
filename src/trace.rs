//! Wrap-time logging and contract-violation reporting.
//!
//! Generated code calls into this module instead of `tracing` directly, so
//! downstream crates need no logging dependency of their own and the
//! `tracing` feature is decided here, once.
//!
//! Nothing in this module runs per operation call.

use core::fmt;

use crate::catalog::{CapSet, Catalog, ShapeInfo};

/// Record a completed `wrap`.
#[inline]
pub fn wrapped(catalog: &Catalog, shape: &ShapeInfo, hooks: &dyn fmt::Debug) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "tola_snoop",
        catalog = catalog.name,
        shape = shape.name,
        exposed = %Surface(catalog, shape.capabilities),
        hooks = ?hooks,
        "wrapped object"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (catalog, shape, hooks);
}

/// The detected subset matched no synthesized shape.
///
/// Only reachable if `CATALOG` and the generated dispatch disagree.
#[cold]
#[track_caller]
pub fn selector_exhausted(catalog: &Catalog, set: CapSet) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(
        target: "tola_snoop",
        catalog = catalog.name,
        set = ?set,
        "no shape for detected capability subset"
    );
    panic!(
        "tola-snoop: catalog `{}` has no shape for capability subset {:?} ({} shapes generated)",
        catalog.name,
        set,
        catalog.shape_count(),
    )
}

/// An interceptor was asked to run an operation whose capability the
/// wrapped object no longer reports.
///
/// Shapes only expose operations detected at wrap time, so this fires
/// only when an object's capability queries change answers afterwards.
#[cold]
#[track_caller]
pub fn capability_missing(catalog: &Catalog, capability: &str, operation: &str) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(
        target: "tola_snoop",
        catalog = catalog.name,
        capability,
        operation,
        "capability vanished after wrap"
    );
    panic!(
        "tola-snoop: `{}::{}` called on an object that no longer provides `{}` \
         (capability queries must answer the same for the object's whole lifetime)",
        catalog.name, operation, capability,
    )
}

/// `Display` adapter for an exposed surface, formatted only when a
/// subscriber actually wants the event.
#[cfg(feature = "tracing")]
struct Surface<'a>(&'a Catalog, CapSet);

#[cfg(feature = "tracing")]
impl fmt::Display for Surface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.base.name)?;
        for j in self.1.iter() {
            match self.0.optional.get(j) {
                Some(cap) => write!(f, " + {}", cap.name)?,
                None => write!(f, " + #{j}")?,
            }
        }
        Ok(())
    }
}
