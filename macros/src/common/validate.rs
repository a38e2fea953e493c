//! Cross-item catalog rules.
//!
//! - exactly one `base` block, and it comes first
//! - at most [`MAX_OPTIONAL`] optional capabilities
//! - capability names unique, and distinct from generated item names
//! - operation names unique across the whole catalog, and distinct from
//!   the generated capability queries and the `Wrapped` accessors
//! - parameter names outside the prefix used for generated locals

use std::collections::HashSet;

use syn::ext::IdentExt;

use super::{
    fn_alias, hook_alias, query, query_mut, CapabilityKind, CatalogDef, ACCESSORS, LOCAL_PREFIX,
    RESERVED,
};

/// Mirrors `tola_snoop::MAX_OPTIONAL`.
pub const MAX_OPTIONAL: usize = 8;

pub fn validate(catalog: &CatalogDef) -> syn::Result<()> {
    let base = catalog.base();
    if base.kind != CapabilityKind::Base {
        return Err(syn::Error::new(
            base.kind_span,
            "the first capability must be the `base` capability",
        ));
    }
    if let Some(extra) = catalog.optional().iter().find(|c| c.kind == CapabilityKind::Base) {
        return Err(syn::Error::new(
            extra.kind_span,
            "a catalog has exactly one `base` capability\n\
             \n\
             Declare the remaining capabilities as `optional`.",
        ));
    }

    let optional = catalog.optional();
    if optional.len() > MAX_OPTIONAL {
        return Err(syn::Error::new_spanned(
            &optional[MAX_OPTIONAL].name,
            format!(
                "too many optional capabilities ({}, at most {})\n\
                 \n\
                 Every subset gets its own shape, so {} capabilities would\n\
                 generate {} shapes.",
                optional.len(),
                MAX_OPTIONAL,
                optional.len(),
                1u64 << optional.len(),
            ),
        ));
    }

    // Names the generator derives from operations.
    let mut generated: HashSet<String> = RESERVED.iter().map(|s| s.to_string()).collect();
    for (_, op) in catalog.operations() {
        generated.insert(fn_alias(&op.name).to_string());
        generated.insert(hook_alias(&op.name).to_string());
    }

    let mut caps = HashSet::new();
    let mut queries = HashSet::new();
    for cap in &catalog.capabilities {
        let name = cap.name.unraw().to_string();
        if !caps.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                &cap.name,
                format!("duplicate capability `{}`", name),
            ));
        }
        if generated.contains(&name) || is_shape_name(&name) {
            return Err(syn::Error::new_spanned(
                &cap.name,
                format!("capability name `{}` collides with a generated item", name),
            ));
        }
    }
    for cap in optional {
        queries.insert(query(&cap.name).to_string());
        queries.insert(query_mut(&cap.name).to_string());
    }

    let mut ops = HashSet::new();
    for (cap, op) in catalog.operations() {
        let name = op.name.unraw().to_string();
        if !ops.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                &op.name,
                format!(
                    "duplicate operation `{}` (in `{}`)\n\
                     \n\
                     Operation names must be unique across the whole catalog,\n\
                     since each one owns a hook slot.",
                    name, cap.name
                ),
            ));
        }
        if queries.contains(&name) {
            return Err(syn::Error::new_spanned(
                &op.name,
                format!("operation `{}` collides with a generated capability query", name),
            ));
        }
        if ACCESSORS.contains(&name.as_str()) {
            return Err(syn::Error::new_spanned(
                &op.name,
                format!(
                    "operation `{}` collides with the `Wrapped::{}` accessor\n\
                     \n\
                     The accessor would shadow the operation on wrapped objects.",
                    name, name
                ),
            ));
        }
        if let Some(param) = op
            .params
            .iter()
            .find(|p| p.name.unraw().to_string().starts_with(LOCAL_PREFIX))
        {
            return Err(syn::Error::new_spanned(
                &param.name,
                format!("parameter names starting with `{}` are reserved", LOCAL_PREFIX),
            ));
        }
    }

    Ok(())
}

fn is_shape_name(name: &str) -> bool {
    name.strip_prefix("Shape")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b == b'0' || b == b'1'))
}
