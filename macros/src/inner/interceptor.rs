//! The generic interceptor.
//!
//! One private struct holding `(object, hooks)` with an inherent method per
//! catalog operation. Every shape wraps this same value, so operation
//! bodies exist once no matter how many shapes are generated.
//!
//! Each method:
//! 1. binds the original (the object itself for base operations, the
//!    capability query's answer for optional ones)
//! 2. with no hook set, calls it directly
//! 3. otherwise boxes it as `OpFn`, hands it to the hook, and calls what
//!    the hook returns, once, with the caller's arguments

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::common::{fn_alias, private, LOCAL_PREFIX, query, query_mut, CapabilityDef, CatalogDef, OperationDef};

/// Local names in generated bodies. Validation keeps `LOCAL_PREFIX` out
/// of parameter names, so these never shadow an argument.
struct Locals {
    inner: syn::Ident,
    hook: syn::Ident,
    original: syn::Ident,
    replaced: syn::Ident,
}

impl Locals {
    fn new() -> Self {
        Locals {
            inner: format_ident!("{}inner", LOCAL_PREFIX),
            hook: format_ident!("{}hook", LOCAL_PREFIX),
            original: format_ident!("{}original", LOCAL_PREFIX),
            replaced: format_ident!("{}replaced", LOCAL_PREFIX),
        }
    }
}

pub fn expand_interceptor(catalog: &CatalogDef) -> TokenStream {
    let base_name = &catalog.base().name;
    let methods = catalog
        .capabilities
        .iter()
        .enumerate()
        .flat_map(|(i, cap)| {
            cap.operations
                .iter()
                .map(move |op| interceptor_method(catalog, (i > 0).then_some(cap), op))
        })
        .collect::<Vec<_>>();

    quote! {
        /// The object and its hooks. Shared by every shape.
        struct Interceptor<W> {
            inner: W,
            hooks: Hooks,
        }

        impl<W: #base_name> Interceptor<W> {
            #(#methods)*
        }
    }
}

/// `optional` is `None` for base operations.
fn interceptor_method(
    catalog: &CatalogDef,
    optional: Option<&CapabilityDef>,
    op: &OperationDef,
) -> TokenStream {
    let base_name = &catalog.base().name;
    let l = Locals::new();
    let (inner, hook, original, replaced) = (&l.inner, &l.hook, &l.original, &l.replaced);

    let name = &op.name;
    let sig = op.signature();
    let args = op.arg_names();
    let arg_types = op.arg_types();
    let output = op.output_tokens();
    let fn_ty = fn_alias(name);
    let boxed = private("Box");
    let some = private("Some");
    let none = private("None");

    // How to bind the original object, and how to call `name` on it.
    let reborrow = if op.mutable {
        quote! { &mut *#inner }
    } else {
        quote! { &*#inner }
    };
    let (bind, call) = match optional {
        None => {
            let bind = if op.mutable {
                quote! { let #inner = &mut self.inner; }
            } else {
                quote! { let #inner = &self.inner; }
            };
            (bind, quote! { <W as #base_name>::#name })
        }
        Some(cap) => {
            let cap_name = &cap.name;
            let cap_str = cap_name.to_string();
            let op_str = name.to_string();
            let (q, field) = if op.mutable {
                (query_mut(cap_name), quote! { &mut self.inner })
            } else {
                (query(cap_name), quote! { &self.inner })
            };
            let bind = quote! {
                let #inner = match <W as #base_name>::#q(#field) {
                    #some(#inner) => #inner,
                    #none => ::tola_snoop::__private::capability_missing(&CATALOG, #cap_str, #op_str),
                };
            };
            (bind, quote! { #cap_name::#name })
        }
    };

    quote! {
        #[inline]
        #sig {
            #bind
            match &self.hooks.#name {
                #none => #call(#inner #(, #args)*),
                #some(#hook) => {
                    let #original: #fn_ty<'_> = #boxed::new(
                        move |#(#args: #arg_types),*| #output { #call(#reborrow #(, #args)*) }
                    );
                    let mut #replaced = #hook(#original);
                    #replaced(#(#args),*)
                }
            }
        }
    }
}
