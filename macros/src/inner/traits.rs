//! Capability traits, capability queries, the detector and the catalog
//! descriptors.
//!
//! For a catalog `base B { .. } optional X { .. }` this emits:
//!
//! ```text
//! trait B {
//!     fn ops..;
//!     fn as_x(&self) -> Option<&dyn X> { None }           // query
//!     fn as_x_mut(&mut self) -> Option<&mut dyn X> { None }
//! }
//! trait X { fn ops..; }
//! impl<T: ?Sized + B> B for Box<T>   // forwarding, queries included
//! impl<T: ?Sized + B> B for &mut T
//! fn detect(&W) -> CapSet            // one query per optional capability
//! enum OptionalCapability { X, .. }
//! static CATALOG: Catalog
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use syn::LitStr;

use crate::common::{private, query, query_mut, render, CapabilityDef, CatalogDef, OperationDef};

pub fn expand_traits(catalog: &CatalogDef) -> TokenStream {
    let base = catalog.base();
    let base_name = &base.name;
    let base_attrs = &base.attrs;
    let base_ops = base.operations.iter().map(trait_method);

    let option = private("Option");
    let none = private("None");
    let queries = catalog.optional().iter().map(|cap| {
        let cap_name = &cap.name;
        let (q, q_mut) = (query(cap_name), query_mut(cap_name));
        let doc = LitStr::new(
            &format!(
                " Capability query for [`{0}`].\n\n Return `Some(self)` from an implementor that also \
                 implements `{0}`. The answer must not change over the object's lifetime.",
                cap_name
            ),
            cap_name.span(),
        );
        quote! {
            #[doc = #doc]
            #[inline]
            fn #q(&self) -> #option<&dyn #cap_name> {
                #none
            }

            #[doc = #doc]
            #[inline]
            fn #q_mut(&mut self) -> #option<&mut dyn #cap_name> {
                #none
            }
        }
    });

    let optional_traits = catalog.optional().iter().map(|cap| {
        let cap_name = &cap.name;
        let attrs = &cap.attrs;
        let ops = cap.operations.iter().map(trait_method);
        quote! {
            #(#attrs)*
            pub trait #cap_name {
                #(#ops)*
            }
        }
    });

    let forward_box = forward_impl(catalog, quote! { #base_name for ::tola_snoop::__private::Box<T> });
    let forward_mut = forward_impl(catalog, quote! { #base_name for &mut T });

    quote! {
        #(#base_attrs)*
        pub trait #base_name {
            #(#base_ops)*
            #(#queries)*
        }

        #(#optional_traits)*

        #forward_box
        #forward_mut
    }
}

fn trait_method(op: &OperationDef) -> TokenStream {
    let attrs = &op.attrs;
    let sig = op.signature();
    quote! {
        #(#attrs)*
        #sig;
    }
}

/// `impl<T: ?Sized + Base> Base for <ptr>`, forwarding every operation
/// and every capability query to `T`.
fn forward_impl(catalog: &CatalogDef, target: TokenStream) -> TokenStream {
    let base_name = &catalog.base().name;
    let option = private("Option");

    let ops = catalog.base().operations.iter().map(|op| {
        let sig = op.signature();
        let name = &op.name;
        let args = op.arg_names();
        let this = if op.mutable {
            quote! { &mut **self }
        } else {
            quote! { &**self }
        };
        quote! {
            #[inline]
            #sig {
                <T as #base_name>::#name(#this #(, #args)*)
            }
        }
    });

    let queries = catalog.optional().iter().map(|cap| {
        let cap_name = &cap.name;
        let (q, q_mut) = (query(cap_name), query_mut(cap_name));
        quote! {
            #[inline]
            fn #q(&self) -> #option<&dyn #cap_name> {
                <T as #base_name>::#q(&**self)
            }

            #[inline]
            fn #q_mut(&mut self) -> #option<&mut dyn #cap_name> {
                <T as #base_name>::#q_mut(&mut **self)
            }
        }
    });

    quote! {
        impl<T: ?Sized + #base_name> #target {
            #(#ops)*
            #(#queries)*
        }
    }
}

/// `detect`: probe each optional capability once, in catalog order.
pub fn expand_detector(catalog: &CatalogDef) -> TokenStream {
    let base_name = &catalog.base().name;
    let probes = catalog.optional().iter().enumerate().map(|(j, cap)| {
        let q = query(&cap.name);
        quote! {
            if <W as #base_name>::#q(object).is_some() {
                set.insert(#j);
            }
        }
    });

    quote! {
        /// Report which optional capabilities `object` provides.
        ///
        /// Runs every capability query once, in catalog order. The result
        /// depends only on the object's own answers; nothing is cached.
        pub fn detect<W: ?Sized + #base_name>(object: &W) -> ::tola_snoop::CapSet {
            #[allow(unused_mut)]
            let mut set = ::tola_snoop::CapSet::EMPTY;
            #(#probes)*
            set
        }
    }
}

/// `OptionalCapability` enum naming each optional capability.
pub fn expand_capability_enum(catalog: &CatalogDef) -> TokenStream {
    let optional = catalog.optional();
    let count = optional.len();
    let variants: Vec<_> = optional.iter().map(|cap| &cap.name).collect();
    let names: Vec<_> = variants.iter().map(|v| v.to_string()).collect();
    let indices = 0..count;

    quote! {
        /// The optional capabilities of this catalog, in catalog order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OptionalCapability {
            #(#variants,)*
        }

        impl OptionalCapability {
            pub const ALL: [OptionalCapability; #count] = [#(OptionalCapability::#variants),*];

            /// Position in the catalog, which is also the bit in a `CapSet`.
            pub const fn index(self) -> usize {
                match self {
                    #(OptionalCapability::#variants => #indices,)*
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    #(OptionalCapability::#variants => #names,)*
                }
            }
        }

        impl ::core::convert::From<OptionalCapability> for ::tola_snoop::CapSet {
            fn from(cap: OptionalCapability) -> Self {
                ::tola_snoop::CapSet::EMPTY.with(cap.index())
            }
        }
    }
}

/// `CATALOG`: the catalog as runtime data.
pub fn expand_descriptor(catalog: &CatalogDef) -> TokenStream {
    let name = catalog.name.to_string();
    let base = capability_info(catalog.base());
    let optional = catalog.optional().iter().map(capability_info);

    quote! {
        /// This catalog as data: capability and operation names with
        /// their rendered signatures.
        pub static CATALOG: ::tola_snoop::Catalog = ::tola_snoop::Catalog {
            name: #name,
            base: #base,
            optional: &[#(#optional),*],
        };
    }
}

fn capability_info(cap: &CapabilityDef) -> TokenStream {
    let name = cap.name.to_string();
    let ops = cap.operations.iter().map(|op| {
        let op_name = op.name.to_string();
        let mutable = op.mutable;
        let params = op.params.iter().map(|p| {
            let (param_name, ty) = (p.name.to_string(), render(&p.ty));
            quote! { ::tola_snoop::ParamInfo { name: #param_name, ty: #ty } }
        });
        let returns = op.output.as_ref().map_or_else(|| "()".to_string(), |ty| render(ty));
        quote! {
            ::tola_snoop::OperationInfo {
                name: #op_name,
                mutable: #mutable,
                params: &[#(#params),*],
                returns: #returns,
            }
        }
    });
    quote! {
        ::tola_snoop::CapabilityInfo {
            name: #name,
            operations: &[#(#ops),*],
        }
    }
}
