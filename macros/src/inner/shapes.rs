//! Wrapper synthesizer.
//!
//! One tuple struct per capability subset, each holding the interceptor:
//!
//! ```text
//! pub struct Shape101<W>(Interceptor<W>);
//! impl Base for Shape101<W>   // ops forward; as_cap0 / as_cap2 -> Some(self)
//! impl Cap0 for Shape101<W>
//! impl Cap2 for Shape101<W>
//! ```
//!
//! and the tagged union over them:
//!
//! ```text
//! pub enum Wrapped<W> { Shape000(Shape000<W>), .., Shape111(Shape111<W>) }
//! impl Base for Wrapped<W>    // forwards to the active shape, queries included
//! ```

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::LitStr;

use crate::common::{private, LOCAL_PREFIX, query, query_mut, CatalogDef, OperationDef};
use crate::inner::combos::Combination;

pub fn expand_shapes(catalog: &CatalogDef, combos: &[Combination]) -> TokenStream {
    let shapes = combos.iter().map(|combo| expand_shape(catalog, combo));
    let table = expand_shape_table(catalog, combos);
    let wrapped = expand_wrapped(catalog, combos);
    quote! {
        #(#shapes)*
        #table
        #wrapped
    }
}

/// Forwarding body for an operation, `self.0.op(args)`.
fn forward(op: &OperationDef, target: TokenStream) -> TokenStream {
    let sig = op.signature();
    let name = &op.name;
    let args = op.arg_names();
    quote! {
        #[inline]
        #sig {
            #target.#name(#(#args),*)
        }
    }
}

fn expand_shape(catalog: &CatalogDef, combo: &Combination) -> TokenStream {
    let base_name = &catalog.base().name;
    let shape = combo.ident();
    let some = private("Some");
    let option = private("Option");

    let exposed: Vec<String> = std::iter::once(base_name.to_string())
        .chain(combo.members.iter().map(|&j| catalog.optional()[j].name.to_string()))
        .collect();
    let doc = LitStr::new(
        &format!(" Shape exposing `{}`.", exposed.join(" + ")),
        shape.span(),
    );

    let base_ops = catalog
        .base()
        .operations
        .iter()
        .map(|op| forward(op, quote! { self.0 }));

    // Queries answer `Some` exactly for the subset; the rest keep the
    // trait's `None` default.
    let queries = combo.members.iter().map(|&j| {
        let cap_name = &catalog.optional()[j].name;
        let (q, q_mut) = (query(cap_name), query_mut(cap_name));
        quote! {
            #[inline]
            fn #q(&self) -> #option<&dyn #cap_name> {
                #some(self)
            }

            #[inline]
            fn #q_mut(&mut self) -> #option<&mut dyn #cap_name> {
                #some(self)
            }
        }
    });

    let optional_impls = combo.members.iter().map(|&j| {
        let cap = &catalog.optional()[j];
        let cap_name = &cap.name;
        let ops = cap.operations.iter().map(|op| forward(op, quote! { self.0 }));
        quote! {
            impl<W: #base_name> #cap_name for #shape<W> {
                #(#ops)*
            }
        }
    });

    quote! {
        #[doc = #doc]
        pub struct #shape<W>(Interceptor<W>);

        impl<W: #base_name> #base_name for #shape<W> {
            #(#base_ops)*
            #(#queries)*
        }

        #(#optional_impls)*
    }
}

/// `SHAPES`: the enumerator's output, indexed by shape index.
fn expand_shape_table(catalog: &CatalogDef, combos: &[Combination]) -> TokenStream {
    let count = combos.len();
    let catalog_name = catalog.name.to_string();
    let entries = combos.iter().map(|combo| {
        let name = combo.name();
        let bits = combo.set_bits();
        quote! {
            ::tola_snoop::ShapeInfo {
                name: #name,
                capabilities: ::tola_snoop::CapSet::from_bits(#bits),
            }
        }
    });
    let doc = LitStr::new(
        &format!(
            " Every shape of `{catalog_name}`, in canonical order: entry `i` is the \
             shape whose subset has shape index `i`."
        ),
        catalog.name.span(),
    );
    quote! {
        #[doc = #doc]
        pub static SHAPES: [::tola_snoop::ShapeInfo; #count] = [#(#entries),*];
    }
}

fn expand_wrapped(catalog: &CatalogDef, combos: &[Combination]) -> TokenStream {
    let base_name = &catalog.base().name;
    let option = private("Option");
    let shapes: Vec<_> = combos.iter().map(Combination::ident).collect();
    let indices: Vec<_> = combos.iter().map(|c| c.index).collect();
    let active = format_ident!("{}shape", LOCAL_PREFIX);

    // `match self { Wrapped::ShapeX(active) => <body>, .. }`
    let dispatch = |body: TokenStream| {
        let arms = shapes.iter().map(|shape| quote! { Wrapped::#shape(#active) => #body, });
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    let ops = catalog.base().operations.iter().map(|op| {
        let sig = op.signature();
        let name = &op.name;
        let args = op.arg_names();
        let body = dispatch(quote! { #base_name::#name(#active #(, #args)*) });
        quote! {
            #[inline]
            #sig {
                #body
            }
        }
    });

    let queries = catalog.optional().iter().map(|cap| {
        let cap_name = &cap.name;
        let (q, q_mut) = (query(cap_name), query_mut(cap_name));
        let body = dispatch(quote! { #base_name::#q(#active) });
        let body_mut = dispatch(quote! { #base_name::#q_mut(#active) });
        quote! {
            #[inline]
            fn #q(&self) -> #option<&dyn #cap_name> {
                #body
            }

            #[inline]
            fn #q_mut(&mut self) -> #option<&mut dyn #cap_name> {
                #body_mut
            }
        }
    });

    let shape_arms = shapes
        .iter()
        .zip(&indices)
        .map(|(shape, index)| quote! { Wrapped::#shape(_) => &SHAPES[#index], });
    let shape_info = quote! { match self { #(#shape_arms)* } };
    let hooks = dispatch(quote! { &#active.0.hooks });
    let get_ref = dispatch(quote! { &#active.0.inner });
    let get_mut = dispatch(quote! { &mut #active.0.inner });
    let into_inner = dispatch(quote! { #active.0.inner });

    quote! {
        /// An object wrapped by [`wrap`], tagged with the shape matching the
        /// object's capabilities.
        ///
        /// Implements the base capability itself; its capability queries
        /// answer exactly as the active shape does, so `Wrapped` exposes the
        /// same optional capabilities as the object it wraps. Match on the
        /// variant to get the shape's static type.
        pub enum Wrapped<W> {
            #(#shapes(#shapes<W>),)*
        }

        impl<W> Wrapped<W> {
            /// Descriptor of the active shape.
            pub fn shape(&self) -> &'static ::tola_snoop::ShapeInfo {
                #shape_info
            }

            /// Optional capabilities this wrapper exposes.
            pub fn capabilities(&self) -> ::tola_snoop::CapSet {
                self.shape().capabilities
            }

            pub fn exposes(&self, capability: OptionalCapability) -> bool {
                self.capabilities().contains(capability.index())
            }

            pub fn hooks(&self) -> &Hooks {
                #hooks
            }

            /// The wrapped object. Calls made through it bypass the hooks.
            pub fn get_ref(&self) -> &W {
                #get_ref
            }

            /// The wrapped object. Calls made through it bypass the hooks.
            pub fn get_mut(&mut self) -> &mut W {
                #get_mut
            }

            /// Unwrap, dropping the hooks.
            pub fn into_inner(self) -> W {
                #into_inner
            }
        }

        impl<W: #base_name> #base_name for Wrapped<W> {
            #(#ops)*
            #(#queries)*
        }
    }
}
