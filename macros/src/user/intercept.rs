//! `intercept!` - generate an interception layer for one capability catalog.
//!
//! The expansion is a module containing, in order:
//!
//! 1. capability traits, queries, forwarding impls (`inner::traits`)
//! 2. hook aliases and `Hooks` (`inner::hooks`)
//! 3. the generic interceptor (`inner::interceptor`)
//! 4. one shape per capability subset, `SHAPES`, `Wrapped` (`inner::shapes`)
//! 5. `detect`, `wrap` and the catalog descriptors

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::LitStr;

use crate::common::{validate, CatalogDef};
use crate::inner::combos::{enumerate, Combination};
use crate::inner::{hooks, interceptor, shapes, traits};

pub fn expand_intercept(catalog: CatalogDef) -> TokenStream2 {
    if let Err(err) = validate(&catalog) {
        return err.to_compile_error();
    }

    let combos = enumerate(catalog.optional().len());

    let attrs = &catalog.attrs;
    let vis = &catalog.vis;
    let name = &catalog.name;

    let capability_traits = traits::expand_traits(&catalog);
    let detector = traits::expand_detector(&catalog);
    let capability_enum = traits::expand_capability_enum(&catalog);
    let descriptor = traits::expand_descriptor(&catalog);
    let hook_table = hooks::expand_hooks(&catalog);
    let generic = interceptor::expand_interceptor(&catalog);
    let synthesized = shapes::expand_shapes(&catalog, &combos);
    let selector = expand_selector(&catalog, &combos);

    quote! {
        #(#attrs)*
        #vis mod #name {
            #[allow(unused_imports)]
            use super::*;

            #capability_traits
            #hook_table
            #generic
            #synthesized
            #detector
            #selector
            #capability_enum
            #descriptor
        }
    }
}

/// `wrap`: detect, then pick the shape whose canonical index is the
/// detected subset's.
fn expand_selector(catalog: &CatalogDef, combos: &[Combination]) -> TokenStream2 {
    let base_name = &catalog.base().name;
    let width = catalog.optional().len();

    let arms = combos.iter().map(|combo| {
        let shape = combo.ident();
        let index = combo.index;
        quote! {
            #index => Wrapped::#shape(#shape(interceptor)),
        }
    });

    let listed: Vec<String> = catalog
        .optional()
        .iter()
        .map(|cap| format!(" - [`{}`]", cap.name))
        .collect();
    let doc = if listed.is_empty() {
        format!(
            " Wrap `object` so every [`{base_name}`] operation passes through `hooks`.\n\n\
             With no hook set, the wrapper behaves exactly like `object`."
        )
    } else {
        format!(
            " Wrap `object` so every operation passes through `hooks`, keeping its \
             capabilities.\n\n\
             If `object` provides any combination of\n\n{}\n\n\
             (as reported by its capability queries), the wrapper provides exactly the same \
             combination. With no hook set it behaves exactly like `object`. Hooks targeting \
             operations `object` does not provide are ignored; any other hook intercepts the \
             operation it targets and may change its arguments, its result, or whether the \
             original runs at all.",
            listed.join("\n")
        )
    };
    let doc = LitStr::new(&doc, base_name.span());

    quote! {
        #[doc = #doc]
        pub fn wrap<W: #base_name>(object: W, hooks: Hooks) -> Wrapped<W> {
            let set = detect(&object);
            let interceptor = Interceptor { inner: object, hooks };
            let wrapped = match set.shape_index(#width) {
                #(#arms)*
                _ => ::tola_snoop::__private::selector_exhausted(&CATALOG, set),
            };
            ::tola_snoop::__private::wrapped(&CATALOG, wrapped.shape(), wrapped.hooks());
            wrapped
        }
    }
}
