//! Hook table.
//!
//! Per operation `op(&self, a: A) -> R` of capability `Cap`:
//!
//! ```text
//! type OpFn<'a>  = Box<dyn FnMut(A) -> R + 'a>;                    // bound callable
//! type OpHook    = Arc<dyn for<'a> Fn(OpFn<'a>) -> OpFn<'a> + Send + Sync>;
//! struct Hooks { pub op: Option<OpHook>, .. }
//! ```
//!
//! A hook receives the original callable and returns its replacement, so
//! a replacement with another signature is a type error at the call to
//! `Hooks::on_op`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::LitStr;

use crate::common::{builder, fn_alias, hook_alias, private, CatalogDef};

pub fn expand_hooks(catalog: &CatalogDef) -> TokenStream {
    let boxed = private("Box");
    let arc = private("Arc");
    let option = private("Option");
    let fmt = private("fmt");

    let mut aliases = Vec::new();
    let mut fields = Vec::new();
    let mut builders = Vec::new();
    let mut slots = Vec::new();

    for (cap, op) in catalog.operations() {
        let name = &op.name;
        let (fn_ty, hook_ty, on) = (fn_alias(name), hook_alias(name), builder(name));
        let arg_types = op.arg_types();
        let output = op.output_tokens();
        let path = format!("{}::{}", cap.name, name);

        let fn_doc = LitStr::new(
            &format!(" The bound original of [`{path}`], as handed to and returned by a hook."),
            name.span(),
        );
        let hook_doc = LitStr::new(&format!(" Interceptor for [`{path}`]."), name.span());
        aliases.push(quote! {
            #[doc = #fn_doc]
            pub type #fn_ty<'a> = #boxed<dyn ::core::ops::FnMut(#(#arg_types),*) #output + 'a>;

            #[doc = #hook_doc]
            pub type #hook_ty = #arc<dyn for<'a> ::core::ops::Fn(#fn_ty<'a>) -> #fn_ty<'a> + ::core::marker::Send + ::core::marker::Sync>;
        });

        let field_doc = LitStr::new(
            &format!(" Intercepts [`{path}`]. `None` passes calls straight through."),
            name.span(),
        );
        fields.push(quote! {
            #[doc = #field_doc]
            pub #name: #option<#hook_ty>,
        });

        let builder_doc = LitStr::new(
            &format!(
                " Install `hook` for [`{path}`], replacing any previous one.\n\n\
                 The hook gets the original callable and returns the callable to run \
                 instead. It may call the original any number of times, including never."
            ),
            name.span(),
        );
        builders.push(quote! {
            #[doc = #builder_doc]
            pub fn #on<F>(mut self, hook: F) -> Self
            where
                F: for<'a> ::core::ops::Fn(#fn_ty<'a>) -> #fn_ty<'a> + ::core::marker::Send + ::core::marker::Sync + 'static,
            {
                self.#name = ::tola_snoop::__private::Some(#arc::new(hook));
                self
            }
        });

        let name_str = name.to_string();
        slots.push(quote! { (#name_str, self.#name.is_some()) });
    }

    let count = slots.len();

    quote! {
        #(#aliases)*

        /// One optional interceptor per operation of the catalog.
        ///
        /// Unset slots are pass-through. Hooks targeting operations the
        /// wrapped object does not provide are never called.
        #[derive(Clone, Default)]
        pub struct Hooks {
            #(#fields)*
        }

        impl Hooks {
            /// All slots empty.
            pub fn new() -> Self {
                Self::default()
            }

            #(#builders)*

            /// True when no slot is set.
            pub fn is_empty(&self) -> bool {
                self.installed().next().is_none()
            }

            /// Names of the operations with a hook installed, in catalog order.
            pub fn installed(&self) -> impl ::core::iter::Iterator<Item = &'static str> {
                let slots: [(&'static str, bool); #count] = [#(#slots),*];
                ::core::iter::IntoIterator::into_iter(slots)
                    .filter_map(|(name, set)| if set { ::tola_snoop::__private::Some(name) } else { ::tola_snoop::__private::None })
            }
        }

        impl #fmt::Debug for Hooks {
            fn fmt(&self, f: &mut #fmt::Formatter<'_>) -> #fmt::Result {
                f.debug_set().entries(self.installed()).finish()
            }
        }
    }
}
