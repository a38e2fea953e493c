//! Identifiers derived from catalog names.
//!
//! | Source | Derived | Example |
//! |--------|---------|---------|
//! | operation `write_header` | callable alias | `WriteHeaderFn` |
//! | operation `write_header` | hook alias | `WriteHeaderHook` |
//! | operation `write_header` | builder | `on_write_header` |
//! | capability `CloseNotifier` | queries | `as_close_notifier`, `as_close_notifier_mut` |
//! | subset `0b0110` of 4 | shape | `Shape0110` |

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::{ext::IdentExt, Ident};

/// Items every generated module defines besides the per-catalog ones.
pub const RESERVED: &[&str] = &[
    "Hooks",
    "Wrapped",
    "Interceptor",
    "OptionalCapability",
    "CATALOG",
    "SHAPES",
    "wrap",
    "detect",
];

/// Inherent methods of `Wrapped`. An operation with one of these names
/// would be shadowed on the wrapper by the accessor.
pub const ACCESSORS: &[&str] = &[
    "shape",
    "capabilities",
    "exposes",
    "hooks",
    "get_ref",
    "get_mut",
    "into_inner",
];

/// Prefix of locals in generated bodies.
pub const LOCAL_PREFIX: &str = "__snoop_";

pub fn fn_alias(op: &Ident) -> Ident {
    format_ident!("{}Fn", upper_camel(&op.unraw().to_string()), span = op.span())
}

pub fn hook_alias(op: &Ident) -> Ident {
    format_ident!("{}Hook", upper_camel(&op.unraw().to_string()), span = op.span())
}

pub fn builder(op: &Ident) -> Ident {
    format_ident!("on_{}", op.unraw(), span = op.span())
}

pub fn query(cap: &Ident) -> Ident {
    format_ident!("as_{}", snake(&cap.unraw().to_string()), span = cap.span())
}

pub fn query_mut(cap: &Ident) -> Ident {
    format_ident!("as_{}_mut", snake(&cap.unraw().to_string()), span = cap.span())
}

/// Shape type name: `Shape` followed by the subset's index as `width`
/// binary digits (first capability leftmost). A catalog with no optional
/// capability has the single shape `Shape0`.
pub fn shape_name(index: usize, width: usize) -> String {
    format!("Shape{:0w$b}", index, w = width.max(1))
}

pub fn shape_ident(index: usize, width: usize) -> Ident {
    Ident::new(&shape_name(index, width), Span::call_site())
}

/// `write_header` -> `WriteHeader`
pub fn upper_camel(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `CloseNotifier` -> `close_notifier`, `HTTPFlusher` -> `http_flusher`
pub fn snake(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Render a type the way a person would write it: `io::Result<usize>`
/// rather than the token printer's `io :: Result < usize >`.
pub fn render(tokens: &impl ToTokens) -> String {
    let raw = tokens.to_token_stream().to_string();
    raw.replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
        .replace("[ ", "[")
        .replace(" ]", "]")
        .replace("( ", "(")
        .replace(" )", ")")
}

/// `::tola_snoop::__private::<item>`
pub fn private(item: &str) -> TokenStream {
    let item = Ident::new(item, Span::call_site());
    quote! { ::tola_snoop::__private::#item }
}
