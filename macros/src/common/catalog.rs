//! Capability catalog model and parser.
//!
//! # Syntax
//!
//! ```text
//! #[attrs] vis mod NAME {
//!     #[attrs] base Trait { fn op(&self, arg: Ty) -> Ret; ... }
//!     #[attrs] optional Trait { ... }
//!     ...
//! }
//! ```
//!
//! Parsing only checks the shape of each item. Cross-item rules (one base,
//! unique names, capability limit) live in `validate`.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    braced,
    parse::{Parse, ParseStream},
    Attribute, FnArg, GenericArgument, Ident, Lifetime, Pat, PathArguments, ReturnType,
    Token, TraitItem, TraitItemFn, Type, TypeParamBound, Visibility,
};

use super::peek_any_keyword;

// =============================================================================
// Model
// =============================================================================

/// A full catalog: the base capability followed by the optional ones.
pub struct CatalogDef {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub name: Ident,
    pub capabilities: Vec<CapabilityDef>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CapabilityKind {
    Base,
    Optional,
}

/// One capability block, `base X { .. }` or `optional X { .. }`.
pub struct CapabilityDef {
    pub attrs: Vec<Attribute>,
    pub kind: CapabilityKind,
    pub kind_span: Span,
    pub name: Ident,
    pub operations: Vec<OperationDef>,
}

/// One operation signature.
pub struct OperationDef {
    pub attrs: Vec<Attribute>,
    pub name: Ident,
    /// `&mut self` receiver.
    pub mutable: bool,
    pub params: Vec<ParamDef>,
    /// `None` when the operation returns `()` implicitly.
    pub output: Option<Type>,
}

pub struct ParamDef {
    pub name: Ident,
    pub ty: Type,
}

impl CatalogDef {
    pub fn base(&self) -> &CapabilityDef {
        &self.capabilities[0]
    }

    /// Optional capabilities in catalog order. Only meaningful after
    /// validation has confirmed the first block is the base.
    pub fn optional(&self) -> &[CapabilityDef] {
        &self.capabilities[1..]
    }

    /// Every operation with the capability that declares it.
    pub fn operations(&self) -> impl Iterator<Item = (&CapabilityDef, &OperationDef)> {
        self.capabilities
            .iter()
            .flat_map(|cap| cap.operations.iter().map(move |op| (cap, op)))
    }
}

impl OperationDef {
    /// `&self` or `&mut self`
    pub fn receiver(&self) -> TokenStream {
        if self.mutable {
            quote! { &mut self }
        } else {
            quote! { &self }
        }
    }

    /// `-> Ret`, or nothing for implicit `()`.
    pub fn output_tokens(&self) -> TokenStream {
        match &self.output {
            Some(ty) => quote! { -> #ty },
            None => quote! {},
        }
    }

    /// `fn name(&self, a: A, b: B) -> Ret`
    pub fn signature(&self) -> TokenStream {
        let name = &self.name;
        let receiver = self.receiver();
        let params = self.params.iter().map(|p| {
            let (n, ty) = (&p.name, &p.ty);
            quote! { #n: #ty }
        });
        let output = self.output_tokens();
        quote! { fn #name(#receiver #(, #params)*) #output }
    }

    pub fn arg_names(&self) -> Vec<&Ident> {
        self.params.iter().map(|p| &p.name).collect()
    }

    pub fn arg_types(&self) -> Vec<&Type> {
        self.params.iter().map(|p| &p.ty).collect()
    }
}

// =============================================================================
// Parsing
// =============================================================================

impl Parse for CatalogDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let name: Ident = input.parse()?;

        let content;
        braced!(content in input);
        let mut capabilities = Vec::new();
        while !content.is_empty() {
            capabilities.push(content.parse()?);
        }

        if capabilities.is_empty() {
            return Err(syn::Error::new_spanned(
                &name,
                "catalog is empty\n\nDeclare a `base Trait { .. }` block.",
            ));
        }

        Ok(CatalogDef {
            attrs,
            vis,
            name,
            capabilities,
        })
    }
}

impl Parse for CapabilityDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;

        if !peek_any_keyword(input, &["base", "optional"]) {
            return Err(input.error("expected `base` or `optional`"));
        }
        let keyword: Ident = input.parse()?;
        let kind = if keyword == "base" {
            CapabilityKind::Base
        } else {
            CapabilityKind::Optional
        };
        let name: Ident = input.parse()?;

        let body;
        braced!(body in input);
        let mut operations = Vec::new();
        while !body.is_empty() {
            match body.parse::<TraitItem>()? {
                TraitItem::Fn(item) => operations.push(OperationDef::from_item(item)?),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "only method signatures are allowed in a capability",
                    ));
                }
            }
        }

        Ok(CapabilityDef {
            attrs,
            kind,
            kind_span: keyword.span(),
            name,
            operations,
        })
    }
}

impl OperationDef {
    fn from_item(item: TraitItemFn) -> syn::Result<Self> {
        let sig = &item.sig;

        if let Some(body) = &item.default {
            return Err(syn::Error::new_spanned(
                body,
                "operations cannot have a default body",
            ));
        }
        if let Some(token) = &sig.constness {
            return Err(syn::Error::new_spanned(token, "operations cannot be `const`"));
        }
        if let Some(token) = &sig.asyncness {
            return Err(syn::Error::new_spanned(token, "operations cannot be `async`"));
        }
        if let Some(token) = &sig.unsafety {
            return Err(syn::Error::new_spanned(token, "operations cannot be `unsafe`"));
        }
        if let Some(abi) = &sig.abi {
            return Err(syn::Error::new_spanned(abi, "operations cannot declare an ABI"));
        }
        if let Some(variadic) = &sig.variadic {
            return Err(syn::Error::new_spanned(variadic, "operations cannot be variadic"));
        }
        if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
            return Err(syn::Error::new_spanned(
                &sig.generics,
                "operations cannot be generic\n\
                 \n\
                 Capabilities are used as trait objects, so every operation\n\
                 needs a single concrete signature.",
            ));
        }

        let mut inputs = sig.inputs.iter();
        let mutable = match inputs.next() {
            Some(FnArg::Receiver(recv))
                if recv.colon_token.is_none() && recv.reference.is_some() =>
            {
                if let Some((_, Some(lifetime))) = &recv.reference {
                    return Err(syn::Error::new_spanned(
                        lifetime,
                        "receiver lifetimes must be elided",
                    ));
                }
                recv.mutability.is_some()
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    sig,
                    "operations must take `&self` or `&mut self`",
                ));
            }
        };

        let mut params = Vec::new();
        for arg in inputs {
            let FnArg::Typed(typed) = arg else {
                return Err(syn::Error::new_spanned(arg, "unexpected receiver"));
            };
            let name = match &*typed.pat {
                Pat::Ident(pat)
                    if pat.by_ref.is_none() && pat.mutability.is_none() && pat.subpat.is_none() =>
                {
                    pat.ident.clone()
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "parameters must be plain identifiers",
                    ));
                }
            };
            check_type(&typed.ty, Position::Param)?;
            params.push(ParamDef {
                name,
                ty: (*typed.ty).clone(),
            });
        }

        let output = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => {
                check_type(ty, Position::Return)?;
                Some((**ty).clone())
            }
        };

        Ok(OperationDef {
            attrs: item.attrs.clone(),
            name: sig.ident.clone(),
            mutable,
            params,
            output,
        })
    }
}

// =============================================================================
// Type Restrictions
// =============================================================================

/// Where a type appears in a signature.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Param,
    Return,
}

/// Reject types the generated callable aliases cannot express.
///
/// Hook callables are `Box<dyn FnMut(Args) -> Ret + 'a>`, so parameter
/// lifetimes must be elidable (higher-ranked) and the result cannot borrow
/// from the receiver.
///
/// Only lifetimes visible in the tokens can be checked. A return type
/// hiding an elided lifetime, like `Chars` for `Chars<'_>`, still fails
/// later with `E0106`; `Cow` is caught here since it is the usual case.
fn check_type(ty: &Type, pos: Position) -> syn::Result<()> {
    match ty {
        Type::Reference(r) => {
            match &r.lifetime {
                Some(lifetime) => check_lifetime(lifetime, pos)?,
                None if pos == Position::Return => {
                    return Err(syn::Error::new_spanned(
                        ty,
                        "operations cannot return borrowed data\n\
                         \n\
                         Return an owned value instead.",
                    ));
                }
                None => {}
            }
            check_type(&r.elem, pos)
        }
        Type::Path(p) => {
            if let Some(qself) = &p.qself {
                check_type(&qself.ty, pos)?;
            }
            check_path(&p.path, pos)
        }
        Type::TraitObject(obj) => check_bounds(obj.bounds.iter(), pos),
        Type::ImplTrait(_) => Err(syn::Error::new_spanned(
            ty,
            "`impl Trait` is not allowed in operation signatures",
        )),
        Type::Infer(_) => Err(syn::Error::new_spanned(
            ty,
            "operation signatures need explicit types",
        )),
        Type::Slice(s) => check_type(&s.elem, pos),
        Type::Array(a) => check_type(&a.elem, pos),
        Type::Ptr(p) => check_type(&p.elem, pos),
        Type::Paren(p) => check_type(&p.elem, pos),
        Type::Group(g) => check_type(&g.elem, pos),
        Type::Tuple(t) => t.elems.iter().try_for_each(|elem| check_type(elem, pos)),
        _ => Ok(()),
    }
}

fn check_path(path: &syn::Path, pos: Position) -> syn::Result<()> {
    if pos == Position::Return && hides_lifetime(path) {
        return Err(syn::Error::new_spanned(
            path,
            "operations cannot return borrowed data\n\
             \n\
             `Cow` borrows through an elided lifetime. Return an owned value,\n\
             or `Cow<'static, ..>`.",
        ));
    }
    for segment in &path.segments {
        match &segment.arguments {
            PathArguments::None => {}
            PathArguments::AngleBracketed(args) => {
                for arg in &args.args {
                    match arg {
                        GenericArgument::Type(ty) => check_type(ty, pos)?,
                        GenericArgument::Lifetime(lifetime) => check_lifetime(lifetime, pos)?,
                        GenericArgument::AssocType(assoc) => check_type(&assoc.ty, pos)?,
                        _ => {}
                    }
                }
            }
            PathArguments::Parenthesized(args) => {
                for input in &args.inputs {
                    check_type(input, pos)?;
                }
                if let ReturnType::Type(_, ty) = &args.output {
                    check_type(ty, pos)?;
                }
            }
        }
    }
    Ok(())
}

/// `Cow<T>` written without its lifetime argument.
fn hides_lifetime(path: &syn::Path) -> bool {
    let Some(last) = path.segments.last() else {
        return false;
    };
    if last.ident != "Cow" {
        return false;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) => !args
            .args
            .iter()
            .any(|arg| matches!(arg, GenericArgument::Lifetime(_))),
        _ => true,
    }
}

fn check_bounds<'a>(
    bounds: impl Iterator<Item = &'a TypeParamBound>,
    pos: Position,
) -> syn::Result<()> {
    for bound in bounds {
        match bound {
            TypeParamBound::Lifetime(lifetime) => check_lifetime(lifetime, pos)?,
            TypeParamBound::Trait(tb) => check_path(&tb.path, pos)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_lifetime(lifetime: &Lifetime, pos: Position) -> syn::Result<()> {
    if lifetime.ident == "static" || (pos == Position::Param && lifetime.ident == "_") {
        return Ok(());
    }
    let msg = match pos {
        Position::Param => "named lifetimes are not supported\n\nElide the lifetime instead.",
        Position::Return => "operations cannot return borrowed data",
    };
    Err(syn::Error::new_spanned(lifetime, msg))
}
