//! `#[method]` attribute implementation
//!
//! Input:
//! ```ignore
//! #[method]
//! async fn add(x: i64, y: i64) -> Result<i64, ServiceError> {
//!     Ok(x + y)
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! fn add() -> Box<dyn hutshim_runner::Method> {
//!     async fn __hutshim_inner(x: i64, y: i64) -> Result<i64, ServiceError> {
//!         Ok(x + y)
//!     }
//!
//!     hutshim_runner::from_typed_fn(
//!         |_: hutshim_runner::Context, (__arg0, __arg1,): (i64, i64,)| {
//!             __hutshim_inner(__arg0, __arg1)
//!         },
//!     )
//! }
//! ```
//!
//! A leading parameter whose type is named `Context` receives the request
//! context instead of a positional argument.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, Type};

pub fn method_impl(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new(
            Span::call_site(),
            "#[method] does not take arguments",
        ));
    }

    let input_fn: ItemFn = syn::parse2(item)?;
    let sig = &input_fn.sig;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[method] requires an async fn",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[method] functions cannot be generic",
        ));
    }

    let mut arg_types = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(recv) => {
                return Err(syn::Error::new_spanned(
                    recv,
                    "#[method] cannot be used on functions taking self",
                ));
            }
            FnArg::Typed(pat_type) => arg_types.push(pat_type.ty.as_ref()),
        }
    }

    let takes_context = arg_types.first().is_some_and(|ty| is_context(ty));
    let positional = if takes_context {
        &arg_types[1..]
    } else {
        &arg_types[..]
    };

    let arg_idents: Vec<_> = (0..positional.len())
        .map(|i| format_ident!("__arg{}", i))
        .collect();

    let fn_name = &sig.ident;
    let fn_vis = &input_fn.vis;
    let fn_attrs = &input_fn.attrs;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let block = &input_fn.block;

    let (ctx_pat, call) = if takes_context {
        (
            quote! { __ctx },
            quote! { __hutshim_inner(__ctx, #(#arg_idents),*) },
        )
    } else {
        (quote! { _ }, quote! { __hutshim_inner(#(#arg_idents),*) })
    };

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis fn #fn_name() -> ::std::boxed::Box<dyn ::hutshim_runner::Method> {
            async fn __hutshim_inner(#inputs) #output #block

            ::hutshim_runner::from_typed_fn(
                |#ctx_pat: ::hutshim_runner::Context, (#(#arg_idents,)*): (#(#positional,)*)| {
                    #call
                },
            )
        }
    })
}

fn is_context(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "Context"),
        _ => false,
    }
}
