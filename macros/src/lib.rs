//! Proc macros for cntryl-scope instrumentation.
//!
//! This crate provides the `#[scoped]` attribute macro, which instruments a
//! whole function body with the `scope!` marker.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, ExprLit, ItemFn, Lit, MetaNameValue, Token};

/// Instrument a function.
///
/// Equivalent to writing `scope!()` as the first statement of the body, with
/// the function's own name as the site's function component.
///
/// # Example
///
/// ```rust,ignore
/// use cntryl_scope::scoped;
///
/// #[scoped]
/// fn rebuild_index(entries: &[u64]) -> usize {
///     entries.len()
/// }
/// ```
///
/// # Attributes
///
/// - `#[scoped]` - Site named after the function
/// - `#[scoped(name = "custom_name")]` - Use a custom name instead of the function name
///
/// `async fn` is rejected: a recorder must not be held across `.await`.
#[proc_macro_attribute]
pub fn scoped(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as ItemFn);

    if let Some(asyncness) = &input.sig.asyncness {
        return syn::Error::new_spanned(
            asyncness,
            "#[scoped] cannot instrument async functions; time a synchronous scope instead",
        )
        .to_compile_error()
        .into();
    }

    let site_name = match parse_site_name(attr.into()) {
        Ok(Some(name)) => name,
        Ok(None) => input.sig.ident.to_string(),
        Err(e) => return e.to_compile_error().into(),
    };

    let marker: syn::Stmt = syn::parse_quote! {
        ::cntryl_scope::scope!(@named #site_name);
    };
    input.block.stmts.insert(0, marker);

    TokenStream::from(quote! { #input })
}

/// Parse the attribute arguments: nothing, or `name = "value"`.
fn parse_site_name(attr: proc_macro2::TokenStream) -> syn::Result<Option<String>> {
    let args = Punctuated::<MetaNameValue, Token![,]>::parse_terminated.parse2(attr)?;
    let mut name = None;
    for arg in args {
        if !arg.path.is_ident("name") {
            return Err(syn::Error::new_spanned(
                &arg.path,
                "unknown #[scoped] argument; expected `name = \"...\"`",
            ));
        }
        if name.is_some() {
            return Err(syn::Error::new_spanned(&arg, "duplicate `name` argument"));
        }
        match &arg.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(value),
                ..
            }) => name = Some(value.value()),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "`name` must be a string literal",
                ))
            }
        }
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_custom_name() {
        assert_eq!(
            parse_site_name(quote!(name = "flush_all")).unwrap(),
            Some("flush_all".to_string())
        );
    }

    #[test]
    fn should_accept_empty_attribute() {
        assert_eq!(parse_site_name(quote!()).unwrap(), None);
    }

    #[test]
    fn should_reject_unknown_argument() {
        let err = parse_site_name(quote!(nmae = "x")).unwrap_err();
        assert!(err.to_string().contains("unknown #[scoped] argument"));
    }

    #[test]
    fn should_reject_non_string_name() {
        assert!(parse_site_name(quote!(name = 42)).is_err());
        assert!(parse_site_name(quote!(name)).is_err());
    }

    #[test]
    fn should_reject_duplicate_name() {
        assert!(parse_site_name(quote!(name = "a", name = "b")).is_err());
    }
}
