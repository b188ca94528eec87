//! The `#[query(...)]` method attribute.
//!
//! Accepted forms:
//! - `#[query]` / `#[query("")]` - blank template id, reported when the method is called
//! - `#[query("activeUsers")]` - template id
//! - `#[query(inline = "select ...")]` - inline query text
//!
//! followed by any of `native`, `countable` and `count_query = "..."`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Ident, LitStr, Meta, Token, parse::Parse};

/// Parsed `#[query]` attribute.
pub(crate) struct QueryArgs {
    template: Option<LitStr>,
    inline: Option<LitStr>,
    count_query: Option<LitStr>,
    native: bool,
    countable: bool,
}

impl Parse for QueryArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut args = QueryArgs {
            template: None,
            inline: None,
            count_query: None,
            native: false,
            countable: false,
        };

        if input.peek(LitStr) {
            args.template = Some(input.parse()?);
        }

        while !input.is_empty() {
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }

            if input.is_empty() {
                break;
            }

            let ident: Ident = input.parse()?;
            match ident.to_string().as_str() {
                "native" => args.native = true,
                "countable" => args.countable = true,
                "inline" => {
                    input.parse::<Token![=]>()?;
                    args.inline = Some(input.parse()?);
                }
                "count_query" => {
                    input.parse::<Token![=]>()?;
                    args.count_query = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }
        }

        if let (Some(_), Some(inline)) = (&args.template, &args.inline) {
            return Err(syn::Error::new(
                inline.span(),
                "a query takes either a template id or `inline` text, not both",
            ));
        }
        Ok(args)
    }
}

impl QueryArgs {
    /// Expression building the `QueryMarker`.
    pub(crate) fn marker(&self) -> TokenStream {
        let mut marker = match (&self.template, &self.inline) {
            (_, Some(text)) => quote! { ::quarry::QueryMarker::inline(#text) },
            (Some(id), None) => quote! { ::quarry::QueryMarker::template(#id) },
            (None, None) => quote! { ::quarry::QueryMarker::template("") },
        };
        if self.native {
            marker = quote! { #marker.native() };
        }
        if self.countable {
            marker = quote! { #marker.countable() };
        }
        if let Some(count_query) = &self.count_query {
            marker = quote! { #marker.with_count_query(#count_query) };
        }
        marker
    }
}

/// Whether `attr` is a `#[query]` attribute.
pub(crate) fn is_query_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("query")
}

/// Parse the `#[query]` attribute among `attrs`, if any.
pub(crate) fn find_query_attr(attrs: &[Attribute]) -> syn::Result<Option<QueryArgs>> {
    let mut found = None;
    for attr in attrs.iter().filter(|a| is_query_attr(a)) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[query] attribute"));
        }
        let args: QueryArgs = match &attr.meta {
            Meta::Path(_) => syn::parse2(TokenStream::new())?,
            _ => attr.parse_args()?,
        };
        found = Some(args);
    }
    Ok(found)
}
