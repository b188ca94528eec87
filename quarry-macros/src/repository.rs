//! `#[repository]` expansion.

use crate::query::{self, QueryArgs};
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{
    FnArg, Ident, ItemTrait, Pat, Path, ReturnType, Signature, Token, TraitItem, Type, bracketed,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

/// Arguments for the `#[repository]` macro.
pub(crate) struct RepositoryArgs {
    entity: Type,
    id: Type,
    extends: Vec<Path>,
}

impl Parse for RepositoryArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut entity = None;
        let mut id = None;
        let mut extends = Vec::new();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "entity" => entity = Some(input.parse()?),
                "id" => id = Some(input.parse()?),
                "extends" => {
                    let content;
                    bracketed!(content in input);
                    let parents = Punctuated::<Path, Token![,]>::parse_terminated(&content)?;
                    extends.extend(parents);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        let missing = |name: &str| {
            syn::Error::new(
                input.span(),
                format!("#[repository] requires `{} = <Type>`", name),
            )
        };
        Ok(RepositoryArgs {
            entity: entity.ok_or_else(|| missing("entity"))?,
            id: id.ok_or_else(|| missing("id"))?,
            extends,
        })
    }
}

pub(crate) fn expand(args: RepositoryArgs, mut input: ItemTrait) -> syn::Result<TokenStream> {
    let trait_name = input.ident.clone();
    let vis = input.vis.clone();
    let definition_name = format_ident!("{}Definition", trait_name);

    let mut methods = Vec::new();
    for item in &mut input.items {
        let TraitItem::Fn(func) = item else {
            continue;
        };
        let marker = query::find_query_attr(&func.attrs)?;
        func.attrs.retain(|attr| !query::is_query_attr(attr));
        methods.push(method_tokens(&func.sig, marker.as_ref())?);
    }

    let parents = args.extends.iter().map(|parent| {
        let definition = definition_path(parent);
        quote! { .inherit(<#definition as ::quarry::RepositoryInterface>::definition()) }
    });

    let entity = type_string(&args.entity);
    let id = type_string(&args.id);

    Ok(quote! {
        #input

        #[doc = concat!("Repository definition generated by `#[quarry::repository]` for `", stringify!(#trait_name), "`")]
        #[derive(Clone, Copy, Debug, Default)]
        #vis struct #definition_name;

        impl ::quarry::RepositoryInterface for #definition_name {
            fn definition() -> ::quarry::RepositoryDefinition {
                let declaring = ::quarry::TypeRef::new(module_path!(), stringify!(#trait_name));
                ::quarry::RepositoryDefinition::new(
                    ::quarry::RepositoryMetadata::new(declaring, #entity, #id),
                )
                #(#parents)*
                #(.method(#methods))*
            }
        }

        ::quarry::inventory::submit! {
            ::quarry::RepositoryRegistration::new(
                concat!(module_path!(), "::", stringify!(#trait_name)),
                <#definition_name as ::quarry::RepositoryInterface>::definition,
            )
        }
    })
}

/// `RepositoryMethod` builder expression for one trait method.
fn method_tokens(sig: &Signature, marker: Option<&QueryArgs>) -> syn::Result<TokenStream> {
    let name = sig.ident.to_string();

    let mut params = Vec::new();
    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat) = &*pat_type.pat else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "repository method parameters must be plain identifiers",
            ));
        };
        let param = pat.ident.to_string();
        let ty = type_string(&pat_type.ty);
        params.push(quote! { .param(#param, #ty) });
    }

    let returns = match &sig.output {
        ReturnType::Default => "()".to_string(),
        ReturnType::Type(_, ty) => type_string(ty),
    };
    let marker = marker.map(|m| {
        let marker = m.marker();
        quote! { .with_marker(#marker) }
    });

    Ok(quote! {
        ::quarry::RepositoryMethod::new(declaring, #name)
            #(#params)*
            .returns(#returns)
            #marker
    })
}

/// `path::to::Parent` → `path::to::ParentDefinition`.
fn definition_path(parent: &Path) -> Path {
    let mut path = parent.clone();
    if let Some(last) = path.segments.last_mut() {
        last.ident = format_ident!("{}Definition", last.ident);
    }
    path
}

/// Source text of `ty` without the spacing `quote` inserts between tokens.
fn type_string(ty: &impl ToTokens) -> String {
    let raw = ty.to_token_stream().to_string();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last().is_some_and(is_word);
            let next = chars.peek().is_some_and(|&n| is_word(n));
            if prev && next {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}
