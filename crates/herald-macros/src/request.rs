//! `#[derive(Request)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitInt, LitStr, PathArguments,
    Type, spanned::Spanned,
};

// ============================================================================
// Attribute parsing
// ============================================================================

#[derive(Default)]
struct ParamAttrs {
    name: Option<String>,
    ordinal: Option<usize>,
    description: Option<String>,
    capture_remaining: bool,
}

fn parse_param_attrs(attrs: &[Attribute]) -> syn::Result<ParamAttrs> {
    let mut result = ParamAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("ordinal") {
                result.ordinal = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("description") {
                result.description = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("capture_remaining") {
                result.capture_remaining = true;
            } else {
                return Err(meta.error(
                    "unknown param attribute, expected one of: name, ordinal, description, capture_remaining",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Returns `T` if `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

// ============================================================================
// Code generation
// ============================================================================

struct Param<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    nullable: bool,
    attrs: ParamAttrs,
    ordinal: usize,
}

pub fn derive_request(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Request can only be derived for structs",
            ));
        }
    };

    let mut params = Vec::new();
    match fields {
        Fields::Named(named) => {
            for (position, field) in named.named.iter().enumerate() {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let attrs = parse_param_attrs(&field.attrs)?;
                let (ty, nullable) = match option_inner(&field.ty) {
                    Some(inner) => (inner, true),
                    None => (&field.ty, false),
                };
                let ordinal = attrs.ordinal.unwrap_or(position);
                params.push(Param {
                    ident,
                    ty,
                    nullable,
                    attrs,
                    ordinal,
                });
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                fields.span(),
                "Request requires named fields",
            ));
        }
    }

    let fw = quote!(::herald_framework::request);

    let descriptors = params.iter().map(|p| {
        let name = p
            .attrs
            .name
            .clone()
            .unwrap_or_else(|| p.ident.to_string());
        let ordinal = p.ordinal;
        let ty = p.ty;
        let nullable = p.nullable.then(|| quote!(.nullable()));
        let capture = p.attrs.capture_remaining.then(|| quote!(.capture_remaining()));
        let description = p
            .attrs
            .description
            .as_ref()
            .map(|d| quote!(.description(#d)));
        quote! {
            #fw::ParamDescriptor::new(#name, #ordinal, <#ty as #fw::FromParam>::TYPE)
                #nullable #capture #description
        }
    });

    let assignments = params.iter().map(|p| {
        let ident = p.ident;
        let ty = p.ty;
        let ordinal = p.ordinal;
        if p.nullable {
            quote!(#ident: args.take_optional::<#ty>(#ordinal)?)
        } else {
            quote!(#ident: args.take::<#ty>(#ordinal)?)
        }
    });

    let construct = match fields {
        Fields::Unit => quote!(Self),
        _ => quote!(Self { #(#assignments,)* }),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #fw::Request for #name #ty_generics #where_clause {
            fn params() -> ::std::vec::Vec<#fw::ParamDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_args(
                mut args: #fw::BoundArgs,
            ) -> ::std::result::Result<Self, #fw::BindError> {
                ::std::result::Result::Ok(#construct)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_inner() {
        let ty: Type = syn::parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: Type = syn::parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: Type = syn::parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_rejects_enums() {
        let input: DeriveInput = syn::parse_quote! {
            enum NotARequest { A }
        };
        assert!(derive_request(&input).is_err());
    }

    #[test]
    fn test_rejects_unknown_attribute() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad {
                #[param(oridnal = 0)]
                x: i32,
            }
        };
        let err = derive_request(&input).unwrap_err();
        assert!(err.to_string().contains("unknown param attribute"));
    }

    #[test]
    fn test_generates_descriptors() {
        let input: DeriveInput = syn::parse_quote! {
            struct AddRule {
                #[param(ordinal = 0, description = "Where")]
                index: i32,
                #[param(name = "path", ordinal = 1, capture_remaining)]
                rest: Option<String>,
            }
        };
        let tokens: String = derive_request(&input)
            .unwrap()
            .to_string()
            .split_whitespace()
            .collect();
        assert!(tokens.contains("take::<i32>(0usize)"));
        assert!(tokens.contains("take_optional::<String>(1usize)"));
        assert!(tokens.contains("capture_remaining"));
        assert!(tokens.contains("\"path\""));
    }
}
