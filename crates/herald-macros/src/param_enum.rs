//! `#[derive(ParamEnum)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, spanned::Spanned};

/// `SetDefault` -> `SET_DEFAULT`.
fn upper_snake(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut prev_lower = false;
    for c in ident.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.extend(c.to_uppercase());
    }
    out
}

fn variant_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unknown param attribute, expected: name"))
            }
        })?;
    }
    Ok(name)
}

pub fn derive_param_enum(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "ParamEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            input.span(),
            "ParamEnum requires at least one variant",
        ));
    }

    let mut idents = Vec::new();
    let mut names = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "ParamEnum variants cannot carry data",
            ));
        }
        let name = match variant_rename(&variant.attrs)? {
            Some(name) => name.to_uppercase(),
            None => upper_snake(&variant.ident.to_string()),
        };
        if names.contains(&name) {
            return Err(syn::Error::new(
                variant.span(),
                format!("duplicate variant name `{name}`"),
            ));
        }
        idents.push(&variant.ident);
        names.push(name);
    }

    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::herald_framework::request::ParamEnum for #name #ty_generics #where_clause {
            const NAME: &'static str = #type_name;
            const VARIANTS: &'static [&'static str] = &[#(#names),*];

            fn from_variant(name: &str) -> ::std::option::Option<Self> {
                match name {
                    #(#names => ::std::option::Option::Some(Self::#idents),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn variant_name(&self) -> &'static str {
                match self {
                    #(Self::#idents => #names,)*
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_snake() {
        assert_eq!(upper_snake("Allow"), "ALLOW");
        assert_eq!(upper_snake("SetDefault"), "SET_DEFAULT");
        assert_eq!(upper_snake("Level2Mode"), "LEVEL2_MODE");
    }

    #[test]
    fn test_rejects_data_variants() {
        let input: DeriveInput = syn::parse_quote! {
            enum Bad { A, B(u8) }
        };
        let err = derive_param_enum(&input).unwrap_err();
        assert!(err.to_string().contains("cannot carry data"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let input: DeriveInput = syn::parse_quote! {
            enum Bad {
                On,
                #[param(name = "on")]
                Enabled,
            }
        };
        assert!(derive_param_enum(&input).is_err());
    }
}
