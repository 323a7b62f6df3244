use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, Visibility};

use crate::keys::KeySet;
use crate::parse::key_enum::{KeyEnumDecl, LiteralValue, RawType};

/// Generator for `CodingKey` implementations
pub struct CodingKeyGenerator<'a> {
    ident: &'a Ident,
    raw: &'a RawType,
    cases: Vec<(&'a Ident, &'a LiteralValue)>,
}

impl<'a> CodingKeyGenerator<'a> {
    pub fn from_decl(decl: &'a KeyEnumDecl) -> Self {
        Self {
            ident: &decl.ident,
            raw: &decl.raw,
            cases: decl
                .cases
                .iter()
                .map(|case| (&case.variant, &case.literal))
                .collect(),
        }
    }

    pub fn from_key_set(keys: &'a KeySet) -> Self {
        Self {
            ident: &keys.enum_ident,
            raw: &keys.raw,
            cases: keys
                .bindings
                .iter()
                .map(|binding| (&binding.case, &binding.literal))
                .collect(),
        }
    }

    /// The synthesized `<Model>PersistedKeys` enum and its implementation
    pub fn generate_enum(&self, vis: &Visibility) -> TokenStream {
        let ident = self.ident;
        let variants = self.cases.iter().map(|(case, _)| case);
        let implementation = self.generate_impl();

        quote! {
            #[doc(hidden)]
            #[allow(non_camel_case_types)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #vis enum #ident {
                #(#variants,)*
            }

            #implementation
        }
    }

    pub fn generate_impl(&self) -> TokenStream {
        let ident = self.ident;
        let raw_kind = self.raw.kind_tokens();
        let all = self.cases.iter().map(|(case, _)| quote!(#ident::#case));

        let (literal_body, name_body) = if self.cases.is_empty() {
            (quote!(match *self {}), quote!(match *self {}))
        } else {
            let literal_arms = self.cases.iter().map(|(case, literal)| {
                let literal = literal.to_key_literal();
                quote!(#ident::#case => #literal,)
            });
            let name_arms = self.cases.iter().map(|(case, _)| {
                let name = case.to_string();
                quote!(#ident::#case => #name,)
            });
            (
                quote!(match self { #(#literal_arms)* }),
                quote!(match self { #(#name_arms)* }),
            )
        };

        quote! {
            impl ::docbase_store::traits::CodingKey for #ident {
                const ALL: &'static [Self] = &[#(#all),*];
                const RAW: ::docbase_store::traits::RawKind = #raw_kind;

                fn literal(&self) -> ::docbase_store::traits::KeyLiteral {
                    #literal_body
                }

                fn name(&self) -> &'static str {
                    #name_body
                }
            }
        }
    }
}
