use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{Data, DeriveInput, spanned::Spanned};

use crate::errors::{ConfigurationError, Diagnostics};
use crate::generators::CodingKeyGenerator;
use crate::parse::key_enum::KeyEnumDecl;

mod classify;
mod compile;
mod errors;
mod generators;
mod keys;
mod parse;
mod utils;

/// Compiles a model description into a persisted model.
///
/// Placed on an inline module holding the model struct and its marked
/// declarations, or directly on the struct. With more than one struct in
/// the module, name the model: `#[persisted_model(Settings)]`.
///
/// # Markers
///
/// - `#[persisted_ignored]` / `#[persisted_ignored(constant)]` on a field:
///   observed but never stored. Constant ignored fields are constructor
///   arguments and get no setter.
/// - `#[storage_name]` on a `const` or non-`mut` `static` string literal:
///   the record name (defaults to the model name).
/// - `#[model_coding_key]` on an enum deriving `CodingKey`: keys used to
///   store the persisted fields (defaults to the field names).
/// - `#[migration]` on an enum deriving `CodingKey`: keys of the previous
///   schema; generates `migrate` and `should_migrate`.
///
/// # Example
///
/// ```ignore
/// #[persisted_model]
/// pub mod settings {
///     use docbase_store::prelude::*;
///
///     pub struct Settings {
///         pub number: i64,
///         pub text: String,
///         #[persisted_ignored]
///         pub draft: String,
///     }
///
///     #[storage_name]
///     pub const STORAGE: &str = "Default";
///
///     #[migration]
///     #[derive(Clone, Copy, CodingKey)]
///     pub enum LegacyKeys {
///         #[key = "N"]
///         Number,
///         #[key = "S"]
///         Text,
///     }
/// }
///
/// // Generates on `Settings`:
/// //   number() / set_number(), text() / set_text(), draft() / set_draft()
/// //   new, open, load, decode_from, encode_to, save, reload, is_persisted
/// //   migrate, should_migrate
/// // and the hidden SettingsPersistedKeys / SettingsSlots types.
/// ```
///
/// Every configuration error of the model is reported at once and no code
/// is emitted for it.
#[proc_macro_attribute]
pub fn persisted_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    persisted_model_impl(attr.into(), item.into()).into()
}

fn persisted_model_impl(attr: TokenStream2, item: TokenStream2) -> TokenStream2 {
    compile::compile(attr, item).unwrap_or_else(|e| e.to_compile_error())
}

/// Implements `CodingKey` for a unit-only enum.
///
/// String-backed by default: each case stores as its snake_case name, or
/// the literal given by `#[key = "..."]`. With `#[repr(<integer>)]` the case
/// stores as its discriminant.
///
/// ```ignore
/// #[derive(Clone, Copy, CodingKey)]
/// enum Keys {
///     Number,             // "number"
///     #[key = "txt"]
///     Text,               // "txt"
/// }
///
/// #[derive(Clone, Copy, CodingKey)]
/// #[repr(u8)]
/// enum Compact {
///     Number = 1,         // 1
///     Text,               // 2
/// }
/// ```
#[proc_macro_derive(CodingKey, attributes(key))]
pub fn coding_key_derive(input: TokenStream) -> TokenStream {
    coding_key_impl(input.into()).into()
}

fn coding_key_impl(input: TokenStream2) -> TokenStream2 {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(e) => return e.to_compile_error(),
    };

    let mut diagnostics = Diagnostics::new();
    let Data::Enum(data) = &input.data else {
        diagnostics.error(
            ConfigurationError::InvalidKeyAttribute {
                detail: format!("`CodingKey` can only be derived for enums; `{}` is not one", input.ident),
            },
            input.ident.span(),
        );
        return finish(diagnostics);
    };
    if !input.generics.params.is_empty() {
        diagnostics.error(
            ConfigurationError::InvalidKeyAttribute {
                detail: format!("`CodingKey` enums cannot be generic; `{}` is", input.ident),
            },
            input.generics.span(),
        );
        return finish(diagnostics);
    }

    let decl = KeyEnumDecl::from_parts(&input.ident, &input.attrs, &data.variants, &mut diagnostics);
    for (case, literal) in decl.duplicate_literals() {
        diagnostics.error(
            ConfigurationError::DuplicateKeyLiteral {
                enum_name: decl.ident.to_string(),
                literal: literal.to_string(),
            },
            case.span,
        );
    }
    if !diagnostics.is_empty() {
        return finish(diagnostics);
    }

    CodingKeyGenerator::from_decl(&decl).generate_impl()
}

fn finish(diagnostics: Diagnostics) -> TokenStream2 {
    match diagnostics.finish() {
        Ok(()) => TokenStream2::new(),
        Err(e) => e.to_compile_error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_model_expands_in_place() {
        let output = persisted_model_impl(
            quote!(),
            quote! {
                pub mod settings {
                    use docbase_store::prelude::*;

                    pub struct Settings {
                        pub number: i64,
                    }

                    #[storage_name]
                    pub const STORAGE: &str = "Default";
                }
            },
        )
        .to_string();

        assert!(output.starts_with("pub mod settings"));
        assert!(output.contains("pub const STORAGE : & str = \"Default\""));
        assert!(!output.contains("# [storage_name]"));
        assert!(output.contains("pub enum SettingsPersistedKeys"));
        assert!(output.contains("impl :: docbase_store :: traits :: PersistedModel for Settings"));
        assert!(!output.contains("compile_error"));
    }

    #[test]
    fn test_invalid_model_emits_only_errors() {
        let output = persisted_model_impl(
            quote!(),
            quote! {
                mod m {
                    pub struct M { pub a: i64 }

                    #[storage_name]
                    static mut NAME: &str = "Name";
                }
            },
        )
        .to_string();

        assert!(output.contains("compile_error"));
        assert!(output.contains("help: replace `static mut` with `static`"));
        assert!(!output.contains("struct M"));
    }

    #[test]
    fn test_derive_on_struct_is_rejected() {
        let output = coding_key_impl(quote! { struct Keys; }).to_string();
        assert!(output.contains("can only be derived for enums"));
    }

    #[test]
    fn test_derive_reports_duplicate_literals() {
        let output = coding_key_impl(quote! {
            enum Keys { #[key = "a"] First, #[key = "a"] Second }
        })
        .to_string();
        assert!(output.contains("used by more than one case"));
    }

    #[test]
    fn test_derive_integer_keys() {
        let output = coding_key_impl(quote! {
            #[repr(u8)]
            enum Keys { A = 3, B }
        })
        .to_string();
        assert!(output.contains("KeyLiteral :: Int (3i64)"));
        assert!(output.contains("KeyLiteral :: Int (4i64)"));
    }
}
