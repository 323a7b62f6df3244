//! Marker attribute parsing
//!
//! Markers are the attributes the model compiler consumes itself:
//! `#[storage_name]`, `#[persisted_ignored]` / `#[persisted_ignored(constant)]`,
//! `#[model_coding_key]` and `#[migration]`. They are removed from the
//! emitted tokens; every other attribute is kept where it was written.

use proc_macro2::Span;
use quote::ToTokens;
use syn::{Attribute, Ident, Path, Token, punctuated::Punctuated, spanned::Spanned};

use crate::errors::{ConfigurationError, Diagnostics};

pub const STORAGE_NAME: &str = "storage_name";
pub const PERSISTED_IGNORED: &str = "persisted_ignored";
pub const MODEL_CODING_KEY: &str = "model_coding_key";
pub const MIGRATION: &str = "migration";

const INTEGER_REPRS: &[&str] = &[
    "u8", "u16", "u32", "u64", "usize", "i8", "i16", "i32", "i64", "isize",
];

#[derive(Debug, Clone, Copy)]
pub struct IgnoredMarker {
    pub span: Span,
    pub constant: bool,
}

/// Markers found on one declaration.
#[derive(Debug, Clone, Default)]
pub struct Markers {
    pub storage_name: Option<Span>,
    pub ignored: Option<IgnoredMarker>,
    pub model_coding_key: Option<Span>,
    pub migration: Option<Span>,
}

impl Markers {
    /// Removes marker attributes from `attrs` and returns them.
    pub fn extract(attrs: &mut Vec<Attribute>, diagnostics: &mut Diagnostics) -> Self {
        let mut markers = Markers::default();
        attrs.retain(|attr| {
            let path = attr.path();
            if path.is_ident(STORAGE_NAME) {
                require_path_only(attr, STORAGE_NAME, diagnostics);
                markers.storage_name = Some(attr.span());
            } else if path.is_ident(PERSISTED_IGNORED) {
                markers.ignored = Some(parse_ignored(attr, diagnostics));
            } else if path.is_ident(MODEL_CODING_KEY) {
                require_path_only(attr, MODEL_CODING_KEY, diagnostics);
                markers.model_coding_key = Some(attr.span());
            } else if path.is_ident(MIGRATION) {
                require_path_only(attr, MIGRATION, diagnostics);
                markers.migration = Some(attr.span());
            } else {
                return true;
            }
            false
        });
        markers
    }

    pub fn is_empty(&self) -> bool {
        self.storage_name.is_none()
            && self.ignored.is_none()
            && self.model_coding_key.is_none()
            && self.migration.is_none()
    }
}

fn require_path_only(attr: &Attribute, marker: &str, diagnostics: &mut Diagnostics) {
    if attr.meta.require_path_only().is_err() {
        diagnostics.error(
            ConfigurationError::InvalidMarker {
                marker: marker.to_string(),
                detail: "takes no arguments".to_string(),
            },
            attr.span(),
        );
    }
}

fn parse_ignored(attr: &Attribute, diagnostics: &mut Diagnostics) -> IgnoredMarker {
    let mut constant = false;
    if let syn::Meta::List(_) = &attr.meta {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("constant") {
                constant = true;
                Ok(())
            } else {
                Err(meta.error("expected `constant`"))
            }
        });
        if let Err(e) = parsed {
            diagnostics.error(
                ConfigurationError::InvalidMarker {
                    marker: PERSISTED_IGNORED.to_string(),
                    detail: e.to_string(),
                },
                attr.span(),
            );
        }
    } else if let syn::Meta::NameValue(_) = &attr.meta {
        diagnostics.error(
            ConfigurationError::InvalidMarker {
                marker: PERSISTED_IGNORED.to_string(),
                detail: "expected `#[persisted_ignored]` or `#[persisted_ignored(constant)]`"
                    .to_string(),
            },
            attr.span(),
        );
    }
    IgnoredMarker {
        span: attr.span(),
        constant,
    }
}

/// Paths listed in every `#[derive(...)]` attribute.
pub fn derive_paths(attrs: &[Attribute]) -> Vec<Path> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .collect()
}

/// Whether the derive list names `CodingKey` (bare or by path).
pub fn derives_coding_key(attrs: &[Attribute]) -> bool {
    derive_paths(attrs).iter().any(|path| {
        path.segments
            .last()
            .is_some_and(|segment| segment.ident == "CodingKey")
    })
}

/// The derive list as written, used for fix-it text.
pub fn render_derive_list(attrs: &[Attribute]) -> Option<String> {
    let paths = derive_paths(attrs);
    if attrs.iter().all(|attr| !attr.path().is_ident("derive")) {
        return None;
    }
    Some(format!("#[derive({})]", join_paths(&paths)))
}

pub fn join_paths(paths: &[Path]) -> String {
    paths
        .iter()
        .map(|path| path.to_token_stream().to_string().replace(' ', ""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits `#[derive(...)]` attributes from the rest.
pub fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<Attribute>) {
    attrs
        .iter()
        .cloned()
        .partition(|attr| attr.path().is_ident("derive"))
}

pub fn doc_attrs(attrs: &[Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .cloned()
        .collect()
}

/// Integer type named by `#[repr(..)]`, if any. A `repr` that does not
/// parse is reported and treated as absent.
pub fn integer_repr(attrs: &[Attribute], diagnostics: &mut Diagnostics) -> Option<Ident> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("repr")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                if INTEGER_REPRS.iter().any(|repr| ident == repr) {
                    found = Some(ident.clone());
                }
            }
            // `align(N)`, `packed(N)`
            if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                content.parse::<proc_macro2::TokenStream>()?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            diagnostics.error(
                ConfigurationError::InvalidKeyAttribute {
                    detail: format!("malformed `#[repr(...)]`: {}", e),
                },
                attr.span(),
            );
            return None;
        }
    }
    found
}
