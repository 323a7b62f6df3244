//! Key enum parsing, shared by `#[derive(CodingKey)]` and the model compiler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Attribute, Expr, ExprLit, ExprUnary, Fields, Ident, Lit, UnOp, Variant, ext::IdentExt,
    punctuated::Punctuated, spanned::Spanned, token::Comma,
};

use crate::errors::{ConfigurationError, Diagnostics};
use crate::parse::attributes::{derives_coding_key, integer_repr};

/// Raw value type of a key enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    String,
    Int(String),
}

impl RawType {
    pub fn surface_name(&self) -> String {
        match self {
            RawType::String => "String".to_string(),
            RawType::Int(repr) => repr.clone(),
        }
    }

    pub fn kind_tokens(&self) -> TokenStream {
        match self {
            RawType::String => quote!(::docbase_store::traits::RawKind::String),
            RawType::Int(_) => quote!(::docbase_store::traits::RawKind::Integer),
        }
    }
}

/// Conformance surface of a key enum: the capability plus its raw type.
pub fn surface(raw: &RawType) -> BTreeSet<String> {
    ["CodingKey".to_string(), raw.surface_name()]
        .into_iter()
        .collect()
}

pub fn format_surface(surface: &BTreeSet<String>) -> String {
    surface.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => write!(f, "{:?}", s),
            LiteralValue::Int(i) => write!(f, "{}", i),
        }
    }
}

impl LiteralValue {
    pub fn to_key_literal(&self) -> TokenStream {
        match self {
            LiteralValue::Str(s) => quote! {
                ::docbase_store::traits::KeyLiteral::Str(::std::string::String::from(#s))
            },
            LiteralValue::Int(i) => quote! {
                ::docbase_store::traits::KeyLiteral::Int(#i)
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyCase {
    pub variant: Ident,
    pub literal: LiteralValue,
    pub span: Span,
}

impl KeyCase {
    /// Whether this case stands for the persisted field labelled `field`.
    ///
    /// The field name is camel-cased rather than the case snake-cased, so
    /// `value_2` pairs with `Value2`.
    pub fn matches_field(&self, field: &str) -> bool {
        self.variant.unraw() == field.to_upper_camel_case()
    }

    /// Field name suggested when no persisted field matches.
    pub fn expected_field(&self) -> String {
        self.variant.unraw().to_string().to_snake_case()
    }
}

#[derive(Debug, Clone)]
pub struct KeyEnumDecl {
    pub ident: Ident,
    pub conforms: bool,
    pub raw: RawType,
    pub cases: Vec<KeyCase>,
}

impl KeyEnumDecl {
    pub fn from_item(item: &syn::ItemEnum, diagnostics: &mut Diagnostics) -> Self {
        Self::from_parts(&item.ident, &item.attrs, &item.variants, diagnostics)
    }

    pub fn from_parts(
        ident: &Ident,
        attrs: &[Attribute],
        variants: &Punctuated<Variant, Comma>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let raw = match integer_repr(attrs, diagnostics) {
            Some(repr) => RawType::Int(repr.to_string()),
            None => RawType::String,
        };

        let mut cases = Vec::new();
        let mut next_int: i64 = 0;
        for variant in variants {
            if !matches!(variant.fields, Fields::Unit) {
                diagnostics.error(
                    ConfigurationError::InvalidKeyAttribute {
                        detail: format!("case `{}` must be a unit variant", variant.ident),
                    },
                    variant.span(),
                );
                continue;
            }

            let literal = match &raw {
                RawType::String => string_literal(variant, diagnostics),
                RawType::Int(_) => match integer_literal(variant, next_int, diagnostics) {
                    Some(value) => value,
                    None => continue,
                },
            };
            if let LiteralValue::Int(value) = literal {
                next_int = value.wrapping_add(1);
            }

            cases.push(KeyCase {
                variant: variant.ident.clone(),
                literal,
                span: variant.ident.span(),
            });
        }

        Self {
            ident: ident.clone(),
            conforms: derives_coding_key(attrs),
            raw,
            cases,
        }
    }

    pub fn case_for_field(&self, field: &str) -> Option<&KeyCase> {
        self.cases.iter().find(|case| case.matches_field(field))
    }

    /// Literals used by more than one case, each reported once.
    pub fn duplicate_literals(&self) -> Vec<(&KeyCase, &LiteralValue)> {
        let mut seen: BTreeMap<&LiteralValue, usize> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for case in &self.cases {
            let count = seen.entry(&case.literal).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push((case, &case.literal));
            }
        }
        duplicates
    }
}

fn key_attribute(variant: &Variant) -> Option<&Attribute> {
    variant.attrs.iter().find(|attr| attr.path().is_ident("key"))
}

fn string_literal(variant: &Variant, diagnostics: &mut Diagnostics) -> LiteralValue {
    let default = LiteralValue::Str(variant.ident.unraw().to_string().to_snake_case());
    let Some(attr) = key_attribute(variant) else {
        return default;
    };
    match &attr.meta {
        syn::Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => LiteralValue::Str(s.value()),
            other => {
                diagnostics.error(
                    ConfigurationError::InvalidKeyAttribute {
                        detail: format!(
                            "`#[key = ...]` on `{}` must be a string literal",
                            variant.ident
                        ),
                    },
                    other.span(),
                );
                default
            }
        },
        _ => {
            diagnostics.error(
                ConfigurationError::InvalidKeyAttribute {
                    detail: format!("expected `#[key = \"...\"]` on `{}`", variant.ident),
                },
                attr.span(),
            );
            default
        }
    }
}

fn integer_literal(
    variant: &Variant,
    next: i64,
    diagnostics: &mut Diagnostics,
) -> Option<LiteralValue> {
    if let Some(attr) = key_attribute(variant) {
        diagnostics.error(
            ConfigurationError::InvalidKeyAttribute {
                detail: format!(
                    "integer-backed key `{}` takes its value from the discriminant, not `#[key]`",
                    variant.ident
                ),
            },
            attr.span(),
        );
        return None;
    }
    let Some((_, expr)) = &variant.discriminant else {
        return Some(LiteralValue::Int(next));
    };
    match parse_int(expr) {
        Some(value) => Some(LiteralValue::Int(value)),
        None => {
            diagnostics.error(
                ConfigurationError::InvalidKeyAttribute {
                    detail: format!(
                        "discriminant of `{}` must be an integer literal",
                        variant.ident
                    ),
                },
                expr.span(),
            );
            None
        }
    }
}

fn parse_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i64>().ok(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_int(expr).map(|value| -value),
        Expr::Group(group) => parse_int(&group.expr),
        Expr::Paren(paren) => parse_int(&paren.expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse(item: syn::ItemEnum) -> (KeyEnumDecl, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let decl = KeyEnumDecl::from_item(&item, &mut diagnostics);
        (decl, diagnostics)
    }

    #[test]
    fn test_string_literals() {
        let (decl, diagnostics) = parse(parse_quote! {
            #[derive(Clone, Copy, CodingKey)]
            enum Keys {
                Number,
                #[key = "txt"]
                Text,
                CreatedAt,
            }
        });
        assert!(diagnostics.is_empty());
        assert!(decl.conforms);
        assert_eq!(decl.raw, RawType::String);

        let literals: Vec<_> = decl.cases.iter().map(|c| c.literal.clone()).collect();
        assert_eq!(
            literals,
            vec![
                LiteralValue::Str("number".into()),
                LiteralValue::Str("txt".into()),
                LiteralValue::Str("created_at".into()),
            ]
        );
        assert_eq!(decl.case_for_field("created_at").unwrap().variant, "CreatedAt");
    }

    #[test]
    fn test_cases_match_fields_with_digits() {
        let (decl, _) = parse(parse_quote! {
            #[derive(Clone, Copy, CodingKey)]
            enum Keys { Value2, Type }
        });
        assert_eq!(decl.case_for_field("value_2").unwrap().variant, "Value2");
        assert_eq!(decl.case_for_field("type").unwrap().variant, "Type");
        assert_eq!(decl.cases[0].expected_field(), "value2");
    }

    #[test]
    fn test_malformed_repr_is_reported() {
        let (decl, diagnostics) = parse(parse_quote! {
            #[derive(Clone, Copy, CodingKey)]
            #[repr(u8 = 3)]
            enum Keys { A }
        });
        assert_eq!(decl.raw, RawType::String);
        assert!(matches!(
            diagnostics.errors()[0],
            ConfigurationError::InvalidKeyAttribute { .. }
        ));
    }

    #[test]
    fn test_integer_literals_follow_discriminants() {
        let (decl, diagnostics) = parse(parse_quote! {
            #[derive(Clone, Copy, CodingKey)]
            #[repr(i32)]
            enum Keys { A, B = 10, C, D = -2 }
        });
        assert!(diagnostics.is_empty());
        assert_eq!(decl.raw, RawType::Int("i32".into()));
        let literals: Vec<_> = decl.cases.iter().map(|c| c.literal.clone()).collect();
        assert_eq!(
            literals,
            vec![
                LiteralValue::Int(0),
                LiteralValue::Int(10),
                LiteralValue::Int(11),
                LiteralValue::Int(-2),
            ]
        );
        assert_eq!(
            surface(&decl.raw),
            ["CodingKey".to_string(), "i32".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_invalid_cases() {
        let (decl, diagnostics) = parse(parse_quote! {
            #[derive(CodingKey)]
            enum Keys {
                #[key = 3]
                A,
                B(u8),
            }
        });
        assert_eq!(diagnostics.errors().len(), 2);
        assert_eq!(decl.cases.len(), 1);
    }

    #[test]
    fn test_duplicate_literals() {
        let (decl, _) = parse(parse_quote! {
            #[derive(CodingKey)]
            enum Keys {
                #[key = "x"]
                A,
                #[key = "x"]
                B,
                #[key = "x"]
                C,
            }
        });
        let duplicates = decl.duplicate_literals();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].1, &LiteralValue::Str("x".into()));
    }
}
