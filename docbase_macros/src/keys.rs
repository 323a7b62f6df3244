//! Key Deriver
//!
//! Produces the key set the serializer writes with. Without a
//! `#[model_coding_key]` enum, one `_field` case per persisted field is
//! synthesized, keyed by the field name, in declaration order. A supplied
//! enum (and likewise a `#[migration]` enum) is checked against the
//! persisted fields: every field needs a case, every case needs a field, and
//! no two cases may share a literal.

use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use syn::Ident;

use crate::errors::{ConfigurationError, Diagnostic, Diagnostics, FixIt};
use crate::parse::key_enum::{KeyEnumDecl, LiteralValue, RawType, surface};
use crate::parse::metadata::FieldDescriptor;
use crate::utils::naming::{field_label, key_case_name, persisted_keys_enum_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Synthesized `<Model>PersistedKeys`.
    Implicit,
    /// A user enum carrying `#[model_coding_key]` or `#[migration]`.
    Declared,
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub field: Ident,
    pub case: Ident,
    pub literal: LiteralValue,
}

#[derive(Debug, Clone)]
pub struct KeySet {
    pub enum_ident: Ident,
    pub source: KeySource,
    pub raw: RawType,
    /// One binding per persisted field, in declaration order.
    pub bindings: Vec<KeyBinding>,
}

impl KeySet {
    pub fn surface(&self) -> BTreeSet<String> {
        surface(&self.raw)
    }

    pub fn binding(&self, field: &Ident) -> Option<&KeyBinding> {
        self.bindings.iter().find(|binding| binding.field == *field)
    }
}

/// The key set used when the model declares no coding key enum.
pub fn implicit_keys(model: &Ident, persisted: &[&FieldDescriptor]) -> KeySet {
    KeySet {
        enum_ident: persisted_keys_enum_name(model),
        source: KeySource::Implicit,
        raw: RawType::String,
        bindings: persisted
            .iter()
            .map(|field| KeyBinding {
                field: field.name.clone(),
                case: key_case_name(&field.name),
                literal: LiteralValue::Str(field_label(&field.name)),
            })
            .collect(),
    }
}

/// Checks a declared key enum against the persisted fields and binds it.
pub fn bind_key_enum(
    decl: &KeyEnumDecl,
    persisted: &[&FieldDescriptor],
    diagnostics: &mut Diagnostics,
) -> KeySet {
    let enum_name = decl.ident.to_string();

    for (case, literal) in decl.duplicate_literals() {
        diagnostics.error(
            ConfigurationError::DuplicateKeyLiteral {
                enum_name: enum_name.clone(),
                literal: literal.to_string(),
            },
            case.span,
        );
    }

    for case in &decl.cases {
        let claimed_by: Vec<String> = persisted
            .iter()
            .map(|field| field_label(&field.name))
            .filter(|label| case.matches_field(label))
            .collect();
        match claimed_by.as_slice() {
            [] => diagnostics.error(
                ConfigurationError::UnknownKeyCase {
                    enum_name: enum_name.clone(),
                    case: case.variant.to_string(),
                    field: case.expected_field(),
                },
                case.span,
            ),
            [_] => {}
            many => diagnostics.error(
                ConfigurationError::AmbiguousKeyCase {
                    enum_name: enum_name.clone(),
                    case: case.variant.to_string(),
                    fields: many
                        .iter()
                        .map(|field| format!("`{}`", field))
                        .collect::<Vec<_>>()
                        .join(", "),
                },
                case.span,
            ),
        }
    }

    let mut bindings = Vec::new();
    let mut missing = Vec::new();
    for field in persisted {
        match decl.case_for_field(&field_label(&field.name)) {
            Some(case) => bindings.push(KeyBinding {
                field: field.name.clone(),
                case: case.variant.clone(),
                literal: case.literal.clone(),
            }),
            None => missing.push(field_label(&field.name)),
        }
    }

    if !missing.is_empty() {
        let cases = missing
            .iter()
            .map(|field| field.to_upper_camel_case())
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.push(
            Diagnostic::new(
                ConfigurationError::IncompleteCodingKeys {
                    enum_name,
                    missing: missing
                        .iter()
                        .map(|field| format!("`{}`", field))
                        .collect::<Vec<_>>()
                        .join(", "),
                },
                decl.ident.span(),
            )
            .with_fix(FixIt::new("", cases)),
        );
    }

    KeySet {
        enum_ident: decl.ident.clone(),
        source: KeySource::Declared,
        raw: decl.raw.clone(),
        bindings,
    }
}
