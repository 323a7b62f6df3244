//! Field Classifier
//!
//! Assigns exactly one [`Role`] to every declaration of a model, first match
//! wins:
//!
//! 1. `#[storage_name]` on a static constant  → `StorageName`
//! 2. `#[persisted_ignored]` on a struct field → `Ignored`
//! 3. `#[model_coding_key]` on a key enum      → `ModelCodingKeyDecl`
//! 4. `#[migration]` on a key enum             → `MigrationKeyDecl`
//! 5. any other struct field                   → `Persisted`

use strum::{AsRefStr, Display, EnumIter};

use crate::errors::{ConfigurationError, Diagnostic, Diagnostics, FixIt};
use crate::parse::attributes::{MIGRATION, MODEL_CODING_KEY};
use crate::parse::metadata::{DeclKind, FieldDescriptor, ModelDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum Role {
    StorageName,
    Ignored,
    ModelCodingKeyDecl,
    MigrationKeyDecl,
    Persisted,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifiedField<'a> {
    pub field: &'a FieldDescriptor,
    pub role: Role,
}

/// Classifies every declaration of `model`. Declarations that fail
/// classification are reported and left out.
pub fn classify<'a>(model: &'a ModelDescriptor, diagnostics: &mut Diagnostics) -> Vec<ClassifiedField<'a>> {
    model
        .fields
        .iter()
        .filter_map(|field| match classify_field(field) {
            Ok(role) => Some(ClassifiedField { field, role }),
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                None
            }
        })
        .collect()
}

pub fn classify_field(field: &FieldDescriptor) -> Result<Role, Diagnostic> {
    let name = field.name.to_string();

    if field.markers.storage_name.is_some() {
        if field.is_static && field.is_constant && field.has_default_initializer {
            return Ok(Role::StorageName);
        }
        let (reason, fix) = match field.kind {
            DeclKind::Static if !field.is_constant => (
                "declared `static mut`".to_string(),
                Some(FixIt::new("static mut", "static")),
            ),
            DeclKind::Field => ("an instance field".to_string(), None),
            kind if !field.has_default_initializer => (format!("{} without an initializer", kind), None),
            kind => (kind.to_string(), None),
        };
        let diagnostic = Diagnostic::new(
            ConfigurationError::InvalidStorageNameField { name, reason },
            field.span,
        );
        return Err(match fix {
            Some(fix) => diagnostic.with_fix(fix),
            None => diagnostic,
        });
    }

    if let Some(marker) = field.markers.ignored {
        return match field.kind {
            DeclKind::Field => Ok(Role::Ignored),
            kind => Err(Diagnostic::new(
                ConfigurationError::NotAField {
                    name,
                    kind: kind.to_string(),
                },
                marker.span,
            )),
        };
    }

    if field.markers.model_coding_key.is_some() {
        return key_enum_role(field, MODEL_CODING_KEY, Role::ModelCodingKeyDecl);
    }

    if field.markers.migration.is_some() {
        return key_enum_role(field, MIGRATION, Role::MigrationKeyDecl);
    }

    match field.kind {
        DeclKind::Field => Ok(Role::Persisted),
        kind => Err(Diagnostic::new(
            ConfigurationError::NotAField {
                name,
                kind: kind.to_string(),
            },
            field.span,
        )),
    }
}

fn key_enum_role(field: &FieldDescriptor, marker: &str, role: Role) -> Result<Role, Diagnostic> {
    let not_a_key_enum = |reason: String| ConfigurationError::NotAKeyEnum {
        marker: marker.to_string(),
        name: field.name.to_string(),
        reason,
    };

    if field.kind != DeclKind::Enum {
        return Err(Diagnostic::new(
            not_a_key_enum(format!("is {}", field.kind)),
            field.span,
        ));
    }

    if !field.key_enum.as_ref().is_some_and(|decl| decl.conforms) {
        let fix = match &field.derive_list {
            Some(list) => FixIt::new(list.clone(), add_coding_key(list)),
            None => FixIt::new("", "#[derive(Clone, Copy, CodingKey)]"),
        };
        return Err(Diagnostic::new(
            not_a_key_enum("does not derive `CodingKey`".to_string()),
            field.span,
        )
        .with_fix(fix));
    }

    Ok(role)
}

fn add_coding_key(derive_list: &str) -> String {
    match derive_list.strip_suffix(")]") {
        Some(head) if head.ends_with('(') => format!("{}CodingKey)]", head),
        Some(head) => format!("{}, CodingKey)]", head),
        None => derive_list.to_string(),
    }
}
