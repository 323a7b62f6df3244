//! The model compilation pipeline
//!
//! ```text
//! parse_model → classify → derive keys → migration state → generate
//! ```
//!
//! Every stage reports into one [`Diagnostics`]; a model with any error
//! produces only the combined `compile_error!` output.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Expr, ExprLit, Ident, Item, Lit, Type, Visibility};

use crate::classify::{Role, classify};
use crate::errors::{ConfigurationError, Diagnostic, Diagnostics, FixIt};
use crate::generators::ModelGenerator;
use crate::keys::{KeyBinding, KeySet, bind_key_enum, implicit_keys};
use crate::parse::attributes::{MIGRATION, MODEL_CODING_KEY, STORAGE_NAME};
use crate::parse::key_enum::format_surface;
use crate::parse::metadata::{FieldDescriptor, ModelDescriptor};
use crate::parse::module::{ModelSource, parse_model};
use crate::utils::naming::{field_label, setter_name};

/// Members every model gets; no field accessor may shadow them.
const SYNTHESIZED_MEMBERS: &[&str] = &[
    "new",
    "open",
    "load",
    "decode_from",
    "encode_to",
    "save",
    "reload",
    "is_persisted",
    "context",
    "model_context",
    "migrate",
    "should_migrate",
];

#[derive(Debug, Clone)]
pub struct PersistedField {
    pub name: Ident,
    pub label: String,
    pub ty: Type,
    pub vis: Visibility,
    pub attrs: Vec<Attribute>,
    pub key: KeyBinding,
}

#[derive(Debug, Clone)]
pub struct IgnoredField {
    pub name: Ident,
    pub label: String,
    pub ty: Type,
    pub vis: Visibility,
    pub attrs: Vec<Attribute>,
    /// Constructor-only; never defaulted and never reassigned.
    pub constant: bool,
}

#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Keys the stored record is decoded with.
    pub old_keys: KeySet,
}

#[derive(Debug, Clone)]
pub enum MigrationState {
    NotConfigured,
    Configured(MigrationPlan),
}

/// Everything the generators need to emit one model.
#[derive(Debug, Clone)]
pub struct ModelPlan {
    pub name: Ident,
    pub vis: Visibility,
    pub attrs: Vec<Attribute>,
    pub derives: Vec<Attribute>,
    pub storage_name: String,
    pub persisted: Vec<PersistedField>,
    pub ignored: Vec<IgnoredField>,
    pub keys: KeySet,
    pub migration: MigrationState,
}

/// Entry point behind `#[persisted_model]`.
pub fn compile(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let name: Option<Ident> = if attr.is_empty() {
        None
    } else {
        Some(syn::parse2(attr)?)
    };
    let item: Item = syn::parse2(item)?;

    let mut diagnostics = Diagnostics::new();
    let parsed = parse_model(name.as_ref(), item, &mut diagnostics);
    let plan = parsed
        .as_ref()
        .and_then(|parsed| build_plan(&parsed.descriptor, &mut diagnostics));
    diagnostics.finish()?;

    let (Some(parsed), Some(plan)) = (parsed, plan) else {
        return Err(syn::Error::new(
            Span::call_site(),
            ConfigurationError::MissingModel.to_string(),
        ));
    };

    let generated = ModelGenerator::new(&plan).generate();
    Ok(match parsed.source {
        ModelSource::Struct => generated,
        ModelSource::Module {
            mut module,
            model_index,
        } => {
            if let Some((_, items)) = module.content.as_mut() {
                items[model_index] = Item::Verbatim(generated);
            }
            quote!(#module)
        }
    })
}

/// Classifies, derives keys and settles the migration state. Returns `None`
/// when anything was reported.
pub fn build_plan(descriptor: &ModelDescriptor, diagnostics: &mut Diagnostics) -> Option<ModelPlan> {
    if !descriptor.is_final {
        diagnostics.error(
            ConfigurationError::NotFinal {
                name: descriptor.name.to_string(),
                kind: descriptor.kind.to_string(),
            },
            descriptor.span,
        );
        return None;
    }

    let classified = classify(descriptor, diagnostics);
    let with_role = |role: Role| -> Vec<&FieldDescriptor> {
        classified
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.field)
            .collect()
    };
    let storage = with_role(Role::StorageName);
    let custom = with_role(Role::ModelCodingKeyDecl);
    let migration = with_role(Role::MigrationKeyDecl);
    let persisted = with_role(Role::Persisted);
    let ignored = with_role(Role::Ignored);

    for (marker, declarations) in [
        (STORAGE_NAME, &storage),
        (MODEL_CODING_KEY, &custom),
        (MIGRATION, &migration),
    ] {
        for duplicate in declarations.iter().skip(1) {
            diagnostics.error(
                ConfigurationError::DuplicateDeclaration {
                    marker: marker.to_string(),
                },
                duplicate.span,
            );
        }
    }

    let storage_name = match storage.first() {
        Some(field) => match field.initializer.as_ref().and_then(string_literal) {
            Some(name) => name,
            None => {
                diagnostics.error(ConfigurationError::StorageNameNotLiteral, field.span);
                descriptor.name.to_string()
            }
        },
        None => descriptor.name.to_string(),
    };

    check_reserved_names(&persisted, &ignored, diagnostics);

    let keys = match custom.first() {
        Some(field) => match field.key_enum.as_ref() {
            Some(decl) => {
                check_key_visibility(descriptor, field, diagnostics);
                bind_key_enum(decl, &persisted, diagnostics)
            }
            None => implicit_keys(&descriptor.name, &persisted),
        },
        None => implicit_keys(&descriptor.name, &persisted),
    };

    let migration = match migration.first() {
        None => MigrationState::NotConfigured,
        Some(field) => match field.key_enum.as_ref() {
            None => MigrationState::NotConfigured,
            Some(decl) => {
                let old_keys = bind_key_enum(decl, &persisted, diagnostics);
                if old_keys.surface() == keys.surface() {
                    MigrationState::Configured(MigrationPlan { old_keys })
                } else {
                    diagnostics.error(
                        ConfigurationError::MigrationKeySurfaceMismatch {
                            old: old_keys.enum_ident.to_string(),
                            old_surface: format_surface(&old_keys.surface()),
                            new: keys.enum_ident.to_string(),
                            new_surface: format_surface(&keys.surface()),
                        },
                        field.span,
                    );
                    MigrationState::NotConfigured
                }
            }
        },
    };

    if !diagnostics.is_empty() {
        return None;
    }

    let persisted = persisted
        .iter()
        .filter_map(|field| {
            Some(PersistedField {
                name: field.name.clone(),
                label: field_label(&field.name),
                ty: field.ty.clone()?,
                vis: field.vis.clone(),
                attrs: field.attrs.clone(),
                key: keys.binding(&field.name)?.clone(),
            })
        })
        .collect();
    let ignored = ignored
        .iter()
        .filter_map(|field| {
            Some(IgnoredField {
                name: field.name.clone(),
                label: field_label(&field.name),
                ty: field.ty.clone()?,
                vis: field.vis.clone(),
                attrs: field.attrs.clone(),
                constant: field.is_ignored_constant(),
            })
        })
        .collect();

    Some(ModelPlan {
        name: descriptor.name.clone(),
        vis: descriptor.vis.clone(),
        attrs: descriptor.attrs.clone(),
        derives: descriptor.derives.clone(),
        storage_name,
        persisted,
        ignored,
        keys,
        migration,
    })
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Some(s.value()),
        Expr::Group(group) => string_literal(&group.expr),
        Expr::Paren(paren) => string_literal(&paren.expr),
        _ => None,
    }
}

/// Orders visibilities by reach. `pub(in path)` and `pub(super)` share a
/// rank; both are narrower than `pub(crate)`.
fn visibility_rank(vis: &Visibility) -> u8 {
    match vis {
        Visibility::Public(_) => 3,
        Visibility::Restricted(restricted) if restricted.path.is_ident("crate") => 2,
        Visibility::Restricted(restricted) if restricted.path.is_ident("self") => 0,
        Visibility::Restricted(_) => 1,
        Visibility::Inherited => 0,
    }
}

fn render_visibility(vis: &Visibility) -> String {
    quote!(#vis)
        .to_string()
        .replace("pub (", "pub(")
        .replace(" :: ", "::")
        .replace(" )", ")")
}

/// The model's persisted slots name the coding key enum in a public trait
/// impl, so the enum must be at least as visible as the model.
fn check_key_visibility(
    descriptor: &ModelDescriptor,
    key_enum: &FieldDescriptor,
    diagnostics: &mut Diagnostics,
) {
    if visibility_rank(&key_enum.vis) >= visibility_rank(&descriptor.vis) {
        return;
    }
    let model_vis = render_visibility(&descriptor.vis);
    diagnostics.push(
        Diagnostic::new(
            ConfigurationError::KeyEnumLessVisible {
                enum_name: key_enum.name.to_string(),
                model: descriptor.name.to_string(),
                visibility: model_vis.clone(),
            },
            key_enum.span,
        )
        .with_fix(FixIt::new(render_visibility(&key_enum.vis), model_vis)),
    );
}

fn check_reserved_names(
    persisted: &[&FieldDescriptor],
    ignored: &[&FieldDescriptor],
    diagnostics: &mut Diagnostics,
) {
    let setters: Vec<(String, String)> = persisted
        .iter()
        .chain(ignored.iter().filter(|field| !field.is_ignored_constant()))
        .map(|field| (setter_name(&field.name).to_string(), field_label(&field.name)))
        .collect();

    for field in persisted.iter().chain(ignored.iter()) {
        let label = field_label(&field.name);
        let member = if label.starts_with("__") || SYNTHESIZED_MEMBERS.contains(&label.as_str()) {
            Some(label.clone())
        } else {
            setters
                .iter()
                .find(|(setter, _)| *setter == label)
                .map(|(setter, owner)| format!("{} (setter of `{}`)", setter, owner))
        };
        if let Some(member) = member {
            diagnostics.error(
                ConfigurationError::ReservedFieldName { name: label, member },
                field.span,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn plan(item: Item) -> Result<ModelPlan, Vec<ConfigurationError>> {
        plan_for(None, item)
    }

    fn plan_named(name: &str, item: Item) -> Result<ModelPlan, Vec<ConfigurationError>> {
        plan_for(Some(&Ident::new(name, Span::call_site())), item)
    }

    fn plan_for(name: Option<&Ident>, item: Item) -> Result<ModelPlan, Vec<ConfigurationError>> {
        let mut diagnostics = Diagnostics::new();
        let parsed = parse_model(name, item, &mut diagnostics);
        let plan = parsed.and_then(|parsed| build_plan(&parsed.descriptor, &mut diagnostics));
        match plan {
            Some(plan) if diagnostics.is_empty() => Ok(plan),
            _ => Err(diagnostics.errors()),
        }
    }

    #[test]
    fn test_plan_without_markers() {
        let plan = plan(parse_quote! {
            pub struct M {
                pub a: i64,
                pub b: String,
            }
        })
        .unwrap();

        assert_eq!(plan.storage_name, "M");
        assert_eq!(plan.keys.enum_ident, "MPersistedKeys");
        let keys: Vec<String> = plan.persisted.iter().map(|f| f.key.case.to_string()).collect();
        assert_eq!(keys, vec!["_a", "_b"]);
        assert!(matches!(plan.migration, MigrationState::NotConfigured));
    }

    #[test]
    fn test_plan_with_storage_name_and_migration() {
        let plan = plan(parse_quote! {
            mod m {
                pub struct M {
                    pub a: i64,
                    pub b: String,
                    #[persisted_ignored(constant)]
                    pub session: u32,
                }

                #[storage_name]
                const STORAGE: &str = "Default";

                #[migration]
                #[derive(Clone, Copy, CodingKey)]
                enum Old { #[key = "N"] A, #[key = "S"] B }
            }
        })
        .unwrap();

        assert_eq!(plan.storage_name, "Default");
        assert!(plan.ignored[0].constant);
        let MigrationState::Configured(migration) = &plan.migration else {
            panic!("migration should be configured");
        };
        assert_eq!(migration.old_keys.enum_ident, "Old");
        assert_eq!(migration.old_keys.bindings[1].literal.to_string(), "\"S\"");
    }

    #[test]
    fn test_surface_mismatch_blocks_migration() {
        let errors = plan(parse_quote! {
            mod m {
                pub struct M { pub a: i64 }

                #[migration]
                #[derive(Clone, Copy, CodingKey)]
                #[repr(u8)]
                enum Old { A = 1 }
            }
        })
        .unwrap_err();

        assert_eq!(
            errors,
            vec![ConfigurationError::MigrationKeySurfaceMismatch {
                old: "Old".into(),
                old_surface: "CodingKey, u8".into(),
                new: "MPersistedKeys".into(),
                new_surface: "CodingKey, String".into(),
            }]
        );
    }

    #[test]
    fn test_matching_integer_surfaces_migrate() {
        let plan = plan(parse_quote! {
            mod m {
                pub struct M { pub a: i64 }

                #[model_coding_key]
                #[derive(Clone, Copy, CodingKey)]
                #[repr(u8)]
                pub enum Keys { A = 2 }

                #[migration]
                #[derive(Clone, Copy, CodingKey)]
                #[repr(u8)]
                enum Old { A = 1 }
            }
        })
        .unwrap();
        assert!(matches!(plan.migration, MigrationState::Configured(_)));
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let errors = plan(parse_quote! {
            mod m {
                pub struct M { pub save: i64, pub b: String }

                #[storage_name]
                const FIRST: &str = "A";

                #[storage_name]
                const SECOND: &str = concat!("B", "C");

                #[model_coding_key]
                #[derive(Clone, Copy, CodingKey)]
                pub enum Keys { Save }
            }
        })
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                ConfigurationError::DuplicateDeclaration {
                    marker: "storage_name".into(),
                },
                ConfigurationError::ReservedFieldName {
                    name: "save".into(),
                    member: "save".into(),
                },
                ConfigurationError::IncompleteCodingKeys {
                    enum_name: "Keys".into(),
                    missing: "`b`".into(),
                },
            ]
        );
    }

    #[test]
    fn test_storage_name_must_be_literal() {
        let errors = plan(parse_quote! {
            mod m {
                pub struct M { pub a: i64 }
                #[storage_name]
                const STORAGE: &str = NAME;
            }
        })
        .unwrap_err();
        assert_eq!(errors, vec![ConfigurationError::StorageNameNotLiteral]);
    }

    #[test]
    fn test_setter_collision() {
        let errors = plan(parse_quote! {
            pub struct M { pub a: i64, pub set_a: i64 }
        })
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigurationError::ReservedFieldName {
                name: "set_a".into(),
                member: "set_a (setter of `a`)".into(),
            }]
        );
    }

    #[test]
    fn test_compile_reports_compile_errors() {
        let error = compile(quote!(), quote! { enum Settings { A } }).unwrap_err();
        assert!(error.to_string().contains("requires a closed struct type"));
    }

    #[test]
    fn test_named_non_struct_is_not_final() {
        let errors = plan_named(
            "Settings",
            parse_quote! {
                mod m { pub trait Settings {} }
            },
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigurationError::NotFinal {
                name: "Settings".into(),
                kind: "a trait".into(),
            }]
        );
    }

    #[test]
    fn test_private_coding_keys_on_public_model() {
        let mut diagnostics = Diagnostics::new();
        let parsed = parse_model(
            None,
            parse_quote! {
                pub mod m {
                    pub struct M { pub a: i64 }

                    #[model_coding_key]
                    #[derive(Clone, Copy, CodingKey)]
                    enum Keys { A }
                }
            },
            &mut diagnostics,
        )
        .unwrap();
        assert!(build_plan(&parsed.descriptor, &mut diagnostics).is_none());

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(
            diagnostic.error,
            ConfigurationError::KeyEnumLessVisible {
                enum_name: "Keys".into(),
                model: "M".into(),
                visibility: "pub".into(),
            }
        );
        assert_eq!(diagnostic.fix, Some(FixIt::new("", "pub")));
    }

    #[test]
    fn test_key_visibility_ranks() {
        let keys_for = |model_vis: &str, enum_vis: &str| {
            let item: Item = syn::parse_str(&format!(
                "mod m {{ {model_vis} struct M {{ a: i64 }} #[model_coding_key] #[derive(Clone, Copy, CodingKey)] {enum_vis} enum Keys {{ A }} }}"
            ))
            .unwrap();
            plan(item).map(|_| ())
        };
        assert!(keys_for("pub(crate)", "pub").is_ok());
        assert!(keys_for("pub(crate)", "pub(crate)").is_ok());
        assert!(keys_for("", "").is_ok());
        assert!(keys_for("pub(super)", "pub(crate)").is_ok());
        assert!(keys_for("pub", "pub(crate)").is_err());
        assert!(keys_for("pub(crate)", "pub(super)").is_err());
    }
}
