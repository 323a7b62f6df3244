//! Turns the item `#[persisted_model]` is attached to into a [`ModelDescriptor`].
//!
//! Two input shapes are accepted: an inline module holding the model struct
//! next to its storage name constant and key enums, or a bare struct. Marker
//! attributes are stripped from the item in place so the rest of it can be
//! emitted unchanged.

use proc_macro2::Span;
use syn::{Fields, Ident, Item, ItemMod, ItemStruct, StaticMutability, spanned::Spanned};

use crate::errors::{ConfigurationError, Diagnostics};
use crate::parse::attributes::{Markers, render_derive_list, split_derives};
use crate::parse::key_enum::KeyEnumDecl;
use crate::parse::metadata::{DeclKind, FieldDescriptor, ModelDescriptor, item_kind};

/// Where the model came from, so generation can put the output back.
#[derive(Debug)]
pub enum ModelSource {
    /// Inline module; the model struct sits at `model_index`.
    Module { module: ItemMod, model_index: usize },
    /// The attribute was placed directly on the item.
    Struct,
}

#[derive(Debug)]
pub struct ParsedModel {
    pub source: ModelSource,
    pub descriptor: ModelDescriptor,
}

/// Parses `item`. Returns `None` when no model could be located at all; any
/// other problem is recorded in `diagnostics`.
pub fn parse_model(
    name: Option<&Ident>,
    item: Item,
    diagnostics: &mut Diagnostics,
) -> Option<ParsedModel> {
    match item {
        Item::Mod(module) => parse_module(name, module, diagnostics),
        Item::Struct(mut model) => {
            let descriptor = describe_struct(&mut model, diagnostics)?;
            Some(ParsedModel {
                source: ModelSource::Struct,
                descriptor,
            })
        }
        other => {
            let name = item_ident(&other)
                .cloned()
                .unwrap_or_else(|| Ident::new("item", Span::call_site()));
            Some(ParsedModel {
                source: ModelSource::Struct,
                descriptor: ModelDescriptor::not_final(&other, name),
            })
        }
    }
}

fn parse_module(
    name: Option<&Ident>,
    mut module: ItemMod,
    diagnostics: &mut Diagnostics,
) -> Option<ParsedModel> {
    let module_ident = module.ident.clone();
    let Some((_, items)) = module.content.as_mut() else {
        diagnostics.error(
            ConfigurationError::UnsupportedModelShape {
                name: module_ident.to_string(),
                reason: "is declared out of line; `#[persisted_model]` needs an inline module body"
                    .to_string(),
            },
            module_ident.span(),
        );
        return None;
    };

    let model_index = find_model(&module_ident, name, items.as_slice(), diagnostics)?;

    let mut declarations = Vec::new();
    for (index, item) in items.iter_mut().enumerate() {
        if index != model_index {
            declarations.extend(describe_item(item, diagnostics));
        }
    }

    let mut descriptor = match &mut items[model_index] {
        Item::Struct(model) => describe_struct(model, diagnostics)?,
        other => {
            let name = item_ident(other)
                .cloned()
                .unwrap_or_else(|| module_ident.clone());
            ModelDescriptor::not_final(other, name)
        }
    };
    descriptor.fields.extend(declarations);

    Some(ParsedModel {
        source: ModelSource::Module {
            module,
            model_index,
        },
        descriptor,
    })
}

fn find_model(
    module_ident: &Ident,
    name: Option<&Ident>,
    items: &[Item],
    diagnostics: &mut Diagnostics,
) -> Option<usize> {
    if let Some(name) = name {
        return match items.iter().position(|item| item_ident(item) == Some(name)) {
            Some(index) => Some(index),
            None => {
                diagnostics.error(ConfigurationError::MissingModel, name.span());
                None
            }
        };
    }

    let structs: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches!(item, Item::Struct(_)))
        .map(|(index, _)| index)
        .collect();
    match structs.as_slice() {
        [index] => Some(*index),
        [] => {
            diagnostics.error(ConfigurationError::MissingModel, module_ident.span());
            None
        }
        many => {
            let candidates = many
                .iter()
                .filter_map(|index| item_ident(&items[*index]))
                .map(|ident| format!("`{}`", ident))
                .collect::<Vec<_>>()
                .join(", ");
            diagnostics.error(
                ConfigurationError::AmbiguousModel { candidates },
                module_ident.span(),
            );
            None
        }
    }
}

fn describe_struct(model: &mut ItemStruct, diagnostics: &mut Diagnostics) -> Option<ModelDescriptor> {
    let name = model.ident.to_string();
    if !model.generics.params.is_empty() || model.generics.where_clause.is_some() {
        diagnostics.error(
            ConfigurationError::UnsupportedModelShape {
                name,
                reason: "is generic; persisted models cannot take type, lifetime or const parameters"
                    .to_string(),
            },
            model.generics.span(),
        );
        return None;
    }

    let mut descriptor = ModelDescriptor::new(model.ident.clone(), model.vis.clone(), model.span());
    let (derives, attrs) = split_derives(&model.attrs);
    descriptor.derives = derives;
    descriptor.attrs = attrs;

    let fields = match &mut model.fields {
        Fields::Named(named) => &mut named.named,
        Fields::Unnamed(_) | Fields::Unit => {
            diagnostics.error(
                ConfigurationError::UnsupportedModelShape {
                    name,
                    reason: "must have named fields".to_string(),
                },
                model.ident.span(),
            );
            return None;
        }
    };

    for field in fields.iter_mut() {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let markers = Markers::extract(&mut field.attrs, diagnostics);
        let mut described = FieldDescriptor::new(ident.clone(), DeclKind::Field, markers, ident.span());
        described.ty = Some(field.ty.clone());
        described.vis = field.vis.clone();
        described.is_constant = described.is_ignored_constant();
        described.attrs = field.attrs.clone();
        descriptor.fields.push(described);
    }

    Some(descriptor)
}

/// Describes a module item carrying at least one marker.
fn describe_item(item: &mut Item, diagnostics: &mut Diagnostics) -> Option<FieldDescriptor> {
    match item {
        Item::Const(item) => {
            let markers = Markers::extract(&mut item.attrs, diagnostics);
            if markers.is_empty() {
                return None;
            }
            let mut field = FieldDescriptor::new(item.ident.clone(), DeclKind::Const, markers, item.span());
            field.ty = Some((*item.ty).clone());
            field.vis = item.vis.clone();
            field.is_static = true;
            field.is_constant = true;
            field.has_default_initializer = true;
            field.initializer = Some((*item.expr).clone());
            Some(field)
        }
        Item::Static(item) => {
            let markers = Markers::extract(&mut item.attrs, diagnostics);
            if markers.is_empty() {
                return None;
            }
            let mut field = FieldDescriptor::new(item.ident.clone(), DeclKind::Static, markers, item.span());
            field.ty = Some((*item.ty).clone());
            field.vis = item.vis.clone();
            field.is_static = true;
            field.is_constant = matches!(item.mutability, StaticMutability::None);
            field.has_default_initializer = true;
            field.initializer = Some((*item.expr).clone());
            Some(field)
        }
        Item::Enum(item) => {
            let markers = Markers::extract(&mut item.attrs, diagnostics);
            if markers.is_empty() {
                return None;
            }
            let wants_keys = markers.model_coding_key.is_some() || markers.migration.is_some();
            let mut field = FieldDescriptor::new(item.ident.clone(), DeclKind::Enum, markers, item.ident.span());
            field.vis = item.vis.clone();
            field.derive_list = render_derive_list(&item.attrs);
            if wants_keys {
                field.key_enum = Some(KeyEnumDecl::from_item(item, diagnostics));
            }
            Some(field)
        }
        other => {
            let kind = item_kind(other);
            let span = other.span();
            let name = item_ident(other)
                .cloned()
                .unwrap_or_else(|| Ident::new("item", Span::call_site()));
            let attrs = item_attrs_mut(other)?;
            let markers = Markers::extract(attrs, diagnostics);
            if markers.is_empty() {
                return None;
            }
            Some(FieldDescriptor::new(name, DeclKind::Item(kind), markers, span))
        }
    }
}

fn item_ident(item: &Item) -> Option<&Ident> {
    match item {
        Item::Const(item) => Some(&item.ident),
        Item::Enum(item) => Some(&item.ident),
        Item::Fn(item) => Some(&item.sig.ident),
        Item::Mod(item) => Some(&item.ident),
        Item::Static(item) => Some(&item.ident),
        Item::Struct(item) => Some(&item.ident),
        Item::Trait(item) => Some(&item.ident),
        Item::TraitAlias(item) => Some(&item.ident),
        Item::Type(item) => Some(&item.ident),
        Item::Union(item) => Some(&item.ident),
        _ => None,
    }
}

fn item_attrs_mut(item: &mut Item) -> Option<&mut Vec<syn::Attribute>> {
    match item {
        Item::ExternCrate(item) => Some(&mut item.attrs),
        Item::Fn(item) => Some(&mut item.attrs),
        Item::ForeignMod(item) => Some(&mut item.attrs),
        Item::Impl(item) => Some(&mut item.attrs),
        Item::Macro(item) => Some(&mut item.attrs),
        Item::Mod(item) => Some(&mut item.attrs),
        Item::Struct(item) => Some(&mut item.attrs),
        Item::Trait(item) => Some(&mut item.attrs),
        Item::TraitAlias(item) => Some(&mut item.attrs),
        Item::Type(item) => Some(&mut item.attrs),
        Item::Union(item) => Some(&mut item.attrs),
        Item::Use(item) => Some(&mut item.attrs),
        _ => None,
    }
}
