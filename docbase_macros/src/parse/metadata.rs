//! Descriptors handed from parsing to the classifier
//!
//! A [`ModelDescriptor`] is the compiler's whole view of one model: the model
//! struct itself and, in module form, every marked declaration next to it.
//! Nothing here knows about roles yet; see `classify`.

use std::fmt;

use proc_macro2::Span;
use syn::{Attribute, Expr, Ident, Type, Visibility};

use crate::parse::attributes::Markers;
use crate::parse::key_enum::KeyEnumDecl;

/// Syntactic kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Field,
    Const,
    Static,
    Enum,
    Item(&'static str),
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Field => write!(f, "a struct field"),
            DeclKind::Const => write!(f, "a const item"),
            DeclKind::Static => write!(f, "a static item"),
            DeclKind::Enum => write!(f, "an enum"),
            DeclKind::Item(kind) => write!(f, "{}", kind),
        }
    }
}

/// Human readable kind of any module item.
pub fn item_kind(item: &syn::Item) -> &'static str {
    match item {
        syn::Item::Const(_) => "a const item",
        syn::Item::Enum(_) => "an enum",
        syn::Item::ExternCrate(_) => "an extern crate declaration",
        syn::Item::Fn(_) => "a function",
        syn::Item::ForeignMod(_) => "an extern block",
        syn::Item::Impl(_) => "an impl block",
        syn::Item::Macro(_) => "a macro invocation",
        syn::Item::Mod(_) => "a module",
        syn::Item::Static(_) => "a static item",
        syn::Item::Struct(_) => "a struct",
        syn::Item::Trait(_) => "a trait",
        syn::Item::TraitAlias(_) => "a trait alias",
        syn::Item::Type(_) => "a type alias",
        syn::Item::Union(_) => "a union",
        syn::Item::Use(_) => "a use declaration",
        _ => "an unsupported item",
    }
}

/// One declaration of the model body.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: Ident,
    /// Declared type; `None` for enums and other items.
    pub ty: Option<Type>,
    pub vis: Visibility,
    pub kind: DeclKind,
    pub markers: Markers,
    pub has_default_initializer: bool,
    pub is_constant: bool,
    pub is_static: bool,
    pub initializer: Option<Expr>,
    /// Parsed cases when the declaration is an enum carrying a key marker.
    pub key_enum: Option<KeyEnumDecl>,
    /// `#[derive(...)]` as written, for fix-its on key enums.
    pub derive_list: Option<String>,
    /// Attributes left after marker extraction.
    pub attrs: Vec<Attribute>,
    pub span: Span,
}

impl FieldDescriptor {
    pub fn new(name: Ident, kind: DeclKind, markers: Markers, span: Span) -> Self {
        Self {
            name,
            ty: None,
            vis: Visibility::Inherited,
            kind,
            markers,
            has_default_initializer: false,
            is_constant: false,
            is_static: false,
            initializer: None,
            key_enum: None,
            derive_list: None,
            attrs: Vec::new(),
            span,
        }
    }

    pub fn is_ignored_constant(&self) -> bool {
        self.markers.ignored.is_some_and(|marker| marker.constant)
    }
}

#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: Ident,
    pub vis: Visibility,
    /// Only structs are closed to further specialisation.
    pub is_final: bool,
    /// What the model item is, for diagnostics.
    pub kind: &'static str,
    /// Non-derive attributes of the model struct.
    pub attrs: Vec<Attribute>,
    /// `#[derive(...)]` attributes, forwarded to the persisted slots.
    pub derives: Vec<Attribute>,
    /// Struct fields in declaration order, then marked module declarations.
    pub fields: Vec<FieldDescriptor>,
    pub span: Span,
}

impl ModelDescriptor {
    pub fn new(name: Ident, vis: Visibility, span: Span) -> Self {
        Self {
            name,
            vis,
            is_final: true,
            kind: "a struct",
            attrs: Vec::new(),
            derives: Vec::new(),
            fields: Vec::new(),
            span,
        }
    }

    /// Descriptor for a non-struct item the attribute was aimed at.
    pub fn not_final(item: &syn::Item, name: Ident) -> Self {
        let mut descriptor = Self::new(name, item_vis(item), syn::spanned::Spanned::span(item));
        descriptor.is_final = false;
        descriptor.kind = item_kind(item);
        descriptor
    }
}

fn item_vis(item: &syn::Item) -> Visibility {
    match item {
        syn::Item::Const(item) => item.vis.clone(),
        syn::Item::Enum(item) => item.vis.clone(),
        syn::Item::Fn(item) => item.vis.clone(),
        syn::Item::Mod(item) => item.vis.clone(),
        syn::Item::Static(item) => item.vis.clone(),
        syn::Item::Struct(item) => item.vis.clone(),
        syn::Item::Trait(item) => item.vis.clone(),
        syn::Item::TraitAlias(item) => item.vis.clone(),
        syn::Item::Type(item) => item.vis.clone(),
        syn::Item::Union(item) => item.vis.clone(),
        _ => Visibility::Inherited,
    }
}
