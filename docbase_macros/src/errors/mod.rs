use proc_macro2::Span;
use thiserror::Error;

/// Everything that stops a model from being compiled.
///
/// Reported at expansion time; a model with any error emits no code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("`#[storage_name]` must be placed on a constant, static declaration with an initializer; `{name}` is {reason}")]
    InvalidStorageNameField { name: String, reason: String },
    #[error("`#[persisted_ignored]` can only be applied to a field of the model struct; `{name}` is {kind}")]
    NotAField { name: String, kind: String },
    #[error("`#[{marker}]` requires an enum deriving `CodingKey`; `{name}` {reason}")]
    NotAKeyEnum {
        marker: String,
        name: String,
        reason: String,
    },
    #[error("`#[persisted_model]` requires a closed struct type; `{name}` is {kind}")]
    NotFinal { name: String, kind: String },
    #[error("coding key enum `{enum_name}` has no case for persisted field(s): {missing}")]
    IncompleteCodingKeys { enum_name: String, missing: String },
    #[error("migration keys `{old}` conform to {{{old_surface}}} but model keys `{new}` conform to {{{new_surface}}}")]
    MigrationKeySurfaceMismatch {
        old: String,
        old_surface: String,
        new: String,
        new_surface: String,
    },
    #[error("key case `{case}` of `{enum_name}` does not match any persisted field (expected a field named `{field}`)")]
    UnknownKeyCase {
        enum_name: String,
        case: String,
        field: String,
    },
    #[error("key case `{case}` of `{enum_name}` matches more than one persisted field: {fields}")]
    AmbiguousKeyCase {
        enum_name: String,
        case: String,
        fields: String,
    },
    #[error("key literal {literal} is used by more than one case of `{enum_name}`")]
    DuplicateKeyLiteral { enum_name: String, literal: String },
    #[error("only one `#[{marker}]` declaration is allowed per model")]
    DuplicateDeclaration { marker: String },
    #[error("`#[storage_name]` initializer must be a string literal")]
    StorageNameNotLiteral,
    #[error("`#[persisted_model]` module contains no model struct")]
    MissingModel,
    #[error("`#[persisted_model]` module contains several structs ({candidates}); name the model with `#[persisted_model(Name)]`")]
    AmbiguousModel { candidates: String },
    #[error("model `{name}` {reason}")]
    UnsupportedModelShape { name: String, reason: String },
    #[error("field `{name}` collides with the synthesized member `{member}`")]
    ReservedFieldName { name: String, member: String },
    #[error("coding key enum `{enum_name}` must be at least as visible as model `{model}` (`{visibility}`)")]
    KeyEnumLessVisible {
        enum_name: String,
        model: String,
        visibility: String,
    },
    #[error("invalid key attribute: {detail}")]
    InvalidKeyAttribute { detail: String },
    #[error("invalid marker `#[{marker}]`: {detail}")]
    InvalidMarker { marker: String, detail: String },
}

/// Machine-applicable replacement for a textual slip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixIt {
    pub old: String,
    pub new: String,
}

impl FixIt {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub error: ConfigurationError,
    pub span: Span,
    pub fix: Option<FixIt>,
}

impl Diagnostic {
    pub fn new(error: ConfigurationError, span: Span) -> Self {
        Self {
            error,
            span,
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: FixIt) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn to_syn_error(&self) -> syn::Error {
        let mut error = syn::Error::new(self.span, self.error.to_string());
        if let Some(fix) = &self.fix {
            let help = if fix.old.is_empty() {
                format!("help: add `{}`", fix.new)
            } else {
                format!("help: replace `{}` with `{}`", fix.old, fix.new)
            };
            error.combine(syn::Error::new(self.span, help));
        }
        error
    }
}

/// Collects diagnostics so every error of a model is reported at once.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, error: ConfigurationError, span: Span) {
        self.push(Diagnostic::new(error, span));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> Vec<ConfigurationError> {
        self.items.iter().map(|d| d.error.clone()).collect()
    }

    /// `Ok(())` when empty, otherwise every diagnostic combined.
    pub fn finish(self) -> syn::Result<()> {
        let mut combined: Option<syn::Error> = None;
        for diagnostic in &self.items {
            let error = diagnostic.to_syn_error();
            match combined.as_mut() {
                Some(existing) => existing.combine(error),
                None => combined = Some(error),
            }
        }
        match combined {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
