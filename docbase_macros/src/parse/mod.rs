//! Parsing infrastructure for the model compiler
//!
//! ```text
//! #[persisted_model] item
//!     ↓
//! module.rs      locate the model struct, strip markers
//!     ↓
//! attributes.rs  markers, derives, repr
//! key_enum.rs    key cases and literals
//!     ↓
//! metadata.rs    ModelDescriptor / FieldDescriptor
//!     ↓
//! classify → keys → generators
//! ```

pub mod attributes;
pub mod key_enum;
pub mod metadata;
pub mod module;
