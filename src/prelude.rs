//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use docbase_store::prelude::*;
//! ```
//!
//! Brings in the model attributes and `CodingKey` derive, the runtime traits
//! the generated code implements, the context and store types needed to open
//! a model, and the error types its accessors return.

pub use docbase_macros::{CodingKey, persisted_model};

pub use crate::config::StorageConfig;
pub use crate::container::{KeyedDecoder, KeyedEncoder, MigrationDecoder, RecordContainer};
pub use crate::context::ModelContext;
pub use crate::databases::{FileRecordStore, MemoryRecordStore, RecordHandle};
#[cfg(feature = "sled")]
pub use crate::databases::SledRecordStore;
pub use crate::error::{DecodeError, DocbaseError, DocbaseResult, EncodeError, StoreError};
pub use crate::migration::{MigrationOutcome, RecordAssessment};
pub use crate::observation::{FieldId, NoopSink, ObservationEvent, ObservationRegistrar};
pub use crate::slots::PersistedSlots;
pub use crate::traits::{
    CodingKey, KeyLiteral, MigrationShadow, ObservationSink, PersistedModel, PersistedRecord,
    RawKind, RecordStore,
};
