// Models and helpers shared by the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use docbase_store::prelude::*;
use tempfile::TempDir;

#[persisted_model]
pub mod settings {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Settings {
        pub number: i64,
        pub text: String,
        #[persisted_ignored]
        pub draft: String,
        #[persisted_ignored(constant)]
        pub session: u32,
    }

    #[storage_name]
    pub const STORAGE: &str = "Default";
}

/// The `Settings` record as an earlier release wrote it.
#[persisted_model]
pub mod settings_v1 {
    use docbase_store::prelude::*;

    pub struct Settings {
        pub number: i64,
        pub text: String,
    }

    #[storage_name]
    pub const STORAGE: &str = "Default";

    #[model_coding_key]
    #[derive(Debug, Clone, Copy, CodingKey)]
    pub enum Keys {
        #[key = "N"]
        Number,
        #[key = "S"]
        Text,
    }
}

/// Current `Settings`, able to upgrade records written by `settings_v1`.
#[persisted_model]
pub mod settings_v2 {
    use docbase_store::prelude::*;

    pub struct Settings {
        pub number: i64,
        pub text: String,
        #[persisted_ignored]
        pub draft: String,
    }

    #[storage_name]
    pub const STORAGE: &str = "Default";

    #[migration]
    #[derive(Debug, Clone, Copy, CodingKey)]
    pub enum LegacyKeys {
        #[key = "N"]
        Number,
        #[key = "S"]
        Text,
    }
}

/// Integer keyed model with an integer keyed predecessor.
#[persisted_model(Counter)]
pub mod counter {
    use docbase_store::prelude::*;

    pub struct Counter {
        pub count: u64,
        pub label: Option<String>,
        pub history: Vec<u64>,
    }

    /// Not a model; lives next to it.
    pub struct Snapshot {
        pub count: u64,
    }

    #[model_coding_key]
    #[derive(Debug, Clone, Copy, CodingKey)]
    #[repr(u8)]
    pub enum CounterKeys {
        Count = 1,
        Label,
        History,
    }

    #[migration]
    #[derive(Debug, Clone, Copy, CodingKey)]
    #[repr(u8)]
    pub enum CounterKeysV1 {
        Count = 10,
        Label = 20,
        History = 30,
    }
}

/// Crate visible model and keys; its constants share names with locals of
/// the synthesized constructors.
#[persisted_model]
pub(crate) mod ledger {
    use docbase_store::prelude::*;

    pub(crate) struct Ledger {
        pub balance: i64,
        #[persisted_ignored(constant)]
        pub record: u32,
        #[persisted_ignored(constant)]
        pub container: String,
    }

    #[model_coding_key]
    #[derive(Debug, Clone, Copy, CodingKey)]
    pub(crate) enum LedgerKeys {
        #[key = "b"]
        Balance,
    }
}

/// Model declared directly on a struct.
#[persisted_model]
pub struct Profile {
    pub name: String,
    pub r#type: u8,
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn temp_config() -> (TempDir, StorageConfig) {
    let dir = TempDir::new().expect("temp dir");
    let config = StorageConfig::new(dir.path());
    (dir, config)
}

/// A memory backed context plus a second context sharing its store and gate.
pub fn shared_memory(name: &str) -> (ModelContext, ModelContext) {
    let handle = Arc::new(RecordHandle::new(MemoryRecordStore::new(name)));
    (
        ModelContext::from_handle(handle.clone()),
        ModelContext::from_handle(handle),
    )
}

pub fn observed(context: ModelContext) -> (ModelContext, Arc<ObservationRegistrar>) {
    let registrar = Arc::new(ObservationRegistrar::with_history(1024));
    (context.with_sink(registrar.clone()), registrar)
}

pub fn stored_bytes(context: &ModelContext) -> Vec<u8> {
    context.store().read().expect("stored record")
}
