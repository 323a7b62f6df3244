pub mod file_store;
pub mod memory_store;

#[cfg(feature = "sled")]
pub mod sled_store;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::error::{DocbaseError, DocbaseResult};
use crate::traits::store::RecordStore;

pub use file_store::FileRecordStore;
pub use memory_store::MemoryRecordStore;
#[cfg(feature = "sled")]
pub use sled_store::SledRecordStore;

/// Live file handles by record path.
static FILE_HANDLES: LazyLock<Mutex<HashMap<PathBuf, Weak<RecordHandle>>>> =
    LazyLock::new(Default::default);

/// A record store behind a reader/writer gate.
///
/// Accessor reads and write-backs hold the gate shared; `migrate` holds it
/// exclusively so no accessor observes a half-migrated record.
#[derive(Debug)]
pub struct RecordHandle {
    store: Box<dyn RecordStore>,
    gate: RwLock<()>,
}

impl RecordHandle {
    pub fn new<S: RecordStore + 'static>(store: S) -> Self {
        Self::from_boxed(Box::new(store))
    }

    pub fn from_boxed(store: Box<dyn RecordStore>) -> Self {
        Self {
            store,
            gate: RwLock::new(()),
        }
    }

    /// The handle for `store`'s file. While any handle for the same path is
    /// alive it is returned instead of a new one, so every context on that
    /// file contends on the same gate. Paths are compared as given.
    pub fn for_file(store: FileRecordStore) -> Arc<Self> {
        let mut handles = FILE_HANDLES.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|_, handle| handle.strong_count() > 0);
        if let Some(handle) = handles.get(store.path()).and_then(Weak::upgrade) {
            return handle;
        }

        let path = store.path().to_path_buf();
        let handle = Arc::new(Self::new(store));
        handles.insert(path, Arc::downgrade(&handle));
        handle
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn shared(&self) -> DocbaseResult<RwLockReadGuard<'_, ()>> {
        self.gate.read().map_err(|_| DocbaseError::Poisoned)
    }

    pub fn exclusive(&self) -> DocbaseResult<RwLockWriteGuard<'_, ()>> {
        self.gate.write().map_err(|_| DocbaseError::Poisoned)
    }
}
