use std::sync::{PoisonError, RwLock};

use crate::error::StoreError;
use crate::traits::store::RecordStore;

/// Keeps the record in memory. Useful for tests and ephemeral models.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    name: String,
    bytes: RwLock<Option<Vec<u8>>>,
}

impl MemoryRecordStore {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            bytes: RwLock::new(None),
        }
    }

    /// A store that already holds `bytes`.
    pub fn with_bytes<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: RwLock::new(Some(bytes)),
        }
    }

    /// Copy of the raw record, if any.
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.bytes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn exists(&self) -> Result<bool, StoreError> {
        Ok(self
            .bytes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some())
    }

    fn read(&self) -> Result<Vec<u8>, StoreError> {
        self.snapshot().ok_or_else(|| StoreError::NotFound {
            location: self.location(),
        })
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self.bytes.write().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        self.bytes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }
}
