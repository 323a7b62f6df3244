use std::path::Path;

use log::debug;

use crate::error::StoreError;
use crate::traits::store::RecordStore;

/// Stores a model's record under its storage name in a sled database.
///
/// Several models may share one `sled::Db`; each keeps its own key.
#[derive(Debug, Clone)]
pub struct SledRecordStore {
    db: sled::Db,
    key: String,
}

impl SledRecordStore {
    /// Open (or create) the database at `path`
    pub fn new<P: AsRef<Path>>(path: P, storage_name: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self::with_db(db, storage_name))
    }

    /// A throwaway database removed on drop
    pub fn temp(storage_name: &str) -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::with_db(db, storage_name))
    }

    pub fn with_db(db: sled::Db, storage_name: &str) -> Self {
        Self {
            db,
            key: storage_name.to_string(),
        }
    }

    /// Direct access to the underlying sled database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }
}

impl RecordStore for SledRecordStore {
    fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(self.key.as_bytes())?)
    }

    fn read(&self) -> Result<Vec<u8>, StoreError> {
        match self.db.get(self.key.as_bytes())? {
            Some(value) => Ok(value.to_vec()),
            None => Err(StoreError::NotFound {
                location: self.location(),
            }),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        self.db.insert(self.key.as_bytes(), bytes)?;
        self.db.flush()?;
        debug!("wrote {} bytes to {}", bytes.len(), self.location());
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        self.db.remove(self.key.as_bytes())?;
        Ok(())
    }

    fn location(&self) -> String {
        format!("sled:{}", self.key)
    }
}
