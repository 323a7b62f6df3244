use std::path::{Path, PathBuf};

use log::debug;

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::traits::store::RecordStore;

/// One record in one file, `<directory>/<storage name>.<extension>`.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
    create_directories: bool,
}

impl FileRecordStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_directories: true,
        }
    }

    pub fn for_model(config: &StorageConfig, storage_name: &str) -> Self {
        Self {
            path: config.path_for(storage_name),
            create_directories: config.create_directories,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for FileRecordStore {
    fn exists(&self) -> Result<bool, StoreError> {
        self.path
            .try_exists()
            .map_err(|e| StoreError::from_io(&self.path, e))
    }

    fn read(&self) -> Result<Vec<u8>, StoreError> {
        let bytes = std::fs::read(&self.path).map_err(|e| StoreError::from_io(&self.path, e))?;
        debug!("read {} bytes from {}", bytes.len(), self.path.display());
        Ok(bytes)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if self.create_directories {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::from_io(parent, e))?;
            }
        }
        std::fs::write(&self.path, bytes).map_err(|e| StoreError::from_io(&self.path, e))?;
        debug!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn delete(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from_io(&self.path, e)),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
