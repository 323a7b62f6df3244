//! Storage configuration threaded into the file-backed record store.
//!
//! Each model writes one record named after its storage name, so the only
//! global decision is the directory those records live in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Where file-backed models keep their records.
///
/// # Examples
///
/// ```
/// use docbase_store::config::StorageConfig;
///
/// // Defaults: `storage` extension, parent directories created on write
/// let config = StorageConfig::new("/data/app");
/// assert_eq!(
///     config.path_for("Settings"),
///     std::path::PathBuf::from("/data/app/Settings.storage")
/// );
///
/// let config = StorageConfig::builder()
///     .directory("/data/app")
///     .extension("plist")
///     .create_directories(false)
///     .build();
/// assert_eq!(config.extension, "plist");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
pub struct StorageConfig {
    /// Directory holding one file per storage name
    #[builder(setter(into))]
    pub directory: PathBuf,

    /// File extension appended to the storage name; empty for none
    #[builder(default = String::from("storage"), setter(into))]
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Whether missing parent directories are created on first write
    #[builder(default = true)]
    #[serde(default = "default_create_directories")]
    pub create_directories: bool,
}

fn default_extension() -> String {
    String::from("storage")
}

fn default_create_directories() -> bool {
    true
}

impl StorageConfig {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            extension: default_extension(),
            create_directories: default_create_directories(),
        }
    }

    /// Path of the record stored under `storage_name`.
    pub fn path_for(&self, storage_name: &str) -> PathBuf {
        if self.extension.is_empty() {
            self.directory.join(storage_name)
        } else {
            self.directory
                .join(format!("{}.{}", storage_name, self.extension))
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
