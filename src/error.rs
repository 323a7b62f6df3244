use std::path::PathBuf;

use thiserror::Error;

use crate::traits::coding_key::KeyLiteral;

pub type DocbaseResult<T> = Result<T, DocbaseError>;

#[derive(Error, Debug)]
pub enum DocbaseError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("The record gate was poisoned by a panicking writer")]
    Poisoned,
    #[error("Persisted slots backed by {location} could not be populated")]
    SlotsUnavailable { location: String },
}

/// Failures while reading a stored record back into memory.
///
/// A partial record is never accepted: a missing key fails the whole decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Key {key} is missing from the stored record")]
    MissingKey { key: KeyLiteral },
    #[error("Value stored under {key} does not decode as the declared type: {message}")]
    TypeMismatch { key: KeyLiteral, message: String },
    #[error("The record container is corrupted: {0}")]
    Corrupted(String),
}

impl DecodeError {
    pub fn is_missing_key(&self) -> bool {
        matches!(self, DecodeError::MissingKey { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Value for {key} could not be encoded: {message}")]
    Field { key: KeyLiteral, message: String },
    #[error("The record container could not be encoded: {0}")]
    Container(String),
}

/// Errors raised at the record-store boundary. Never retried by the core.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No record stored at {location}")]
    NotFound { location: String },
    #[error("Permission denied for {}", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "sled")]
    #[error("There was an error with the Sled database")]
    Sled(#[from] sled::Error),
}

impl StoreError {
    /// Classifies an io error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound {
                location: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => StoreError::PermissionDenied { path },
            _ => StoreError::Io { path, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
