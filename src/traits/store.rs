use crate::error::StoreError;

/// Single-record persistence backend.
///
/// Implementations hold exactly one record. The core never retries a failed
/// operation, and callers serialise concurrent writers through
/// [`RecordHandle`](crate::databases::RecordHandle).
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    fn exists(&self) -> Result<bool, StoreError>;

    /// Returns [`StoreError::NotFound`] when no record has been written.
    fn read(&self) -> Result<Vec<u8>, StoreError>;

    fn write(&self, bytes: &[u8]) -> Result<(), StoreError>;

    fn delete(&self) -> Result<(), StoreError>;

    /// Human readable location, used in logs and errors.
    fn location(&self) -> String;
}
