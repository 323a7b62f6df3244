//! Per-model runtime context: the record store, its gate, and the
//! observation sink every synthesized accessor reports to.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::config::StorageConfig;
use crate::container::RecordContainer;
use crate::databases::{FileRecordStore, MemoryRecordStore, RecordHandle};
use crate::error::{DocbaseResult, StoreError};
use crate::observation::{FieldId, NoopSink};
use crate::traits::model::PersistedRecord;
use crate::traits::observation::ObservationSink;
use crate::traits::store::RecordStore;

#[derive(Clone)]
pub struct ModelContext {
    handle: Arc<RecordHandle>,
    sink: Arc<dyn ObservationSink>,
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("location", &self.location())
            .field("sink", &self.sink)
            .finish()
    }
}

impl ModelContext {
    pub fn new<S: RecordStore + 'static>(store: S) -> Self {
        Self::from_handle(Arc::new(RecordHandle::new(store)))
    }

    /// Shares `handle` (and its gate) with other contexts.
    pub fn from_handle(handle: Arc<RecordHandle>) -> Self {
        Self {
            handle,
            sink: Arc::new(NoopSink),
        }
    }

    /// Contexts opened on the same record file share one handle, and with it
    /// one gate, for as long as any of them is alive.
    pub fn file(config: &StorageConfig, storage_name: &str) -> Self {
        Self::from_handle(RecordHandle::for_file(FileRecordStore::for_model(
            config,
            storage_name,
        )))
    }

    pub fn memory(storage_name: &str) -> Self {
        Self::new(MemoryRecordStore::new(storage_name))
    }

    pub fn with_sink(mut self, sink: Arc<dyn ObservationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn handle(&self) -> &Arc<RecordHandle> {
        &self.handle
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.handle.store()
    }

    pub fn location(&self) -> String {
        self.handle.store().location()
    }

    pub fn access(&self, field: FieldId) {
        trace!("access {}", field);
        self.sink.will_access(field);
    }

    /// Replaces `*slot` with `value` inside the sink's mutation window.
    pub fn mutate<T>(&self, field: FieldId, slot: &mut T, value: T) {
        self.replace(field, slot, value);
    }

    /// Like [`mutate`](Self::mutate), returning the previous value.
    pub fn replace<T>(&self, field: FieldId, slot: &mut T, value: T) -> T {
        trace!("mutate {}", field);
        let mut value = value;
        let mut swapped = false;
        self.sink.with_mutation(field, &mut || {
            if !swapped {
                std::mem::swap(slot, &mut value);
                swapped = true;
            }
        });
        // The sink broke its contract and skipped the mutation.
        if !swapped {
            std::mem::swap(slot, &mut value);
        }
        value
    }

    /// Assigns `value` to the slot `select` picks out of `record` and writes
    /// the record back. When the write fails the previous value is put back,
    /// so memory never holds a value the store rejected.
    pub fn commit<R, T, F>(
        &self,
        field: FieldId,
        record: &mut R,
        select: F,
        value: T,
    ) -> DocbaseResult<()>
    where
        R: PersistedRecord,
        F: Fn(&mut R) -> &mut T,
    {
        let previous = self.replace(field, select(record), value);
        if let Err(e) = self.save(&*record) {
            warn!("write back of {} to {} failed: {}", field, self.location(), e);
            self.mutate(field, select(record), previous);
            return Err(e);
        }
        Ok(())
    }

    pub fn is_persisted(&self) -> DocbaseResult<bool> {
        let _gate = self.handle.shared()?;
        Ok(self.store().exists()?)
    }

    /// The raw stored container, or `None` when nothing was written yet.
    pub fn read_container(&self) -> DocbaseResult<Option<RecordContainer>> {
        let _gate = self.handle.shared()?;
        match self.store().read() {
            Ok(bytes) => Ok(Some(RecordContainer::from_bytes(&bytes)?)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load<R: PersistedRecord>(&self) -> DocbaseResult<R> {
        let bytes = {
            let _gate = self.handle.shared()?;
            self.store().read()?
        };
        debug!("loading record from {}", self.location());
        R::from_bytes(&bytes)
    }

    /// Writes the whole record back synchronously.
    pub fn save<R: PersistedRecord>(&self, record: &R) -> DocbaseResult<()> {
        let bytes = record.to_bytes()?;
        let _gate = self.handle.shared()?;
        self.store().write(&bytes)?;
        debug!("saved record to {}", self.location());
        Ok(())
    }

    pub fn delete(&self) -> DocbaseResult<()> {
        let _gate = self.handle.exclusive()?;
        self.store().delete()?;
        debug!("deleted record at {}", self.location());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{ObservationEvent, ObservationRegistrar};

    const FIELD: FieldId = FieldId::new("Model", "value");

    #[derive(Debug)]
    struct SkippingSink;

    impl ObservationSink for SkippingSink {
        fn will_access(&self, _field: FieldId) {}
        fn with_mutation(&self, _field: FieldId, _mutation: &mut dyn FnMut()) {}
    }

    #[test]
    fn test_mutate_notifies_sink() {
        let registrar = Arc::new(ObservationRegistrar::with_history(64));
        let context = ModelContext::memory("Model").with_sink(registrar.clone());

        let mut slot = 1;
        context.access(FIELD);
        context.mutate(FIELD, &mut slot, 2);

        assert_eq!(slot, 2);
        assert_eq!(
            registrar.events(),
            vec![
                ObservationEvent::Access(FIELD),
                ObservationEvent::WillMutate(FIELD),
                ObservationEvent::DidMutate(FIELD),
            ]
        );
    }

    #[test]
    fn test_mutate_applies_when_sink_skips() {
        let context = ModelContext::memory("Model").with_sink(Arc::new(SkippingSink));
        let mut slot = String::from("old");
        context.mutate(FIELD, &mut slot, String::from("new"));
        assert_eq!(slot, "new");
    }

    #[test]
    fn test_replace_returns_previous() {
        let context = ModelContext::memory("Model").with_sink(Arc::new(SkippingSink));
        let mut slot = 1;
        assert_eq!(context.replace(FIELD, &mut slot, 2), 1);
        assert_eq!(slot, 2);
    }

    #[test]
    fn test_file_contexts_share_handle() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig::new(dir.path());

        let first = ModelContext::file(&config, "Model");
        let second = ModelContext::file(&config, "Model");
        let other = ModelContext::file(&config, "Other");

        assert!(Arc::ptr_eq(first.handle(), second.handle()));
        assert!(!Arc::ptr_eq(first.handle(), other.handle()));
    }

    #[test]
    fn test_empty_store() {
        let context = ModelContext::memory("Model");
        assert!(!context.is_persisted().unwrap());
        assert!(context.read_container().unwrap().is_none());
    }
}
