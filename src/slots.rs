use std::cell::OnceCell;

use log::debug;

use crate::context::ModelContext;
use crate::error::{DocbaseError, DocbaseResult};
use crate::traits::model::PersistedRecord;

/// Lazily loaded persisted backing slots of a model instance.
///
/// Unloaded slots are populated from the record store on first access.
#[derive(Debug)]
pub struct PersistedSlots<R> {
    cell: OnceCell<R>,
}

impl<R: PersistedRecord> PersistedSlots<R> {
    pub fn loaded(record: R) -> Self {
        Self {
            cell: OnceCell::from(record),
        }
    }

    pub fn unloaded() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Option<&R> {
        self.cell.get()
    }

    pub fn get_or_load(&self, context: &ModelContext) -> DocbaseResult<&R> {
        if let Some(record) = self.cell.get() {
            return Ok(record);
        }
        debug!("first access, populating slots from {}", context.location());
        let record = context.load::<R>()?;
        Ok(self.cell.get_or_init(|| record))
    }

    pub fn get_mut_or_load(&mut self, context: &ModelContext) -> DocbaseResult<&mut R> {
        if self.cell.get().is_none() {
            debug!("first write, populating slots from {}", context.location());
            self.cell = OnceCell::from(context.load::<R>()?);
        }
        self.cell
            .get_mut()
            .ok_or_else(|| DocbaseError::SlotsUnavailable {
                location: context.location(),
            })
    }

    pub fn replace(&mut self, record: R) {
        self.cell = OnceCell::from(record);
    }

    /// Forgets the in-memory copy; the next access reloads.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}
