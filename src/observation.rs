//! Change-notification side channel.
//!
//! Synthesized accessors report every read and write of a persisted or
//! ignored field to the context's [`ObservationSink`]. [`NoopSink`] is the
//! default; [`ObservationRegistrar`] forwards events to registered observers
//! and, when asked to, keeps a bounded history of them.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError, RwLock};

use derive_more::Display;

use crate::traits::observation::ObservationSink;

/// Identifies one field of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{model}.{field}")]
pub struct FieldId {
    pub model: &'static str,
    pub field: &'static str,
}

impl FieldId {
    pub const fn new(model: &'static str, field: &'static str) -> Self {
        Self { model, field }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
pub enum ObservationEvent {
    Access(FieldId),
    WillMutate(FieldId),
    DidMutate(FieldId),
}

impl ObservationEvent {
    pub fn field(&self) -> FieldId {
        match self {
            ObservationEvent::Access(field)
            | ObservationEvent::WillMutate(field)
            | ObservationEvent::DidMutate(field) => *field,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ObservationSink for NoopSink {
    fn will_access(&self, _field: FieldId) {}

    fn with_mutation(&self, _field: FieldId, mutation: &mut dyn FnMut()) {
        mutation();
    }
}

type Observer = Box<dyn Fn(&ObservationEvent) + Send + Sync>;

/// Fans events out to observers.
///
/// A registrar built with [`with_history`](Self::with_history) also keeps
/// the most recent events; older ones are dropped once the limit is reached.
#[derive(Default)]
pub struct ObservationRegistrar {
    history: Mutex<VecDeque<ObservationEvent>>,
    limit: usize,
    observers: RwLock<Vec<Observer>>,
}

impl std::fmt::Debug for ObservationRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationRegistrar")
            .field("events", &self.events().len())
            .field("limit", &self.limit)
            .field(
                "observers",
                &self
                    .observers
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .finish()
    }
}

impl ObservationRegistrar {
    /// Observers only; nothing is recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also records up to `limit` of the latest events.
    pub fn with_history(limit: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(limit.min(1024))),
            limit,
            ..Self::default()
        }
    }

    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&ObservationEvent) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<ObservationEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Returns and forgets the recorded events.
    pub fn drain(&self) -> Vec<ObservationEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn count(&self, event: ObservationEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    fn emit(&self, event: ObservationEvent) {
        if self.limit > 0 {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() == self.limit {
                history.pop_front();
            }
            history.push_back(event);
        }
        for observer in self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            observer(&event);
        }
    }
}

impl ObservationSink for ObservationRegistrar {
    fn will_access(&self, field: FieldId) {
        self.emit(ObservationEvent::Access(field));
    }

    fn with_mutation(&self, field: FieldId, mutation: &mut dyn FnMut()) {
        self.emit(ObservationEvent::WillMutate(field));
        mutation();
        self.emit(ObservationEvent::DidMutate(field));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NUMBER: FieldId = FieldId::new("Settings", "number");

    #[test]
    fn test_registrar_records_in_order() {
        let registrar = ObservationRegistrar::with_history(16);
        let mut ran = false;

        registrar.will_access(NUMBER);
        registrar.with_mutation(NUMBER, &mut || ran = true);

        assert!(ran);
        assert_eq!(
            registrar.drain(),
            vec![
                ObservationEvent::Access(NUMBER),
                ObservationEvent::WillMutate(NUMBER),
                ObservationEvent::DidMutate(NUMBER),
            ]
        );
        assert!(registrar.events().is_empty());
    }

    #[test]
    fn test_observers_are_notified() {
        let registrar = ObservationRegistrar::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        registrar.observe(move |event| {
            if event.field() == NUMBER {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        registrar.will_access(NUMBER);
        registrar.will_access(FieldId::new("Settings", "text"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(NUMBER.to_string(), "Settings.number");
        assert_eq!(ObservationEvent::Access(NUMBER).as_ref(), "Access");
    }

    #[test]
    fn test_default_registrar_keeps_no_history() {
        let registrar = ObservationRegistrar::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        registrar.observe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..100 {
            registrar.will_access(NUMBER);
        }
        assert_eq!(seen.load(Ordering::SeqCst), 100);
        assert!(registrar.events().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let registrar = ObservationRegistrar::with_history(2);
        let text = FieldId::new("Settings", "text");

        registrar.will_access(NUMBER);
        registrar.with_mutation(text, &mut || {});

        assert_eq!(
            registrar.events(),
            vec![ObservationEvent::WillMutate(text), ObservationEvent::DidMutate(text)]
        );
        assert_eq!(registrar.count(ObservationEvent::Access(NUMBER)), 0);
    }
}
