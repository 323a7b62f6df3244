use crate::observation::FieldId;

/// Receives the access and mutation hooks every synthesized accessor calls.
pub trait ObservationSink: Send + Sync + std::fmt::Debug {
    fn will_access(&self, field: FieldId);

    /// Must invoke `mutation` exactly once.
    fn with_mutation(&self, field: FieldId, mutation: &mut dyn FnMut());
}
