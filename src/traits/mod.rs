pub mod coding_key;
pub mod migration;
pub mod model;
pub mod observation;
pub mod store;

pub use coding_key::{CodingKey, KeyLiteral, RawKind, key_fingerprint};
pub use migration::MigrationShadow;
pub use model::{PersistedModel, PersistedRecord};
pub use observation::ObservationSink;
pub use store::RecordStore;
