use crate::config::StorageConfig;
use crate::container::{KeyedDecoder, KeyedEncoder, RecordContainer};
use crate::context::ModelContext;
use crate::error::{DecodeError, DocbaseResult, EncodeError};
use crate::traits::coding_key::CodingKey;

/// The persisted half of a model: every persisted field, written and read
/// against one key enum in declaration order.
///
/// Generated by `#[persisted_model]` for the hidden `<Model>Slots` struct.
pub trait PersistedRecord: Sized {
    type Keys: CodingKey;

    fn encode_record(&self, encoder: &mut KeyedEncoder<Self::Keys>) -> Result<(), EncodeError>;

    fn decode_record(decoder: &KeyedDecoder<'_, Self::Keys>) -> Result<Self, DecodeError>;

    fn to_container(&self) -> Result<RecordContainer, EncodeError> {
        let mut encoder = KeyedEncoder::new();
        self.encode_record(&mut encoder)?;
        Ok(encoder.finish())
    }

    fn to_bytes(&self) -> DocbaseResult<Vec<u8>> {
        Ok(self.to_container()?.to_bytes()?)
    }

    fn from_container(container: &RecordContainer) -> Result<Self, DecodeError> {
        Self::decode_record(&KeyedDecoder::new(container))
    }

    fn from_bytes(bytes: &[u8]) -> DocbaseResult<Self> {
        let container = RecordContainer::from_bytes(bytes)?;
        Ok(Self::from_container(&container)?)
    }
}

/// Implemented for every model type produced by `#[persisted_model]`.
pub trait PersistedModel {
    type Record: PersistedRecord;

    const MODEL_NAME: &'static str;

    /// Name of the single record this model is stored under.
    const STORAGE_NAME: &'static str;

    /// File-backed context for this model's record under `config`.
    fn context(config: &StorageConfig) -> ModelContext {
        ModelContext::file(config, Self::STORAGE_NAME)
    }
}
