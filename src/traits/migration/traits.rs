use crate::container::{KeyedEncoder, MigrationDecoder};
use crate::error::{DecodeError, EncodeError};
use crate::traits::coding_key::CodingKey;

/// Transient copy of a model's persisted fields that reads through the old
/// key enum and writes through the current one.
///
/// # Example
///
/// ```
/// use docbase_store::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, CodingKey)]
/// enum Current {
///     #[key = "count"]
///     Count,
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, CodingKey)]
/// enum Legacy {
///     #[key = "N"]
///     Count,
/// }
///
/// struct Shadow {
///     count: u32,
/// }
///
/// impl MigrationShadow for Shadow {
///     type OldKeys = Legacy;
///     type NewKeys = Current;
///     const MODEL_NAME: &'static str = "Counter";
///
///     fn decode_old(
///         decoder: &MigrationDecoder<'_, Legacy, Current>,
///     ) -> Result<Self, DecodeError> {
///         Ok(Shadow { count: decoder.decode(Legacy::Count, Current::Count)? })
///     }
///
///     fn encode_new(&self, encoder: &mut KeyedEncoder<Current>) -> Result<(), EncodeError> {
///         encoder.encode(&self.count, Current::Count)
///     }
/// }
/// ```
pub trait MigrationShadow: Sized {
    type OldKeys: CodingKey;
    type NewKeys: CodingKey;

    const MODEL_NAME: &'static str;

    fn decode_old(
        decoder: &MigrationDecoder<'_, Self::OldKeys, Self::NewKeys>,
    ) -> Result<Self, DecodeError>;

    fn encode_new(&self, encoder: &mut KeyedEncoder<Self::NewKeys>) -> Result<(), EncodeError>;
}
