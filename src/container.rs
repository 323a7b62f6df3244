//! Keyed record container.
//!
//! One stored record is a bincode-encoded [`RecordContainer`]: a key-schema
//! fingerprint followed by `(key literal, value bytes)` entries in declaration
//! order. Field values are encoded individually so a decoder can look them up
//! by key and report exactly which key is missing or malformed.

use std::marker::PhantomData;

use bincode::{Decode, Encode};

use crate::error::{DecodeError, EncodeError};
use crate::traits::coding_key::{CodingKey, KeyLiteral, key_fingerprint};

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RecordContainer {
    key_schema: u64,
    entries: Vec<(KeyLiteral, Vec<u8>)>,
}

impl RecordContainer {
    pub fn new(key_schema: u64) -> Self {
        Self {
            key_schema,
            entries: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (container, read): (Self, usize) = bincode::decode_from_slice(bytes, config())
            .map_err(|e| DecodeError::Corrupted(e.to_string()))?;
        if read != bytes.len() {
            return Err(DecodeError::Corrupted(format!(
                "{} trailing bytes after record",
                bytes.len() - read
            )));
        }
        Ok(container)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        bincode::encode_to_vec(self, config()).map_err(|e| EncodeError::Container(e.to_string()))
    }

    /// Fingerprint of the key enum the record was written with.
    pub fn key_schema(&self) -> u64 {
        self.key_schema
    }

    pub fn get(&self, key: &KeyLiteral) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, key: &KeyLiteral) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyLiteral> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn insert(&mut self, key: KeyLiteral, value: Vec<u8>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

fn decode_value<T: Decode<()>>(key: &KeyLiteral, bytes: &[u8]) -> Result<T, DecodeError> {
    let (value, read): (T, usize) =
        bincode::decode_from_slice(bytes, config()).map_err(|e| DecodeError::TypeMismatch {
            key: key.clone(),
            message: e.to_string(),
        })?;
    if read != bytes.len() {
        return Err(DecodeError::TypeMismatch {
            key: key.clone(),
            message: format!("{} unread bytes", bytes.len() - read),
        });
    }
    Ok(value)
}

/// Writes field values under the keys of `K`.
#[derive(Debug)]
pub struct KeyedEncoder<K: CodingKey> {
    container: RecordContainer,
    _keys: PhantomData<K>,
}

impl<K: CodingKey> Default for KeyedEncoder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CodingKey> KeyedEncoder<K> {
    pub fn new() -> Self {
        Self {
            container: RecordContainer::new(key_fingerprint::<K>()),
            _keys: PhantomData,
        }
    }

    pub fn encode<T: Encode>(&mut self, value: &T, key: K) -> Result<(), EncodeError> {
        let literal = key.literal();
        let bytes = bincode::encode_to_vec(value, config()).map_err(|e| EncodeError::Field {
            key: literal.clone(),
            message: e.to_string(),
        })?;
        self.container.insert(literal, bytes);
        Ok(())
    }

    pub fn finish(self) -> RecordContainer {
        self.container
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, EncodeError> {
        self.container.to_bytes()
    }
}

/// Reads field values stored under the keys of `K`.
#[derive(Debug)]
pub struct KeyedDecoder<'a, K: CodingKey> {
    container: &'a RecordContainer,
    _keys: PhantomData<K>,
}

impl<'a, K: CodingKey> KeyedDecoder<'a, K> {
    pub fn new(container: &'a RecordContainer) -> Self {
        Self {
            container,
            _keys: PhantomData,
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.container.contains(&key.literal())
    }

    /// True when the container was written with exactly the keys of `K`.
    pub fn schema_matches(&self) -> bool {
        self.container.key_schema() == key_fingerprint::<K>()
    }

    pub fn decode<T: Decode<()>>(&self, key: K) -> Result<T, DecodeError> {
        let literal = key.literal();
        match self.container.get(&literal) {
            Some(bytes) => decode_value(&literal, bytes),
            None => Err(DecodeError::MissingKey { key: literal }),
        }
    }
}

/// Decodes a record through an old key enum, optionally falling back to the
/// matching key of the new enum for fields that were already rewritten.
#[derive(Debug)]
pub struct MigrationDecoder<'a, Old: CodingKey, New: CodingKey> {
    container: &'a RecordContainer,
    fallback: bool,
    _keys: PhantomData<(Old, New)>,
}

impl<'a, Old: CodingKey, New: CodingKey> MigrationDecoder<'a, Old, New> {
    pub fn new(container: &'a RecordContainer) -> Self {
        Self {
            container,
            fallback: true,
            _keys: PhantomData,
        }
    }

    /// Only the old keys are consulted.
    pub fn strict(container: &'a RecordContainer) -> Self {
        Self {
            container,
            fallback: false,
            _keys: PhantomData,
        }
    }

    pub fn decode<T: Decode<()>>(&self, old: Old, new: New) -> Result<T, DecodeError> {
        let old_literal = old.literal();
        if let Some(bytes) = self.container.get(&old_literal) {
            return decode_value(&old_literal, bytes);
        }
        if self.fallback {
            let new_literal = new.literal();
            if let Some(bytes) = self.container.get(&new_literal) {
                return decode_value(&new_literal, bytes);
            }
        }
        Err(DecodeError::MissingKey { key: old_literal })
    }
}
