//! Runtime half of the migration adapter.
//!
//! A model compiled with a `#[migration]` key enum gets a private
//! [`MigrationShadow`] plus `migrate` / `should_migrate` entry points that
//! forward here.
//!
//! A record is classified by the key-schema fingerprint stored in its
//! container. When the fingerprint matches neither enum (records written by
//! another tool, or hand-edited), the shadow is probe-decoded with the old
//! keys: success or a missing key means the record still needs migrating,
//! anything else means it is already current.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::container::{KeyedEncoder, MigrationDecoder, RecordContainer};
use crate::context::ModelContext;
use crate::error::{DocbaseResult, StoreError};
use crate::traits::coding_key::key_fingerprint;
use crate::traits::migration::MigrationShadow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
pub enum RecordAssessment {
    /// Written with the current keys.
    Current,
    /// Written with the migration keys, fully or in part.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
pub enum MigrationOutcome {
    NoRecord,
    AlreadyCurrent,
    Migrated,
}

pub fn assess<S: MigrationShadow>(container: &RecordContainer) -> RecordAssessment {
    let schema = container.key_schema();
    if schema == key_fingerprint::<S::NewKeys>() {
        return RecordAssessment::Current;
    }
    if schema == key_fingerprint::<S::OldKeys>() {
        return RecordAssessment::Legacy;
    }
    match S::decode_old(&MigrationDecoder::strict(container)) {
        Ok(_) => RecordAssessment::Legacy,
        Err(e) if e.is_missing_key() => RecordAssessment::Legacy,
        Err(e) => {
            debug!(
                "{}: unknown key schema and old keys do not decode ({}), treating as current",
                S::MODEL_NAME,
                e
            );
            RecordAssessment::Current
        }
    }
}

/// Whether the stored record still uses the migration keys.
///
/// Never writes to the store. A missing record needs no migration; an
/// unreadable one is an error.
pub fn should_migrate<S: MigrationShadow>(context: &ModelContext) -> DocbaseResult<bool> {
    let Some(container) = context.read_container()? else {
        return Ok(false);
    };
    let assessment = assess::<S>(&container);
    debug!("{} record at {} is {}", S::MODEL_NAME, context.location(), assessment);
    Ok(assessment == RecordAssessment::Legacy)
}

/// Rewrites a legacy record under the current keys, in place.
///
/// Holds the record gate exclusively for the whole read-decode-encode-write
/// cycle. Running it again on a migrated record is a no-op.
pub fn migrate<S: MigrationShadow>(context: &ModelContext) -> DocbaseResult<MigrationOutcome> {
    let _gate = context.handle().exclusive()?;
    let store = context.store();

    let bytes = match store.read() {
        Ok(bytes) => bytes,
        Err(StoreError::NotFound { .. }) => {
            debug!("{}: nothing to migrate at {}", S::MODEL_NAME, store.location());
            return Ok(MigrationOutcome::NoRecord);
        }
        Err(e) => {
            warn!("{}: migration could not read {}: {}", S::MODEL_NAME, store.location(), e);
            return Err(e.into());
        }
    };

    let container = RecordContainer::from_bytes(&bytes)?;
    if assess::<S>(&container) == RecordAssessment::Current {
        debug!("{}: record at {} is already current", S::MODEL_NAME, store.location());
        return Ok(MigrationOutcome::AlreadyCurrent);
    }

    let shadow = S::decode_old(&MigrationDecoder::new(&container))?;
    let mut encoder = KeyedEncoder::<S::NewKeys>::new();
    shadow.encode_new(&mut encoder)?;
    store.write(&encoder.into_bytes()?)?;

    info!("{}: migrated record at {}", S::MODEL_NAME, store.location());
    Ok(MigrationOutcome::Migrated)
}
