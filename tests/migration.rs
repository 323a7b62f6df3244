/// Migration adapter tests
///
/// Records are written by `settings_v1` (keys "N" / "S") and upgraded by
/// `settings_v2`, whose implicit keys are the field names.
mod common;

use common::counter::{Counter, CounterKeysV1};
use common::{init_logging, settings_v1, settings_v2, shared_memory, stored_bytes, temp_config};
use docbase_store::prelude::*;
use quickcheck::{QuickCheck, TestResult};
use std::sync::Arc;

fn write_v1(context: &ModelContext, number: i64, text: &str) -> DocbaseResult<()> {
    settings_v1::Settings::new(context.clone(), number, text.to_string())?;
    Ok(())
}

#[test]
fn test_migrate_rewrites_under_new_keys() -> anyhow::Result<()> {
    init_logging();
    let (context, _) = shared_memory("settings");
    write_v1(&context, 5, "x")?;

    // The current model cannot read the old record before migrating.
    assert!(settings_v2::Settings::load(context.clone()).is_err());

    assert!(settings_v2::Settings::should_migrate(&context)?);
    assert_eq!(settings_v2::Settings::migrate(&context)?, MigrationOutcome::Migrated);
    assert!(!settings_v2::Settings::should_migrate(&context)?);

    let migrated = settings_v2::Settings::load(context.clone())?;
    assert_eq!(*migrated.number()?, 5);
    assert_eq!(migrated.text()?, "x");

    let container = context.read_container()?.expect("record");
    let keys: Vec<KeyLiteral> = container.keys().cloned().collect();
    assert_eq!(keys, vec![KeyLiteral::from("number"), KeyLiteral::from("text")]);
    Ok(())
}

#[test]
fn test_should_migrate_never_writes() -> anyhow::Result<()> {
    let (context, _) = shared_memory("settings");
    write_v1(&context, 1, "legacy")?;
    let before = stored_bytes(&context);

    settings_v2::Settings::should_migrate(&context)?;
    settings_v2::Settings::should_migrate(&context)?;

    assert_eq!(stored_bytes(&context), before);
    Ok(())
}

#[test]
fn test_migrate_is_idempotent() -> anyhow::Result<()> {
    let (context, _) = shared_memory("settings");
    write_v1(&context, 9, "twice")?;

    settings_v2::Settings::migrate(&context)?;
    let once = stored_bytes(&context);
    assert_eq!(
        settings_v2::Settings::migrate(&context)?,
        MigrationOutcome::AlreadyCurrent
    );
    assert_eq!(stored_bytes(&context), once);
    Ok(())
}

#[test]
fn test_current_record_needs_no_migration() -> anyhow::Result<()> {
    let (context, _) = shared_memory("settings");
    settings_v2::Settings::new(context.clone(), 1, "new".into(), String::new())?;

    assert!(!settings_v2::Settings::should_migrate(&context)?);
    assert_eq!(
        settings_v2::Settings::migrate(&context)?,
        MigrationOutcome::AlreadyCurrent
    );
    Ok(())
}

#[test]
fn test_missing_record() -> anyhow::Result<()> {
    let (context, _) = shared_memory("settings");
    assert!(!settings_v2::Settings::should_migrate(&context)?);
    assert_eq!(settings_v2::Settings::migrate(&context)?, MigrationOutcome::NoRecord);
    Ok(())
}

#[test]
fn test_partially_migrated_record_completes() -> anyhow::Result<()> {
    // "N" was already rewritten to "number", "S" was not.
    let config = bincode::config::standard();
    let mut container = RecordContainer::new(0);
    container.insert(KeyLiteral::from("number"), bincode::encode_to_vec(3i64, config)?);
    container.insert(KeyLiteral::from("S"), bincode::encode_to_vec("half", config)?);
    let store = MemoryRecordStore::with_bytes("settings", container.to_bytes()?);
    let context = ModelContext::new(store);

    assert!(settings_v2::Settings::should_migrate(&context)?);
    assert_eq!(settings_v2::Settings::migrate(&context)?, MigrationOutcome::Migrated);

    let migrated = settings_v2::Settings::load(context)?;
    assert_eq!(*migrated.number()?, 3);
    assert_eq!(migrated.text()?, "half");
    Ok(())
}

#[test]
fn test_corrupted_record_is_not_reported_as_current() -> anyhow::Result<()> {
    let context = ModelContext::new(MemoryRecordStore::with_bytes("settings", vec![0xfe, 0x01]));

    assert!(matches!(
        settings_v2::Settings::should_migrate(&context),
        Err(DocbaseError::Decode(DecodeError::Corrupted(_)))
    ));
    assert!(matches!(
        settings_v2::Settings::migrate(&context),
        Err(DocbaseError::Decode(DecodeError::Corrupted(_)))
    ));
    Ok(())
}

#[test]
fn test_migration_on_file_store() -> anyhow::Result<()> {
    let (_dir, config) = temp_config();
    let legacy = settings_v1::Settings::context(&config);
    write_v1(&legacy, 12, "disk")?;

    let context = settings_v2::Settings::context(&config);
    // Both releases name the same file, so they contend on one gate.
    assert!(Arc::ptr_eq(legacy.handle(), context.handle()));
    assert_eq!(settings_v2::Settings::migrate(&context)?, MigrationOutcome::Migrated);

    let migrated = settings_v2::Settings::open(settings_v2::Settings::context(&config));
    assert_eq!(*migrated.number()?, 12);
    Ok(())
}

#[test]
fn test_integer_keyed_migration() -> anyhow::Result<()> {
    let mut encoder = KeyedEncoder::<CounterKeysV1>::new();
    encoder.encode(&7u64, CounterKeysV1::Count)?;
    encoder.encode(&Some("seven".to_string()), CounterKeysV1::Label)?;
    encoder.encode(&vec![1u64, 2, 3], CounterKeysV1::History)?;
    let context = ModelContext::new(MemoryRecordStore::with_bytes("counter", encoder.into_bytes()?));

    assert!(Counter::should_migrate(&context)?);
    Counter::migrate(&context)?;

    let container = context.read_container()?.expect("record");
    let keys: Vec<KeyLiteral> = container.keys().cloned().collect();
    assert_eq!(keys, vec![KeyLiteral::Int(1), KeyLiteral::Int(2), KeyLiteral::Int(3)]);

    let counter = Counter::load(context)?;
    assert_eq!(*counter.count()?, 7);
    assert_eq!(counter.label()?.as_deref(), Some("seven"));
    assert_eq!(counter.history()?, &vec![1u64, 2, 3]);
    Ok(())
}

#[test]
fn prop_migration_preserves_values() {
    fn preserves(number: i64, text: String) -> TestResult {
        let (context, _) = shared_memory("settings");
        if write_v1(&context, number, &text).is_err() {
            return TestResult::failed();
        }
        // Decoding the old bytes under the old keys gives the reference values.
        let Ok(old) = settings_v1::Settings::load(context.clone()) else {
            return TestResult::failed();
        };
        let expected = (old.number().ok().copied(), old.text().ok().cloned());

        if settings_v2::Settings::migrate(&context).is_err() {
            return TestResult::failed();
        }
        let Ok(new) = settings_v2::Settings::load(context) else {
            return TestResult::failed();
        };
        let actual = (new.number().ok().copied(), new.text().ok().cloned());
        TestResult::from_bool(actual == expected && expected == (Some(number), Some(text)))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(preserves as fn(i64, String) -> TestResult);
}
