//! Selective Executor atomicity, idempotence and referential safety
//! (§8 properties 6-8).

use chrono::{TimeZone, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::models::{FieldValue, Record, RestoreSet};
use flightvault_core::registry::default_registry;
use flightvault_core::traits::TemporalStore;
use flightvault_graph::DependencyValidator;
use flightvault_recovery::executor::Executor;
use flightvault_recovery::CancellationToken;
use flightvault_storage::SqliteTemporalStore;

fn airport(id: &str) -> Record {
    let mut r = Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Text("Name".into()));
    r.insert("iata_code".into(), FieldValue::Text(id.into()));
    r
}

fn airport_missing_pk() -> Record {
    let mut r = Record::new();
    r.insert("name".into(), FieldValue::Text("No PK".into()));
    r
}

fn route(id: &str, source: &str, dest: &str) -> Record {
    let mut r = Record::new();
    r.insert("route_id".into(), FieldValue::Text(id.into()));
    r.insert("source_airport_id".into(), FieldValue::Text(source.into()));
    r.insert("destination_airport_id".into(), FieldValue::Text(dest.into()));
    r
}

#[test]
fn a_failed_batch_rolls_back_work_from_earlier_successful_batches() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let mut config = FlightVaultConfig::default();
    config.executor_batch_size = 2;

    let restore_set: RestoreSet = vec![
        (FieldValue::Text("AAA".into()), airport("AAA")),
        (FieldValue::Text("BBB".into()), airport("BBB")),
        (FieldValue::Text("CCC".into()), airport_missing_pk()),
    ];

    let executor = Executor::new(&store, &registry, &config);
    let result = executor.execute("airports", &restore_set, &CancellationToken::new()).unwrap();

    assert!(!result.success);
    assert!(store.current("airports", None).unwrap().is_empty(), "partial batch work must be rolled back");
}

#[test]
fn applying_the_same_restore_set_twice_yields_the_same_final_state() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let config = FlightVaultConfig::default();

    let restore_set: RestoreSet = vec![
        (FieldValue::Text("AAA".into()), airport("AAA")),
        (FieldValue::Text("BBB".into()), airport("BBB")),
    ];

    let executor = Executor::new(&store, &registry, &config);
    let first = executor.execute("airports", &restore_set, &CancellationToken::new()).unwrap();
    assert!(first.success);
    let after_first = store.current("airports", None).unwrap();

    let second = executor.execute("airports", &restore_set, &CancellationToken::new()).unwrap();
    assert!(second.success);
    let after_second = store.current("airports", None).unwrap();

    assert_eq!(after_first.len(), after_second.len());
    assert_eq!(after_first.len(), 2);
    // Re-applying identical payloads is a no-op per upsert's idempotence.
    assert_eq!(second.records_processed, 0);
}

#[test]
fn executor_refuses_a_restore_set_the_validator_blocks() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();

    // "AAA" does not exist in the store at all.
    let restore_set: RestoreSet = vec![(FieldValue::Text("R1".into()), route("R1", "AAA", "BBB"))];

    let validator = DependencyValidator::new(&store, &registry);
    let validation = validator.validate("routes", &restore_set).unwrap();
    assert!(!validation.safe_to_restore);
    assert!(!validation.foreign_key_issues.is_empty());
}

#[test]
fn once_the_validator_accepts_a_restore_its_references_resolve_after_commit() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let config = FlightVaultConfig::default();

    store.seed_version("airports", "AAA", &airport("AAA"), t0, None).unwrap();
    store.seed_version("airports", "BBB", &airport("BBB"), t0, None).unwrap();

    let restore_set: RestoreSet = vec![(FieldValue::Text("R1".into()), route("R1", "AAA", "BBB"))];

    let validator = DependencyValidator::new(&store, &registry);
    let validation = validator.validate("routes", &restore_set).unwrap();
    assert!(validation.safe_to_restore);

    let executor = Executor::new(&store, &registry, &config);
    let result = executor.execute("routes", &restore_set, &CancellationToken::new()).unwrap();
    assert!(result.success);

    let routes = store.current("routes", None).unwrap();
    let airports: std::collections::HashSet<FieldValue> = store
        .current("airports", None)
        .unwrap()
        .iter()
        .filter_map(|r| r.get("airport_id").cloned())
        .collect();

    for r in &routes {
        let source = r.get("source_airport_id").unwrap();
        let dest = r.get("destination_airport_id").unwrap();
        assert!(airports.contains(source));
        assert!(airports.contains(dest));
    }
}
