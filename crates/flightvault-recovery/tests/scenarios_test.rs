//! End-to-end seed scenarios (§8, S1-S6).

use chrono::{Duration, TimeZone, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::models::{ClassificationRule, FieldValue, Label, Record};
use flightvault_core::registry::default_registry;
use flightvault_core::traits::{FixedClock, TemporalStore};
use flightvault_recovery::RecoveryEngine;
use flightvault_storage::SqliteTemporalStore;
use std::sync::Arc;

fn airport(id: &str, name: &str) -> Record {
    let mut r = Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Text(name.into()));
    r.insert("iata_code".into(), FieldValue::Text(id.into()));
    r
}

fn route(id: &str, source: &str, dest: &str) -> Record {
    let mut r = Record::new();
    r.insert("route_id".into(), FieldValue::Text(id.into()));
    r.insert("source_airport_id".into(), FieldValue::Text(source.into()));
    r.insert("destination_airport_id".into(), FieldValue::Text(dest.into()));
    r
}

fn engine_at(t0: chrono::DateTime<Utc>) -> (RecoveryEngine, Arc<SqliteTemporalStore>) {
    let registry = default_registry();
    let store = Arc::new(SqliteTemporalStore::open_in_memory(registry.clone()).unwrap());
    let clock = Arc::new(FixedClock::new(t0));
    let engine = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);
    (engine, store)
}

#[test]
fn s1_finder_locates_the_window_before_mass_deletion() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    for i in 0..100 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}"), "Name"), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::minutes(30);
    for i in 0..40 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::hours(1);
    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);

    let result = engine.suggest_restore_point("airports").unwrap();
    assert!(result.optimal_timestamp >= t0);
    assert!(result.optimal_timestamp < disaster_at);
    assert!(result.confidence_percentage >= 80.0);
}

#[test]
fn s2_dry_run_restore_reports_counts_without_writing() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    for i in 0..100 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}"), "Name"), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::minutes(30);
    for i in 0..40 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::hours(1);
    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store, registry, FlightVaultConfig::default(), clock);

    let result = engine.restore("airports", Some(t0), true).unwrap();
    assert_eq!(result.will_add, 40);
    assert_eq!(result.will_update, 0);
    assert_eq!(result.will_remove, 0);
    assert!(result.execution.is_none());
}

#[test]
fn s3_executed_restore_is_idempotent() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    for i in 0..100 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}"), "Name"), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::minutes(30);
    for i in 0..40 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::hours(1);
    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store.clone(), registry.clone(), FlightVaultConfig::default(), clock.clone());

    let first = engine.restore("airports", Some(t0), false).unwrap();
    assert!(first.execution.unwrap().success);
    assert_eq!(store.current("airports", None).unwrap().len(), 100);

    let engine2 = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);
    let second = engine2.restore("airports", Some(t0), false).unwrap();
    assert!(second.execution.unwrap().success);
    assert_eq!(store.current("airports", None).unwrap().len(), 100);
}

#[test]
fn s4_validator_blocks_restore_referencing_a_deleted_airport() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    store.seed_version("airports", "AAA", &airport("AAA", "Alpha"), t0, None).unwrap();
    store.seed_version("airports", "BBB", &airport("BBB", "Bravo"), t0, None).unwrap();
    store.seed_version("routes", "R1", &route("R1", "AAA", "BBB"), t0, None).unwrap();

    let deleted_route_at = t0 + Duration::minutes(10);
    store.retire("routes", "R1", deleted_route_at).unwrap();
    let deleted_airport_at = t0 + Duration::minutes(20);
    store.retire("airports", "AAA", deleted_airport_at).unwrap();

    let now = t0 + Duration::hours(1);
    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);

    let result = engine
        .selective_restore("routes", Some(t0), &[force_restore_rule()], true)
        .unwrap_err();

    assert!(matches!(
        result,
        flightvault_core::errors::FlightVaultError::Recovery(
            flightvault_core::errors::RecoveryError::ValidationFailed(_)
        )
    ));
    assert_eq!(store.current("routes", None).unwrap().len(), 0);
}

#[test]
fn s5_mass_modification_is_restored_by_critical_field_heuristic() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    for i in 0..200 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}"), "Original"), t0, None)
            .unwrap();
    }
    let corruption_at = t0 + Duration::minutes(15);
    for i in 0..200 {
        store
            .seed_version(
                "airports",
                &format!("A{i}"),
                &airport(&format!("A{i}"), "Corrupted"),
                corruption_at,
                None,
            )
            .unwrap();
    }

    let now = t0 + Duration::hours(1);
    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);

    let result = engine.selective_restore("airports", Some(t0), &[], true).unwrap();
    assert_eq!(result.classification.restore.len(), 200);

    let current = store.current("airports", None).unwrap();
    assert!(current.iter().all(|r| r.get("name") == Some(&FieldValue::Text("Original".into()))));
}

#[test]
fn s6_recent_addition_is_kept_alongside_restored_deletions() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let (_, store) = engine_at(t0);

    for i in 0..20 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}"), "Name"), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::minutes(10);
    for i in 0..15 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::minutes(40);
    store.seed_version("airports", "NEW", &airport("NEW", "Fresh"), now - Duration::minutes(10), None).unwrap();

    let clock = Arc::new(FixedClock::new(now));
    let registry = default_registry();
    let engine = RecoveryEngine::with_clock(store.clone(), registry, FlightVaultConfig::default(), clock);

    let result = engine.selective_restore("airports", Some(t0), &[], true).unwrap();
    assert_eq!(result.classification.restore.len(), 15);
    assert_eq!(result.classification.keep.len(), 1);

    let current = store.current("airports", None).unwrap();
    assert!(current.iter().any(|r| r.get("airport_id") == Some(&FieldValue::Text("NEW".into()))));
    assert_eq!(current.len(), 21);
}

fn force_restore_rule() -> ClassificationRule {
    ClassificationRule {
        change_type: None,
        field_pattern: None,
        time_range: None,
        label: Label::Restore,
    }
}
