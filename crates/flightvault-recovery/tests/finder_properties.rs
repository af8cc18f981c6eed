//! Finder convergence bounds (§8 properties 4-5): the chosen timestamp
//! always falls within the searched window, and total probes never
//! exceed the 15 binary-search + 10 refinement budget.

use chrono::{Duration, TimeZone, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::models::FieldValue;
use flightvault_core::registry::default_registry;
use flightvault_core::traits::FixedClock;
use flightvault_recovery::finder::Finder;
use flightvault_storage::SqliteTemporalStore;

fn airport(id: &str) -> flightvault_core::models::Record {
    let mut r = flightvault_core::models::Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Text("Name".into()));
    r.insert("iata_code".into(), FieldValue::Text(id.into()));
    r
}

#[test]
fn suggested_timestamp_always_falls_within_the_searched_window() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();

    for i in 0..50 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}")), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::hours(4);
    for i in 0..30 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::hours(8);
    let clock = FixedClock::new(now);
    let config = FlightVaultConfig::default();
    let finder = Finder::new(&store, &registry, &config, &clock);

    let result = finder.suggest_in_window("airports", t0, now).unwrap();

    assert!(result.optimal_timestamp >= t0);
    assert!(result.optimal_timestamp <= now);
    assert!(result.probes_used <= 25, "probes_used = {} exceeds budget", result.probes_used);
}

#[test]
fn probe_budget_never_exceeds_fifteen_binary_search_plus_ten_refinement() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();

    for i in 0..10 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}")), t0, None)
            .unwrap();
    }
    // No disaster at all: a flat-health store forces the binary search to
    // walk the full window since every probe looks equally healthy.
    let now = t0 + Duration::hours(24);
    let clock = FixedClock::new(now);
    let config = FlightVaultConfig::default();
    let finder = Finder::new(&store, &registry, &config, &clock);

    let result = finder.suggest_in_window("airports", t0, now).unwrap();
    assert!(result.probes_used <= 25, "probes_used = {} exceeds budget", result.probes_used);
}

#[test]
fn narrower_candidate_window_never_needs_more_probes_than_a_wider_one() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();

    for i in 0..50 {
        store
            .seed_version("airports", &format!("A{i}"), &airport(&format!("A{i}")), t0, None)
            .unwrap();
    }
    let disaster_at = t0 + Duration::hours(2);
    for i in 0..30 {
        store.retire("airports", &format!("A{i}"), disaster_at).unwrap();
    }

    let now = t0 + Duration::hours(4);
    let clock = FixedClock::new(now);
    let config = FlightVaultConfig::default();
    let finder = Finder::new(&store, &registry, &config, &clock);

    let wide = finder.suggest_in_window("airports", t0, now).unwrap();
    let narrow = finder
        .suggest_in_window("airports", disaster_at - Duration::minutes(10), disaster_at + Duration::minutes(10))
        .unwrap();

    assert!(narrow.probes_used <= wide.probes_used + 10);
}

/// A snapshot version whose every field is present and whose city/country
/// are unique per record, so `health::score` awards full marks on all
/// four checks.
fn healthy_airport(id: &str) -> flightvault_core::models::Record {
    let mut r = flightvault_core::models::Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Text(format!("Airport {id}")));
    r.insert("iata_code".into(), FieldValue::Text(id.into()));
    r.insert("city".into(), FieldValue::Text(format!("City {id}")));
    r.insert("country".into(), FieldValue::Text(format!("Country {id}")));
    r
}

/// Same key, `name` wiped and city/country collapsed to one shared value
/// so both the required-fields and distribution checks degrade.
fn degraded_airport(id: &str) -> flightvault_core::models::Record {
    let mut r = flightvault_core::models::Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Null);
    r.insert("iata_code".into(), FieldValue::Text(id.into()));
    r.insert("city".into(), FieldValue::Text("Nowhere".into()));
    r.insert("country".into(), FieldValue::Text("Nowhere".into()));
    r
}

/// Builds a store whose health score is pinned at 100 for every instant
/// before `t_disaster` and 60 (well below the healthy threshold) from
/// `t_disaster` onward, by swapping every row's open version at exactly
/// that instant rather than deleting anything — record count, and so the
/// record-count check, stays constant across the boundary, isolating the
/// step to the required-fields and distribution checks. Exercises the
/// asymmetric binary-search branch directly: a healthy probe must push
/// the window later, an unhealthy one must pull it earlier.
#[test]
fn finder_converges_on_a_pinned_health_step_within_one_refinement_step() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let t_disaster = t0 + Duration::minutes(121);
    let now = t0 + Duration::hours(4);

    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();

    for i in 0..10 {
        let id = format!("A{i}");
        store
            .seed_version("airports", &id, &healthy_airport(&id), t0, Some(t_disaster))
            .unwrap();
        store
            .seed_version("airports", &id, &degraded_airport(&id), t_disaster, None)
            .unwrap();
    }

    let clock = FixedClock::new(now);
    let config = FlightVaultConfig::default();
    let finder = Finder::new(&store, &registry, &config, &clock);

    let result = finder.suggest_in_window("airports", t0, now).unwrap();

    assert!(result.health_score.score >= config.finder_healthy_threshold);
    let gap = t_disaster - result.optimal_timestamp;
    assert!(
        gap >= Duration::zero() && gap <= Duration::minutes(1),
        "optimal_timestamp {} is not within one refinement step of t_disaster {}",
        result.optimal_timestamp,
        t_disaster
    );
}

#[test]
fn unknown_kind_is_rejected_before_any_probe() {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let clock = FixedClock::new(t0);
    let config = FlightVaultConfig::default();
    let finder = Finder::new(&store, &registry, &config, &clock);

    let err = finder.suggest_in_window("not_a_kind", t0, t0 + Duration::hours(1)).unwrap_err();
    assert!(matches!(err, flightvault_core::errors::StoreError::UnknownKind(_)));
}
