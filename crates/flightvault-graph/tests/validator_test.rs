use flightvault_core::models::{FieldValue, Record};
use flightvault_core::registry::default_registry;
use flightvault_core::traits::TemporalStore;
use flightvault_graph::DependencyValidator;
use flightvault_storage::SqliteTemporalStore;

fn airport(id: &str) -> Record {
    let mut r = Record::new();
    r.insert("airport_id".into(), FieldValue::Text(id.into()));
    r.insert("name".into(), FieldValue::Text(format!("Airport {id}")));
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

#[test]
fn restoring_a_route_to_a_missing_airport_is_blocked() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let validator = DependencyValidator::new(&store, &registry);

    let restore_set = vec![(FieldValue::Text("R1".into()), route("R1", "AAA", "BBB"))];
    let result = validator.validate("routes", &restore_set).unwrap();

    assert!(!result.safe_to_restore);
    assert_eq!(result.foreign_key_issues.len(), 2);
}

#[test]
fn restoring_a_route_with_existing_airports_is_safe() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let tx = store.tx_begin().unwrap();
    flightvault_core::traits::TemporalStore::upsert_batch(
        &store,
        "airports",
        &[airport("AAA"), airport("BBB")],
        &tx,
    )
    .unwrap();
    store.tx_commit(tx).unwrap();

    let validator = DependencyValidator::new(&store, &registry);
    let restore_set = vec![(FieldValue::Text("R1".into()), route("R1", "AAA", "BBB"))];
    let result = validator.validate("routes", &restore_set).unwrap();

    assert!(result.safe_to_restore);
    assert!(result.foreign_key_issues.is_empty());
}

#[test]
fn restoring_an_airport_reports_cascade_impact_from_referring_routes() {
    let registry = default_registry();
    let store = SqliteTemporalStore::open_in_memory(registry.clone()).unwrap();
    let tx = store.tx_begin().unwrap();
    flightvault_core::traits::TemporalStore::upsert_batch(
        &store,
        "airports",
        &[airport("AAA"), airport("BBB")],
        &tx,
    )
    .unwrap();
    flightvault_core::traits::TemporalStore::upsert_batch(
        &store,
        "routes",
        &[route("R1", "AAA", "BBB")],
        &tx,
    )
    .unwrap();
    store.tx_commit(tx).unwrap();

    let validator = DependencyValidator::new(&store, &registry);
    let restore_set = vec![(FieldValue::Text("AAA".into()), airport("AAA"))];
    let result = validator.validate("airports", &restore_set).unwrap();

    assert!(result.safe_to_restore);
    assert_eq!(result.cascade_impact.len(), 1);
    assert_eq!(result.cascade_impact[0].referring_kind, "routes");
    assert_eq!(result.cascade_impact[0].affected_row_count, 1);
    assert!(!result.warnings.is_empty());
}
