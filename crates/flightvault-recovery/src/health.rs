//! Health Scorer (§4.C): four bounded checks summing to a 0-100 score for
//! one `(kind, timestamp)` candidate. Each check degrades gracefully —
//! a failed sub-query yields partial credit rather than aborting the
//! whole score, mirroring the propagation policy in §7 ("one bad probe
//! does not fail a whole Finder run").

use chrono::{DateTime, Duration, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::errors::StoreError;
use flightvault_core::models::{level_for, CheckResult, FieldValue, HealthChecks, HealthScore};
use flightvault_core::registry::{EntityKind, Registry};
use flightvault_core::traits::TemporalStore;
use serde_json::json;
use tracing::instrument;

#[instrument(skip(store, registry, config))]
pub fn score(
    store: &dyn TemporalStore,
    registry: &Registry,
    config: &FlightVaultConfig,
    kind: &str,
    t: DateTime<Utc>,
) -> Result<HealthScore, StoreError> {
    let entity = registry
        .get(kind)
        .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;

    let snapshot = store.as_of(kind, t, None)?;
    let n = snapshot.len();

    let record_count = record_count_check(store, kind, t, n)?;
    let required_fields = required_fields_check(entity, &snapshot);
    let referential_integrity = referential_integrity_check(store, entity, &snapshot, t);
    let distribution = distribution_check(kind, &snapshot);

    let score = record_count.score
        + required_fields.score
        + referential_integrity.score
        + distribution.score;

    let checks = HealthChecks {
        record_count,
        required_fields,
        referential_integrity,
        distribution,
    };

    Ok(HealthScore {
        score,
        level: level_for(score, config.health_healthy_cutoff, config.health_warning_cutoff),
        checks,
    })
}

fn record_count_check(
    store: &dyn TemporalStore,
    kind: &str,
    t: DateTime<Utc>,
    n: usize,
) -> Result<CheckResult, StoreError> {
    let baseline = match store.current(kind, None) {
        Ok(records) if !records.is_empty() => records.len(),
        _ => store.as_of(kind, t - Duration::hours(24), None)?.len(),
    };

    let n_f = n as f64;
    let b_f = baseline as f64;
    let lower = 0.8 * b_f;
    let upper = 1.2 * b_f;

    let result_score = if n_f == 0.0 {
        0.0
    } else if n_f >= lower && n_f <= upper {
        25.0
    } else if n_f >= lower {
        15.0
    } else {
        5.0
    };

    Ok(CheckResult::new(
        result_score,
        json!({ "n": n, "baseline": baseline }),
    ))
}

fn required_fields_check(entity: &EntityKind, snapshot: &[flightvault_core::models::Record]) -> CheckResult {
    let n = snapshot.len();
    if entity.required_fields.is_empty() || n == 0 {
        return CheckResult::new(25.0, json!({ "violations": 0, "total": 0 }));
    }

    let total = n * entity.required_fields.len();
    let violations: usize = snapshot
        .iter()
        .map(|record| {
            entity
                .required_fields
                .iter()
                .filter(|field| {
                    record
                        .get(field.as_str())
                        .map(FieldValue::is_missing_or_empty)
                        .unwrap_or(true)
                })
                .count()
        })
        .sum();

    let ratio = violations as f64 / total as f64;
    let score = if violations == 0 {
        25.0
    } else if ratio < 0.1 {
        20.0
    } else if ratio < 0.2 {
        10.0
    } else {
        0.0
    };

    CheckResult::new(score, json!({ "violations": violations, "total": total }))
}

fn referential_integrity_check(
    store: &dyn TemporalStore,
    entity: &EntityKind,
    snapshot: &[flightvault_core::models::Record],
    t: DateTime<Utc>,
) -> CheckResult {
    if entity.references.is_empty() {
        return CheckResult::new(25.0, json!({ "references": [] }));
    }
    if snapshot.is_empty() {
        return CheckResult::new(25.0, json!({ "references": [], "note": "empty snapshot" }));
    }

    let mut worst_p = 1.0_f64;
    let mut diagnostics = Vec::new();

    for reference in &entity.references {
        let target_entity = match store.as_of(&reference.target_kind, t, None) {
            Ok(target_snapshot) => target_snapshot,
            Err(_) => {
                return CheckResult::partial(
                    15.0,
                    json!({ "failed_reference": reference.target_kind, "reason": "sub-query failed" }),
                );
            }
        };

        let resolved = snapshot
            .iter()
            .filter(|record| match record.get(&reference.field_on_self) {
                Some(value) if !value.is_missing_or_empty() => target_entity
                    .iter()
                    .any(|target| target.get(&reference.target_field) == Some(value)),
                _ => true,
            })
            .count();

        let p = resolved as f64 / snapshot.len() as f64;
        diagnostics.push(json!({ "field": reference.field_on_self, "resolved_fraction": p }));
        worst_p = worst_p.min(p);
    }

    let score = if worst_p >= 0.95 {
        25.0
    } else if worst_p >= 0.8 {
        20.0
    } else if worst_p >= 0.6 {
        10.0
    } else {
        0.0
    };

    CheckResult::new(score, json!({ "references": diagnostics, "worst_fraction": worst_p }))
}

fn distribution_check(kind: &str, snapshot: &[flightvault_core::models::Record]) -> CheckResult {
    if snapshot.is_empty() {
        return CheckResult::new(0.0, json!({ "reason": "empty snapshot" }));
    }
    if kind != "airports" {
        return CheckResult::new(25.0, json!({ "rule": "none_registered" }));
    }

    let city_score = diversity_score(snapshot, "city", &[0.3, 0.1], &[15.0, 10.0, 5.0]);
    let country_score = diversity_score(snapshot, "country", &[0.1], &[10.0, 5.0]);

    CheckResult::new(
        city_score + country_score,
        json!({ "city_score": city_score, "country_score": country_score }),
    )
}

fn diversity_score(
    snapshot: &[flightvault_core::models::Record],
    field: &str,
    thresholds: &[f64],
    awards: &[f64],
) -> f64 {
    let values: Vec<&FieldValue> = snapshot
        .iter()
        .filter_map(|record| record.get(field))
        .filter(|v| !v.is_missing_or_empty())
        .collect();

    if values.is_empty() {
        return *awards.last().unwrap_or(&0.0);
    }

    let distinct = values
        .iter()
        .map(|v| v.to_string())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let diversity = distinct as f64 / values.len() as f64;

    for (threshold, award) in thresholds.iter().zip(awards.iter()) {
        if diversity > *threshold {
            return *award;
        }
    }
    *awards.last().unwrap_or(&0.0)
}
