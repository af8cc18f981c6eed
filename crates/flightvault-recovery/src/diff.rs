//! Diff Engine (§4.B): two hash-indexed passes over record lists keyed by
//! the kind's declared primary key — build a primary-key map for each
//! side, then added/deleted/modified passes. No event-range optimization:
//! there is no event log here, the store hands back full snapshots.

use std::collections::BTreeMap;

use flightvault_core::errors::RecoveryError;
use flightvault_core::models::{Change, ChangeSet, FieldChange, Modified, PrimaryKey, Record};

/// Diff `before` against `after`, keyed by `pk_field`. `added` = keys new
/// in `after`; `deleted` = keys missing from `after`; `modified` = keys in
/// both whose non-key fields differ (§3 "Change set" fixes the direction
/// as before → after, per the Open Questions resolution).
pub fn diff(
    kind: &str,
    pk_field: &str,
    before: &[Record],
    after: &[Record],
) -> Result<ChangeSet, RecoveryError> {
    let map_before = index_by_pk(kind, pk_field, before)?;
    let map_after = index_by_pk(kind, pk_field, after)?;

    let mut added = Vec::new();
    let mut deleted = Vec::new();
    let mut modified = Vec::new();

    for (key, record) in &map_after {
        if !map_before.contains_key(key) {
            added.push(record.clone());
        }
    }

    for (key, record) in &map_before {
        if !map_after.contains_key(key) {
            deleted.push(record.clone());
        }
    }

    for (key, record_before) in &map_before {
        if let Some(record_after) = map_after.get(key) {
            let field_changes = field_changes(record_before, record_after);
            if !field_changes.is_empty() {
                modified.push(Modified {
                    key: key.clone(),
                    before: record_before.clone(),
                    after: record_after.clone(),
                    field_changes,
                });
            }
        }
    }

    Ok(ChangeSet {
        added,
        deleted,
        modified,
    })
}

fn index_by_pk(
    kind: &str,
    pk_field: &str,
    records: &[Record],
) -> Result<BTreeMap<PrimaryKey, Record>, RecoveryError> {
    let mut map = BTreeMap::new();
    for record in records {
        let pk = record
            .get(pk_field)
            .cloned()
            .ok_or_else(|| RecoveryError::MissingPrimaryKey {
                kind: kind.to_string(),
                pk_field: pk_field.to_string(),
            })?;
        map.insert(pk, record.clone());
    }
    Ok(map)
}

fn field_changes(before: &Record, after: &Record) -> Vec<FieldChange> {
    let mut fields: Vec<&String> = before.keys().chain(after.keys()).collect();
    fields.sort();
    fields.dedup();

    fields
        .into_iter()
        .filter_map(|field| {
            let before_value = before.get(field);
            let after_value = after.get(field);
            if before_value == after_value {
                None
            } else {
                Some(FieldChange {
                    field: field.clone(),
                    before: before_value.cloned(),
                    after: after_value.cloned(),
                })
            }
        })
        .collect()
}

/// Re-key a `ChangeSet` into the flat `Change` list the classifier and
/// validator both consume.
pub fn into_changes(changes: ChangeSet) -> Vec<Change> {
    changes.into_changes()
}
