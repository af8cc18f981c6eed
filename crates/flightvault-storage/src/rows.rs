//! Raw row <-> domain type conversions between the `{kind}_versions`
//! table's TEXT columns and `Record`/`VersionedRecord`.

use chrono::{DateTime, Utc};
use flightvault_core::errors::StoreError;
use flightvault_core::models::{FieldValue, Provenance, Record, RowStatus, VersionedRecord};

use crate::open_sentinel;

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Query {
            kind: "<timestamp>".into(),
            message: format!("malformed timestamp {s}: {e}"),
        })
}

pub fn payload_to_record(payload: &str, kind: &str) -> Result<Record, StoreError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| StoreError::Query {
            kind: kind.to_string(),
            message: format!("malformed payload: {e}"),
        })?;
    let obj = value.as_object().ok_or_else(|| StoreError::Query {
        kind: kind.to_string(),
        message: "payload is not a JSON object".into(),
    })?;

    let mut record = Record::new();
    for (k, v) in obj {
        record.insert(k.clone(), json_to_field_value(v));
    }
    Ok(record)
}

pub fn record_to_payload(record: &Record) -> Result<String, StoreError> {
    let map: serde_json::Map<String, serde_json::Value> = record
        .iter()
        .map(|(k, v)| (k.clone(), field_value_to_json(v)))
        .collect();
    serde_json::to_string(&serde_json::Value::Object(map)).map_err(StoreError::from)
}

fn json_to_field_value(v: &serde_json::Value) -> FieldValue {
    match v {
        serde_json::Value::Null => FieldValue::Null,
        serde_json::Value::Bool(b) => FieldValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else {
                FieldValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => FieldValue::Text(s.clone()),
        other => FieldValue::Text(other.to_string()),
    }
}

fn field_value_to_json(v: &FieldValue) -> serde_json::Value {
    match v {
        FieldValue::Null => serde_json::Value::Null,
        FieldValue::Bool(b) => serde_json::Value::Bool(*b),
        FieldValue::Int(i) => serde_json::Value::from(*i),
        FieldValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        FieldValue::Text(s) => serde_json::Value::String(s.clone()),
    }
}

/// Build a `VersionedRecord` from a raw `(payload, row_start, row_end)` row.
pub fn build_versioned_record(
    kind: &str,
    payload: &str,
    row_start: &str,
    row_end: &str,
) -> Result<VersionedRecord, StoreError> {
    let record = payload_to_record(payload, kind)?;
    let row_start = parse_timestamp(row_start)?;
    let row_end = parse_timestamp(row_end)?;
    let status = if row_end == open_sentinel() {
        RowStatus::Current
    } else {
        RowStatus::Historical
    };

    Ok(VersionedRecord {
        record,
        provenance: Provenance {
            row_start,
            row_end,
            changed_at: row_start,
            valid_until: if status == RowStatus::Current {
                None
            } else {
                Some(row_end)
            },
            status,
        },
    })
}
