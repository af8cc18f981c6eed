use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar value a field may hold. Deliberately small: the registry (§6)
/// only needs to compare, hash and serialize these, never compute on them.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// True for values the completeness check (§4.C.2) treats as a
    /// violation: missing or empty string. `Null` and `Text("")` both
    /// count; everything else does not.
    pub fn is_missing_or_empty(&self) -> bool {
        matches!(self, FieldValue::Null) || matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl Eq for FieldValue {}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(v: &FieldValue) -> u8 {
            match v {
                FieldValue::Null => 0,
                FieldValue::Bool(_) => 1,
                FieldValue::Int(_) => 2,
                FieldValue::Float(_) => 3,
                FieldValue::Text(_) => 4,
            }
        }
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => std::cmp::Ordering::Equal,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            FieldValue::Null => 0u8.hash(state),
            FieldValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            FieldValue::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            FieldValue::Float(f) => {
                3u8.hash(state);
                f.to_bits().hash(state);
            }
            FieldValue::Text(s) => {
                4u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// An unordered mapping from field name to scalar value (§3). Stored as a
/// `BTreeMap` rather than a `HashMap` so two equal records always produce
/// the same serialized bytes — diff fixtures and content hashing both
/// depend on that determinism.
pub type Record = BTreeMap<String, FieldValue>;

/// The primary-key value extracted from a record via `pk(K)`.
pub type PrimaryKey = FieldValue;

/// Row-validity metadata a store attaches to a version. Never compared as
/// data and never written back — kept in its own struct, not inline in
/// `Record`, so "provenance fields are write-excluded" is enforced by the
/// type system rather than by a runtime filter that could be forgotten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub row_start: DateTime<Utc>,
    pub row_end: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub status: RowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Current,
    Historical,
}

/// A record as returned by the audit/between views: data plus the
/// provenance that placed it in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    pub record: Record,
    pub provenance: Provenance,
}

/// Optional equality filter passed to `as_of`/`current` (§4.A).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter(pub BTreeMap<String, FieldValue>);

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }
}

/// The set of records of one kind valid at one instant, keyed by primary
/// key (§3 "Snapshot").
pub type Snapshot = BTreeMap<PrimaryKey, Record>;

pub fn snapshot_from_records(records: Vec<Record>, pk_field: &str) -> Snapshot {
    records
        .into_iter()
        .filter_map(|r| r.get(pk_field).cloned().map(|pk| (pk, r)))
        .collect()
}
