use serde::{Deserialize, Serialize};

use super::record::{FieldValue, PrimaryKey, Record};

/// A single field-level delta inside a modified record (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<FieldValue>,
    pub after: Option<FieldValue>,
}

/// A record present in both snapshots but differing on at least one
/// non-provenance field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modified {
    pub key: PrimaryKey,
    pub before: Record,
    pub after: Record,
    pub field_changes: Vec<FieldChange>,
}

/// The result of diffing two snapshots of one entity kind (§3 "Change set").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<Record>,
    pub deleted: Vec<Record>,
    pub modified: Vec<Modified>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}

/// One entry of a `ChangeSet`, tagged with its kind. The Classifier (4.E)
/// and Dependency Validator (4.F) both operate over these rather than the
/// raw `ChangeSet` so a single list can carry mixed change types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Change {
    Added(Record),
    Deleted(Record),
    Modified(Modified),
}

impl Change {
    pub fn key(&self, pk_field: &str) -> Option<PrimaryKey> {
        match self {
            Change::Added(r) => r.get(pk_field).cloned(),
            Change::Deleted(r) => r.get(pk_field).cloned(),
            Change::Modified(m) => Some(m.key.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Change::Added(_) => "added",
            Change::Deleted(_) => "deleted",
            Change::Modified(_) => "modified",
        }
    }
}

impl ChangeSet {
    /// Flatten into the tagged `Change` list the Classifier consumes.
    pub fn into_changes(self) -> Vec<Change> {
        let mut changes = Vec::with_capacity(self.len());
        changes.extend(self.added.into_iter().map(Change::Added));
        changes.extend(self.deleted.into_iter().map(Change::Deleted));
        changes.extend(self.modified.into_iter().map(Change::Modified));
        changes
    }
}
