//! Classifier (§4.E): explicit first-match-wins rules, falling back to
//! the default heuristics when no rule matches (or none are given).
//! Timestamps the heuristics need come from the store's audit view, not
//! from the change payload itself — a missing timestamp demotes the
//! change to `Uncertain` rather than guessing, per the Open Questions
//! resolution carried from spec.md §9.

use chrono::{DateTime, Duration, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::errors::StoreError;
use flightvault_core::models::{
    Change, ChangeSet, ChangeTypeFilter, ClassificationEntry, ClassificationResult,
    ClassificationRule, Label,
};
use flightvault_core::registry::Registry;
use flightvault_core::traits::{Clock, TemporalStore};
use tracing::instrument;

/// No real deployment has anywhere near this many versions of one key;
/// used in place of an unbounded `audit` call when scanning for a key's
/// full history.
const FULL_HISTORY_LIMIT: usize = 1_000_000;

pub struct Classifier<'a> {
    store: &'a dyn TemporalStore,
    registry: &'a Registry,
    config: &'a FlightVaultConfig,
    clock: &'a dyn Clock,
}

impl<'a> Classifier<'a> {
    pub fn new(
        store: &'a dyn TemporalStore,
        registry: &'a Registry,
        config: &'a FlightVaultConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            clock,
        }
    }

    #[instrument(skip(self, changes, rules))]
    pub fn classify(
        &self,
        kind: &str,
        restore_timestamp: DateTime<Utc>,
        changes: ChangeSet,
        rules: &[ClassificationRule],
    ) -> Result<ClassificationResult, StoreError> {
        let entity = self
            .registry
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;

        let pk_field = entity.primary_key.clone();
        let critical_fields = entity.critical_fields.clone();
        let deleted_count = changes.deleted.len();

        let mut result = ClassificationResult::default();

        for change in changes.into_changes() {
            let label = if let Some(label) =
                self.match_rules(kind, rules, &change, &pk_field, restore_timestamp)?
            {
                label
            } else {
                self.default_label(kind, restore_timestamp, &change, &pk_field, &critical_fields, deleted_count)?
            };
            result.push(ClassificationEntry { change, label });
        }

        Ok(result)
    }

    fn match_rules(
        &self,
        kind: &str,
        rules: &[ClassificationRule],
        change: &Change,
        pk_field: &str,
        restore_timestamp: DateTime<Utc>,
    ) -> Result<Option<Label>, StoreError> {
        for rule in rules {
            if let Some(filter) = &rule.change_type {
                let matches = matches!(
                    (filter, change),
                    (ChangeTypeFilter::Added, Change::Added(_))
                        | (ChangeTypeFilter::Deleted, Change::Deleted(_))
                        | (ChangeTypeFilter::Modified, Change::Modified(_))
                );
                if !matches {
                    continue;
                }
            }

            if let Some(pattern) = &rule.field_pattern {
                let touches = match change {
                    Change::Modified(m) => m.field_changes.iter().any(|fc| &fc.field == pattern),
                    _ => false,
                };
                if !touches {
                    continue;
                }
            }

            if let Some(range) = &rule.time_range {
                let key = change.key(pk_field);
                let timestamp = match key {
                    Some(key) => match change {
                        Change::Added(_) => self.creation_timestamp(kind, &key)?,
                        Change::Deleted(_) => self.deletion_timestamp(kind, &key, restore_timestamp)?,
                        Change::Modified(_) => self
                            .latest_change_timestamp(kind, &key)?
                            .filter(|t| *t > restore_timestamp),
                    },
                    None => None,
                };
                match timestamp {
                    Some(t) if range.contains(t) => {}
                    _ => continue,
                }
            }

            return Ok(Some(rule.label));
        }
        Ok(None)
    }

    fn default_label(
        &self,
        kind: &str,
        restore_timestamp: DateTime<Utc>,
        change: &Change,
        pk_field: &str,
        critical_fields: &[String],
        deleted_count: usize,
    ) -> Result<Label, StoreError> {
        match change {
            Change::Added(record) => {
                let Some(key) = record.get(pk_field).cloned() else {
                    return Ok(Label::Uncertain);
                };
                match self.creation_timestamp(kind, &key)? {
                    Some(created_at) => {
                        let recent = self.clock.now() - created_at
                            <= Duration::minutes(self.config.recent_add_window_minutes);
                        Ok(if recent { Label::Keep } else { Label::Uncertain })
                    }
                    None => Ok(Label::Uncertain),
                }
            }
            Change::Deleted(_) => {
                if deleted_count > self.config.mass_delete_threshold {
                    Ok(Label::Restore)
                } else {
                    Ok(Label::Uncertain)
                }
            }
            Change::Modified(m) => {
                let touches_critical = m
                    .field_changes
                    .iter()
                    .any(|fc| critical_fields.iter().any(|cf| cf == &fc.field));
                Ok(if touches_critical { Label::Restore } else { Label::Keep })
            }
        }
    }

    /// Earliest `changed_at` across the audit history for `key`.
    fn creation_timestamp(
        &self,
        kind: &str,
        key: &flightvault_core::models::PrimaryKey,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let pk_field = pk_field_of(kind, self.registry)?;
        let history = self.store.audit(kind, FULL_HISTORY_LIMIT)?;
        Ok(history
            .into_iter()
            .filter(|v| v.record.get(pk_field) == Some(key))
            .map(|v| v.provenance.changed_at)
            .min())
    }

    /// When `key` was last seen historical after `after_timestamp`: scans
    /// the audit trail newest-first (the order `audit` already returns)
    /// for the first historical version whose `changed_at` falls after
    /// `after_timestamp`, and returns the instant it stopped being valid.
    fn deletion_timestamp(
        &self,
        kind: &str,
        key: &flightvault_core::models::PrimaryKey,
        after_timestamp: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        use flightvault_core::models::RowStatus;

        let pk_field = pk_field_of(kind, self.registry)?;
        let history = self.store.audit(kind, FULL_HISTORY_LIMIT)?;
        Ok(history
            .into_iter()
            .find(|v| {
                v.record.get(pk_field) == Some(key)
                    && v.provenance.status == RowStatus::Historical
                    && v.provenance.changed_at > after_timestamp
            })
            .and_then(|v| v.provenance.valid_until))
    }

    /// Latest `changed_at` across history for `key`, used by time-range
    /// rule predicates.
    fn latest_change_timestamp(
        &self,
        kind: &str,
        key: &flightvault_core::models::PrimaryKey,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let pk_field = pk_field_of(kind, self.registry)?;
        let history = self.store.audit(kind, FULL_HISTORY_LIMIT)?;
        Ok(history
            .into_iter()
            .filter(|v| v.record.get(pk_field) == Some(key))
            .map(|v| v.provenance.changed_at)
            .max())
    }
}

fn pk_field_of<'a>(kind: &str, registry: &'a Registry) -> Result<&'a str, StoreError> {
    registry
        .get(kind)
        .map(|e| e.primary_key.as_str())
        .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))
}
