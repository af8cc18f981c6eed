//! `RecoveryEngine`: the facade exposing the operation surface of §6,
//! wiring the Diff Engine, Health Scorer, Finder, Classifier, Dependency
//! Validator and Selective Executor together over one store and
//! registry — one entry point per public operation, delegating to the
//! module that actually does the work.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::errors::{FlightVaultError, FlightVaultResult, RecoveryError};
use flightvault_core::models::{
    Change, ChangeSet, ClassificationRule, FinderResult, PagedRecords, PrimaryKey, Record,
    RestoreResult, RestoreSet, SelectiveResult, TimelineBucket,
};
use flightvault_core::registry::Registry;
use flightvault_core::traits::{Clock, SystemClock, TemporalStore};
use flightvault_graph::DependencyValidator;
use tracing::{instrument, warn};

use crate::cancellation::CancellationToken;
use crate::classify::Classifier;
use crate::diff;
use crate::executor::Executor;
use crate::finder::Finder;

pub struct RecoveryEngine {
    store: Arc<dyn TemporalStore>,
    registry: Registry,
    config: FlightVaultConfig,
    clock: Arc<dyn Clock>,
}

impl RecoveryEngine {
    pub fn new(store: Arc<dyn TemporalStore>, registry: Registry, config: FlightVaultConfig) -> Self {
        Self::with_clock(store, registry, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn TemporalStore>,
        registry: Registry,
        config: FlightVaultConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            clock,
        }
    }

    fn pk_field(&self, kind: &str) -> FlightVaultResult<&str> {
        self.registry
            .get(kind)
            .map(|e| e.primary_key.as_str())
            .ok_or_else(|| FlightVaultError::Precondition(format!("unknown entity kind: {kind}")))
    }

    #[instrument(skip(self))]
    pub fn suggest_restore_point(&self, kind: &str) -> FlightVaultResult<FinderResult> {
        let finder = Finder::new(&*self.store, &self.registry, &self.config, &*self.clock);
        Ok(finder.suggest(kind)?)
    }

    #[instrument(skip(self))]
    pub fn diff(
        &self,
        kind: &str,
        t_before: DateTime<Utc>,
        t_after: Option<DateTime<Utc>>,
    ) -> FlightVaultResult<ChangeSet> {
        let pk_field = self.pk_field(kind)?.to_string();
        let before = self.store.as_of(kind, t_before, None)?;
        let after = match t_after {
            Some(t) => self.store.as_of(kind, t, None)?,
            None => self.store.current(kind, None)?,
        };
        Ok(diff::diff(kind, &pk_field, &before, &after)?)
    }

    /// Whole-kind restore toward `timestamp` (or the Finder's suggestion
    /// when absent). Reports counts against the current state; executes
    /// only when `dry_run = false`.
    #[instrument(skip(self))]
    pub fn restore(
        &self,
        kind: &str,
        timestamp: Option<DateTime<Utc>>,
        dry_run: bool,
    ) -> FlightVaultResult<RestoreResult> {
        let pk_field = self.pk_field(kind)?.to_string();
        let restore_timestamp = self.resolve_timestamp(kind, timestamp)?;

        let before = self.store.as_of(kind, restore_timestamp, None)?;
        let after = self.store.current(kind, None)?;
        let changes = diff::diff(kind, &pk_field, &before, &after)?;

        let will_add = changes.deleted.len();
        let will_update = changes.modified.len();
        let will_remove = changes.added.len();

        let execution = if dry_run {
            None
        } else {
            let restore_set = restore_set_from_before(&pk_field, &before, &changes);
            let executor = Executor::new(&*self.store, &self.registry, &self.config);
            Some(executor.execute(kind, &restore_set, &CancellationToken::new())?)
        };

        Ok(RestoreResult {
            dry_run,
            restore_timestamp,
            will_add,
            will_update,
            will_remove,
            execution,
        })
    }

    /// Classified, dependency-checked restore. `execute = false` previews
    /// the classification and validation without writing anything.
    #[instrument(skip(self, rules))]
    pub fn selective_restore(
        &self,
        kind: &str,
        timestamp: Option<DateTime<Utc>>,
        rules: &[ClassificationRule],
        execute: bool,
    ) -> FlightVaultResult<SelectiveResult> {
        let pk_field = self.pk_field(kind)?.to_string();
        let restore_timestamp = self.resolve_timestamp(kind, timestamp)?;

        let before = self.store.as_of(kind, restore_timestamp, None)?;
        let after = self.store.current(kind, None)?;
        let changes = diff::diff(kind, &pk_field, &before, &after)?;

        let classifier = Classifier::new(&*self.store, &self.registry, &self.config, &*self.clock);
        let classification = classifier.classify(kind, restore_timestamp, changes, rules)?;

        let restore_set = restore_set_from_classification(&pk_field, &before, &classification.restore);

        let validator = DependencyValidator::new(&*self.store, &self.registry);
        let validation = validator.validate(kind, &restore_set)?;

        let execution = if execute {
            if !validation.safe_to_restore {
                return Err(FlightVaultError::Recovery(RecoveryError::ValidationFailed(
                    validation.foreign_key_issues.len(),
                )));
            }
            let executor = Executor::new(&*self.store, &self.registry, &self.config);
            Some(executor.execute(kind, &restore_set, &CancellationToken::new())?)
        } else {
            None
        };

        Ok(SelectiveResult {
            restore_timestamp,
            classification,
            validation,
            execution,
        })
    }

    #[instrument(skip(self))]
    pub fn snapshot(&self, kind: &str, t: DateTime<Utc>, limit: usize, offset: usize) -> FlightVaultResult<PagedRecords> {
        let records = self.store.as_of(kind, t, None)?;
        let total = records.len();
        let page = records.into_iter().skip(offset).take(limit).collect();

        Ok(PagedRecords {
            records: page,
            total,
            limit,
            offset,
        })
    }

    #[instrument(skip(self))]
    pub fn timeline(&self, kind: &str, hours: i64) -> FlightVaultResult<Vec<TimelineBucket>> {
        let pk_field = self.pk_field(kind)?.to_string();
        let now = self.clock.now();
        let mut buckets = Vec::new();

        for h in (0..hours).rev() {
            let bucket_start = now - Duration::hours(h + 1);
            let bucket_end = now - Duration::hours(h);

            let before = self.store.as_of(kind, bucket_start, None)?;
            let after = self.store.as_of(kind, bucket_end, None)?;
            let changes = diff::diff(kind, &pk_field, &before, &after)?;
            let change_count = changes.len();
            let sample_changes: Vec<Change> = changes.into_changes().into_iter().take(5).collect();

            buckets.push(TimelineBucket {
                bucket_timestamp: bucket_start,
                change_count,
                sample_changes,
            });
        }

        Ok(buckets)
    }

    fn resolve_timestamp(&self, kind: &str, timestamp: Option<DateTime<Utc>>) -> FlightVaultResult<DateTime<Utc>> {
        match timestamp {
            Some(t) => Ok(t),
            None => Ok(self.suggest_restore_point(kind)?.optimal_timestamp),
        }
    }
}

/// Build a `RestoreSet` by pulling the historical payload out of `before`
/// for every key in `changes.deleted` and `changes.modified` (§3 "A
/// restore payload for key k equals exactly S(K, t*)[k]"). Keys added
/// since `t*` have no historical payload and are reported via
/// `will_remove` but never enter a restore set — the store contract has
/// no delete operation (§1 out of scope).
fn restore_set_from_before(pk_field: &str, before: &[Record], changes: &ChangeSet) -> RestoreSet {
    let mut wanted: BTreeSet<PrimaryKey> = changes.deleted.iter().filter_map(|r| r.get(pk_field).cloned()).collect();
    wanted.extend(changes.modified.iter().map(|m| m.key.clone()));

    before
        .iter()
        .filter_map(|record| {
            record
                .get(pk_field)
                .cloned()
                .filter(|pk| wanted.contains(pk))
                .map(|pk| (pk, record.clone()))
        })
        .collect()
}

fn restore_set_from_classification(
    pk_field: &str,
    before: &[Record],
    restore_entries: &[flightvault_core::models::ClassificationEntry],
) -> RestoreSet {
    let mut wanted = BTreeSet::new();
    for entry in restore_entries {
        match entry.change.key(pk_field) {
            Some(key) => {
                wanted.insert(key);
            }
            None => warn!("restore-labelled change has no primary key; skipping"),
        }
        if matches!(entry.change, Change::Added(_)) {
            warn!("an 'added' change was labelled restore; there is no historical payload to restore to, skipping");
        }
    }

    before
        .iter()
        .filter_map(|record| {
            record
                .get(pk_field)
                .cloned()
                .filter(|pk| wanted.contains(pk))
                .map(|pk| (pk, record.clone()))
        })
        .collect()
}
