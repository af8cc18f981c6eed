//! Selective Executor (§4.G): applies a restore set inside one
//! transaction, batched, with a per-batch duplicate-key probe and a
//! final presence check. Any failure at any point rolls back — the
//! transaction guard's `Drop` is the backstop if an early return is
//! ever added later without an explicit rollback call.

use std::collections::BTreeSet;
use std::time::Instant;

use flightvault_core::config::FlightVaultConfig;
use flightvault_core::errors::{RecoveryError, StoreError};
use flightvault_core::models::{ExecutionResult, PrimaryKey, Record, RestoreSet};
use flightvault_core::registry::Registry;
use flightvault_core::traits::{TemporalStore, Transaction};
use tracing::{instrument, warn};

use crate::cancellation::CancellationToken;

pub struct Executor<'a> {
    store: &'a dyn TemporalStore,
    registry: &'a Registry,
    config: &'a FlightVaultConfig,
}

/// RAII guard that rolls back the open transaction unless `commit` is
/// called (§5).
struct TxGuard<'a> {
    store: &'a dyn TemporalStore,
    tx: Option<Transaction>,
}

impl<'a> TxGuard<'a> {
    fn begin(store: &'a dyn TemporalStore) -> Result<Self, StoreError> {
        Ok(Self {
            store,
            tx: Some(store.tx_begin()?),
        })
    }

    fn handle(&self) -> Transaction {
        self.tx.expect("transaction guard used after commit/rollback")
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().expect("commit called twice");
        self.store.tx_commit(tx)
    }
}

impl Drop for TxGuard<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = self.store.tx_rollback(tx) {
                warn!(error = %e, "rollback during drop failed");
            }
        }
    }
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a dyn TemporalStore, registry: &'a Registry, config: &'a FlightVaultConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    #[instrument(skip(self, restore_set, token))]
    pub fn execute(
        &self,
        kind: &str,
        restore_set: &RestoreSet,
        token: &CancellationToken,
    ) -> Result<ExecutionResult, RecoveryError> {
        let started = Instant::now();
        let entity = self
            .registry
            .get(kind)
            .ok_or_else(|| RecoveryError::MissingPrimaryKey {
                kind: kind.to_string(),
                pk_field: "<unknown kind>".to_string(),
            })?;

        let guard = TxGuard::begin(self.store).map_err(|_| RecoveryError::IntegrityFailure {
            gate: "transaction begin".to_string(),
        })?;

        let mut records_processed = 0usize;
        let mut batches_completed = 0usize;
        let mut errors = Vec::new();
        let batch_size = self.config.executor_batch_size.max(1);

        for batch in restore_set.chunks(batch_size) {
            if token.is_cancelled() {
                errors.push("aborted before batch completed".to_string());
                return Ok(ExecutionResult {
                    success: false,
                    records_processed,
                    batches_completed,
                    execution_time_ms: elapsed_ms(started),
                    errors,
                });
            }

            let records: Vec<Record> = batch.iter().map(|(_, record)| record.clone()).collect();
            match self.store.upsert_batch(kind, &records, &guard.handle()) {
                Ok(outcome) => {
                    records_processed += outcome.inserted + outcome.updated;
                }
                Err(e) => {
                    errors.push(format!("batch upsert failed: {e}"));
                    return Ok(ExecutionResult {
                        success: false,
                        records_processed,
                        batches_completed,
                        execution_time_ms: elapsed_ms(started),
                        errors,
                    });
                }
            }

            if let Err(gate) = self.duplicate_key_probe(kind, &entity.primary_key) {
                errors.push(gate);
                return Ok(ExecutionResult {
                    success: false,
                    records_processed,
                    batches_completed,
                    execution_time_ms: elapsed_ms(started),
                    errors,
                });
            }

            batches_completed += 1;
        }

        if let Err(gate) = self.final_presence_check(kind, &entity.primary_key, restore_set) {
            errors.push(gate);
            return Ok(ExecutionResult {
                success: false,
                records_processed,
                batches_completed,
                execution_time_ms: elapsed_ms(started),
                errors,
            });
        }

        guard.commit().map_err(|_| RecoveryError::IntegrityFailure {
            gate: "transaction commit".to_string(),
        })?;

        Ok(ExecutionResult {
            success: true,
            records_processed,
            batches_completed,
            execution_time_ms: elapsed_ms(started),
            errors,
        })
    }

    fn duplicate_key_probe(&self, kind: &str, pk_field: &str) -> Result<(), String> {
        let current = self
            .store
            .current(kind, None)
            .map_err(|e| format!("duplicate-key probe query failed: {e}"))?;

        let mut seen = BTreeSet::new();
        for record in &current {
            if let Some(pk) = record.get(pk_field) {
                if !seen.insert(pk) {
                    return Err(format!("duplicate primary key detected in {kind} after batch"));
                }
            }
        }
        Ok(())
    }

    fn final_presence_check(
        &self,
        kind: &str,
        pk_field: &str,
        restore_set: &RestoreSet,
    ) -> Result<(), String> {
        let current = self
            .store
            .current(kind, None)
            .map_err(|e| format!("final presence check query failed: {e}"))?;

        let present: BTreeSet<&PrimaryKey> = current.iter().filter_map(|r| r.get(pk_field)).collect();
        let missing = restore_set
            .iter()
            .filter(|(pk, _)| !present.contains(pk))
            .count();

        if missing > 0 {
            Err(format!("{missing} restored key(s) not present in current({kind}) after commit"))
        } else {
            Ok(())
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
