use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Filter, Record, VersionedRecord};

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque handle to an open transaction scope (§4.A, §5 "Transaction scope
/// as a value"). Callers pass it to every read/write they want inside the
/// same transaction; they cannot construct one themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction(pub u64);

/// Outcome of `upsert_batch` (§4.A).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub updated: usize,
}

/// Thin contract over a versioned store (§4.A). Implementations are
/// expected to be cheap to clone/share (`Arc<dyn TemporalStore>`); the
/// core never holds a raw connection itself.
pub trait TemporalStore: Send + Sync {
    /// Snapshot at instant `t`.
    fn as_of(
        &self,
        kind: &str,
        t: DateTime<Utc>,
        filters: Option<&Filter>,
    ) -> StoreResult<Vec<Record>>;

    /// Snapshot at "now".
    fn current(&self, kind: &str, filters: Option<&Filter>) -> StoreResult<Vec<Record>>;

    /// Every version active at any point in `[t1, t2]`, each carrying its
    /// own provenance.
    fn between(
        &self,
        kind: &str,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
    ) -> StoreResult<Vec<VersionedRecord>>;

    /// Versions in reverse chronological order of `row_start`.
    fn audit(&self, kind: &str, limit: usize) -> StoreResult<Vec<VersionedRecord>>;

    /// Key-wise insert-or-replace of non-key fields inside `tx`.
    fn upsert_batch(
        &self,
        kind: &str,
        records: &[Record],
        tx: &Transaction,
    ) -> StoreResult<UpsertOutcome>;

    fn tx_begin(&self) -> StoreResult<Transaction>;
    fn tx_commit(&self, tx: Transaction) -> StoreResult<()>;
    fn tx_rollback(&self, tx: Transaction) -> StoreResult<()>;
}
