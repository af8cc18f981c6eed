use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classify::ClassificationResult;
use super::record::{PrimaryKey, Record};
use super::validate::ValidationResult;

/// The subset of changes labelled `restore`: idempotent upserts of
/// historical payloads (§3 "Restore set").
pub type RestoreSet = Vec<(PrimaryKey, Record)>;

/// Result of the whole-snapshot `restore` operation (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    pub dry_run: bool,
    pub restore_timestamp: DateTime<Utc>,
    pub will_add: usize,
    pub will_update: usize,
    pub will_remove: usize,
    pub execution: Option<ExecutionResult>,
}

/// Result of `selective_restore` (§6): the classification breakdown plus,
/// when `execute = true`, the executor's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectiveResult {
    pub restore_timestamp: DateTime<Utc>,
    pub classification: ClassificationResult,
    pub validation: ValidationResult,
    pub execution: Option<ExecutionResult>,
}

/// Outcome of running the Selective Executor (§4.G) over a restore set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub records_processed: usize,
    pub batches_completed: usize,
    pub execution_time_ms: u64,
    pub errors: Vec<String>,
}
