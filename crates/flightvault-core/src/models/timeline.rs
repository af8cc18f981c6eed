use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::Change;
use super::record::Record;

/// One hourly bucket of the `timeline(kind, hours)` operation (§6), built
/// from `original_source/src/cli/flightvault.py`'s timeline view: each
/// bucket carries how many changes landed in it and a handful of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub bucket_timestamp: DateTime<Utc>,
    pub change_count: usize,
    pub sample_changes: Vec<Change>,
}

/// A page of records returned by `snapshot(kind, t, limit, offset)` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedRecords {
    pub records: Vec<Record>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
