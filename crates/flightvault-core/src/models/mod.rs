mod change;
mod classify;
mod finder;
mod health;
mod record;
mod restore;
mod timeline;
mod validate;

pub use change::{Change, ChangeSet, FieldChange, Modified};
pub use classify::{
    ChangeTypeFilter, ClassificationEntry, ClassificationResult, ClassificationRule, Label,
    TimeRange,
};
pub use finder::{FinderResult, SearchLogEntry, SearchPhase, StabilityCheck};
pub use health::{level_for, CheckResult, HealthChecks, HealthLevel, HealthScore};
pub use record::{
    snapshot_from_records, Filter, FieldValue, PrimaryKey, Provenance, Record, RowStatus,
    Snapshot, VersionedRecord,
};
pub use restore::{ExecutionResult, RestoreResult, RestoreSet, SelectiveResult};
pub use timeline::{PagedRecords, TimelineBucket};
pub use validate::{CascadeImpact, ForeignKeyIssue, ValidationResult};
