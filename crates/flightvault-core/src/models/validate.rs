use serde::{Deserialize, Serialize};

use super::record::PrimaryKey;

/// A blocking referential problem found while validating a proposed
/// restore set (§4.F "Outgoing references").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyIssue {
    pub kind: String,
    pub key: PrimaryKey,
    pub field: String,
    pub missing_target_kind: String,
    pub missing_target_key: PrimaryKey,
}

/// Non-blocking impact of restoring on another kind that refers to this
/// one (§4.F "Incoming references").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeImpact {
    pub referring_kind: String,
    pub affected_row_count: usize,
}

/// Result of `Dependency Validator` on a proposed restore set (§4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub safe_to_restore: bool,
    pub foreign_key_issues: Vec<ForeignKeyIssue>,
    pub cascade_impact: Vec<CascadeImpact>,
    pub warnings: Vec<String>,
    pub affected_kinds: Vec<String>,
}
