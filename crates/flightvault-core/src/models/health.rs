use serde::{Deserialize, Serialize};

/// Health level derived from the composite score (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

/// Result of one of the four bounded checks (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub score: f64,
    /// Set when the check awarded partial credit because a sub-query
    /// failed rather than because the data was actually unhealthy
    /// (the foreign-key check's "score 15, flagged" case).
    pub partial_credit: bool,
    pub diagnostics: serde_json::Value,
}

impl CheckResult {
    pub fn new(score: f64, diagnostics: serde_json::Value) -> Self {
        Self {
            score,
            partial_credit: false,
            diagnostics,
        }
    }

    pub fn partial(score: f64, diagnostics: serde_json::Value) -> Self {
        Self {
            score,
            partial_credit: true,
            diagnostics,
        }
    }
}

/// The four named checks that make up a health score (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    pub record_count: CheckResult,
    pub required_fields: CheckResult,
    pub referential_integrity: CheckResult,
    pub distribution: CheckResult,
}

/// Composite health score for one `(kind, timestamp)` candidate (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub checks: HealthChecks,
    pub level: HealthLevel,
}

pub fn level_for(score: f64, healthy_cutoff: f64, warning_cutoff: f64) -> HealthLevel {
    if score >= healthy_cutoff {
        HealthLevel::Healthy
    } else if score >= warning_cutoff {
        HealthLevel::Warning
    } else {
        HealthLevel::Critical
    }
}
