use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::health::HealthScore;

/// One probe logged during the Finder's binary search or refinement pass
/// (§4.D). Returned to the caller for observability; never persisted
/// (§3 "Lifecycle").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub timestamp: DateTime<Utc>,
    pub health_score: f64,
    pub iteration: u32,
    pub phase: SearchPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    BinarySearch,
    Refinement,
}

/// Stability check result at the chosen candidate (§4.D step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityCheck {
    pub stable: bool,
    pub score: f64,
    pub count_before: usize,
    pub count_at: usize,
    pub count_after: usize,
}

/// Full result of `suggest_restore_point` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderResult {
    pub optimal_timestamp: DateTime<Utc>,
    pub confidence_percentage: f64,
    pub health_score: HealthScore,
    pub search_log: Vec<SearchLogEntry>,
    pub stability: StabilityCheck,
    pub reason: String,
    pub warnings: Vec<String>,
    pub probes_used: u32,
}
