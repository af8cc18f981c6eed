use serde::{Deserialize, Serialize};

/// Configuration for the recovery engine. Every policy constant the
/// Health Scorer, Finder, Classifier and Executor rely on lives here
/// instead of being hard-coded, so an operator can tighten or loosen
/// recovery behavior per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightVaultConfig {
    /// Default search window for the Finder when the caller gives none.
    pub default_search_window_hours: i64,

    /// Maximum binary-search probes before falling back to the current
    /// window boundaries (§4.D step 2).
    pub finder_max_iterations: u32,

    /// Health score at/above which a candidate timestamp is considered
    /// pre-disaster and the search moves later (§4.D step 2d).
    pub finder_healthy_threshold: f64,

    /// Once the search window narrows to this many minutes or fewer,
    /// switch to per-minute refinement (§4.D step 3).
    pub finder_refine_window_minutes: i64,

    /// Confidence below which the Finder result carries a warning
    /// (§7, "Low confidence").
    pub low_confidence_threshold: f64,

    /// Health score cutoffs for healthy/warning/critical (§4.C).
    pub health_healthy_cutoff: f64,
    pub health_warning_cutoff: f64,

    /// Number of deletions within one change set that counts as a "mass
    /// deletion" for the default classifier heuristic (§4.E).
    pub mass_delete_threshold: usize,

    /// How recent an addition must be to default-classify as `keep`
    /// (§4.E "Added, recent").
    pub recent_add_window_minutes: i64,

    /// Batch size for the Selective Executor (§4.G).
    pub executor_batch_size: usize,
}

impl Default for FlightVaultConfig {
    fn default() -> Self {
        Self {
            default_search_window_hours: 24,
            finder_max_iterations: 15,
            finder_healthy_threshold: 80.0,
            finder_refine_window_minutes: 10,
            low_confidence_threshold: 50.0,
            health_healthy_cutoff: 80.0,
            health_warning_cutoff: 60.0,
            mass_delete_threshold: 10,
            recent_add_window_minutes: 60,
            executor_batch_size: 100,
        }
    }
}

impl FlightVaultConfig {
    /// Load config from a TOML string, falling back to defaults for
    /// missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
