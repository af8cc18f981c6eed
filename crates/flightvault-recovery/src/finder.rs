//! Smart Restore-Point Finder (§4.D): binary search through a time window
//! guided by the Health Scorer, followed by per-minute refinement and a
//! stability check around the chosen instant. The asymmetric branching
//! rule — a healthy probe means the disaster is later, so search right —
//! is the load-bearing invariant the whole module exists to encode.

use chrono::{DateTime, Duration, Utc};
use flightvault_core::config::FlightVaultConfig;
use flightvault_core::errors::StoreError;
use flightvault_core::models::{
    FinderResult, HealthScore, SearchLogEntry, SearchPhase, StabilityCheck,
};
use flightvault_core::registry::Registry;
use flightvault_core::traits::{Clock, TemporalStore};
use tracing::instrument;

use crate::health;

pub struct Finder<'a> {
    store: &'a dyn TemporalStore,
    registry: &'a Registry,
    config: &'a FlightVaultConfig,
    clock: &'a dyn Clock,
}

impl<'a> Finder<'a> {
    pub fn new(
        store: &'a dyn TemporalStore,
        registry: &'a Registry,
        config: &'a FlightVaultConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            clock,
        }
    }

    /// Default window: last `default_search_window_hours`, ending "now"
    /// per the injected clock.
    pub fn default_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.clock.now();
        let start = end - Duration::hours(self.config.default_search_window_hours);
        (start, end)
    }

    #[instrument(skip(self))]
    pub fn suggest(&self, kind: &str) -> Result<FinderResult, StoreError> {
        let (t_start, t_end) = self.default_window();
        self.suggest_in_window(kind, t_start, t_end)
    }

    #[instrument(skip(self))]
    pub fn suggest_in_window(
        &self,
        kind: &str,
        t_start: DateTime<Utc>,
        t_end: DateTime<Utc>,
    ) -> Result<FinderResult, StoreError> {
        self.registry
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;

        let mut lo = t_start;
        let mut hi = t_end;
        let mut probes = 0u32;
        let mut search_log = Vec::new();

        // best = (t_start, 0) per §4.D step 1: no probe spent here, only
        // the budget-counted iterations below consume the 15-probe cap.
        let mut best_t = t_start;
        let mut best_score = 0.0_f64;
        let mut best_health: Option<HealthScore> = None;

        for _ in 0..self.config.finder_max_iterations {
            if hi - lo <= Duration::minutes(5) {
                break;
            }
            let mid = lo + (hi - lo) / 2;
            let hs = self.probe(kind, mid)?;
            probes += 1;
            search_log.push(log_entry(mid, hs.score, probes, SearchPhase::BinarySearch));

            if hs.score > best_score {
                best_t = mid;
                best_score = hs.score;
                best_health = Some(hs.clone());
            }

            if hs.score >= self.config.finder_healthy_threshold {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        if hi - lo <= Duration::minutes(self.config.finder_refine_window_minutes) {
            let mut cursor = lo;
            let mut refinement_probes = 0u32;
            while cursor <= hi && refinement_probes < 10 {
                let hs = self.probe(kind, cursor)?;
                probes += 1;
                refinement_probes += 1;
                search_log.push(log_entry(cursor, hs.score, probes, SearchPhase::Refinement));

                if hs.score > best_score {
                    best_t = cursor;
                    best_score = hs.score;
                    best_health = Some(hs.clone());
                }
                cursor += Duration::minutes(1);
            }
        }

        // Every iteration above probed at least `t_start`'s descendants;
        // if the window was already <= 5 min wide, no binary-search probe
        // ever ran and refinement may also have been skipped — fall back
        // to a single direct probe so `health_score` always reflects a
        // real candidate.
        let best_health = match best_health {
            Some(hs) => hs,
            None => {
                let hs = self.probe(kind, best_t)?;
                probes += 1;
                search_log.push(log_entry(best_t, hs.score, probes, SearchPhase::BinarySearch));
                best_score = hs.score;
                hs
            }
        };

        let stability = self.stability_check(kind, best_t)?;
        let boundary_clarity = (best_health.score / 100.0).min(1.0);
        let bonus = if boundary_clarity > 0.9 {
            10.0
        } else if boundary_clarity > 0.7 {
            5.0
        } else {
            0.0
        };
        let stability_term = if stability.stable { 10.0 } else { -5.0 };
        let confidence = (best_health.score + stability_term + bonus).clamp(0.0, 100.0);

        let count_variance = [stability.count_before, stability.count_at, stability.count_after]
            .iter()
            .max()
            .zip([stability.count_before, stability.count_at, stability.count_after].iter().min())
            .map(|(max, min)| max.saturating_sub(*min))
            .unwrap_or(0);

        let mut warnings = Vec::new();
        if confidence < self.config.low_confidence_threshold {
            warnings.push(format!("confidence {confidence:.1} below threshold"));
        }
        if !stability.stable {
            warnings.push("candidate timestamp is not stable (record count drifts nearby)".to_string());
        }
        if count_variance > 5 {
            warnings.push(format!("record count variance of {count_variance} around candidate"));
        }

        Ok(FinderResult {
            optimal_timestamp: best_t,
            confidence_percentage: confidence,
            health_score: best_health,
            search_log,
            stability,
            reason: format!(
                "selected the highest-scoring candidate found across {probes} probe(s) of binary search and refinement"
            ),
            warnings,
            probes_used: probes,
        })
    }

    fn probe(&self, kind: &str, t: DateTime<Utc>) -> Result<HealthScore, StoreError> {
        health::score(self.store, self.registry, self.config, kind, t)
    }

    fn stability_check(&self, kind: &str, t: DateTime<Utc>) -> Result<StabilityCheck, StoreError> {
        let count_before = self.store.as_of(kind, t - Duration::minutes(2), None)?.len();
        let count_at = self.store.as_of(kind, t, None)?.len();
        let count_after = self.store.as_of(kind, t + Duration::minutes(2), None)?.len();

        let stable = count_before == count_at && count_at == count_after;
        let max_delta = [count_before, count_after]
            .iter()
            .map(|c| (*c as i64 - count_at as i64).unsigned_abs())
            .max()
            .unwrap_or(0);
        let score = if stable {
            100.0
        } else {
            (100.0 - 10.0 * max_delta as f64).max(0.0)
        };

        Ok(StabilityCheck {
            stable,
            score,
            count_before,
            count_at,
            count_after,
        })
    }
}

fn log_entry(timestamp: DateTime<Utc>, score: f64, iteration: u32, phase: SearchPhase) -> SearchLogEntry {
    SearchLogEntry {
        timestamp,
        health_score: score,
        iteration,
        phase,
    }
}
