//! The search cascade: priority-ordered, early-stopping, multi-source
//! retrieval.
//!
//! Sources are grouped by priority. Groups run one after another; the
//! sources inside a group run concurrently under a bound. After each group
//! the results are merged and deduplicated, and the stop policy decides
//! whether the next group is worth querying.

pub mod breaker;
pub mod confidence;
pub mod engine;
pub mod policy;
pub mod response;

use serde::{Deserialize, Serialize};

pub use breaker::{CircuitBreaker, CircuitBreakerSettings, CircuitState};
pub use confidence::overall_confidence;
pub use engine::SearchCascadeEngine;
pub use policy::StopPolicy;
pub use response::{
    CascadeResult, SearchCascadeResponse, SearchOptions, SourceReport, SourceStatus,
};

/// Engine-wide cascade behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeSettings {
    pub stop_policy: StopPolicy,
    /// Sources of one priority group in flight at once.
    pub max_concurrent_sources: usize,
    /// Overall deadline per query in milliseconds; 0 disables it.
    pub overall_deadline_ms: u64,
    /// Length of the final result list.
    pub max_results: usize,
    /// Route queries without an explicit source subset by classified intent.
    pub intent_routing: bool,
    pub circuit_breaker: CircuitBreakerSettings,
    /// Top results fed to the cross-referencer.
    pub max_cross_reference_items: usize,
    /// Drop open-web items assessed below this credibility.
    pub min_web_credibility: Option<f64>,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            stop_policy: StopPolicy::default(),
            max_concurrent_sources: 4,
            overall_deadline_ms: 20_000,
            max_results: 20,
            intent_routing: false,
            circuit_breaker: CircuitBreakerSettings::default(),
            max_cross_reference_items: 20,
            min_web_credibility: None,
        }
    }
}

impl CascadeSettings {
    /// Check bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_sources == 0 {
            return Err("max_concurrent_sources must be at least 1".into());
        }
        if self.max_results == 0 {
            return Err("max_results must be at least 1".into());
        }
        if let Some(min) = self.min_web_credibility
            && !(0.0..=1.0).contains(&min)
        {
            return Err(format!("min_web_credibility must be within [0, 1], got {min}"));
        }
        Ok(())
    }
}
