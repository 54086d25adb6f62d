//! Per-source circuit breaker.
//!
//! Owned by one engine. Consecutive failures trip a source to `Open`;
//! after the cooldown the next query may send a single probe
//! (`HalfOpen`). A successful probe closes the circuit, a failed one
//! re-opens it.
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └───▲────┘   failure   └────┬─────┘
//!     │                        └──────────────────────┤
//!     │                    success                     │
//!     └────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::types::SourceType;

/// Circuit state of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    /// Cooldown elapsed; one probe is in flight.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct SourceHealth {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Breaker thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit. Zero disables the breaker.
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a probe.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

/// Health tracking for every source of one engine.
#[derive(Debug)]
pub struct CircuitBreaker {
    settings: CircuitBreakerSettings,
    sources: HashMap<SourceType, SourceHealth>,
}

impl CircuitBreaker {
    pub fn new(settings: CircuitBreakerSettings) -> Self {
        Self {
            settings,
            sources: HashMap::new(),
        }
    }

    fn enabled(&self) -> bool {
        self.settings.failure_threshold > 0
    }

    /// Whether `source` may be called now. Moves an open circuit whose
    /// cooldown has elapsed to half-open and admits exactly that call.
    pub fn should_attempt(&mut self, source: SourceType) -> bool {
        if !self.enabled() {
            return true;
        }
        let cooldown = Duration::from_secs(self.settings.cooldown_secs);
        let health = self.sources.entry(source).or_default();
        match health.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let elapsed = health
                    .last_failure_at
                    .is_none_or(|t| t.elapsed() >= cooldown);
                if elapsed {
                    health.state = CircuitState::HalfOpen;
                }
                elapsed
            }
        }
    }

    /// Record a successful call; closes the circuit.
    pub fn record_success(&mut self, source: SourceType) {
        let health = self.sources.entry(source).or_default();
        health.state = CircuitState::Closed;
        health.consecutive_failures = 0;
    }

    /// Record a failed call; opens the circuit at the threshold or when a
    /// half-open probe fails.
    pub fn record_failure(&mut self, source: SourceType) {
        let threshold = self.settings.failure_threshold;
        let enabled = self.enabled();
        let health = self.sources.entry(source).or_default();
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.last_failure_at = Some(Instant::now());
        if enabled
            && (health.state == CircuitState::HalfOpen || health.consecutive_failures >= threshold)
        {
            if health.state != CircuitState::Open {
                tracing::warn!(%source, failures = health.consecutive_failures, "circuit opened");
            }
            health.state = CircuitState::Open;
        }
    }

    /// Give back a half-open probe that never completed. The circuit
    /// returns to open with its original failure time, so the next query
    /// may probe again.
    pub fn abandon_probe(&mut self, source: SourceType) {
        if let Some(health) = self.sources.get_mut(&source)
            && health.state == CircuitState::HalfOpen
        {
            health.state = CircuitState::Open;
        }
    }

    /// Current state of `source`.
    pub fn state(&self, source: SourceType) -> CircuitState {
        self.sources
            .get(&source)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// Consecutive failures recorded for `source`.
    pub fn consecutive_failures(&self, source: SourceType) -> u32 {
        self.sources
            .get(&source)
            .map_or(0, |h| h.consecutive_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerSettings {
            failure_threshold: threshold,
            cooldown_secs: 30,
        })
    }

    #[test]
    fn opens_after_threshold() {
        let mut b = breaker(2);
        b.record_failure(SourceType::Web);
        assert_eq!(b.state(SourceType::Web), CircuitState::Closed);
        b.record_failure(SourceType::Web);
        assert_eq!(b.state(SourceType::Web), CircuitState::Open);
        assert!(!b.should_attempt(SourceType::Web));
        assert!(b.should_attempt(SourceType::LegalActs));
    }

    #[test]
    fn success_resets() {
        let mut b = breaker(2);
        b.record_failure(SourceType::Web);
        b.record_success(SourceType::Web);
        b.record_failure(SourceType::Web);
        assert_eq!(b.state(SourceType::Web), CircuitState::Closed);
        assert_eq!(b.consecutive_failures(SourceType::Web), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_admits_single_probe() {
        let mut b = breaker(1);
        b.record_failure(SourceType::Spatial);
        assert!(!b.should_attempt(SourceType::Spatial));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_attempt(SourceType::Spatial));
        assert_eq!(b.state(SourceType::Spatial), CircuitState::HalfOpen);
        assert!(!b.should_attempt(SourceType::Spatial));

        b.record_failure(SourceType::Spatial);
        assert_eq!(b.state(SourceType::Spatial), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_attempt(SourceType::Spatial));
        b.record_success(SourceType::Spatial);
        assert_eq!(b.state(SourceType::Spatial), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_probe_can_be_retried() {
        let mut b = breaker(1);
        b.record_failure(SourceType::Web);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.should_attempt(SourceType::Web));
        b.abandon_probe(SourceType::Web);
        assert_eq!(b.state(SourceType::Web), CircuitState::Open);
        assert!(b.should_attempt(SourceType::Web));
    }

    #[test]
    fn zero_threshold_disables() {
        let mut b = breaker(0);
        for _ in 0..10 {
            b.record_failure(SourceType::Web);
        }
        assert!(b.should_attempt(SourceType::Web));
        assert_eq!(b.state(SourceType::Web), CircuitState::Closed);
    }
}
