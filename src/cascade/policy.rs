//! Early-stop policy.

use serde::{Deserialize, Serialize};

/// How the per-source `min_results_to_stop` values of the sources that
/// produced results combine into the cascade's stop threshold.
///
/// Whatever the policy, a caller-supplied `stop_after_results` also stops
/// the cascade once reached, and exhaustive queries never stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Stop once the count reaches the smallest threshold among responders.
    #[default]
    MinAcrossResponders,
    /// Stop once the count reaches the largest threshold among responders.
    MaxAcrossResponders,
    /// Ignore source thresholds; only `stop_after_results` stops the cascade.
    CallerOnly,
}

impl StopPolicy {
    /// Source-derived threshold, given the `min_results_to_stop` of every
    /// source that has produced results so far.
    pub fn threshold(&self, responders: &[usize]) -> Option<usize> {
        match self {
            Self::MinAcrossResponders => responders.iter().min().copied(),
            Self::MaxAcrossResponders => responders.iter().max().copied(),
            Self::CallerOnly => None,
        }
    }

    /// Whether `accumulated` distinct results are enough to stop.
    ///
    /// `stop_after_results` of zero is treated as unset.
    pub fn should_stop(
        &self,
        accumulated: usize,
        responders: &[usize],
        stop_after_results: Option<usize>,
    ) -> bool {
        let caller = stop_after_results
            .filter(|n| *n > 0)
            .is_some_and(|n| accumulated >= n);
        caller || self.threshold(responders).is_some_and(|t| accumulated >= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_policy_uses_smallest_responder_threshold() {
        let p = StopPolicy::MinAcrossResponders;
        assert!(p.should_stop(3, &[3, 5], None));
        assert!(!p.should_stop(2, &[3, 5], None));
    }

    #[test]
    fn max_policy_uses_largest_responder_threshold() {
        let p = StopPolicy::MaxAcrossResponders;
        assert!(!p.should_stop(3, &[3, 5], None));
        assert!(p.should_stop(5, &[3, 5], None));
    }

    #[test]
    fn no_responders_means_no_source_threshold() {
        for p in [StopPolicy::MinAcrossResponders, StopPolicy::MaxAcrossResponders] {
            assert!(!p.should_stop(0, &[], None));
        }
    }

    #[test]
    fn caller_threshold_applies_under_every_policy() {
        for p in [
            StopPolicy::MinAcrossResponders,
            StopPolicy::MaxAcrossResponders,
            StopPolicy::CallerOnly,
        ] {
            assert!(p.should_stop(3, &[10], Some(3)));
        }
        assert!(!StopPolicy::CallerOnly.should_stop(100, &[1], None));
        assert!(!StopPolicy::CallerOnly.should_stop(0, &[], Some(0)));
    }
}
