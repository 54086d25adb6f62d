//! Overall confidence of an answer set.

use crate::crossref::CrossReference;
use crate::types::{SearchResultItem, clamp_unit};

/// Results averaged for the base confidence.
const TOP_N: usize = 5;

/// Strongest reduction a single contested claim can cause.
const MAX_DISPUTE_PENALTY: f64 = 0.5;

/// Confidence in `results`, `[0, 1]`.
///
/// Base: mean of `(relevance + trust) / 2` over the top results. Reduced
/// by the worst contested claim, in proportion to how contested it is and
/// how trusted the results involved are. `item_indices` of each cross
/// reference index into `results`.
pub fn overall_confidence(results: &[SearchResultItem], cross_references: &[CrossReference]) -> f64 {
    let top: Vec<&SearchResultItem> = results.iter().take(TOP_N).collect();
    if top.is_empty() {
        return 0.0;
    }
    let base = top
        .iter()
        .map(|item| 0.5 * item.relevance + 0.5 * item.trust())
        .sum::<f64>()
        / top.len() as f64;

    let dispute = cross_references
        .iter()
        .filter(|r| r.is_contested())
        .map(|r| {
            let trusts: Vec<f64> = r
                .item_indices
                .iter()
                .filter_map(|&i| results.get(i))
                .map(SearchResultItem::trust)
                .collect();
            let trust = if trusts.is_empty() {
                0.0
            } else {
                trusts.iter().sum::<f64>() / trusts.len() as f64
            };
            (1.0 - r.confidence) * trust
        })
        .fold(0.0_f64, f64::max);

    clamp_unit(base * (1.0 - MAX_DISPUTE_PENALTY * dispute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossref::ClaimStatus;
    use crate::types::SourceType;

    fn item(relevance: f64, credibility: f64) -> SearchResultItem {
        let mut item = SearchResultItem::new("t", "c", SourceType::Web).with_relevance(relevance);
        item.credibility = Some(credibility);
        item
    }

    fn disputed(indices: Vec<usize>) -> CrossReference {
        CrossReference {
            claim: "claim".into(),
            supporting_sources: vec!["a".into(), "b".into(), "c".into()],
            contradicting_sources: vec!["d".into()],
            confidence: 0.75,
            status: ClaimStatus::Disputed,
            item_indices: indices,
        }
    }

    #[test]
    fn empty_results_have_zero_confidence() {
        assert_eq!(overall_confidence(&[], &[]), 0.0);
    }

    #[test]
    fn base_is_mean_of_relevance_and_trust() {
        let results = vec![item(1.0, 1.0), item(0.5, 0.5)];
        assert!((overall_confidence(&results, &[]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn disputes_among_trusted_sources_cost_more() {
        let trusted = vec![item(0.8, 0.9); 4];
        let shaky = vec![item(0.8, 0.2); 4];
        let base_trusted = overall_confidence(&trusted, &[]);
        let hit_trusted = overall_confidence(&trusted, &[disputed(vec![0, 1, 2, 3])]);
        let base_shaky = overall_confidence(&shaky, &[]);
        let hit_shaky = overall_confidence(&shaky, &[disputed(vec![0, 1, 2, 3])]);
        assert!(hit_trusted < base_trusted);
        assert!(base_trusted - hit_trusted > base_shaky - hit_shaky);
    }

    #[test]
    fn corroborated_claims_do_not_penalize() {
        let results = vec![item(0.8, 0.9); 2];
        let mut r = disputed(vec![0, 1]);
        r.contradicting_sources.clear();
        r.confidence = 1.0;
        r.status = ClaimStatus::Corroborated;
        assert_eq!(overall_confidence(&results, &[r]), overall_confidence(&results, &[]));
    }
}
