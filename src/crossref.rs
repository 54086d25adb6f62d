//! Claim cross-referencing across results.
//!
//! Every result is split into sentence-level claims. Claims whose
//! content-word sets overlap above the similarity threshold are clustered
//! (transitively), and each cluster reports which origins state the claim
//! and which negate it. An origin is the result's host, or its source kind
//! when it has no URL, so two pages from one site count once.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::text::{content_words, is_negation, jaccard, tokenize};
use crate::types::SearchResultItem;

/// Tuning for [`CrossReferencer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossReferenceSettings {
    /// Jaccard similarity a pair of claims must exceed to be linked.
    pub similarity_threshold: f64,
    /// Sentences with fewer words are not treated as claims.
    pub min_claim_words: usize,
    /// Claims taken from each result, in reading order.
    pub max_claims_per_item: usize,
}

impl Default for CrossReferenceSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            min_claim_words: 4,
            max_claims_per_item: 8,
        }
    }
}

impl CrossReferenceSettings {
    /// Check the threshold range and claim limits.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if self.max_claims_per_item == 0 {
            return Err("max_claims_per_item must be at least 1".into());
        }
        Ok(())
    }
}

/// Verdict on a clustered claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// At least two origins state it and none negate it.
    Corroborated,
    /// At least two origins state it and at least one negates it.
    Disputed,
    /// Fewer than two origins state it.
    Unverified,
}

/// A claim found in more than one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Representative claim text.
    pub claim: String,
    /// Distinct origins stating the claim.
    pub supporting_sources: Vec<String>,
    /// Distinct origins negating the claim.
    pub contradicting_sources: Vec<String>,
    /// `supporting / (supporting + contradicting)`.
    pub confidence: f64,
    pub status: ClaimStatus,
    /// Positions in the input slice of every result in the cluster.
    pub item_indices: Vec<usize>,
}

impl CrossReference {
    /// Whether any origin contradicts the claim.
    pub fn is_contested(&self) -> bool {
        !self.contradicting_sources.is_empty()
    }
}

struct Claim {
    item: usize,
    origin: String,
    negated: bool,
    text: String,
    words: BTreeSet<String>,
}

/// Clusters claims across results.
#[derive(Debug, Clone, Default)]
pub struct CrossReferencer {
    settings: CrossReferenceSettings,
}

impl CrossReferencer {
    pub fn new(settings: CrossReferenceSettings) -> Self {
        Self { settings }
    }

    /// Cross-reference `items`. Only clusters spanning at least two
    /// origins are returned, largest first.
    pub fn cross_reference(&self, items: &[SearchResultItem]) -> Vec<CrossReference> {
        let claims: Vec<Claim> = items
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| self.claims_of(idx, item))
            .collect();
        if claims.len() < 2 {
            return Vec::new();
        }

        let mut sets = DisjointSet::new(claims.len());
        for i in 0..claims.len() {
            for j in (i + 1)..claims.len() {
                if claims[i].origin == claims[j].origin {
                    continue;
                }
                if jaccard(&claims[i].words, &claims[j].words) > self.settings.similarity_threshold {
                    sets.union(i, j);
                }
            }
        }

        // Root -> claim indices, keyed by root so output order follows input.
        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..claims.len() {
            clusters.entry(sets.find(i)).or_default().push(i);
        }

        let mut refs: Vec<(usize, CrossReference)> = clusters
            .into_values()
            .filter_map(|members| summarize(&claims, &members).map(|r| (members[0], r)))
            .collect();
        refs.sort_by(|(a_first, a), (b_first, b)| {
            let a_size = a.supporting_sources.len() + a.contradicting_sources.len();
            let b_size = b.supporting_sources.len() + b.contradicting_sources.len();
            b_size.cmp(&a_size).then(a_first.cmp(b_first))
        });
        refs.into_iter().map(|(_, r)| r).collect()
    }

    fn claims_of(&self, idx: usize, item: &SearchResultItem) -> Vec<Claim> {
        let origin = origin_of(item);
        let body = if item.content.trim().is_empty() {
            item.title.as_str()
        } else {
            item.content.as_str()
        };
        split_sentences(body)
            .into_iter()
            .filter_map(|sentence| {
                let tokens = tokenize(sentence);
                if tokens.len() < self.settings.min_claim_words {
                    return None;
                }
                let words = content_words(sentence);
                if words.is_empty() {
                    return None;
                }
                Some(Claim {
                    item: idx,
                    origin: origin.clone(),
                    negated: tokens.iter().any(|t| is_negation(t)),
                    text: sentence.trim().to_string(),
                    words,
                })
            })
            .take(self.settings.max_claims_per_item)
            .collect()
    }
}

fn summarize(claims: &[Claim], members: &[usize]) -> Option<CrossReference> {
    // Per origin: (stating claims, negating claims).
    let mut per_origin: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for &m in members {
        let entry = per_origin.entry(claims[m].origin.as_str()).or_default();
        if claims[m].negated {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }
    if per_origin.len() < 2 {
        return None;
    }

    let mut supporting = Vec::new();
    let mut contradicting = Vec::new();
    for (origin, (stating, negating)) in per_origin {
        if negating > stating {
            contradicting.push(origin.to_string());
        } else {
            supporting.push(origin.to_string());
        }
    }

    let total = supporting.len() + contradicting.len();
    let confidence = supporting.len() as f64 / total as f64;
    let status = if supporting.len() < 2 {
        ClaimStatus::Unverified
    } else if contradicting.is_empty() {
        ClaimStatus::Corroborated
    } else {
        ClaimStatus::Disputed
    };

    let representative = members
        .iter()
        .find(|&&m| !claims[m].negated)
        .unwrap_or(&members[0]);
    let item_indices: BTreeSet<usize> = members.iter().map(|&m| claims[m].item).collect();

    Some(CrossReference {
        claim: claims[*representative].text.clone(),
        supporting_sources: supporting,
        contradicting_sources: contradicting,
        confidence,
        status,
        item_indices: item_indices.into_iter().collect(),
    })
}

fn origin_of(item: &SearchResultItem) -> String {
    item.url
        .as_deref()
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()))
        .unwrap_or_else(|| item.source_type.name().to_string())
}

/// Split on `! ? ;` and newlines, and on `.` only when followed by
/// whitespace or the end, so dates and numbering stay intact.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '!' | '?' | ';' | '\n' => true,
            '.' => chars.peek().is_none_or(|(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let piece = &text[start..i];
            if !piece.trim().is_empty() {
                out.push(piece);
            }
            start = i + c.len_utf8();
        }
    }
    let tail = &text[start..];
    if !tail.trim().is_empty() {
        out.push(tail);
    }
    out
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller index becomes root so roots track input order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
