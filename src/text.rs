//! Text helpers shared by the scorer, the cross-referencer and the index.

use std::collections::BTreeSet;

/// Function words ignored by overlap measures (Polish and English).
const STOPWORDS: &[&str] = &[
    "a", "aby", "ale", "an", "and", "are", "as", "at", "be", "by", "co", "czy", "dla", "do",
    "for", "from", "i", "in", "is", "it", "jak", "jest", "na", "o", "od", "of", "on", "or",
    "oraz", "po", "przez", "się", "sa", "są", "that", "the", "to", "w", "was", "we", "which",
    "with", "z", "za", "ze", "że",
];

/// Words that invert the polarity of the sentence they occur in.
pub const NEGATION_MARKERS: &[&str] = &[
    "not", "no", "never", "false", "denied", "denies", "untrue", "nie", "nigdy", "brak",
    "fałsz", "nieprawda", "zaprzecza", "zaprzeczył", "zaprzeczyła", "dementuje", "odrzucono",
];

/// Lowercase and split on anything that is not a letter or digit.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether a lowercased token is a stopword.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Whether a lowercased token is a negation marker.
pub fn is_negation(token: &str) -> bool {
    NEGATION_MARKERS.contains(&token)
}

/// Content-bearing word set: tokens minus stopwords and negation markers.
pub fn content_words(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stopword(t) && !is_negation(t))
        .collect()
}

/// Jaccard similarity of two word sets. Two empty sets score 0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Share of `needles` found in `haystack` (0 when `needles` is empty).
pub fn coverage(needles: &BTreeSet<String>, haystack: &BTreeSet<String>) -> f64 {
    if needles.is_empty() {
        return 0.0;
    }
    needles.intersection(haystack).count() as f64 / needles.len() as f64
}

/// Lowercase, collapse whitespace and strip punctuation for keying.
pub fn normalize_title(title: &str) -> String {
    tokenize(title).join(" ")
}
