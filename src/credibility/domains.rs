//! Static domain-trust table.
//!
//! Hosts are matched against patterns either by suffix (the pattern equals
//! the host or is a parent domain of it) or by substring (`bip.` catches
//! every municipal public-information bulletin). The longest matching
//! pattern wins, so `isap.sejm.gov.pl` beats `gov.pl`.

use serde::{Deserialize, Serialize};

/// Trust given to hosts not present in the table.
pub const NEUTRAL_TRUST: f64 = 0.5;

/// Editorial category of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainCategory {
    /// Government, parliament, EU institutions, public bulletins.
    Government,
    /// Universities and research institutes.
    Academic,
    /// Established press and news agencies.
    Press,
    /// Community-edited reference works.
    Encyclopedia,
    /// Social networks and other user-generated content.
    UserGenerated,
    /// Sites documented as publishing fabricated news.
    Unreliable,
    /// Declared satire.
    Satire,
    /// Not in the table.
    Unknown,
}

impl DomainCategory {
    /// Hard ceiling on the blended credibility for this category.
    ///
    /// Satire and fabricated-news sites stay untrusted no matter how well
    /// written the page is.
    pub fn overall_ceiling(&self) -> f64 {
        match self {
            Self::Unreliable => 0.15,
            Self::Satire => 0.25,
            Self::Government
            | Self::Academic
            | Self::Press
            | Self::Encyclopedia
            | Self::UserGenerated
            | Self::Unknown => 1.0,
        }
    }
}

/// How a pattern is compared against a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Host equals the pattern or ends with `.` + pattern.
    Suffix,
    /// Host contains the pattern anywhere.
    Contains,
}

/// One row of the trust table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Domain or substring pattern, lowercase.
    pub pattern: String,
    /// Trust in `[0, 1]`.
    pub trust: f64,
    /// Editorial category.
    pub category: DomainCategory,
    /// Comparison mode.
    #[serde(default = "suffix")]
    pub match_kind: MatchKind,
}

fn suffix() -> MatchKind {
    MatchKind::Suffix
}

impl DomainEntry {
    fn matches(&self, host: &str) -> bool {
        match self.match_kind {
            MatchKind::Suffix => {
                host == self.pattern
                    || host
                        .strip_suffix(self.pattern.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
            MatchKind::Contains => host.contains(self.pattern.as_str()),
        }
    }
}

/// Result of a table lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMatch {
    /// Trust in `[0, 1]`.
    pub trust: f64,
    /// Category of the matched entry, [`DomainCategory::Unknown`] if none.
    pub category: DomainCategory,
    /// The pattern that matched.
    pub pattern: Option<String>,
}

/// Trust table: built-in rows plus configured extras.
#[derive(Debug, Clone)]
pub struct DomainTable {
    entries: Vec<DomainEntry>,
}

const BUILTIN: &[(&str, f64, DomainCategory, MatchKind)] = &[
    ("gov.pl", 0.95, DomainCategory::Government, MatchKind::Suffix),
    ("sejm.gov.pl", 0.97, DomainCategory::Government, MatchKind::Suffix),
    ("isap.sejm.gov.pl", 0.98, DomainCategory::Government, MatchKind::Suffix),
    ("stat.gov.pl", 0.97, DomainCategory::Government, MatchKind::Suffix),
    ("dziennikustaw.gov.pl", 0.98, DomainCategory::Government, MatchKind::Suffix),
    ("europa.eu", 0.95, DomainCategory::Government, MatchKind::Suffix),
    ("bip.", 0.9, DomainCategory::Government, MatchKind::Contains),
    ("edu.pl", 0.8, DomainCategory::Academic, MatchKind::Suffix),
    ("pan.pl", 0.85, DomainCategory::Academic, MatchKind::Suffix),
    ("pap.pl", 0.85, DomainCategory::Press, MatchKind::Suffix),
    ("rp.pl", 0.8, DomainCategory::Press, MatchKind::Suffix),
    ("gazetaprawna.pl", 0.8, DomainCategory::Press, MatchKind::Suffix),
    ("prawo.pl", 0.8, DomainCategory::Press, MatchKind::Suffix),
    ("polskieradio.pl", 0.75, DomainCategory::Press, MatchKind::Suffix),
    ("tvn24.pl", 0.75, DomainCategory::Press, MatchKind::Suffix),
    ("wyborcza.pl", 0.75, DomainCategory::Press, MatchKind::Suffix),
    ("bankier.pl", 0.75, DomainCategory::Press, MatchKind::Suffix),
    ("money.pl", 0.7, DomainCategory::Press, MatchKind::Suffix),
    ("onet.pl", 0.65, DomainCategory::Press, MatchKind::Suffix),
    ("wp.pl", 0.6, DomainCategory::Press, MatchKind::Suffix),
    ("interia.pl", 0.6, DomainCategory::Press, MatchKind::Suffix),
    ("reuters.com", 0.9, DomainCategory::Press, MatchKind::Suffix),
    ("apnews.com", 0.9, DomainCategory::Press, MatchKind::Suffix),
    ("bbc.com", 0.85, DomainCategory::Press, MatchKind::Suffix),
    ("wikipedia.org", 0.7, DomainCategory::Encyclopedia, MatchKind::Suffix),
    ("facebook.com", 0.35, DomainCategory::UserGenerated, MatchKind::Suffix),
    ("x.com", 0.35, DomainCategory::UserGenerated, MatchKind::Suffix),
    ("twitter.com", 0.35, DomainCategory::UserGenerated, MatchKind::Suffix),
    ("tiktok.com", 0.3, DomainCategory::UserGenerated, MatchKind::Suffix),
    ("wykop.pl", 0.35, DomainCategory::UserGenerated, MatchKind::Suffix),
    ("infowars.com", 0.1, DomainCategory::Unreliable, MatchKind::Suffix),
    ("naturalnews.com", 0.1, DomainCategory::Unreliable, MatchKind::Suffix),
    ("beforeitsnews.com", 0.1, DomainCategory::Unreliable, MatchKind::Suffix),
    ("aszdziennik.pl", 0.1, DomainCategory::Satire, MatchKind::Suffix),
    ("theonion.com", 0.1, DomainCategory::Satire, MatchKind::Suffix),
    ("babylonbee.com", 0.1, DomainCategory::Satire, MatchKind::Suffix),
    ("thedailymash.co.uk", 0.1, DomainCategory::Satire, MatchKind::Suffix),
];

impl Default for DomainTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DomainTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(pattern, trust, category, match_kind)| DomainEntry {
                pattern: pattern.to_string(),
                trust,
                category,
                match_kind,
            })
            .collect();
        Self { entries }
    }

    /// Add configured rows. Extras are consulted alongside the built-ins;
    /// an extra with the same pattern replaces the built-in row.
    #[must_use]
    pub fn with_extra(mut self, extra: &[DomainEntry]) -> Self {
        for entry in extra {
            let mut entry = entry.clone();
            entry.pattern = entry.pattern.to_lowercase();
            entry.trust = entry.trust.clamp(0.0, 1.0);
            self.entries.retain(|e| e.pattern != entry.pattern);
            self.entries.push(entry);
        }
        self
    }

    /// Look up a host (case-insensitive, leading `www.` ignored).
    pub fn lookup(&self, host: &str) -> DomainMatch {
        let host = host.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        self.entries
            .iter()
            .filter(|e| e.matches(host))
            .max_by_key(|e| e.pattern.len())
            .map_or(
                DomainMatch {
                    trust: NEUTRAL_TRUST,
                    category: DomainCategory::Unknown,
                    pattern: None,
                },
                |e| DomainMatch {
                    trust: e.trust,
                    category: e.category,
                    pattern: Some(e.pattern.clone()),
                },
            )
    }
}
