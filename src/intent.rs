//! Query intent classification and intent-based source routing.

use serde::{Deserialize, Serialize};

use crate::documents::extract_session_number;
use crate::text::tokenize;
use crate::types::SourceType;

/// What a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Council sessions, resolutions, protocols.
    SessionLookup,
    /// Statutes and regulations.
    LegalAct,
    /// Population, budget and labour statistics.
    Statistics,
    /// Companies and sole traders.
    BusinessLookup,
    /// Plots, zoning, maps.
    Spatial,
    General,
}

/// Token prefixes that vote for each intent.
const RULES: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::SessionLookup,
        &["sesj", "uchwał", "protokó", "porząd", "radn", "obrad", "interpelac"],
    ),
    (
        QueryIntent::LegalAct,
        &["ustaw", "rozporządz", "kodeks", "dziennik", "przepis", "prawn"],
    ),
    (
        QueryIntent::Statistics,
        &["statysty", "ludnoś", "mieszkańc", "bezrobo", "gus", "wskaźnik", "demograf", "dochod"],
    ),
    (
        QueryIntent::BusinessLookup,
        &["firm", "spółk", "krs", "nip", "regon", "ceidg", "przedsiębior", "działalnoś"],
    ),
    (
        QueryIntent::Spatial,
        &["działk", "zagospodarow", "geoportal", "map", "teryt", "ewidencj", "grunt", "mpzp"],
    ),
];

impl QueryIntent {
    /// Classify free text by keyword votes. A session number counts as two
    /// votes for [`QueryIntent::SessionLookup`]; ties go to the earlier
    /// rule; no votes means [`QueryIntent::General`].
    pub fn classify(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut best = (Self::General, 0usize);
        for (intent, stems) in RULES {
            let mut votes = tokens
                .iter()
                .filter(|t| stems.iter().any(|s| t.starts_with(*s)))
                .count();
            if *intent == Self::SessionLookup && extract_session_number(text).is_some() {
                votes += 2;
            }
            if votes > best.1 {
                best = (*intent, votes);
            }
        }
        best.0
    }

    /// Parse an externally supplied label. Unknown labels map to
    /// [`QueryIntent::General`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "session_lookup" | "session" => Self::SessionLookup,
            "legal_act" | "legal" => Self::LegalAct,
            "statistics" | "stats" => Self::Statistics,
            "business_lookup" | "business" => Self::BusinessLookup,
            "spatial" => Self::Spatial,
            _ => Self::General,
        }
    }

    /// Sources worth querying for this intent.
    pub fn preferred_sources(&self) -> &'static [SourceType] {
        match self {
            Self::SessionLookup => &[SourceType::LocalIndex, SourceType::LegalActs, SourceType::Web],
            Self::LegalAct => &[SourceType::LegalActs, SourceType::LocalIndex, SourceType::Web],
            Self::Statistics => &[SourceType::Statistics, SourceType::LocalIndex, SourceType::Web],
            Self::BusinessLookup => &[SourceType::BusinessRegistry, SourceType::Web],
            Self::Spatial => &[SourceType::Spatial, SourceType::LocalIndex, SourceType::Web],
            Self::General => SourceType::all(),
        }
    }
}
