//! Local document scoring: session numbering, document types and the
//! relevance scorer used both for listings and by the local-index source.

pub mod scorer;
pub mod session;
pub mod types;

pub use scorer::{DocumentRelevanceScorer, DocumentScoringSettings, ScoringQuery, document_session};
pub use session::{arabic_to_session_numeral, extract_session_number, session_numeral_to_arabic};
pub use types::{
    Document, DocumentCategory, DocumentScore, DocumentSignals, Priority, ScoringDetails,
};
