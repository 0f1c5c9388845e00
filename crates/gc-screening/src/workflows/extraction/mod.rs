//! Cascading fact extraction: deterministic patterns, glossary lookup and an optional
//! external extractor, merged into one [`CandidateProfile`].

mod cascade;
pub mod confidence;
pub mod external;
pub mod glossary;
pub mod input;
mod merge;
mod negation;
mod normalizer;
pub mod patterns;
mod vocabulary;

pub use cascade::{CascadeController, ExtractionOptions};
pub use external::{
    ExternalExtractionError, ExternalExtractor, ExternalProfilePayload, HttpExtractionAdapter,
};
pub use glossary::{Glossary, GlossaryEntry, GlossaryError, GlossaryMapper, GlossarySeverity};
pub use input::{
    combine_documents, AssessmentInput, DecodedDocument, DocumentDecoder, InputError,
    PlainTextDecoder, SourceDocument,
};
pub use patterns::PatternExtractor;

pub(crate) use cascade::finalize;

use crate::workflows::candidate::{CandidateProfile, ExtractionLayer};

/// Fields one layer recovered, each stamped with its own confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialExtraction {
    pub layer: ExtractionLayer,
    pub profile: CandidateProfile,
}

/// One deterministic layer of the cascade. Implementations never fail; text they cannot read
/// simply leaves fields unset.
pub trait ExtractionStrategy: Send + Sync {
    fn layer(&self) -> ExtractionLayer;

    fn try_extract(&self, text: &str, current: &CandidateProfile) -> PartialExtraction;
}
