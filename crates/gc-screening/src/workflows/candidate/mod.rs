//! Candidate fact schema shared by extraction and scoring.

pub mod conditions;
pub mod domain;

pub use conditions::{
    ComplicationCategory, ConditionCode, ConditionDomain, ConditionInfo, ConditionTier,
    CONDITION_TABLE,
};
pub use domain::{
    CandidateProfile, ComplicationEvidence, ComplicationRecord, EnvironmentalFactor,
    ExtractionLayer, LifestyleFactor, ParsingMetadata, PregnancyHistory, ProfileField,
    PsychologicalFactor,
};
