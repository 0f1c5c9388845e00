//! Guideline scoring, clinic-type differentials and MFM referral estimates over an extracted
//! [`CandidateProfile`](crate::workflows::candidate::CandidateProfile).

pub mod clinic;
pub mod domain;
pub mod guidelines;
pub mod mfm;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clinic::{ClinicThresholds, ClinicTypeScorer, CombinationPolicy};
pub use domain::{
    AcceptanceLevel, Approvability, AssessmentReport, AssessmentResult, CategoryFinding,
    ClinicIssue, ClinicType, ClinicTypeResult, GuidelineCategory, IssueSeverity, MfmAssessment,
    MfmFinding, MfmLikelihood, MfmLikelihoodEstimate, MfmReviewLevel, OverallRisk, RiskLevel,
};
pub use guidelines::{AssessmentEngine, GuidelineAssessment, GuidelineConfig};
pub use mfm::MfmAssessor;
pub use router::{assessment_router, AssessmentRequest, AssessmentResponse, ExtractionRequest};
pub use service::ScreeningService;

/// Whole numbers print without a decimal, everything else with one.
pub(crate) fn format_measure(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
