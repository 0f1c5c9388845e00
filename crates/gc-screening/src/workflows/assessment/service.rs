use std::sync::Arc;

use tracing::info;

use super::clinic::ClinicTypeScorer;
use super::domain::{AssessmentReport, AssessmentResult};
use super::guidelines::{AssessmentEngine, GuidelineConfig};
use super::mfm::MfmAssessor;
use crate::config::ExtractionConfig;
use crate::workflows::candidate::CandidateProfile;
use crate::workflows::extraction::{
    AssessmentInput, CascadeController, ExtractionOptions, GlossaryError,
};

/// Service composing the extraction cascade, guideline engine, clinic scorer and MFM assessor.
pub struct ScreeningService {
    cascade: Arc<CascadeController>,
    engine: Arc<AssessmentEngine>,
    clinics: ClinicTypeScorer,
    mfm: MfmAssessor,
}

impl ScreeningService {
    pub fn new(cascade: CascadeController, config: GuidelineConfig) -> Self {
        Self {
            cascade: Arc::new(cascade),
            engine: Arc::new(AssessmentEngine::new(config)),
            clinics: ClinicTypeScorer::new(),
            mfm: MfmAssessor::new(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, GlossaryError> {
        let cascade = CascadeController::from_config(config)?;
        Ok(Self::new(cascade, GuidelineConfig::default()))
    }

    pub fn cascade(&self) -> &CascadeController {
        &self.cascade
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    /// Narrative to profile without scoring.
    pub async fn extract(&self, text: &str, options: &ExtractionOptions) -> CandidateProfile {
        self.cascade.extract(text, options).await
    }

    /// Extract (when needed) and score one candidate.
    pub async fn assess(
        &self,
        input: AssessmentInput,
        options: &ExtractionOptions,
    ) -> AssessmentReport {
        let profile = match input {
            AssessmentInput::Narrative(text) => self.cascade.extract(&text, options).await,
            AssessmentInput::Structured(profile) => *profile,
        };
        let result = self.assess_profile(&profile);

        info!(
            risk = result.overall_risk.level.label(),
            confidence = profile.parsing_metadata.final_confidence,
            gaps = profile.documentation_gaps.len(),
            "candidate assessed"
        );

        AssessmentReport { profile, result }
    }

    /// Pure scoring: identical profiles always yield identical results.
    pub fn assess_profile(&self, profile: &CandidateProfile) -> AssessmentResult {
        let guidelines = self.engine.assess(profile);

        AssessmentResult {
            overall_risk: guidelines.overall_risk,
            category_summaries: guidelines.category_summaries,
            clinic_type_analysis: self.clinics.score_by_clinic_type(profile),
            mfm_assessment: self.mfm.assess_mfm(profile),
            recommendations: guidelines.recommendations,
        }
    }
}
