mod config;
mod policy;
mod rules;

pub use config::GuidelineConfig;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CategoryFinding, GuidelineCategory, OverallRisk};
use crate::workflows::candidate::CandidateProfile;

/// Stateless guideline evaluator.
#[derive(Debug, Clone, Default)]
pub struct AssessmentEngine {
    config: GuidelineConfig,
}

impl AssessmentEngine {
    pub fn new(config: GuidelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuidelineConfig {
        &self.config
    }

    pub fn assess(&self, profile: &CandidateProfile) -> GuidelineAssessment {
        let mut category_summaries = rules::evaluate_profile(profile, &self.config);
        policy::apply_combination_rule(&mut category_summaries);

        let overall_risk = policy::overall_risk(&category_summaries);
        let recommendations = policy::recommendations(profile, &category_summaries);

        GuidelineAssessment {
            overall_risk,
            category_summaries,
            recommendations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidelineAssessment {
    pub overall_risk: OverallRisk,
    pub category_summaries: BTreeMap<GuidelineCategory, Vec<CategoryFinding>>,
    pub recommendations: Vec<String>,
}
