use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::candidate::CandidateProfile;

/// Guideline risk classification, ordered from most to least favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Eligible,
    RequiresCounseling,
    HighRisk,
    Disqualified,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Eligible => "eligible",
            RiskLevel::RequiresCounseling => "requires counseling",
            RiskLevel::HighRisk => "high risk",
            RiskLevel::Disqualified => "disqualified",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RiskLevel::Eligible => "Candidate meets published gestational carrier guidelines",
            RiskLevel::RequiresCounseling => {
                "Candidate may proceed after counseling and additional documentation"
            }
            RiskLevel::HighRisk => {
                "Candidate carries elevated risk; specialist review required before matching"
            }
            RiskLevel::Disqualified => {
                "Candidate does not meet published gestational carrier guidelines"
            }
        }
    }
}

/// Estimated acceptance by a clinic, ordered from least to most favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceLevel {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    HighlyLikely,
}

impl AcceptanceLevel {
    pub fn label(self) -> &'static str {
        match self {
            AcceptanceLevel::VeryUnlikely => "very unlikely",
            AcceptanceLevel::Unlikely => "unlikely",
            AcceptanceLevel::Possible => "possible",
            AcceptanceLevel::Likely => "likely",
            AcceptanceLevel::HighlyLikely => "highly likely",
        }
    }
}

/// Likelihood that a maternal-fetal-medicine specialist clears the candidate, ordered from
/// least to most favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MfmLikelihood {
    LikelyDeny,
    UnlikelyApprove,
    PossiblyApprove,
    LikelyApprove,
}

impl MfmLikelihood {
    pub fn base_percentage(self) -> u8 {
        match self {
            MfmLikelihood::LikelyApprove => 85,
            MfmLikelihood::PossiblyApprove => 60,
            MfmLikelihood::UnlikelyApprove => 30,
            MfmLikelihood::LikelyDeny => 10,
        }
    }

    /// Lowest percentage still reported at this level.
    pub fn floor_percentage(self) -> u8 {
        match self {
            MfmLikelihood::LikelyApprove => 70,
            MfmLikelihood::PossiblyApprove => 40,
            MfmLikelihood::UnlikelyApprove => 15,
            MfmLikelihood::LikelyDeny => 0,
        }
    }

    pub fn downgrade(self) -> Self {
        match self {
            MfmLikelihood::LikelyApprove => MfmLikelihood::PossiblyApprove,
            MfmLikelihood::PossiblyApprove => MfmLikelihood::UnlikelyApprove,
            MfmLikelihood::UnlikelyApprove | MfmLikelihood::LikelyDeny => MfmLikelihood::LikelyDeny,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MfmLikelihood::LikelyApprove => "MFM clearance is likely",
            MfmLikelihood::PossiblyApprove => "MFM clearance is possible after detailed review",
            MfmLikelihood::UnlikelyApprove => "MFM clearance is unlikely",
            MfmLikelihood::LikelyDeny => "MFM is likely to advise against carrying",
        }
    }
}

/// Guideline group a finding belongs to. Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidelineCategory {
    Age,
    Bmi,
    PregnancyHistory,
    DeliveryHistory,
    PregnancyComplications,
    MedicalConditions,
    MentalHealth,
    Lifestyle,
    Environmental,
    CombinedRisk,
}

impl GuidelineCategory {
    pub fn label(self) -> &'static str {
        match self {
            GuidelineCategory::Age => "age",
            GuidelineCategory::Bmi => "BMI",
            GuidelineCategory::PregnancyHistory => "pregnancy history",
            GuidelineCategory::DeliveryHistory => "delivery history",
            GuidelineCategory::PregnancyComplications => "pregnancy complications",
            GuidelineCategory::MedicalConditions => "medical conditions",
            GuidelineCategory::MentalHealth => "mental health",
            GuidelineCategory::Lifestyle => "lifestyle",
            GuidelineCategory::Environmental => "environmental",
            GuidelineCategory::CombinedRisk => "combined risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFinding {
    pub status: RiskLevel,
    pub message: String,
    pub guideline: String,
}

impl CategoryFinding {
    pub fn new(status: RiskLevel, message: impl Into<String>, guideline: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            guideline: guideline.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallRisk {
    pub level: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicType {
    Strict,
    Moderate,
    Lenient,
}

impl ClinicType {
    pub const ALL: [ClinicType; 3] = [ClinicType::Strict, ClinicType::Moderate, ClinicType::Lenient];

    pub fn label(self) -> &'static str {
        match self {
            ClinicType::Strict => "strict",
            ClinicType::Moderate => "moderate",
            ClinicType::Lenient => "lenient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Minor,
    Moderate,
    Major,
    Disqualifying,
}

impl IssueSeverity {
    /// Burden contributed by the issue; disqualifying issues bypass the burden scale.
    pub fn weight(self) -> Option<u32> {
        match self {
            IssueSeverity::Minor => Some(1),
            IssueSeverity::Moderate => Some(2),
            IssueSeverity::Major => Some(4),
            IssueSeverity::Disqualifying => None,
        }
    }

    pub fn downgrade(self) -> Self {
        match self {
            IssueSeverity::Disqualifying => IssueSeverity::Disqualifying,
            IssueSeverity::Major => IssueSeverity::Moderate,
            IssueSeverity::Moderate | IssueSeverity::Minor => IssueSeverity::Minor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicTypeResult {
    pub acceptance_level: AcceptanceLevel,
    pub score: u8,
    pub issues: Vec<ClinicIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Approvability {
    Likely,
    Possible,
    Unlikely,
    Deny,
}

impl Approvability {
    pub fn likelihood(self) -> MfmLikelihood {
        match self {
            Approvability::Likely => MfmLikelihood::LikelyApprove,
            Approvability::Possible => MfmLikelihood::PossiblyApprove,
            Approvability::Unlikely => MfmLikelihood::UnlikelyApprove,
            Approvability::Deny => MfmLikelihood::LikelyDeny,
        }
    }

    pub fn is_concerning(self) -> bool {
        self >= Approvability::Possible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MfmReviewLevel {
    NotRequired,
    Standard,
    Comprehensive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfmFinding {
    pub category: String,
    pub concern: String,
    pub mfm_view: String,
    pub approvability: Approvability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfmLikelihoodEstimate {
    pub level: MfmLikelihood,
    pub description: String,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfmAssessment {
    pub consultation_needed: bool,
    pub review_level: MfmReviewLevel,
    pub likelihood: MfmLikelihoodEstimate,
    pub findings: Vec<MfmFinding>,
}

/// Complete, self-describing scoring output. Holds no timestamps so identical profiles
/// always produce identical results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub overall_risk: OverallRisk,
    pub category_summaries: BTreeMap<GuidelineCategory, Vec<CategoryFinding>>,
    pub clinic_type_analysis: BTreeMap<ClinicType, ClinicTypeResult>,
    pub mfm_assessment: MfmAssessment,
    pub recommendations: Vec<String>,
}

/// Envelope handed to report rendering and HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub profile: CandidateProfile,
    pub result: AssessmentResult,
}

impl AssessmentReport {
    /// Display name is cosmetic and never influences scoring.
    pub fn stamp_display_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let trimmed = name.trim();
        self.profile.display_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
}
