//! Acceptance estimates for three clinic archetypes that read the same guidelines with
//! different tolerance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{AcceptanceLevel, ClinicIssue, ClinicType, ClinicTypeResult, IssueSeverity};
use super::format_measure;
use crate::workflows::candidate::{
    CandidateProfile, ConditionTier, EnvironmentalFactor, LifestyleFactor, PsychologicalFactor,
};

const CASE_BY_CASE_NOTE: &str = " (reviewed case by case)";
const DISQUALIFIED_SCORE_CAP: u8 = 10;

/// How a clinic compounds several non-disqualifying issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationPolicy {
    Exponential,
    Additive,
    CaseByCase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicThresholds {
    pub minimum_age: u8,
    pub preferred_max_age: u8,
    pub hard_max_age: u8,
    pub bmi_floor: f64,
    pub bmi_ceiling: f64,
    pub bmi_hard_limit: f64,
    pub max_cesareans: u32,
    pub max_deliveries: u32,
    pub max_complications: u32,
    pub combination: CombinationPolicy,
}

impl ClinicThresholds {
    pub fn for_type(clinic: ClinicType) -> Self {
        match clinic {
            ClinicType::Strict => Self {
                minimum_age: 21,
                preferred_max_age: 39,
                hard_max_age: 42,
                bmi_floor: 19.0,
                bmi_ceiling: 30.0,
                bmi_hard_limit: 32.0,
                max_cesareans: 2,
                max_deliveries: 5,
                max_complications: 0,
                combination: CombinationPolicy::Exponential,
            },
            ClinicType::Moderate => Self {
                minimum_age: 21,
                preferred_max_age: 42,
                hard_max_age: 45,
                bmi_floor: 18.5,
                bmi_ceiling: 32.0,
                bmi_hard_limit: 35.0,
                max_cesareans: 3,
                max_deliveries: 5,
                max_complications: 1,
                combination: CombinationPolicy::Additive,
            },
            ClinicType::Lenient => Self {
                minimum_age: 21,
                preferred_max_age: 45,
                hard_max_age: 47,
                bmi_floor: 18.0,
                bmi_ceiling: 35.0,
                bmi_hard_limit: 40.0,
                max_cesareans: 3,
                max_deliveries: 6,
                max_complications: 2,
                combination: CombinationPolicy::CaseByCase,
            },
        }
    }
}

/// Severity a clinic assigns to a condition tier.
fn tier_severity(clinic: ClinicType, tier: ConditionTier) -> IssueSeverity {
    use ClinicType::{Lenient, Moderate, Strict};
    use IssueSeverity::{Disqualifying, Major, Minor, Moderate as Mod};

    match (tier, clinic) {
        (ConditionTier::Disqualifying, _) => Disqualifying,
        (ConditionTier::Complex, Strict) => Disqualifying,
        (ConditionTier::Complex, Moderate | Lenient) => Major,
        (ConditionTier::Significant, Strict | Moderate) => Major,
        (ConditionTier::Significant, Lenient) => Mod,
        (ConditionTier::ReviewRequired, Strict) => Major,
        (ConditionTier::ReviewRequired, Moderate | Lenient) => Mod,
        (ConditionTier::Minor, Strict) => Mod,
        (ConditionTier::Minor, Moderate | Lenient) => Minor,
    }
}

/// Psychosocial flags every clinic screens, with strict/moderate/lenient severities.
struct FactorSeverity<K> {
    factor: K,
    trigger: bool,
    message: &'static str,
    severities: [IssueSeverity; 3],
}

const LIFESTYLE_SEVERITIES: &[FactorSeverity<LifestyleFactor>] = &[
    FactorSeverity {
        factor: LifestyleFactor::CurrentSmoker,
        trigger: true,
        message: "Current tobacco or nicotine use",
        severities: [IssueSeverity::Disqualifying; 3],
    },
    FactorSeverity {
        factor: LifestyleFactor::IllicitDrugUse,
        trigger: true,
        message: "Illicit drug use",
        severities: [IssueSeverity::Disqualifying; 3],
    },
    FactorSeverity {
        factor: LifestyleFactor::HeavyAlcoholUse,
        trigger: true,
        message: "Heavy alcohol use",
        severities: [IssueSeverity::Disqualifying, IssueSeverity::Major, IssueSeverity::Major],
    },
    FactorSeverity {
        factor: LifestyleFactor::MarijuanaUse,
        trigger: true,
        message: "Marijuana use",
        severities: [IssueSeverity::Major, IssueSeverity::Moderate, IssueSeverity::Minor],
    },
];

const PSYCHOLOGICAL_SEVERITIES: &[FactorSeverity<PsychologicalFactor>] = &[
    FactorSeverity {
        factor: PsychologicalFactor::PsychiatricHospitalization,
        trigger: true,
        message: "Prior psychiatric hospitalization",
        severities: [IssueSeverity::Disqualifying, IssueSeverity::Major, IssueSeverity::Major],
    },
    FactorSeverity {
        factor: PsychologicalFactor::AdequateSupportSystem,
        trigger: false,
        message: "Limited support system",
        severities: [IssueSeverity::Major, IssueSeverity::Moderate, IssueSeverity::Minor],
    },
];

const ENVIRONMENTAL_SEVERITIES: &[FactorSeverity<EnvironmentalFactor>] = &[
    FactorSeverity {
        factor: EnvironmentalFactor::DomesticViolence,
        trigger: true,
        message: "Domestic violence in the household",
        severities: [IssueSeverity::Disqualifying; 3],
    },
    FactorSeverity {
        factor: EnvironmentalFactor::ReceivingPublicAssistance,
        trigger: true,
        message: "Receiving public assistance",
        severities: [IssueSeverity::Disqualifying, IssueSeverity::Major, IssueSeverity::Moderate],
    },
    FactorSeverity {
        factor: EnvironmentalFactor::CriminalHistory,
        trigger: true,
        message: "Criminal history",
        severities: [IssueSeverity::Major, IssueSeverity::Major, IssueSeverity::Moderate],
    },
    FactorSeverity {
        factor: EnvironmentalFactor::StableHousing,
        trigger: false,
        message: "Housing instability",
        severities: [IssueSeverity::Major, IssueSeverity::Moderate, IssueSeverity::Minor],
    },
];

fn clinic_index(clinic: ClinicType) -> usize {
    match clinic {
        ClinicType::Strict => 0,
        ClinicType::Moderate => 1,
        ClinicType::Lenient => 2,
    }
}

fn factor_issues<K: Copy>(
    clinic: ClinicType,
    table: &[FactorSeverity<K>],
    flag: impl Fn(K) -> Option<bool>,
    issues: &mut Vec<ClinicIssue>,
) {
    for entry in table {
        if flag(entry.factor) == Some(entry.trigger) {
            issues.push(ClinicIssue {
                severity: entry.severities[clinic_index(clinic)],
                message: entry.message.to_string(),
            });
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClinicTypeScorer;

impl ClinicTypeScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score_by_clinic_type(
        &self,
        profile: &CandidateProfile,
    ) -> BTreeMap<ClinicType, ClinicTypeResult> {
        let mut results: BTreeMap<ClinicType, ClinicTypeResult> = ClinicType::ALL
            .into_iter()
            .map(|clinic| (clinic, score_clinic(clinic, profile)))
            .collect();

        enforce_monotone(&mut results, ClinicType::Moderate, ClinicType::Lenient);
        enforce_monotone(&mut results, ClinicType::Strict, ClinicType::Moderate);
        results
    }
}

/// Caps `stricter` at the acceptance and score of `looser`. A cap that changes the result is
/// recorded as an issue so the list still explains the level.
pub(crate) fn enforce_monotone(
    results: &mut BTreeMap<ClinicType, ClinicTypeResult>,
    stricter: ClinicType,
    looser: ClinicType,
) {
    let Some((cap_level, cap_score, cap_severity)) = results.get(&looser).map(|result| {
        let severity = result
            .issues
            .iter()
            .map(|issue| issue.severity)
            .max()
            .unwrap_or(IssueSeverity::Moderate);
        (result.acceptance_level, result.score, severity)
    }) else {
        return;
    };
    let Some(result) = results.get_mut(&stricter) else {
        return;
    };

    let level = result.acceptance_level.min(cap_level);
    let score = result.score.min(cap_score);
    if level == result.acceptance_level && score == result.score {
        return;
    }

    result.acceptance_level = level;
    result.score = score;
    result.issues.push(ClinicIssue {
        severity: cap_severity,
        message: format!(
            "Held to the {} clinic estimate ({}, score {score})",
            looser.label(),
            level.label()
        ),
    });
}

pub(crate) fn clinic_issues(clinic: ClinicType, profile: &CandidateProfile) -> Vec<ClinicIssue> {
    let thresholds = ClinicThresholds::for_type(clinic);
    let label = clinic.label();
    let mut issues = Vec::new();

    if let Some(age) = profile.age {
        if age < thresholds.minimum_age {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Disqualifying,
                message: format!("Age {age} below minimum of {}", thresholds.minimum_age),
            });
        } else if age > thresholds.hard_max_age {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Disqualifying,
                message: format!(
                    "Age {age} exceeds {label} program maximum of {}",
                    thresholds.hard_max_age
                ),
            });
        } else if age > thresholds.preferred_max_age {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Moderate,
                message: format!(
                    "Age {age} above {label} preferred maximum of {}",
                    thresholds.preferred_max_age
                ),
            });
        }
    }

    if let Some(bmi) = profile.bmi.filter(|value| value.is_finite() && *value > 0.0) {
        let shown = format_measure(bmi);
        if bmi > thresholds.bmi_hard_limit {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Disqualifying,
                message: format!(
                    "BMI {shown} exceeds {label} program ceiling of {} and hard limit of {}",
                    format_measure(thresholds.bmi_ceiling),
                    format_measure(thresholds.bmi_hard_limit)
                ),
            });
        } else if bmi > thresholds.bmi_ceiling {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Major,
                message: format!(
                    "BMI {shown} exceeds {label} program ceiling of {}",
                    format_measure(thresholds.bmi_ceiling)
                ),
            });
        } else if bmi < thresholds.bmi_floor {
            issues.push(ClinicIssue {
                severity: IssueSeverity::Moderate,
                message: format!(
                    "BMI {shown} below {label} program floor of {}",
                    format_measure(thresholds.bmi_floor)
                ),
            });
        }
    }

    let history = &profile.pregnancy_history;
    if history.number_of_cesareans > thresholds.max_cesareans {
        issues.push(ClinicIssue {
            severity: IssueSeverity::Disqualifying,
            message: format!(
                "{} cesarean deliveries exceed {label} limit of {}",
                history.number_of_cesareans, thresholds.max_cesareans
            ),
        });
    }
    if history.total_deliveries > thresholds.max_deliveries {
        issues.push(ClinicIssue {
            severity: IssueSeverity::Major,
            message: format!(
                "{} deliveries exceed {label} limit of {}",
                history.total_deliveries, thresholds.max_deliveries
            ),
        });
    }
    if history.number_of_complications > thresholds.max_complications {
        issues.push(ClinicIssue {
            severity: IssueSeverity::Major,
            message: format!(
                "{} pregnancy complication(s) exceed {label} tolerance of {}",
                history.number_of_complications, thresholds.max_complications
            ),
        });
    }

    for code in &profile.medical_conditions {
        issues.push(ClinicIssue {
            severity: tier_severity(clinic, code.tier()),
            message: code.label().to_string(),
        });
    }

    factor_issues(
        clinic,
        LIFESTYLE_SEVERITIES,
        |factor| profile.lifestyle_flag(factor),
        &mut issues,
    );
    factor_issues(
        clinic,
        PSYCHOLOGICAL_SEVERITIES,
        |factor| profile.psychological_flag(factor),
        &mut issues,
    );
    factor_issues(
        clinic,
        ENVIRONMENTAL_SEVERITIES,
        |factor| profile.environmental_flag(factor),
        &mut issues,
    );

    issues
}

fn score_clinic(clinic: ClinicType, profile: &CandidateProfile) -> ClinicTypeResult {
    let thresholds = ClinicThresholds::for_type(clinic);
    let mut issues = clinic_issues(clinic, profile);

    let disqualified = issues
        .iter()
        .any(|issue| issue.severity == IssueSeverity::Disqualifying);

    if thresholds.combination == CombinationPolicy::CaseByCase && !disqualified {
        if let [issue] = issues.as_mut_slice() {
            issue.severity = issue.severity.downgrade();
            issue.message.push_str(CASE_BY_CASE_NOTE);
        }
    }

    let burden = issue_burden(&issues, thresholds.combination);
    let acceptance_level = acceptance_for(&issues, burden);

    let mut score = (100.0 - 8.0 * burden).round().clamp(0.0, 100.0) as u8;
    if disqualified {
        score = score.min(DISQUALIFIED_SCORE_CAP);
    }

    ClinicTypeResult {
        acceptance_level,
        score,
        issues,
    }
}

pub(crate) fn issue_burden(issues: &[ClinicIssue], policy: CombinationPolicy) -> f64 {
    let weights: Vec<u32> = issues
        .iter()
        .filter_map(|issue| issue.severity.weight())
        .collect();
    let sum: u32 = weights.iter().sum();

    match policy {
        CombinationPolicy::Exponential if weights.len() > 1 => {
            f64::from(sum) * 1.5_f64.powi(weights.len() as i32 - 1)
        }
        CombinationPolicy::Exponential | CombinationPolicy::Additive | CombinationPolicy::CaseByCase => {
            f64::from(sum)
        }
    }
}

pub(crate) fn acceptance_for(issues: &[ClinicIssue], burden: f64) -> AcceptanceLevel {
    if issues.is_empty() {
        return AcceptanceLevel::HighlyLikely;
    }
    if issues
        .iter()
        .any(|issue| issue.severity == IssueSeverity::Disqualifying)
    {
        return AcceptanceLevel::VeryUnlikely;
    }

    if burden <= 2.0 {
        AcceptanceLevel::Likely
    } else if burden <= 5.0 {
        AcceptanceLevel::Possible
    } else if burden <= 9.0 {
        AcceptanceLevel::Unlikely
    } else {
        AcceptanceLevel::VeryUnlikely
    }
}
