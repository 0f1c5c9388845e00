use std::collections::BTreeMap;

use super::super::domain::{CategoryFinding, GuidelineCategory, RiskLevel};
use super::super::format_measure;
use super::config::GuidelineConfig;
use crate::workflows::candidate::{
    CandidateProfile, ConditionCode, ConditionDomain, ConditionTier, EnvironmentalFactor,
    LifestyleFactor, ProfileField, PsychologicalFactor,
};

pub(crate) type CategorySummaries = BTreeMap<GuidelineCategory, Vec<CategoryFinding>>;

/// Factor value that raises a finding, with its status, message and guideline text.
struct FactorRule<K> {
    factor: K,
    trigger: bool,
    status: RiskLevel,
    message: &'static str,
    guideline: &'static str,
}

const PSYCHOLOGICAL_RULES: &[FactorRule<PsychologicalFactor>] = &[
    FactorRule {
        factor: PsychologicalFactor::PsychiatricHospitalization,
        trigger: true,
        status: RiskLevel::HighRisk,
        message: "Prior psychiatric hospitalization",
        guideline: "Psychiatric hospitalization history requires evaluation by a licensed mental health professional",
    },
    FactorRule {
        factor: PsychologicalFactor::CurrentPsychotropicMedication,
        trigger: true,
        status: RiskLevel::RequiresCounseling,
        message: "Currently taking psychotropic medication",
        guideline: "Review medication safety in pregnancy with the prescribing clinician",
    },
    FactorRule {
        factor: PsychologicalFactor::HistoryOfAbuse,
        trigger: true,
        status: RiskLevel::RequiresCounseling,
        message: "History of abuse reported",
        guideline: "Trauma-informed psychological counseling recommended before matching",
    },
    FactorRule {
        factor: PsychologicalFactor::AdequateSupportSystem,
        trigger: false,
        status: RiskLevel::RequiresCounseling,
        message: "Limited support system reported",
        guideline: "ASRM: carriers should have a stable support system; explore support during counseling",
    },
    FactorRule {
        factor: PsychologicalFactor::PsychologicalEvaluationCompleted,
        trigger: false,
        status: RiskLevel::RequiresCounseling,
        message: "Psychological evaluation not yet completed",
        guideline: "ASRM: complete a psychological evaluation by a qualified mental health professional",
    },
];

const LIFESTYLE_RULES: &[FactorRule<LifestyleFactor>] = &[
    FactorRule {
        factor: LifestyleFactor::CurrentSmoker,
        trigger: true,
        status: RiskLevel::Disqualified,
        message: "Current tobacco or nicotine use",
        guideline: "ASRM: carriers must not use tobacco or nicotine during the cycle and pregnancy",
    },
    FactorRule {
        factor: LifestyleFactor::IllicitDrugUse,
        trigger: true,
        status: RiskLevel::Disqualified,
        message: "Illicit drug use reported",
        guideline: "ASRM: illicit drug use excludes gestational carriage",
    },
    FactorRule {
        factor: LifestyleFactor::HeavyAlcoholUse,
        trigger: true,
        status: RiskLevel::HighRisk,
        message: "Heavy alcohol use reported",
        guideline: "Substance use assessment required; alcohol must be avoided in pregnancy",
    },
    FactorRule {
        factor: LifestyleFactor::MarijuanaUse,
        trigger: true,
        status: RiskLevel::RequiresCounseling,
        message: "Marijuana use reported",
        guideline: "Counsel on cessation; most programs require abstinence and negative toxicology",
    },
    FactorRule {
        factor: LifestyleFactor::FormerSmoker,
        trigger: true,
        status: RiskLevel::Eligible,
        message: "Former smoker",
        guideline: "Confirm sustained tobacco cessation",
    },
];

const ENVIRONMENTAL_RULES: &[FactorRule<EnvironmentalFactor>] = &[
    FactorRule {
        factor: EnvironmentalFactor::DomesticViolence,
        trigger: true,
        status: RiskLevel::Disqualified,
        message: "Domestic violence in the household",
        guideline: "Active domestic violence excludes matching until resolved",
    },
    FactorRule {
        factor: EnvironmentalFactor::ReceivingPublicAssistance,
        trigger: true,
        status: RiskLevel::HighRisk,
        message: "Receiving public assistance",
        guideline: "Most programs require carriers to be financially independent of public assistance",
    },
    FactorRule {
        factor: EnvironmentalFactor::CriminalHistory,
        trigger: true,
        status: RiskLevel::HighRisk,
        message: "Criminal history reported",
        guideline: "Background check review required by the matching agency",
    },
    FactorRule {
        factor: EnvironmentalFactor::StableHousing,
        trigger: false,
        status: RiskLevel::RequiresCounseling,
        message: "Housing instability reported",
        guideline: "Confirm stable living arrangements before matching",
    },
    FactorRule {
        factor: EnvironmentalFactor::FinancialStability,
        trigger: false,
        status: RiskLevel::RequiresCounseling,
        message: "Financial instability reported",
        guideline: "ASRM: compensation should not be the carrier's sole means of support; verify financial stability",
    },
];

pub(crate) fn evaluate_profile(
    profile: &CandidateProfile,
    config: &GuidelineConfig,
) -> CategorySummaries {
    let mut summaries = BTreeMap::new();
    summaries.insert(GuidelineCategory::Age, evaluate_age(profile, config));
    summaries.insert(GuidelineCategory::Bmi, evaluate_bmi(profile, config));
    summaries.insert(
        GuidelineCategory::PregnancyHistory,
        evaluate_pregnancy_history(profile),
    );
    summaries.insert(
        GuidelineCategory::DeliveryHistory,
        evaluate_delivery_history(profile, config),
    );
    summaries.insert(
        GuidelineCategory::PregnancyComplications,
        evaluate_conditions(profile, GuidelineCategory::PregnancyComplications),
    );
    summaries.insert(
        GuidelineCategory::MedicalConditions,
        evaluate_conditions(profile, GuidelineCategory::MedicalConditions),
    );
    summaries.insert(GuidelineCategory::MentalHealth, evaluate_mental_health(profile));
    summaries.insert(
        GuidelineCategory::Lifestyle,
        evaluate_factors(
            profile,
            ProfileField::Lifestyle,
            "lifestyle history",
            LIFESTYLE_RULES,
            |factor| profile.lifestyle_flag(factor),
        ),
    );
    summaries.insert(
        GuidelineCategory::Environmental,
        evaluate_factors(
            profile,
            ProfileField::Environmental,
            "social and environmental history",
            ENVIRONMENTAL_RULES,
            |factor| profile.environmental_flag(factor),
        ),
    );
    summaries
}

/// Eligible placeholder for a field the rule cannot read.
fn insufficient_data(profile: &CandidateProfile, key: &str, subject: &str) -> CategoryFinding {
    let nested = format!("{key}.");
    let malformed = profile
        .parsing_metadata
        .malformed_fields
        .iter()
        .any(|field| field == key || field.starts_with(&nested));

    let message = if malformed {
        format!("Insufficient data: {subject} was supplied in an unreadable format")
    } else {
        format!("Insufficient data: {subject} not documented")
    };
    CategoryFinding::new(
        RiskLevel::Eligible,
        message,
        format!("Document {subject} before final eligibility review"),
    )
}

fn evaluate_age(profile: &CandidateProfile, config: &GuidelineConfig) -> Vec<CategoryFinding> {
    let Some(age) = profile.age else {
        return vec![insufficient_data(profile, "age", "age")];
    };

    let finding = if age < config.minimum_age {
        CategoryFinding::new(
            RiskLevel::Disqualified,
            format!("Age {age} is below the minimum of {}", config.minimum_age),
            format!(
                "ASRM: gestational carriers must be at least {} years old",
                config.minimum_age
            ),
        )
    } else if age <= config.maximum_eligible_age {
        CategoryFinding::new(
            RiskLevel::Eligible,
            format!(
                "Age {age} is within the recommended range of {}-{}",
                config.minimum_age, config.maximum_eligible_age
            ),
            format!(
                "ASRM: carriers should be between {} and {} years old",
                config.minimum_age, config.maximum_eligible_age
            ),
        )
    } else if age <= config.maximum_counseling_age {
        CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            format!(
                "Age {age} is above the preferred maximum of {}",
                config.maximum_eligible_age
            ),
            format!(
                "Counsel on age-related obstetric risk; carriers over {} need additional medical clearance",
                config.maximum_eligible_age
            ),
        )
    } else {
        CategoryFinding::new(
            RiskLevel::Disqualified,
            format!(
                "Age {age} exceeds the maximum of {}",
                config.maximum_counseling_age
            ),
            format!(
                "ASRM: carriers older than {} are not recommended",
                config.maximum_counseling_age
            ),
        )
    };
    vec![finding]
}

fn evaluate_bmi(profile: &CandidateProfile, config: &GuidelineConfig) -> Vec<CategoryFinding> {
    let Some(bmi) = profile.bmi.filter(|value| value.is_finite() && *value > 0.0) else {
        return vec![insufficient_data(profile, "bmi", "BMI")];
    };
    let shown = format_measure(bmi);

    let finding = if bmi < config.underweight_bmi {
        CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            format!(
                "BMI {shown} is below {}",
                format_measure(config.underweight_bmi)
            ),
            "Nutritional assessment recommended for underweight candidates",
        )
    } else if bmi <= config.maximum_eligible_bmi {
        CategoryFinding::new(
            RiskLevel::Eligible,
            format!("BMI {shown} is within the recommended range"),
            format!(
                "ASRM: preferred carrier BMI is {} to {}",
                format_measure(config.underweight_bmi),
                format_measure(config.maximum_eligible_bmi)
            ),
        )
    } else if bmi <= config.maximum_counseling_bmi {
        CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            format!(
                "BMI {shown} exceeds {}",
                format_measure(config.maximum_eligible_bmi)
            ),
            "Counsel on weight-related pregnancy risks such as gestational diabetes and hypertension",
        )
    } else if bmi <= config.maximum_high_risk_bmi {
        CategoryFinding::new(
            RiskLevel::HighRisk,
            format!(
                "BMI {shown} exceeds {}",
                format_measure(config.maximum_counseling_bmi)
            ),
            "MFM review required for carriers with BMI above 35",
        )
    } else {
        CategoryFinding::new(
            RiskLevel::Disqualified,
            format!(
                "BMI {shown} exceeds the maximum of {}",
                format_measure(config.maximum_high_risk_bmi)
            ),
            format!(
                "Carriers with BMI above {} are not accepted",
                format_measure(config.maximum_high_risk_bmi)
            ),
        )
    };
    vec![finding]
}

fn evaluate_pregnancy_history(profile: &CandidateProfile) -> Vec<CategoryFinding> {
    if !profile.is_documented(ProfileField::PregnancyHistory) {
        return vec![CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            "Delivery history not documented",
            "Obtain delivery records confirming at least one uncomplicated term pregnancy",
        )];
    }

    let history = &profile.pregnancy_history;
    let term = history.number_of_term_pregnancies;
    let complications = history.number_of_complications;

    let finding = if term == 0 {
        CategoryFinding::new(
            RiskLevel::Disqualified,
            "No prior term pregnancy documented",
            "ASRM: carriers must have had at least one uncomplicated term pregnancy",
        )
    } else if complications == 0 {
        CategoryFinding::new(
            RiskLevel::Eligible,
            format!(
                "{term} term {} without documented complications",
                pregnancies(term)
            ),
            "ASRM: prior uncomplicated term pregnancy requirement met",
        )
    } else if complications >= term {
        CategoryFinding::new(
            RiskLevel::HighRisk,
            format!(
                "Complications documented across all {term} term {}",
                pregnancies(term)
            ),
            "No uncomplicated term pregnancy on record; MFM review of prior complications required",
        )
    } else {
        CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            format!(
                "{complications} complication(s) across {term} term {}",
                pregnancies(term)
            ),
            "Review prior complications with the candidate's obstetrician",
        )
    };
    vec![finding]
}

fn pregnancies(count: u32) -> &'static str {
    if count == 1 {
        "pregnancy"
    } else {
        "pregnancies"
    }
}

fn evaluate_delivery_history(
    profile: &CandidateProfile,
    config: &GuidelineConfig,
) -> Vec<CategoryFinding> {
    if !profile.is_documented(ProfileField::PregnancyHistory) {
        return vec![insufficient_data(profile, "pregnancyHistory", "delivery history")];
    }

    let history = &profile.pregnancy_history;
    let cesareans = history.number_of_cesareans;
    let mut findings = Vec::new();

    let cesarean_finding = if cesareans >= config.disqualifying_cesareans {
        CategoryFinding::new(
            RiskLevel::Disqualified,
            format!("{cesareans} prior cesarean deliveries"),
            format!(
                "Carriers with {} or more cesareans are not accepted due to uterine rupture and placenta accreta risk",
                config.disqualifying_cesareans
            ),
        )
    } else if cesareans >= config.high_risk_cesareans {
        CategoryFinding::new(
            RiskLevel::HighRisk,
            format!("{cesareans} prior cesarean deliveries"),
            "MFM review required after three cesarean deliveries",
        )
    } else if cesareans >= config.counseling_cesareans {
        CategoryFinding::new(
            RiskLevel::RequiresCounseling,
            format!("{cesareans} prior cesarean deliveries"),
            "Counsel on cumulative surgical risk of repeat cesarean delivery",
        )
    } else {
        CategoryFinding::new(
            RiskLevel::Eligible,
            format!(
                "{cesareans} prior cesarean {} of {} total",
                if cesareans == 1 { "delivery" } else { "deliveries" },
                history.total_deliveries
            ),
            "Cesarean history within guideline limits",
        )
    };
    findings.push(cesarean_finding);

    if history.total_deliveries > config.maximum_deliveries {
        findings.push(CategoryFinding::new(
            RiskLevel::HighRisk,
            format!(
                "{} prior deliveries exceed the recommended maximum of {}",
                history.total_deliveries, config.maximum_deliveries
            ),
            format!(
                "ASRM: carriers should not have had more than {} deliveries",
                config.maximum_deliveries
            ),
        ));
    }

    findings
}

fn tier_status(tier: ConditionTier) -> RiskLevel {
    match tier {
        ConditionTier::Minor => RiskLevel::Eligible,
        ConditionTier::ReviewRequired => RiskLevel::RequiresCounseling,
        ConditionTier::Significant | ConditionTier::Complex => RiskLevel::HighRisk,
        ConditionTier::Disqualifying => RiskLevel::Disqualified,
    }
}

fn condition_guideline(code: ConditionCode) -> String {
    let label = code.label();
    match code.tier() {
        ConditionTier::Minor => format!("{label} is generally compatible with carrying; note in medical record"),
        ConditionTier::ReviewRequired => {
            format!("Counsel on recurrence risk of {label} and obtain treating-physician clearance")
        }
        ConditionTier::Significant => format!("{label} requires MFM review before matching"),
        ConditionTier::Complex => {
            format!("{label} requires comprehensive MFM evaluation; most programs decline")
        }
        ConditionTier::Disqualifying => {
            format!("{label} is a contraindication to gestational carriage")
        }
    }
}

fn condition_findings(
    profile: &CandidateProfile,
    belongs: impl Fn(ConditionDomain) -> bool,
) -> Vec<CategoryFinding> {
    profile
        .medical_conditions
        .iter()
        .filter(|code| belongs(code.info().domain))
        .map(|code| {
            CategoryFinding::new(
                tier_status(code.tier()),
                format!("{} documented", code.label()),
                condition_guideline(*code),
            )
        })
        .collect()
}

fn evaluate_conditions(
    profile: &CandidateProfile,
    category: GuidelineCategory,
) -> Vec<CategoryFinding> {
    let findings = match category {
        GuidelineCategory::PregnancyComplications => {
            condition_findings(profile, |domain| matches!(domain, ConditionDomain::Obstetric(_)))
        }
        _ => condition_findings(profile, |domain| domain == ConditionDomain::Medical),
    };
    if !findings.is_empty() {
        return findings;
    }

    if profile.is_documented(ProfileField::MedicalConditions) {
        vec![CategoryFinding::new(
            RiskLevel::Eligible,
            format!("No {} documented", category.label()),
            "No action required",
        )]
    } else {
        vec![insufficient_data(profile, "medicalConditions", "medical history")]
    }
}

fn evaluate_mental_health(profile: &CandidateProfile) -> Vec<CategoryFinding> {
    let mut findings =
        condition_findings(profile, |domain| domain == ConditionDomain::MentalHealth);
    findings.extend(factor_findings(PSYCHOLOGICAL_RULES, |factor| {
        profile.psychological_flag(factor)
    }));
    if !findings.is_empty() {
        return findings;
    }

    if profile.is_documented(ProfileField::MedicalConditions)
        || profile.is_documented(ProfileField::Psychological)
    {
        vec![CategoryFinding::new(
            RiskLevel::Eligible,
            "No mental health concerns documented",
            "ASRM: psychological evaluation remains required before matching",
        )]
    } else {
        vec![insufficient_data(profile, "psychological", "mental health history")]
    }
}

fn factor_findings<K: Copy>(
    rules: &[FactorRule<K>],
    flag: impl Fn(K) -> Option<bool>,
) -> Vec<CategoryFinding> {
    rules
        .iter()
        .filter(|rule| flag(rule.factor) == Some(rule.trigger))
        .map(|rule| CategoryFinding::new(rule.status, rule.message, rule.guideline))
        .collect()
}

fn evaluate_factors<K: Copy>(
    profile: &CandidateProfile,
    field: ProfileField,
    subject: &str,
    rules: &[FactorRule<K>],
    flag: impl Fn(K) -> Option<bool>,
) -> Vec<CategoryFinding> {
    let findings = factor_findings(rules, flag);
    if !findings.is_empty() {
        return findings;
    }

    if profile.is_documented(field) {
        vec![CategoryFinding::new(
            RiskLevel::Eligible,
            format!("No {subject} concerns reported"),
            "No action required",
        )]
    } else {
        let key = match field {
            ProfileField::Lifestyle => "lifestyle",
            _ => "environmental",
        };
        vec![insufficient_data(profile, key, subject)]
    }
}
