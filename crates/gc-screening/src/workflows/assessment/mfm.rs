use super::domain::{
    Approvability, MfmAssessment, MfmFinding, MfmLikelihoodEstimate, MfmReviewLevel,
};
use super::format_measure;
use crate::workflows::candidate::{CandidateProfile, ConditionCode, ConditionDomain, ConditionTier};

const PENALTY_PER_EXTRA_CONCERN: u8 = 5;
const CESAREAN_TRIGGER: u32 = 3;
const BMI_TRIGGER: f64 = 35.0;
const AGE_TRIGGER: u8 = 40;

struct MfmView {
    code: ConditionCode,
    concern: &'static str,
    view: &'static str,
    approvability: Approvability,
}

const MFM_VIEWS: &[MfmView] = &[
    MfmView {
        code: ConditionCode::GestationalDiabetes,
        concern: "Prior gestational diabetes",
        view: "Recurrence is common but manageable with early glucose screening; diet-controlled history is usually acceptable",
        approvability: Approvability::Likely,
    },
    MfmView {
        code: ConditionCode::PregnancyHypertension,
        concern: "Prior gestational hypertension",
        view: "Low-dose aspirin and close blood pressure monitoring generally allow another pregnancy",
        approvability: Approvability::Likely,
    },
    MfmView {
        code: ConditionCode::Preeclampsia,
        concern: "Prior preeclampsia",
        view: "Recurrence risk depends on onset and severity; late-onset mild disease is often cleared, early-onset disease rarely",
        approvability: Approvability::Possible,
    },
    MfmView {
        code: ConditionCode::Eclampsia,
        concern: "Prior eclampsia",
        view: "Seizure in a prior pregnancy signals severe disease; carrying for another family is generally discouraged",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::HellpSyndrome,
        concern: "Prior HELLP syndrome",
        view: "High recurrence of severe hypertensive disease; most MFM specialists advise against a surrogate pregnancy",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::PretermBirth,
        concern: "Prior preterm birth",
        view: "Spontaneous preterm birth recurs in roughly a third of pregnancies; cause and gestational age at delivery decide",
        approvability: Approvability::Possible,
    },
    MfmView {
        code: ConditionCode::CervicalInsufficiency,
        concern: "Cervical insufficiency",
        view: "Would require cerclage and surveillance; rarely accepted for a carrier",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::PlacentaPrevia,
        concern: "Prior placenta previa",
        view: "Modest recurrence risk, higher after cesarean; acceptable with early placental imaging",
        approvability: Approvability::Possible,
    },
    MfmView {
        code: ConditionCode::PlacentaAccreta,
        concern: "Prior placenta accreta spectrum",
        view: "Risk of massive hemorrhage and hysterectomy; MFM will not clear a carrier",
        approvability: Approvability::Deny,
    },
    MfmView {
        code: ConditionCode::PlacentalAbruption,
        concern: "Prior placental abruption",
        view: "Recurrence risk up to tenfold with potential for fetal loss; clearance unlikely",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::PostpartumHemorrhage,
        concern: "Prior postpartum hemorrhage",
        view: "Cause matters: uterine atony with prompt recovery is often acceptable, transfusion or surgery is not",
        approvability: Approvability::Possible,
    },
    MfmView {
        code: ConditionCode::UterineRupture,
        concern: "Prior uterine rupture",
        view: "Absolute contraindication to further pregnancy",
        approvability: Approvability::Deny,
    },
    MfmView {
        code: ConditionCode::Stillbirth,
        concern: "Prior stillbirth",
        view: "Requires full workup of the cause; unexplained stillbirth usually excludes carrying",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::PostpartumPsychosis,
        concern: "Prior postpartum psychosis",
        view: "High recurrence with serious risk to the carrier; not cleared",
        approvability: Approvability::Deny,
    },
    MfmView {
        code: ConditionCode::ChronicHypertension,
        concern: "Chronic hypertension",
        view: "Well-controlled hypertension on pregnancy-safe medication may be acceptable after cardiology input",
        approvability: Approvability::Possible,
    },
    MfmView {
        code: ConditionCode::Type1Diabetes,
        concern: "Type 1 diabetes",
        view: "Pregestational diabetes carries high risk of anomalies and stillbirth; not cleared for a carrier",
        approvability: Approvability::Deny,
    },
    MfmView {
        code: ConditionCode::Type2Diabetes,
        concern: "Type 2 diabetes",
        view: "Pregestational diabetes raises anomaly and preeclampsia risk; clearance unlikely",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::SystemicLupus,
        concern: "Systemic lupus erythematosus",
        view: "Flares, preeclampsia and fetal heart block risk; clearance unlikely even in remission",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::Thrombophilia,
        concern: "Thrombophilia",
        view: "Would require anticoagulation through pregnancy and postpartum; case dependent",
        approvability: Approvability::Unlikely,
    },
    MfmView {
        code: ConditionCode::HeartDisease,
        concern: "Heart disease",
        view: "Pregnancy increases cardiac output by up to half; structural or functional heart disease excludes carrying",
        approvability: Approvability::Deny,
    },
    MfmView {
        code: ConditionCode::BipolarDisorder,
        concern: "Bipolar disorder",
        view: "High postpartum relapse risk; psychiatric and MFM teams advise against carrying",
        approvability: Approvability::Deny,
    },
];

fn tier_approvability(tier: ConditionTier) -> Option<Approvability> {
    match tier {
        ConditionTier::Minor => None,
        ConditionTier::ReviewRequired => Some(Approvability::Likely),
        ConditionTier::Significant => Some(Approvability::Possible),
        ConditionTier::Complex => Some(Approvability::Unlikely),
        ConditionTier::Disqualifying => Some(Approvability::Deny),
    }
}

fn tier_view(tier: ConditionTier) -> &'static str {
    match tier {
        ConditionTier::Minor => "Generally compatible with pregnancy",
        ConditionTier::ReviewRequired => "Usually acceptable once the treating physician confirms stability",
        ConditionTier::Significant => "Requires MFM review of records and current control",
        ConditionTier::Complex => "Requires comprehensive MFM evaluation; clearance is uncommon",
        ConditionTier::Disqualifying => "Contraindication to a surrogate pregnancy",
    }
}

fn finding_category(code: ConditionCode) -> String {
    match code.info().domain {
        ConditionDomain::Obstetric(category) => category.label().to_string(),
        ConditionDomain::Medical => "Medical condition".to_string(),
        ConditionDomain::MentalHealth => "Mental health".to_string(),
    }
}

fn condition_finding(code: ConditionCode) -> Option<MfmFinding> {
    if let Some(view) = MFM_VIEWS.iter().find(|view| view.code == code) {
        return Some(MfmFinding {
            category: finding_category(code),
            concern: view.concern.to_string(),
            mfm_view: view.view.to_string(),
            approvability: view.approvability,
        });
    }

    let tier = code.tier();
    tier_approvability(tier).map(|approvability| MfmFinding {
        category: finding_category(code),
        concern: code.label().to_string(),
        mfm_view: tier_view(tier).to_string(),
        approvability,
    })
}

fn profile_findings(profile: &CandidateProfile) -> Vec<MfmFinding> {
    let mut findings = Vec::new();
    let cesareans = profile.pregnancy_history.number_of_cesareans;

    if cesareans >= CESAREAN_TRIGGER {
        findings.push(MfmFinding {
            category: "Delivery history".to_string(),
            concern: format!("{cesareans} prior cesarean deliveries"),
            mfm_view: "Each repeat cesarean raises placenta accreta and uterine rupture risk"
                .to_string(),
            approvability: if cesareans > CESAREAN_TRIGGER {
                Approvability::Deny
            } else {
                Approvability::Unlikely
            },
        });
    }

    if let Some(bmi) = profile.bmi.filter(|bmi| *bmi > BMI_TRIGGER) {
        findings.push(MfmFinding {
            category: "Body mass index".to_string(),
            concern: format!("BMI {}", format_measure(bmi)),
            mfm_view: "Obesity raises gestational diabetes, preeclampsia and operative delivery risk"
                .to_string(),
            approvability: if bmi > 40.0 {
                Approvability::Unlikely
            } else {
                Approvability::Possible
            },
        });
    }

    if let Some(age) = profile.age.filter(|age| *age > AGE_TRIGGER) {
        findings.push(MfmFinding {
            category: "Maternal age".to_string(),
            concern: format!("Age {age}"),
            mfm_view: "Advanced maternal age raises hypertensive and placental complication risk"
                .to_string(),
            approvability: if age > 45 {
                Approvability::Unlikely
            } else {
                Approvability::Possible
            },
        });
    }

    findings
}

/// Maternal-fetal-medicine referral estimate built from a fixed view per condition and a few
/// profile triggers.
#[derive(Debug, Clone, Default)]
pub struct MfmAssessor;

impl MfmAssessor {
    pub fn new() -> Self {
        Self
    }

    pub fn assess_mfm(&self, profile: &CandidateProfile) -> MfmAssessment {
        let mut findings: Vec<MfmFinding> = profile
            .medical_conditions
            .iter()
            .filter_map(|code| condition_finding(*code))
            .collect();
        let triggers = profile_findings(profile);
        let has_trigger = !triggers.is_empty();
        findings.extend(triggers);

        let has_complex = profile
            .medical_conditions
            .iter()
            .any(|code| code.tier().is_complex());
        let consultation_needed =
            profile.pregnancy_history.number_of_complications > 1 || has_complex || has_trigger;

        let review_level = if !consultation_needed {
            MfmReviewLevel::NotRequired
        } else if has_complex || findings.len() >= 3 {
            MfmReviewLevel::Comprehensive
        } else {
            MfmReviewLevel::Standard
        };

        MfmAssessment {
            consultation_needed,
            review_level,
            likelihood: estimate_likelihood(&findings),
            findings,
        }
    }
}

pub(crate) fn estimate_likelihood(findings: &[MfmFinding]) -> MfmLikelihoodEstimate {
    let worst = findings
        .iter()
        .map(|finding| finding.approvability)
        .max()
        .unwrap_or(Approvability::Likely);
    let concerning = findings
        .iter()
        .filter(|finding| finding.approvability.is_concerning())
        .count();

    let mut level = worst.likelihood();
    if concerning >= 2 {
        level = level.downgrade();
    }

    let extra = concerning.saturating_sub(1).min(u8::MAX as usize) as u8;
    let percentage = level
        .base_percentage()
        .saturating_sub(extra.saturating_mul(PENALTY_PER_EXTRA_CONCERN))
        .max(level.floor_percentage());

    let description = if findings.is_empty() {
        "No findings requiring MFM input".to_string()
    } else {
        level.description().to_string()
    };

    MfmLikelihoodEstimate {
        level,
        description,
        percentage,
    }
}
