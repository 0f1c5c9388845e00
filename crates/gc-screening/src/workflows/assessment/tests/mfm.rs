use super::common::*;
use crate::workflows::assessment::mfm::estimate_likelihood;
use crate::workflows::assessment::{
    Approvability, MfmAssessor, MfmFinding, MfmLikelihood, MfmReviewLevel,
};
use crate::workflows::candidate::ConditionCode;

fn finding(approvability: Approvability) -> MfmFinding {
    MfmFinding {
        category: "test".to_string(),
        concern: "concern".to_string(),
        mfm_view: "view".to_string(),
        approvability,
    }
}

#[test]
fn clean_profile_needs_no_consultation() {
    let assessment = MfmAssessor::new().assess_mfm(&eligible_profile());

    assert!(!assessment.consultation_needed);
    assert_eq!(assessment.review_level, MfmReviewLevel::NotRequired);
    assert!(assessment.findings.is_empty());
    assert_eq!(assessment.likelihood.level, MfmLikelihood::LikelyApprove);
    assert_eq!(assessment.likelihood.percentage, 85);
    assert_eq!(
        assessment.likelihood.description,
        "No findings requiring MFM input"
    );
}

#[test]
fn single_gdm_is_noted_without_referral() {
    let assessment = MfmAssessor::new().assess_mfm(&gdm_cesarean_profile());

    assert!(!assessment.consultation_needed);
    assert_eq!(assessment.findings.len(), 1);
    assert_eq!(assessment.findings[0].approvability, Approvability::Likely);
    assert_eq!(assessment.likelihood.level, MfmLikelihood::LikelyApprove);
}

#[test]
fn hellp_with_three_cesareans_is_likely_denied() {
    let mut profile = with_conditions(eligible_profile(), &[ConditionCode::HellpSyndrome]);
    profile.pregnancy_history.number_of_cesareans = 3;
    profile.pregnancy_history.total_deliveries = 3;
    profile.pregnancy_history.number_of_term_pregnancies = 3;

    let assessment = MfmAssessor::new().assess_mfm(&profile);

    assert!(assessment.consultation_needed);
    assert_eq!(assessment.review_level, MfmReviewLevel::Comprehensive);
    assert_eq!(assessment.likelihood.level, MfmLikelihood::LikelyDeny);
    assert_eq!(assessment.likelihood.percentage, 5);
    assert!(assessment
        .findings
        .iter()
        .any(|finding| finding.concern == "3 prior cesarean deliveries"));
}

#[test]
fn advanced_age_alone_triggers_standard_review() {
    let mut profile = eligible_profile();
    profile.age = Some(44);

    let assessment = MfmAssessor::new().assess_mfm(&profile);

    assert!(assessment.consultation_needed);
    assert_eq!(assessment.review_level, MfmReviewLevel::Standard);
    assert_eq!(assessment.likelihood.level, MfmLikelihood::PossiblyApprove);
    assert_eq!(assessment.likelihood.percentage, 60);
}

#[test]
fn minor_conditions_produce_no_finding() {
    let profile = with_conditions(eligible_profile(), &[ConditionCode::Asthma]);
    let assessment = MfmAssessor::new().assess_mfm(&profile);
    assert!(assessment.findings.is_empty());
}

#[test]
fn concerning_findings_lower_the_estimate_down_to_the_floor() {
    let two = estimate_likelihood(&[finding(Approvability::Possible), finding(Approvability::Possible)]);
    assert_eq!(two.level, MfmLikelihood::UnlikelyApprove);
    assert_eq!(two.percentage, 25);

    let many: Vec<MfmFinding> = (0..8).map(|_| finding(Approvability::Possible)).collect();
    let floored = estimate_likelihood(&many);
    assert_eq!(floored.level, MfmLikelihood::UnlikelyApprove);
    assert_eq!(floored.percentage, 15);

    let benign = estimate_likelihood(&[finding(Approvability::Likely), finding(Approvability::Likely)]);
    assert_eq!(benign.level, MfmLikelihood::LikelyApprove);
    assert_eq!(benign.percentage, 85);
}
