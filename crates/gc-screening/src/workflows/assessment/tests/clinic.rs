use super::common::*;
use crate::workflows::assessment::clinic::{acceptance_for, enforce_monotone, issue_burden};
use crate::workflows::assessment::{
    AcceptanceLevel, ClinicIssue, ClinicType, ClinicTypeResult, ClinicTypeScorer, CombinationPolicy,
    IssueSeverity,
};
use std::collections::BTreeMap;
use crate::workflows::candidate::{ConditionCode, LifestyleFactor};

fn issue(severity: IssueSeverity) -> ClinicIssue {
    ClinicIssue {
        severity,
        message: "issue".to_string(),
    }
}

#[test]
fn eligible_profile_is_highly_likely_everywhere() {
    let results = ClinicTypeScorer::new().score_by_clinic_type(&eligible_profile());

    assert_eq!(results.len(), 3);
    for (clinic, result) in results {
        assert_eq!(result.acceptance_level, AcceptanceLevel::HighlyLikely, "{clinic:?}");
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }
}

#[test]
fn gdm_and_cesarean_profile_differs_by_clinic_type() {
    let results = ClinicTypeScorer::new().score_by_clinic_type(&gdm_cesarean_profile());

    let strict = &results[&ClinicType::Strict];
    assert_eq!(strict.acceptance_level, AcceptanceLevel::VeryUnlikely);
    assert!(strict.score <= 10);
    assert!(strict.issues.iter().any(|issue| {
        issue.severity == IssueSeverity::Disqualifying && issue.message.contains("ceiling of 30")
    }));

    let moderate = &results[&ClinicType::Moderate];
    assert_eq!(moderate.acceptance_level, AcceptanceLevel::Unlikely);
    assert_eq!(moderate.score, 52);
    let severities: Vec<IssueSeverity> =
        moderate.issues.iter().map(|issue| issue.severity).collect();
    assert_eq!(severities, vec![IssueSeverity::Major, IssueSeverity::Moderate]);

    let lenient = &results[&ClinicType::Lenient];
    assert_eq!(lenient.acceptance_level, AcceptanceLevel::Likely);
    assert_eq!(lenient.issues.len(), 1);
    assert_eq!(lenient.issues[0].severity, IssueSeverity::Minor);
    assert!(lenient.issues[0].message.ends_with("(reviewed case by case)"));
}

#[test]
fn strict_clinics_compound_issues_exponentially() {
    let mut profile = with_conditions(eligible_profile(), &[ConditionCode::Asthma]);
    profile.age = Some(41);

    let results = ClinicTypeScorer::new().score_by_clinic_type(&profile);
    let strict = &results[&ClinicType::Strict];

    assert_eq!(strict.issues.len(), 2);
    assert_eq!(strict.acceptance_level, AcceptanceLevel::Unlikely);
    assert_eq!(strict.score, 52);
    assert_eq!(results[&ClinicType::Moderate].acceptance_level, AcceptanceLevel::Likely);
}

#[test]
fn burden_follows_combination_policy() {
    let issues = vec![issue(IssueSeverity::Moderate), issue(IssueSeverity::Moderate)];

    assert_eq!(issue_burden(&issues, CombinationPolicy::Additive), 4.0);
    assert_eq!(issue_burden(&issues, CombinationPolicy::Exponential), 6.0);
    assert_eq!(
        issue_burden(&issues[..1], CombinationPolicy::Exponential),
        2.0
    );
    assert_eq!(
        issue_burden(&[issue(IssueSeverity::Disqualifying)], CombinationPolicy::Additive),
        0.0
    );
}

#[test]
fn acceptance_bands() {
    assert_eq!(acceptance_for(&[], 0.0), AcceptanceLevel::HighlyLikely);

    let some = [issue(IssueSeverity::Minor)];
    assert_eq!(acceptance_for(&some, 2.0), AcceptanceLevel::Likely);
    assert_eq!(acceptance_for(&some, 5.0), AcceptanceLevel::Possible);
    assert_eq!(acceptance_for(&some, 9.0), AcceptanceLevel::Unlikely);
    assert_eq!(acceptance_for(&some, 9.5), AcceptanceLevel::VeryUnlikely);

    let blocking = [issue(IssueSeverity::Minor), issue(IssueSeverity::Disqualifying)];
    assert_eq!(acceptance_for(&blocking, 1.0), AcceptanceLevel::VeryUnlikely);
}

#[test]
fn disqualifying_issue_caps_score() {
    let mut profile = eligible_profile();
    profile.lifestyle.insert(LifestyleFactor::CurrentSmoker, true);

    let results = ClinicTypeScorer::new().score_by_clinic_type(&profile);
    for result in results.values() {
        assert_eq!(result.acceptance_level, AcceptanceLevel::VeryUnlikely);
        assert_eq!(result.score, 10);
    }
}

#[test]
fn stricter_clinics_never_outscore_looser_ones() {
    let mut older = eligible_profile();
    older.age = Some(44);
    let mut heavy = with_conditions(eligible_profile(), &[ConditionCode::Preeclampsia]);
    heavy.bmi = Some(33.5);
    let mut many = with_conditions(eligible_profile(), &[ConditionCode::Asthma]);
    many.pregnancy_history.total_deliveries = 6;
    many.pregnancy_history.number_of_cesareans = 3;

    let scorer = ClinicTypeScorer::new();
    for profile in [eligible_profile(), gdm_cesarean_profile(), older, heavy, many] {
        let results = scorer.score_by_clinic_type(&profile);
        let strict = &results[&ClinicType::Strict];
        let moderate = &results[&ClinicType::Moderate];
        let lenient = &results[&ClinicType::Lenient];

        assert!(strict.acceptance_level <= moderate.acceptance_level);
        assert!(moderate.acceptance_level <= lenient.acceptance_level);
        assert!(strict.score <= moderate.score);
        assert!(moderate.score <= lenient.score);
    }
}

#[test]
fn capped_stricter_result_explains_the_cap() {
    let mut results = BTreeMap::from([
        (
            ClinicType::Strict,
            ClinicTypeResult {
                acceptance_level: AcceptanceLevel::Likely,
                score: 92,
                issues: vec![issue(IssueSeverity::Minor)],
            },
        ),
        (
            ClinicType::Moderate,
            ClinicTypeResult {
                acceptance_level: AcceptanceLevel::Possible,
                score: 68,
                issues: vec![issue(IssueSeverity::Major)],
            },
        ),
    ]);

    enforce_monotone(&mut results, ClinicType::Strict, ClinicType::Moderate);
    let strict = &results[&ClinicType::Strict];
    assert_eq!(strict.acceptance_level, AcceptanceLevel::Possible);
    assert_eq!(strict.score, 68);
    assert_eq!(strict.issues.len(), 2);
    assert_eq!(strict.issues[1].severity, IssueSeverity::Major);
    assert!(strict.issues[1].message.contains("moderate clinic estimate"));

    enforce_monotone(&mut results, ClinicType::Strict, ClinicType::Moderate);
    assert_eq!(results[&ClinicType::Strict].issues.len(), 2);
}
