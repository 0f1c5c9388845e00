use gc_screening::workflows::assessment::{
    AcceptanceLevel, ClinicType, GuidelineCategory, GuidelineConfig, IssueSeverity, RiskLevel,
};
use gc_screening::workflows::candidate::{ConditionCode, ProfileField};
use gc_screening::workflows::extraction::{AssessmentInput, ExtractionOptions};
use gc_screening::{AssessmentReport, CascadeController, ScreeningService};

fn service() -> ScreeningService {
    let cascade = CascadeController::embedded().expect("embedded glossary loads");
    ScreeningService::new(cascade, GuidelineConfig::default())
}

async fn assess(service: &ScreeningService, text: &str) -> AssessmentReport {
    let input = AssessmentInput::from_text(text).expect("readable input");
    service
        .assess(input, &ExtractionOptions::deterministic())
        .await
}

const NARRATIVES: &[&str] = &[
    "G2P2, 2 SVD, no complications, BMI 22",
    "BMI 34, GDM in last pregnancy, 1 C-section",
    "38 yo G4P3, 3 prior c-sections, history of preeclampsia. Smoker. BMI 29",
    "Age: 27. G1P1, 1 SVD complicated by postpartum hemorrhage. 5'6\", 150 lbs",
    "42 year old with chronic hypertension, BMI 37, G3P3",
    "Healthy 29 years old",
];

#[tokio::test]
async fn uncomplicated_history_is_eligible_with_age_gap() {
    let report = assess(&service(), "G2P2, 2 SVD, no complications, BMI 22").await;

    let profile = &report.profile;
    assert_eq!(profile.pregnancy_history.number_of_term_pregnancies, 2);
    assert_eq!(profile.pregnancy_history.number_of_complications, 0);
    assert_eq!(profile.bmi, Some(22.0));
    assert!(profile.medical_conditions.is_empty());
    assert_eq!(profile.documentation_gaps, vec!["Age not documented"]);
    assert_eq!(profile.parsing_metadata.final_confidence, 69);

    assert_eq!(report.result.overall_risk.level, RiskLevel::Eligible);
    for result in report.result.clinic_type_analysis.values() {
        assert_eq!(result.acceptance_level, AcceptanceLevel::HighlyLikely);
    }
    assert!(!report.result.mfm_assessment.consultation_needed);
}

#[tokio::test]
async fn gestational_diabetes_with_cesarean_diverges_by_clinic() {
    let report = assess(&service(), "BMI 34, GDM in last pregnancy, 1 C-section").await;

    let profile = &report.profile;
    assert!(profile.has_condition(ConditionCode::GestationalDiabetes));
    assert_eq!(profile.pregnancy_history.number_of_cesareans, 1);
    assert_eq!(profile.pregnancy_history.number_of_term_pregnancies, 1);

    let result = &report.result;
    assert_eq!(result.overall_risk.level, RiskLevel::HighRisk);
    assert_eq!(
        result.category_summaries[&GuidelineCategory::Bmi][0].status,
        RiskLevel::RequiresCounseling
    );

    let strict = &result.clinic_type_analysis[&ClinicType::Strict];
    assert_eq!(strict.acceptance_level, AcceptanceLevel::VeryUnlikely);
    assert!(strict
        .issues
        .iter()
        .any(|issue| issue.severity == IssueSeverity::Disqualifying
            && issue.message.contains("ceiling of 30")));

    let moderate = &result.clinic_type_analysis[&ClinicType::Moderate];
    assert_eq!(moderate.acceptance_level, AcceptanceLevel::Unlikely);

    let lenient = &result.clinic_type_analysis[&ClinicType::Lenient];
    assert_eq!(lenient.acceptance_level, AcceptanceLevel::Likely);
}

#[tokio::test]
async fn single_complicated_pregnancy_is_high_risk_not_disqualified() {
    let report = assess(
        &service(),
        "30 years old, G1P1, 1 SVD complicated by preeclampsia, BMI 24. Healthy otherwise.",
    )
    .await;

    assert!(report.profile.has_condition(ConditionCode::Preeclampsia));
    let result = &report.result;
    assert!(!result
        .category_summaries
        .contains_key(&GuidelineCategory::CombinedRisk));
    assert_eq!(result.overall_risk.level, RiskLevel::HighRisk);
}

#[tokio::test]
async fn overall_risk_is_the_worst_category_and_clinics_stay_ordered() {
    let service = service();
    for text in NARRATIVES {
        let report = assess(&service, text).await;
        let result = &report.result;

        let worst = result
            .category_summaries
            .values()
            .flatten()
            .map(|finding| finding.status)
            .max()
            .expect("findings present");
        assert_eq!(result.overall_risk.level, worst, "{text}");

        let strict = &result.clinic_type_analysis[&ClinicType::Strict];
        let moderate = &result.clinic_type_analysis[&ClinicType::Moderate];
        let lenient = &result.clinic_type_analysis[&ClinicType::Lenient];
        assert!(strict.acceptance_level <= moderate.acceptance_level, "{text}");
        assert!(moderate.acceptance_level <= lenient.acceptance_level, "{text}");
        assert!(strict.score <= lenient.score, "{text}");
    }
}

#[tokio::test]
async fn identical_input_yields_identical_reports() {
    let service = service();
    for text in NARRATIVES {
        let first = assess(&service, text).await;
        let second = assess(&service, text).await;
        assert_eq!(first, second, "{text}");
        assert_eq!(service.assess_profile(&first.profile), first.result);
    }
}

#[tokio::test]
async fn structured_profile_matches_equivalent_extraction() {
    let service = service();
    let extracted = assess(&service, "G2P2, 2 SVD, no complications, BMI 22").await;

    let json = serde_json::to_string(&extracted.profile).expect("profile serializes");
    let structured = service
        .assess(
            AssessmentInput::from_text(&json).expect("structured input"),
            &ExtractionOptions::deterministic(),
        )
        .await;

    assert_eq!(structured.profile, extracted.profile);
    assert_eq!(structured.result, extracted.result);
}

#[tokio::test]
async fn more_documentation_never_lowers_confidence() {
    let service = service();
    let steps = [
        "G2P2",
        "G2P2, BMI 22",
        "G2P2, 2 SVD, no complications, BMI 22",
        "Age: 31. G2P2, 2 SVD, no complications, BMI 22",
    ];

    let mut previous = 0;
    for text in steps {
        let profile = service.cascade().extract_deterministic(text);
        let confidence = profile.parsing_metadata.final_confidence;
        assert!(confidence >= previous, "{text}: {confidence} < {previous}");
        previous = confidence;
    }
    assert!(previous >= 80);

    let complete = service.cascade().extract_deterministic(steps[3]);
    assert!(complete.documentation_gaps.is_empty());
    assert!(complete.is_documented(ProfileField::Age));
}
