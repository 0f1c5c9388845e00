use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::common::*;
use crate::workflows::assessment::RiskLevel;
use crate::workflows::candidate::{ExtractionLayer, ProfileField};
use crate::workflows::extraction::{AssessmentInput, ExtractionOptions};

const THIN_NARRATIVE: &str = "Healthy 29 years old";

fn external_payload() -> serde_json::Value {
    json!({
        "age": 45,
        "bmi": 24.5,
        "pregnancyHistory": { "numberOfTermPregnancies": 2, "numberOfCesareans": 0 },
        "medicalConditions": ["gestational_diabetes"]
    })
}

#[tokio::test]
async fn uncomplicated_narrative_is_eligible() {
    let report = service()
        .assess(
            AssessmentInput::from_text("G2P2, 2 SVD, no complications, BMI 22").expect("input"),
            &ExtractionOptions::deterministic(),
        )
        .await;

    assert_eq!(report.result.overall_risk.level, RiskLevel::Eligible);
    assert_eq!(report.profile.parsing_metadata.final_confidence, 69);
    assert_eq!(
        report.result.recommendations,
        vec!["Obtain documentation: Age not documented".to_string()]
    );
}

#[tokio::test]
async fn structured_profiles_bypass_extraction() {
    let input = AssessmentInput::from_value(json!({
        "age": 30,
        "bmi": 24.0,
        "pregnancyHistory": { "numberOfTermPregnancies": 2, "totalDeliveries": 2 },
        "medicalConditions": []
    }))
    .expect("structured input");

    let report = service()
        .assess(input, &ExtractionOptions::deterministic())
        .await;

    assert!(report.profile.parsing_metadata.layers_used.is_empty());
    assert_eq!(report.profile.parsing_metadata.final_confidence, 100);
    assert_eq!(report.result.overall_risk.level, RiskLevel::Eligible);
}

#[test]
fn scoring_is_idempotent() {
    let service = service();
    let profile = gdm_cesarean_profile();

    let first = service.assess_profile(&profile);
    let second = service.assess_profile(&profile);
    assert_eq!(first, second);
}

#[tokio::test]
async fn thin_narrative_escalates_and_keeps_confident_fields() {
    let adapter = Arc::new(StaticExtractor::new(external_payload()));
    let service = service_with_external(adapter.clone(), Duration::from_secs(5));

    let deterministic = service.cascade().extract_deterministic(THIN_NARRATIVE);
    assert_eq!(deterministic.parsing_metadata.final_confidence, 36);

    let profile = service
        .extract(THIN_NARRATIVE, &ExtractionOptions::with_external("  key-123 "))
        .await;

    assert_eq!(adapter.calls(), 1);
    assert_eq!(
        adapter.seen_credentials.lock().expect("lock").as_slice(),
        ["key-123".to_string()]
    );
    assert!(profile
        .parsing_metadata
        .layers_used
        .contains(&ExtractionLayer::External));
    assert_eq!(profile.age, Some(29));
    assert!(profile.medical_conditions.is_empty());
    assert_eq!(profile.bmi, Some(24.5));
    assert_eq!(profile.pregnancy_history.number_of_term_pregnancies, 2);
    assert_eq!(profile.field_confidence(ProfileField::Bmi), Some(60));
    assert_eq!(profile.parsing_metadata.final_confidence, 69);
}

#[tokio::test]
async fn confident_narrative_skips_the_external_extractor() {
    let adapter = Arc::new(StaticExtractor::new(external_payload()));
    let service = service_with_external(adapter.clone(), Duration::from_secs(5));

    let profile = service
        .extract(
            "Age 31, G2P2, 2 SVD, no complications, BMI 23",
            &ExtractionOptions::with_external("key"),
        )
        .await;

    assert_eq!(adapter.calls(), 0);
    assert!(!profile
        .parsing_metadata
        .layers_used
        .contains(&ExtractionLayer::External));
}

#[tokio::test]
async fn opted_out_requests_never_reach_the_external_extractor() {
    let adapter = Arc::new(StaticExtractor::new(external_payload()));
    let service = service_with_external(adapter.clone(), Duration::from_secs(5));

    let mut options = ExtractionOptions::with_external("key");
    options.use_external = false;
    service.extract(THIN_NARRATIVE, &options).await;

    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn external_timeout_falls_back_to_deterministic_result() {
    let service = service_with_external(Arc::new(StalledExtractor), Duration::from_millis(50));

    let profile = service
        .extract(THIN_NARRATIVE, &ExtractionOptions::with_external("key"))
        .await;

    assert_eq!(profile, service.cascade().extract_deterministic(THIN_NARRATIVE));
}

#[tokio::test]
async fn rejected_credential_falls_back_to_deterministic_result() {
    let service = service_with_external(Arc::new(RejectingExtractor), Duration::from_secs(5));

    let profile = service
        .extract(THIN_NARRATIVE, &ExtractionOptions::with_external("expired"))
        .await;

    assert_eq!(profile, service.cascade().extract_deterministic(THIN_NARRATIVE));
}

#[tokio::test]
async fn malformed_external_payload_is_discarded() {
    let adapter = Arc::new(StaticExtractor::new(json!({ "bmi": "high", "notes": "?" })));
    let service = service_with_external(adapter.clone(), Duration::from_secs(5));

    let profile = service
        .extract(THIN_NARRATIVE, &ExtractionOptions::with_external("key"))
        .await;

    assert_eq!(adapter.calls(), 1);
    assert_eq!(profile, service.cascade().extract_deterministic(THIN_NARRATIVE));
}
