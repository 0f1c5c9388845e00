use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::assessment::{
    assessment_router, AssessmentEngine, GuidelineConfig, ScreeningService,
};
use crate::workflows::candidate::{
    CandidateProfile, ConditionCode, LifestyleFactor, ProfileField,
};
use crate::workflows::extraction::{
    CascadeController, ExternalExtractionError, ExternalExtractor,
};

/// 30-year-old, BMI 24, two uncomplicated vaginal deliveries, non-smoker.
pub(super) fn eligible_profile() -> CandidateProfile {
    let mut profile = CandidateProfile::new();
    profile.age = Some(30);
    profile.set_field_confidence(ProfileField::Age, 90);
    profile.bmi = Some(24.0);
    profile.set_field_confidence(ProfileField::Bmi, 92);

    let history = &mut profile.pregnancy_history;
    history.has_completed_pregnancy = true;
    history.number_of_term_pregnancies = 2;
    history.total_deliveries = 2;
    profile.set_field_confidence(ProfileField::PregnancyHistory, 92);
    profile.set_field_confidence(ProfileField::MedicalConditions, 75);

    profile
        .lifestyle
        .insert(LifestyleFactor::CurrentSmoker, false);
    profile.set_field_confidence(ProfileField::Lifestyle, 80);
    profile
}

/// Profile read from "BMI 34, GDM in last pregnancy, 1 C-section".
pub(super) fn gdm_cesarean_profile() -> CandidateProfile {
    let mut profile = CandidateProfile::new();
    profile.bmi = Some(34.0);
    profile.set_field_confidence(ProfileField::Bmi, 92);

    let history = &mut profile.pregnancy_history;
    history.has_completed_pregnancy = true;
    history.number_of_term_pregnancies = 1;
    history.number_of_cesareans = 1;
    history.total_deliveries = 1;
    profile.set_field_confidence(ProfileField::PregnancyHistory, 88);

    profile.record_condition(ConditionCode::GestationalDiabetes, "GDM");
    profile.set_field_confidence(ProfileField::MedicalConditions, 88);
    profile
}

pub(super) fn with_conditions(mut profile: CandidateProfile, codes: &[ConditionCode]) -> CandidateProfile {
    for code in codes {
        profile.record_condition(*code, code.label());
    }
    profile.set_field_confidence(ProfileField::MedicalConditions, 88);
    profile
}

pub(super) fn engine() -> AssessmentEngine {
    AssessmentEngine::new(GuidelineConfig::default())
}

pub(super) fn cascade() -> CascadeController {
    CascadeController::embedded().expect("embedded glossary loads")
}

pub(super) fn service() -> ScreeningService {
    ScreeningService::new(cascade(), GuidelineConfig::default())
}

pub(super) fn service_with_external(
    adapter: Arc<dyn ExternalExtractor>,
    timeout: Duration,
) -> ScreeningService {
    let cascade = cascade().with_external(adapter).with_timeout(timeout);
    ScreeningService::new(cascade, GuidelineConfig::default())
}

pub(super) fn router() -> axum::Router {
    assessment_router(Arc::new(service()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Returns a fixed payload and remembers the credential it was handed.
pub(super) struct StaticExtractor {
    pub payload: Value,
    pub seen_credentials: std::sync::Mutex<Vec<String>>,
}

impl StaticExtractor {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            seen_credentials: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen_credentials.lock().expect("lock").len()
    }
}

#[async_trait]
impl ExternalExtractor for StaticExtractor {
    async fn extract(
        &self,
        _text: &str,
        credential: &str,
        _context_hints: &[String],
    ) -> Result<Value, ExternalExtractionError> {
        self.seen_credentials
            .lock()
            .expect("lock")
            .push(credential.to_string());
        Ok(self.payload.clone())
    }
}

/// Never answers within any reasonable timeout.
pub(super) struct StalledExtractor;

#[async_trait]
impl ExternalExtractor for StalledExtractor {
    async fn extract(
        &self,
        _text: &str,
        _credential: &str,
        _context_hints: &[String],
    ) -> Result<Value, ExternalExtractionError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Value::Null)
    }
}

/// Rejects every credential.
pub(super) struct RejectingExtractor;

#[async_trait]
impl ExternalExtractor for RejectingExtractor {
    async fn extract(
        &self,
        _text: &str,
        _credential: &str,
        _context_hints: &[String],
    ) -> Result<Value, ExternalExtractionError> {
        Err(ExternalExtractionError::Auth(401))
    }
}
