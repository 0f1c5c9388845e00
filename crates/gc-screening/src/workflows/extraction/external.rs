//! Layer 3: optional external extraction service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::workflows::candidate::{
    CandidateProfile, ConditionCode, EnvironmentalFactor, LifestyleFactor, ProfileField,
    PsychologicalFactor,
};

const EXTERNAL_CONFIDENCE: u8 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ExternalExtractionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("external extractor timed out after {0:?}")]
    Timeout(Duration),
    #[error("credential rejected with status {0}")]
    Auth(u16),
    #[error("external extractor returned status {0}")]
    Status(u16),
    #[error("malformed extractor response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ExternalExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Free-text extractor consulted when the deterministic layers leave too many gaps. The
/// credential is supplied per call and never stored by the cascade.
#[async_trait]
pub trait ExternalExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        credential: &str,
        context_hints: &[String],
    ) -> Result<Value, ExternalExtractionError>;
}

/// Fact-schema subset an external extractor may return. Unknown keys or wrongly typed values
/// reject the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExternalProfilePayload {
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub height_inches: Option<f64>,
    #[serde(default)]
    pub weight_lbs: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub pregnancy_history: Option<ExternalPregnancyHistory>,
    #[serde(default)]
    pub medical_conditions: Option<Vec<ConditionCode>>,
    #[serde(default)]
    pub psychological: BTreeMap<PsychologicalFactor, bool>,
    #[serde(default)]
    pub lifestyle: BTreeMap<LifestyleFactor, bool>,
    #[serde(default)]
    pub environmental: BTreeMap<EnvironmentalFactor, bool>,
    #[serde(default)]
    pub documentation_gaps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExternalPregnancyHistory {
    #[serde(default)]
    pub gravida: Option<u32>,
    pub number_of_term_pregnancies: u32,
    #[serde(default)]
    pub number_of_cesareans: u32,
    #[serde(default)]
    pub number_of_complications: u32,
    #[serde(default)]
    pub total_deliveries: Option<u32>,
}

impl ExternalProfilePayload {
    /// Accepts either a bare payload or one wrapped as `{"profile": {...}}`.
    pub fn from_value(value: Value) -> Result<Self, ExternalExtractionError> {
        let payload = match value {
            Value::Object(mut object) if object.len() == 1 && object.contains_key("profile") => {
                object.remove("profile").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(payload)
            .map_err(|err| ExternalExtractionError::MalformedResponse(err.to_string()))
    }

    /// Partial profile at the external layer's fixed confidence. Values outside plausible
    /// ranges are dropped rather than trusted.
    pub fn into_profile(self) -> CandidateProfile {
        let mut profile = CandidateProfile::new();

        if let Some(age) = self.age.filter(|age| (16..=65).contains(age)) {
            profile.age = Some(age);
            profile.set_field_confidence(ProfileField::Age, EXTERNAL_CONFIDENCE);
        }
        if let Some(height) = self.height_inches.filter(|value| (48.0..=84.0).contains(value)) {
            profile.height_inches = Some(height);
            profile.set_field_confidence(ProfileField::Height, EXTERNAL_CONFIDENCE);
        }
        if let Some(weight) = self.weight_lbs.filter(|value| (70.0..=500.0).contains(value)) {
            profile.weight_lbs = Some(weight);
            profile.set_field_confidence(ProfileField::Weight, EXTERNAL_CONFIDENCE);
        }
        if let Some(bmi) = self.bmi.filter(|value| (12.0..=80.0).contains(value)) {
            profile.bmi = Some(bmi);
            profile.set_field_confidence(ProfileField::Bmi, EXTERNAL_CONFIDENCE);
        }

        if let Some(history) = self.pregnancy_history {
            let target = &mut profile.pregnancy_history;
            target.gravida = history.gravida;
            target.number_of_term_pregnancies = history.number_of_term_pregnancies;
            target.number_of_cesareans = history.number_of_cesareans;
            target.number_of_complications = history.number_of_complications;
            target.total_deliveries = history
                .total_deliveries
                .unwrap_or(history.number_of_term_pregnancies)
                .max(history.number_of_term_pregnancies);
            target.has_completed_pregnancy = target.total_deliveries > 0;
            profile.set_field_confidence(ProfileField::PregnancyHistory, EXTERNAL_CONFIDENCE);
        }

        if let Some(conditions) = self.medical_conditions {
            for code in conditions {
                profile.record_condition(code, code.label());
            }
            profile.set_field_confidence(ProfileField::MedicalConditions, EXTERNAL_CONFIDENCE);
        }

        if !self.psychological.is_empty() {
            profile.psychological = self.psychological;
            profile.set_field_confidence(ProfileField::Psychological, EXTERNAL_CONFIDENCE);
        }
        if !self.lifestyle.is_empty() {
            profile.lifestyle = self.lifestyle;
            profile.set_field_confidence(ProfileField::Lifestyle, EXTERNAL_CONFIDENCE);
        }
        if !self.environmental.is_empty() {
            profile.environmental = self.environmental;
            profile.set_field_confidence(ProfileField::Environmental, EXTERNAL_CONFIDENCE);
        }

        for gap in self.documentation_gaps {
            profile.add_documentation_gap(gap);
        }

        profile
    }
}

/// JSON-over-HTTP extractor authenticated with a bearer credential.
#[derive(Debug, Clone)]
pub struct HttpExtractionAdapter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl HttpExtractionAdapter {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExternalExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ExternalExtractionError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExternalExtractor for HttpExtractionAdapter {
    async fn extract(
        &self,
        text: &str,
        credential: &str,
        context_hints: &[String],
    ) -> Result<Value, ExternalExtractionError> {
        let body = json!({
            "model": self.model,
            "text": text,
            "contextHints": context_hints,
            "vocabularyVersion": ConditionCode::VOCABULARY_VERSION,
            "conditionCodes": ConditionCode::all().map(ConditionCode::as_code).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ExternalExtractionError::Timeout(self.timeout)
                } else {
                    ExternalExtractionError::from(err)
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExternalExtractionError::Auth(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ExternalExtractionError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_and_bare_payloads_are_accepted() {
        let bare = json!({ "age": 33, "medicalConditions": ["gestational_diabetes"] });
        let wrapped = json!({ "profile": bare.clone() });
        assert_eq!(
            ExternalProfilePayload::from_value(bare).expect("bare payload"),
            ExternalProfilePayload::from_value(wrapped).expect("wrapped payload")
        );
    }

    #[test]
    fn unknown_fields_and_codes_are_rejected() {
        let extra = json!({ "age": 33, "favouriteColour": "blue" });
        assert!(matches!(
            ExternalProfilePayload::from_value(extra),
            Err(ExternalExtractionError::MalformedResponse(_))
        ));

        let unknown_code = json!({ "medicalConditions": ["made_up_condition"] });
        assert!(ExternalProfilePayload::from_value(unknown_code).is_err());
    }

    #[test]
    fn payload_becomes_partial_profile_at_fixed_confidence() {
        let payload = ExternalProfilePayload::from_value(json!({
            "age": 29,
            "bmi": 400.0,
            "pregnancyHistory": { "numberOfTermPregnancies": 2, "numberOfCesareans": 1 },
            "medicalConditions": ["preeclampsia"],
            "lifestyle": { "currentSmoker": false }
        }))
        .expect("valid payload");

        let profile = payload.into_profile();
        assert_eq!(profile.age, Some(29));
        assert_eq!(profile.bmi, None);
        assert_eq!(profile.pregnancy_history.total_deliveries, 2);
        assert!(profile.pregnancy_history.has_completed_pregnancy);
        assert_eq!(profile.pregnancy_history.number_of_complications, 1);
        assert_eq!(profile.field_confidence(ProfileField::Age), Some(EXTERNAL_CONFIDENCE));
        assert_eq!(
            profile.lifestyle_flag(LifestyleFactor::CurrentSmoker),
            Some(false)
        );
    }
}
