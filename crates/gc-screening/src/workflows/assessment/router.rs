use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::AssessmentReport;
use super::service::ScreeningService;
use crate::error::AppError;
use crate::workflows::candidate::CandidateProfile;
use crate::workflows::extraction::{
    AssessmentInput, ExtractionOptions, InputError, PlainTextDecoder, SourceDocument,
};

/// Router builder exposing assessment and extraction endpoints.
pub fn assessment_router(service: Arc<ScreeningService>) -> Router {
    Router::new()
        .route("/api/v1/assessments", post(assess_handler))
        .route("/api/v1/extractions", post(extract_handler))
        .with_state(service)
}

/// Exactly one of `profile`, `narrative` or `documents` is read, in that order of preference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentRequest {
    pub narrative: Option<String>,
    pub profile: Option<Value>,
    pub documents: Vec<DocumentPayload>,
    pub options: ExtractionOptions,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    pub content: String,
}

impl AssessmentRequest {
    pub fn input(&self) -> Result<AssessmentInput, InputError> {
        if let Some(profile) = &self.profile {
            return AssessmentInput::from_value(profile.clone());
        }
        if let Some(narrative) = &self.narrative {
            return AssessmentInput::from_text(narrative);
        }
        if self.documents.is_empty() {
            return Err(InputError::Empty);
        }

        let documents: Vec<SourceDocument> = self
            .documents
            .iter()
            .map(|document| {
                let source = SourceDocument::new(document.name.clone(), document.content.as_bytes());
                match &document.media_type {
                    Some(media_type) => source.with_media_type(media_type.clone()),
                    None => source,
                }
            })
            .collect();
        AssessmentInput::from_documents(&documents, &PlainTextDecoder)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub assessed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AssessmentReport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub narrative: String,
    #[serde(default)]
    pub options: ExtractionOptions,
}

pub(crate) async fn assess_handler(
    State(service): State<Arc<ScreeningService>>,
    Json(request): Json<AssessmentRequest>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let input = request.input()?;
    let mut report = service.assess(input, &request.options).await;
    if let Some(name) = &request.display_name {
        report.stamp_display_name(name.as_str());
    }

    Ok(Json(AssessmentResponse {
        assessed_at: Utc::now(),
        report,
    }))
}

pub(crate) async fn extract_handler(
    State(service): State<Arc<ScreeningService>>,
    Json(request): Json<ExtractionRequest>,
) -> Result<Json<CandidateProfile>, AppError> {
    if request.narrative.trim().is_empty() {
        return Err(InputError::Empty.into());
    }
    let profile = service.extract(&request.narrative, &request.options).await;
    Ok(Json(profile))
}
