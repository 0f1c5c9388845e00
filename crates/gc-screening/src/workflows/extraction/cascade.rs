use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::confidence::{aggregate_confidence, SATISFIED_CONFIDENCE};
use super::external::{ExternalExtractor, ExternalProfilePayload, HttpExtractionAdapter};
use super::glossary::{Glossary, GlossaryError, GlossaryMapper};
use super::merge::merge_partial;
use super::normalizer::normalize_narrative;
use super::patterns::{derive_bmi, PatternExtractor};
use super::{ExtractionStrategy, PartialExtraction};
use crate::config::{
    ExtractionConfig, DEFAULT_ESCALATION_THRESHOLD, DEFAULT_EXTERNAL_TIMEOUT_SECS,
};
use crate::workflows::candidate::{CandidateProfile, ExtractionLayer, ProfileField};

/// Per-call extraction settings. Credentials travel with the request and are never kept by
/// the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionOptions {
    pub use_external: bool,
    #[serde(skip_serializing)]
    pub credential: Option<String>,
    pub context_hints: Vec<String>,
}

impl ExtractionOptions {
    /// Layers 1 and 2 only.
    pub fn deterministic() -> Self {
        Self::default()
    }

    pub fn with_external(credential: impl Into<String>) -> Self {
        Self {
            use_external: true,
            credential: Some(credential.into()),
            context_hints: Vec::new(),
        }
    }

    fn usable_credential(&self) -> Option<&str> {
        if !self.use_external {
            return None;
        }
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|credential| !credential.is_empty())
    }
}

/// Runs the extraction strategies in order and escalates to the external extractor when the
/// deterministic result is too thin.
pub struct CascadeController {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    external: Option<Arc<dyn ExternalExtractor>>,
    escalation_threshold: u8,
    external_timeout: Duration,
}

impl CascadeController {
    pub fn new(glossary: Arc<Glossary>) -> Self {
        Self {
            strategies: vec![
                Box::new(PatternExtractor::new()),
                Box::new(GlossaryMapper::new(glossary)),
            ],
            external: None,
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            external_timeout: Duration::from_secs(DEFAULT_EXTERNAL_TIMEOUT_SECS),
        }
    }

    /// Controller with the embedded glossary and no external layer.
    pub fn embedded() -> Result<Self, GlossaryError> {
        Ok(Self::new(Arc::new(Glossary::embedded()?)))
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, GlossaryError> {
        let glossary = match &config.glossary_path {
            Some(path) => Glossary::from_path(path)?,
            None => Glossary::embedded()?,
        };
        info!(entries = glossary.len(), "condition glossary loaded");

        let mut controller = Self::new(Arc::new(glossary))
            .with_escalation_threshold(config.escalation_threshold)
            .with_timeout(config.external_timeout());

        if let Some(endpoint) = &config.external_endpoint {
            match HttpExtractionAdapter::new(
                endpoint.clone(),
                config.external_model.clone(),
                config.external_timeout(),
            ) {
                Ok(adapter) => controller = controller.with_external(Arc::new(adapter)),
                Err(err) => warn!(error = %err, "external extractor disabled"),
            }
        }

        Ok(controller)
    }

    pub fn with_external(mut self, adapter: Arc<dyn ExternalExtractor>) -> Self {
        self.external = Some(adapter);
        self
    }

    pub fn with_escalation_threshold(mut self, threshold: u8) -> Self {
        self.escalation_threshold = threshold.min(100);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.external_timeout = timeout;
        self
    }

    pub fn escalation_threshold(&self) -> u8 {
        self.escalation_threshold
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Layers 1 and 2 only. Identical input always yields an identical profile.
    pub fn extract_deterministic(&self, text: &str) -> CandidateProfile {
        let normalized = normalize_narrative(text);
        finalize(self.run_strategies(&normalized))
    }

    /// Full cascade. External failures of any kind fall back to the deterministic result.
    pub async fn extract(&self, text: &str, options: &ExtractionOptions) -> CandidateProfile {
        let normalized = normalize_narrative(text);
        let base = self.run_strategies(&normalized);
        let confidence = aggregate_confidence(&base);

        let (Some(adapter), Some(credential)) = (&self.external, options.usable_credential())
        else {
            return finalize(base);
        };
        if confidence >= self.escalation_threshold {
            debug!(confidence, "deterministic layers sufficient, skipping external extractor");
            return finalize(base);
        }

        info!(
            confidence,
            threshold = self.escalation_threshold,
            "escalating to external extractor"
        );
        let call = adapter.extract(&normalized, credential, &options.context_hints);
        let outcome = match tokio::time::timeout(self.external_timeout, call).await {
            Ok(Ok(value)) => ExternalProfilePayload::from_value(value),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(super::ExternalExtractionError::Timeout(self.external_timeout)),
        };

        match outcome {
            Ok(payload) => {
                let mut merged = base.clone();
                let partial = PartialExtraction {
                    layer: ExtractionLayer::External,
                    profile: payload.into_profile(),
                };
                merge_partial(&mut merged, &partial, Some(self.escalation_threshold));
                merged
                    .parsing_metadata
                    .layers_used
                    .insert(ExtractionLayer::External);
                finalize(merged)
            }
            Err(err) => {
                warn!(error = %err, "external extraction failed, keeping deterministic profile");
                finalize(base)
            }
        }
    }

    fn run_strategies(&self, text: &str) -> CandidateProfile {
        let mut profile = CandidateProfile::new();

        for strategy in &self.strategies {
            let partial = strategy.try_extract(text, &profile);
            merge_partial(&mut profile, &partial, None);
            profile
                .parsing_metadata
                .layers_used
                .insert(strategy.layer());

            let confidence = aggregate_confidence(&profile);
            profile.parsing_metadata.final_confidence = confidence;
            debug!(layer = strategy.layer().label(), confidence, "extraction layer applied");
            if confidence >= SATISFIED_CONFIDENCE {
                break;
            }
        }

        profile
    }
}

/// Post-extraction pass shared by narrative and structured input: derives BMI, records
/// required-field gaps and recomputes the aggregate confidence.
pub(crate) fn finalize(mut profile: CandidateProfile) -> CandidateProfile {
    derive_bmi(&mut profile);

    if !profile.is_documented(ProfileField::Age) {
        profile.add_documentation_gap("Age not documented");
    }
    if !profile.is_documented(ProfileField::PregnancyHistory) {
        profile.add_documentation_gap("Delivery history (gravida/para and delivery records) not documented");
    }
    if !profile.is_documented(ProfileField::Bmi) {
        profile.add_documentation_gap("BMI, height or weight not documented");
    }
    if !profile.is_documented(ProfileField::MedicalConditions) {
        profile.add_documentation_gap("Medical history not documented");
    }
    if profile.complication_count_implausible() {
        profile.add_documentation_gap(format!(
            "Complication count ({}) implausible for {} term pregnancies; verify records",
            profile.pregnancy_history.number_of_complications,
            profile.pregnancy_history.number_of_term_pregnancies
        ));
    }

    profile.parsing_metadata.final_confidence = aggregate_confidence(&profile);
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::candidate::ConditionCode;

    fn controller() -> CascadeController {
        CascadeController::embedded().expect("embedded glossary")
    }

    #[test]
    fn deterministic_extraction_runs_both_layers() {
        let profile = controller().extract_deterministic("G2P2, 2 SVD, no complications, BMI 22");
        let layers: Vec<_> = profile
            .parsing_metadata
            .layers_used
            .iter()
            .copied()
            .collect();
        assert_eq!(layers, vec![ExtractionLayer::Pattern, ExtractionLayer::Glossary]);
        assert_eq!(profile.parsing_metadata.final_confidence, 69);
        assert_eq!(profile.documentation_gaps, vec!["Age not documented"]);
    }

    #[test]
    fn missing_medical_history_is_a_documentation_gap() {
        let profile = controller().extract_deterministic("30 years old, G2P2, 2 SVD, BMI 24.");
        assert!(!profile.is_documented(ProfileField::MedicalConditions));
        assert_eq!(profile.documentation_gaps, vec!["Medical history not documented"]);

        let profile = controller().extract_deterministic("30 years old, G2P2, 2 SVD, BMI 24. Healthy.");
        assert!(profile.documentation_gaps.is_empty());
    }

    #[test]
    fn glossary_fills_what_patterns_miss() {
        let profile = controller()
            .extract_deterministic("32 years old, G1P1, 1 SVD. Had heavy bleeding after birth.");
        assert!(profile.has_condition(ConditionCode::PostpartumHemorrhage));
        assert_eq!(
            profile.field_confidence(ProfileField::MedicalConditions),
            Some(65)
        );
    }

    #[tokio::test]
    async fn extraction_without_credential_never_escalates() {
        let options = ExtractionOptions {
            use_external: true,
            credential: Some("   ".to_string()),
            context_hints: Vec::new(),
        };
        let profile = controller().extract("BMI 30", &options).await;
        assert!(!profile
            .parsing_metadata
            .layers_used
            .contains(&ExtractionLayer::External));
    }

    #[test]
    fn options_never_serialize_the_credential() {
        let json = serde_json::to_value(ExtractionOptions::with_external("secret"))
            .expect("serializes");
        assert!(json.get("credential").is_none());
        assert_eq!(json["useExternal"], serde_json::json!(true));
    }
}
