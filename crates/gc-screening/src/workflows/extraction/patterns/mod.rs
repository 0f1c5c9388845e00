//! Layer 1: deterministic patterns over the normalized narrative.

mod factors;
mod measurements;
mod obstetric;

use std::sync::OnceLock;

use regex::Regex;

use super::vocabulary;
use super::{ExtractionStrategy, PartialExtraction};
use crate::workflows::candidate::{CandidateProfile, ExtractionLayer, ProfileField};

pub(crate) use measurements::derive_bmi;

const CONDITION_CONFIDENCE: u8 = 88;
const KNOWN_EMPTY_CONFIDENCE: u8 = 75;

static NO_HISTORY: OnceLock<Regex> = OnceLock::new();

fn no_history() -> &'static Regex {
    NO_HISTORY.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:no\s+(?:pregnancy\s+|obstetric\s+|prior\s+|known\s+)?complications|uncomplicated|no\s+(?:significant\s+)?(?:past\s+)?medical\s+history|no\s+(?:known\s+)?(?:medical|health)\s+(?:conditions|problems|issues)|no\s+chronic\s+(?:conditions|illness(?:es)?)|healthy|pmh\s*:?\s*(?:none|negative|unremarkable|noncontributory))\b",
        )
        .expect("no-history pattern compiles")
    })
}

/// Recognizes obstetric shorthand, measurements, condition vocabulary and psychosocial
/// phrases. Never fails: unrecognized text simply leaves fields unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> CandidateProfile {
        let mut profile = CandidateProfile::new();

        measurements::extract_age(text, &mut profile);
        measurements::extract_bmi(text, &mut profile);
        measurements::extract_weight(text, &mut profile);
        measurements::extract_height(text, &mut profile);
        derive_bmi(&mut profile);

        obstetric::extract_pregnancy_history(text, &mut profile);
        extract_conditions(text, &mut profile);
        factors::extract_factors(text, &mut profile);

        profile
    }
}

impl ExtractionStrategy for PatternExtractor {
    fn layer(&self) -> ExtractionLayer {
        ExtractionLayer::Pattern
    }

    fn try_extract(&self, text: &str, _current: &CandidateProfile) -> PartialExtraction {
        PartialExtraction {
            layer: self.layer(),
            profile: self.extract(text),
        }
    }
}

fn extract_conditions(text: &str, profile: &mut CandidateProfile) {
    let mentions = vocabulary::find_conditions(text);
    for mention in &mentions {
        profile.record_condition(mention.code, &mention.text);
    }

    if !mentions.is_empty() {
        profile.set_field_confidence(ProfileField::MedicalConditions, CONDITION_CONFIDENCE);
    } else if no_history().is_match(text) {
        profile.set_field_confidence(ProfileField::MedicalConditions, KNOWN_EMPTY_CONFIDENCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::candidate::{ComplicationCategory, ConditionCode};

    #[test]
    fn uncomplicated_history_is_fully_read() {
        let profile = PatternExtractor::new().extract("G2P2, 2 SVD, no complications, BMI 22");
        assert_eq!(profile.bmi, Some(22.0));
        assert_eq!(profile.pregnancy_history.total_deliveries, 2);
        assert!(profile.medical_conditions.is_empty());
        assert_eq!(
            profile.field_confidence(ProfileField::MedicalConditions),
            Some(KNOWN_EMPTY_CONFIDENCE)
        );
        assert_eq!(profile.age, None);
    }

    #[test]
    fn complications_feed_the_obstetric_record() {
        let profile =
            PatternExtractor::new().extract("BMI 34, GDM in last pregnancy, 1 C-section");
        assert_eq!(profile.bmi, Some(34.0));
        assert_eq!(profile.pregnancy_history.number_of_cesareans, 1);
        assert!(profile.has_condition(ConditionCode::GestationalDiabetes));
        assert_eq!(profile.pregnancy_history.number_of_complications, 1);
        assert!(profile
            .pregnancy_specific_complications
            .contains_key(&ComplicationCategory::GestationalDiabetes));
        assert_eq!(
            profile.field_confidence(ProfileField::MedicalConditions),
            Some(CONDITION_CONFIDENCE)
        );
    }

    #[test]
    fn repeated_mentions_are_counted_once() {
        let profile = PatternExtractor::new()
            .extract("Preeclampsia with first. Pre-eclampsia again with second; chronic HTN.");
        assert_eq!(profile.medical_conditions.len(), 2);
        assert_eq!(profile.pregnancy_history.number_of_complications, 1);
    }

    #[test]
    fn empty_text_yields_empty_profile() {
        let profile = PatternExtractor::new().extract("");
        assert_eq!(profile, CandidateProfile::new());
    }
}
