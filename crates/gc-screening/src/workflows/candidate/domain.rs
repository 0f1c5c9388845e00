use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::conditions::{ComplicationCategory, ConditionCode};

/// Extracted facts about a prospective carrier. Built additively by the extraction layers and
/// read-only once scoring starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub age: Option<u8>,
    pub height_text: Option<String>,
    pub height_inches: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub bmi: Option<f64>,
    pub pregnancy_history: PregnancyHistory,
    pub medical_conditions: BTreeSet<ConditionCode>,
    pub pregnancy_specific_complications: BTreeMap<ComplicationCategory, ComplicationEvidence>,
    pub psychological: BTreeMap<PsychologicalFactor, bool>,
    pub lifestyle: BTreeMap<LifestyleFactor, bool>,
    pub environmental: BTreeMap<EnvironmentalFactor, bool>,
    pub documentation_gaps: Vec<String>,
    pub parsing_metadata: ParsingMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PregnancyHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravida: Option<u32>,
    pub has_completed_pregnancy: bool,
    pub number_of_term_pregnancies: u32,
    pub number_of_cesareans: u32,
    pub number_of_complications: u32,
    pub total_deliveries: u32,
    pub complications: Vec<ComplicationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationRecord {
    pub category: ComplicationCategory,
    #[serde(default)]
    pub mentions: BTreeSet<String>,
}

/// Raw textual evidence kept for traceability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplicationEvidence {
    pub found: bool,
    #[serde(default)]
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PsychologicalFactor {
    AdequateSupportSystem,
    PsychiatricHospitalization,
    HistoryOfAbuse,
    CurrentPsychotropicMedication,
    PsychologicalEvaluationCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifestyleFactor {
    CurrentSmoker,
    FormerSmoker,
    HeavyAlcoholUse,
    IllicitDrugUse,
    MarijuanaUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvironmentalFactor {
    StableHousing,
    FinancialStability,
    ReceivingPublicAssistance,
    DomesticViolence,
    CriminalHistory,
}

/// Extraction strategy that contributed to a profile. Serialized as its layer number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExtractionLayer {
    Pattern,
    Glossary,
    External,
}

impl ExtractionLayer {
    pub const fn number(self) -> u8 {
        match self {
            ExtractionLayer::Pattern => 1,
            ExtractionLayer::Glossary => 2,
            ExtractionLayer::External => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ExtractionLayer::Pattern => "pattern",
            ExtractionLayer::Glossary => "glossary",
            ExtractionLayer::External => "external",
        }
    }
}

impl From<ExtractionLayer> for u8 {
    fn from(value: ExtractionLayer) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for ExtractionLayer {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ExtractionLayer::Pattern),
            2 => Ok(ExtractionLayer::Glossary),
            3 => Ok(ExtractionLayer::External),
            other => Err(format!("unknown extraction layer {other}")),
        }
    }
}

/// Profile fields tracked for confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    Age,
    Height,
    Weight,
    Bmi,
    PregnancyHistory,
    MedicalConditions,
    Psychological,
    Lifestyle,
    Environmental,
}

impl ProfileField {
    /// Fields the guideline engine cannot score without, with their share of the aggregate
    /// confidence.
    pub const REQUIRED: [(ProfileField, u32); 4] = [
        (ProfileField::Age, 20),
        (ProfileField::PregnancyHistory, 35),
        (ProfileField::Bmi, 20),
        (ProfileField::MedicalConditions, 25),
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::Height => "height",
            ProfileField::Weight => "weight",
            ProfileField::Bmi => "BMI",
            ProfileField::PregnancyHistory => "pregnancy history",
            ProfileField::MedicalConditions => "medical conditions",
            ProfileField::Psychological => "psychological factors",
            ProfileField::Lifestyle => "lifestyle factors",
            ProfileField::Environmental => "environmental factors",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsingMetadata {
    pub layers_used: BTreeSet<ExtractionLayer>,
    pub final_confidence: u8,
    pub per_field_confidence: BTreeMap<ProfileField, u8>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub malformed_fields: BTreeSet<String>,
}

impl CandidateProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_confidence(&self, field: ProfileField) -> Option<u8> {
        self.parsing_metadata
            .per_field_confidence
            .get(&field)
            .copied()
    }

    pub fn set_field_confidence(&mut self, field: ProfileField, confidence: u8) {
        self.parsing_metadata
            .per_field_confidence
            .insert(field, confidence.min(100));
    }

    /// Whether any layer (or the caller, for structured input) populated `field`.
    pub fn is_documented(&self, field: ProfileField) -> bool {
        self.parsing_metadata
            .per_field_confidence
            .contains_key(&field)
    }

    /// Records a condition and, for pregnancy-specific codes, its obstetric evidence.
    /// Returns `false` when the code was already present.
    pub fn record_condition(&mut self, code: ConditionCode, mention: &str) -> bool {
        let inserted = self.medical_conditions.insert(code);

        if let Some(category) = code.complication_category() {
            let mention = mention.trim().to_string();
            let evidence = self
                .pregnancy_specific_complications
                .entry(category)
                .or_default();
            evidence.found = true;
            if !mention.is_empty() && !evidence.mentions.contains(&mention) {
                evidence.mentions.push(mention.clone());
            }

            let history = &mut self.pregnancy_history;
            match history
                .complications
                .iter_mut()
                .find(|record| record.category == category)
            {
                Some(record) => {
                    if !mention.is_empty() {
                        record.mentions.insert(mention);
                    }
                }
                None => {
                    let mut mentions = BTreeSet::new();
                    if !mention.is_empty() {
                        mentions.insert(mention);
                    }
                    history.complications.push(ComplicationRecord { category, mentions });
                }
            }
            history.number_of_complications = history
                .number_of_complications
                .max(history.complications.len() as u32);
        }

        inserted
    }

    pub fn add_documentation_gap(&mut self, gap: impl Into<String>) {
        let gap = gap.into();
        if !self.documentation_gaps.contains(&gap) {
            self.documentation_gaps.push(gap);
        }
    }

    pub fn has_condition(&self, code: ConditionCode) -> bool {
        self.medical_conditions.contains(&code)
    }

    pub fn psychological_flag(&self, factor: PsychologicalFactor) -> Option<bool> {
        self.psychological.get(&factor).copied()
    }

    pub fn lifestyle_flag(&self, factor: LifestyleFactor) -> Option<bool> {
        self.lifestyle.get(&factor).copied()
    }

    pub fn environmental_flag(&self, factor: EnvironmentalFactor) -> Option<bool> {
        self.environmental.get(&factor).copied()
    }

    /// Implausible when complications outnumber term pregnancies more than threefold.
    pub fn complication_count_implausible(&self) -> bool {
        let history = &self.pregnancy_history;
        history.number_of_complications > 0
            && history.number_of_complications > history.number_of_term_pregnancies * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_condition_dedupes_and_keeps_evidence_order() {
        let mut profile = CandidateProfile::new();
        assert!(profile.record_condition(ConditionCode::Preeclampsia, "preeclampsia"));
        assert!(profile.record_condition(ConditionCode::HellpSyndrome, "HELLP"));
        assert!(!profile.record_condition(ConditionCode::Preeclampsia, "pre-eclampsia"));

        let evidence = profile
            .pregnancy_specific_complications
            .get(&ComplicationCategory::HypertensiveDisorders)
            .expect("evidence recorded");
        assert!(evidence.found);
        assert_eq!(evidence.mentions, vec!["preeclampsia", "HELLP", "pre-eclampsia"]);
        assert_eq!(profile.pregnancy_history.complications.len(), 1);
        assert_eq!(profile.pregnancy_history.number_of_complications, 1);
        assert_eq!(profile.medical_conditions.len(), 2);
    }

    #[test]
    fn general_conditions_do_not_touch_pregnancy_history() {
        let mut profile = CandidateProfile::new();
        profile.record_condition(ConditionCode::Asthma, "asthma");
        assert!(profile.pregnancy_history.complications.is_empty());
        assert!(profile.pregnancy_specific_complications.is_empty());
    }

    #[test]
    fn confidence_is_clamped_and_marks_field_documented() {
        let mut profile = CandidateProfile::new();
        assert!(!profile.is_documented(ProfileField::Age));
        profile.set_field_confidence(ProfileField::Age, 250);
        assert_eq!(profile.field_confidence(ProfileField::Age), Some(100));
        assert!(profile.is_documented(ProfileField::Age));
    }

    #[test]
    fn layers_serialize_as_numbers() {
        let mut metadata = ParsingMetadata::default();
        metadata.layers_used.insert(ExtractionLayer::Glossary);
        metadata.layers_used.insert(ExtractionLayer::Pattern);
        let json = serde_json::to_value(&metadata).expect("serializes");
        assert_eq!(json["layersUsed"], serde_json::json!([1, 2]));
    }

    #[test]
    fn implausible_complication_counts_are_detected() {
        let mut profile = CandidateProfile::new();
        profile.pregnancy_history.number_of_term_pregnancies = 1;
        profile.pregnancy_history.number_of_complications = 4;
        assert!(profile.complication_count_implausible());
        profile.pregnancy_history.number_of_complications = 3;
        assert!(!profile.complication_count_implausible());
    }
}
