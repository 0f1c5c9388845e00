use std::collections::BTreeMap;

use super::confidence::LOW_CONFIDENCE;
use super::PartialExtraction;
use crate::workflows::candidate::{CandidateProfile, ConditionCode, ProfileField};

/// Whether an incoming value may replace the current one. Unset fields are always filled; set
/// fields only when their confidence is low and the incoming value is more certain. Fields at
/// or above `protect_at` are never touched.
pub(crate) fn should_take(current: Option<u8>, incoming: u8, protect_at: Option<u8>) -> bool {
    match current {
        None => true,
        Some(current) if protect_at.is_some_and(|threshold| current >= threshold) => false,
        Some(current) => current < LOW_CONFIDENCE && incoming > current,
    }
}

fn is_protected(target: &CandidateProfile, field: ProfileField, protect_at: Option<u8>) -> bool {
    match (target.field_confidence(field), protect_at) {
        (Some(current), Some(threshold)) => current >= threshold,
        _ => false,
    }
}

/// Folds a layer's partial profile into `target` without ever discarding what earlier layers
/// established.
pub(crate) fn merge_partial(
    target: &mut CandidateProfile,
    partial: &PartialExtraction,
    protect_at: Option<u8>,
) {
    let incoming = &partial.profile;

    let take = |target: &mut CandidateProfile, field: ProfileField| -> bool {
        match incoming.field_confidence(field) {
            Some(confidence)
                if should_take(target.field_confidence(field), confidence, protect_at) =>
            {
                target.set_field_confidence(field, confidence);
                true
            }
            _ => false,
        }
    };

    if take(target, ProfileField::Age) {
        target.age = incoming.age;
    }
    if take(target, ProfileField::Height) {
        target.height_text = incoming.height_text.clone();
        target.height_inches = incoming.height_inches;
    }
    if take(target, ProfileField::Weight) {
        target.weight_lbs = incoming.weight_lbs;
    }
    if take(target, ProfileField::Bmi) {
        target.bmi = incoming.bmi;
    }
    if take(target, ProfileField::PregnancyHistory) {
        let source = &incoming.pregnancy_history;
        let history = &mut target.pregnancy_history;
        history.gravida = source.gravida.or(history.gravida);
        history.has_completed_pregnancy = source.has_completed_pregnancy;
        history.number_of_term_pregnancies = source.number_of_term_pregnancies;
        history.number_of_cesareans = source.number_of_cesareans;
        history.total_deliveries = source.total_deliveries;
        history.number_of_complications = source
            .number_of_complications
            .max(history.complications.len() as u32);
    }

    merge_conditions(target, incoming, protect_at);
    merge_flags(
        target,
        ProfileField::Psychological,
        incoming.field_confidence(ProfileField::Psychological),
        &incoming.psychological,
        protect_at,
        |profile| &mut profile.psychological,
    );
    merge_flags(
        target,
        ProfileField::Lifestyle,
        incoming.field_confidence(ProfileField::Lifestyle),
        &incoming.lifestyle,
        protect_at,
        |profile| &mut profile.lifestyle,
    );
    merge_flags(
        target,
        ProfileField::Environmental,
        incoming.field_confidence(ProfileField::Environmental),
        &incoming.environmental,
        protect_at,
        |profile| &mut profile.environmental,
    );

    for gap in &incoming.documentation_gaps {
        target.add_documentation_gap(gap.clone());
    }
    target
        .parsing_metadata
        .malformed_fields
        .extend(incoming.parsing_metadata.malformed_fields.iter().cloned());
}

fn mentions_for(profile: &CandidateProfile, code: ConditionCode) -> Vec<String> {
    let mentions = code
        .complication_category()
        .and_then(|category| profile.pregnancy_specific_complications.get(&category))
        .map(|evidence| evidence.mentions.clone())
        .unwrap_or_default();
    if mentions.is_empty() {
        vec![code.label().to_string()]
    } else {
        mentions
    }
}

fn merge_conditions(
    target: &mut CandidateProfile,
    incoming: &CandidateProfile,
    protect_at: Option<u8>,
) {
    let Some(confidence) = incoming.field_confidence(ProfileField::MedicalConditions) else {
        return;
    };
    if is_protected(target, ProfileField::MedicalConditions, protect_at) {
        return;
    }

    for code in &incoming.medical_conditions {
        if !target.has_condition(*code) {
            for mention in mentions_for(incoming, *code) {
                target.record_condition(*code, &mention);
            }
        }
    }

    let history = &mut target.pregnancy_history;
    history.number_of_complications = history
        .number_of_complications
        .max(incoming.pregnancy_history.number_of_complications);

    if should_take(
        target.field_confidence(ProfileField::MedicalConditions),
        confidence,
        protect_at,
    ) {
        target.set_field_confidence(ProfileField::MedicalConditions, confidence);
    }
}

fn merge_flags<K: Ord + Copy>(
    target: &mut CandidateProfile,
    field: ProfileField,
    confidence: Option<u8>,
    incoming: &BTreeMap<K, bool>,
    protect_at: Option<u8>,
    select: impl Fn(&mut CandidateProfile) -> &mut BTreeMap<K, bool>,
) {
    if incoming.is_empty() || is_protected(target, field, protect_at) {
        return;
    }

    let flags = select(target);
    for (key, value) in incoming {
        flags.entry(*key).or_insert(*value);
    }

    if let Some(confidence) = confidence {
        if should_take(target.field_confidence(field), confidence, protect_at) {
            target.set_field_confidence(field, confidence);
        }
    }
}
