use std::sync::OnceLock;

use regex::Regex;

use crate::workflows::candidate::{CandidateProfile, ProfileField};

const AGE_RANGE: std::ops::RangeInclusive<u8> = 16..=65;
const BMI_RANGE: std::ops::RangeInclusive<f64> = 12.0..=80.0;
const WEIGHT_RANGE_LBS: std::ops::RangeInclusive<f64> = 70.0..=500.0;
const HEIGHT_RANGE_IN: std::ops::RangeInclusive<f64> = 48.0..=84.0;
const KG_TO_LBS: f64 = 2.204_62;
const CM_PER_INCH: f64 = 2.54;

struct AgePattern {
    regex: Regex,
    confidence: u8,
}

static AGE_PATTERNS: OnceLock<Vec<AgePattern>> = OnceLock::new();
static GESTATIONAL_PREFIX: OnceLock<Regex> = OnceLock::new();
static GESTATIONAL_SUFFIX: OnceLock<Regex> = OnceLock::new();
static BMI_PATTERN: OnceLock<Regex> = OnceLock::new();
static WEIGHT_LBS: OnceLock<Regex> = OnceLock::new();
static WEIGHT_KG: OnceLock<Regex> = OnceLock::new();
static WEIGHT_BARE: OnceLock<Regex> = OnceLock::new();
static HEIGHT_IMPERIAL: OnceLock<Regex> = OnceLock::new();
static HEIGHT_METRIC: OnceLock<Regex> = OnceLock::new();
static HEIGHT_BARE: OnceLock<Regex> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid measurement pattern {pattern}: {err}"))
}

fn age_patterns() -> &'static [AgePattern] {
    AGE_PATTERNS.get_or_init(|| {
        [
            (r"(?i)\bage[d]?\s*(?::|=|is|of)\s*(\d{1,2})\b", 92),
            (r"(?i)\b(\d{1,2})\s*-?\s*(?:years?|yrs?)[\s-]*old\b", 90),
            (r"(?i)\b(\d{1,2})\s*(?:y/o|y\.o\.|yo\b|yr\s+old\b)", 90),
            (r"(?i)\baged?\s+(\d{1,2})\b", 90),
            (r"(?i)\b(\d{1,2})\s*(?:f|female|woman)\b", 70),
        ]
        .into_iter()
        .map(|(pattern, confidence)| AgePattern {
            regex: compile(pattern),
            confidence,
        })
        .collect()
    })
}

/// "Gestational age of 38 weeks" and "GA 38+2 wks" describe a pregnancy, not the candidate.
fn is_gestational_age(text: &str, start: usize, end: usize) -> bool {
    let prefix = GESTATIONAL_PREFIX
        .get_or_init(|| compile(r"(?i)\b(?:gestational|gestation|fetal|ga)\s*$"));
    let suffix = GESTATIONAL_SUFFIX.get_or_init(|| {
        compile(r"(?i)^\s*(?:\+\s*\d\s*(?:/\s*7)?\s*)?(?:(?:weeks?|wks?)\b|w\d)")
    });
    prefix.is_match(&text[..start]) || suffix.is_match(&text[end..])
}

pub(super) fn extract_age(text: &str, profile: &mut CandidateProfile) {
    for pattern in age_patterns() {
        let found = pattern
            .regex
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let value = captures.get(1)?;
                if is_gestational_age(text, whole.start(), value.end()) {
                    return None;
                }
                value.as_str().parse::<u8>().ok()
            })
            .find(|age| AGE_RANGE.contains(age));

        if let Some(age) = found {
            profile.age = Some(age);
            profile.set_field_confidence(ProfileField::Age, pattern.confidence);
            return;
        }
    }
}

pub(super) fn extract_bmi(text: &str, profile: &mut CandidateProfile) {
    let regex = BMI_PATTERN.get_or_init(|| {
        compile(
            r"(?i)\bbmi\s*(?:of|is|was|=|:)?\s*(?:approximately|approx\.?|about|around|~)?\s*(\d{1,2}(?:\.\d+)?)",
        )
    });

    let found = regex
        .captures_iter(text)
        .filter_map(|captures| captures.get(1)?.as_str().parse::<f64>().ok())
        .find(|bmi| BMI_RANGE.contains(bmi));

    if let Some(bmi) = found {
        profile.bmi = Some(bmi);
        profile.set_field_confidence(ProfileField::Bmi, 92);
    }
}

pub(super) fn extract_weight(text: &str, profile: &mut CandidateProfile) {
    let lbs = WEIGHT_LBS.get_or_init(|| {
        compile(r"(?i)\b(\d{2,3}(?:\.\d+)?)\s*(?:lbs?|pounds?)\b")
    });
    let kg = WEIGHT_KG.get_or_init(|| {
        compile(r"(?i)\b(\d{2,3}(?:\.\d+)?)\s*(?:kgs?|kilograms?)\b")
    });
    let bare = WEIGHT_BARE.get_or_init(|| {
        compile(r"(?i)\b(?:weight|wt)\s*(?:of|is|:|=)?\s*(\d{2,3}(?:\.\d+)?)\b")
    });

    let candidates = [(lbs, 1.0, 90), (kg, KG_TO_LBS, 85), (bare, 1.0, 60)];
    for (regex, factor, confidence) in candidates {
        let found = regex
            .captures_iter(text)
            .filter_map(|captures| captures.get(1)?.as_str().parse::<f64>().ok())
            .map(|value| round_tenth(value * factor))
            .find(|weight| WEIGHT_RANGE_LBS.contains(weight));

        if let Some(weight) = found {
            profile.weight_lbs = Some(weight);
            profile.set_field_confidence(ProfileField::Weight, confidence);
            return;
        }
    }
}

pub(super) fn extract_height(text: &str, profile: &mut CandidateProfile) {
    let imperial = HEIGHT_IMPERIAL.get_or_init(|| {
        compile(
            r#"(?i)\b([4-7])\s*(?:'|ft\b\.?|feet\b|foot\b)\s*(?:(\d{1,2}(?:\.\d+)?)\s*(?:"|''|in\b\.?|inches\b|inch\b)?)?"#,
        )
    });
    let metric = HEIGHT_METRIC.get_or_init(|| {
        compile(r"(?i)\b(1[2-9]\d|2[0-2]\d)\s*(?:cm|centimet(?:er|re)s?)\b")
    });
    let bare = HEIGHT_BARE.get_or_init(|| {
        compile(r"(?i)\b(?:height|ht)\s*(?:of|is|:|=)?\s*(\d{2,3}(?:\.\d+)?)\b")
    });

    for captures in imperial.captures_iter(text) {
        let feet: f64 = match captures[1].parse() {
            Ok(feet) => feet,
            Err(_) => continue,
        };
        let inches: f64 = captures
            .get(2)
            .and_then(|value| value.as_str().parse().ok())
            .unwrap_or(0.0);
        if inches >= 12.0 {
            continue;
        }
        let total = feet * 12.0 + inches;
        if HEIGHT_RANGE_IN.contains(&total) {
            record_height(profile, captures[0].trim(), total, 88);
            return;
        }
    }

    if let Some(captures) = metric.captures(text) {
        if let Ok(cm) = captures[1].parse::<f64>() {
            let total = round_tenth(cm / CM_PER_INCH);
            if HEIGHT_RANGE_IN.contains(&total) {
                record_height(profile, captures[0].trim(), total, 88);
                return;
            }
        }
    }

    if let Some(captures) = bare.captures(text) {
        if let Ok(value) = captures[1].parse::<f64>() {
            let total = if HEIGHT_RANGE_IN.contains(&value) {
                value
            } else {
                round_tenth(value / CM_PER_INCH)
            };
            if HEIGHT_RANGE_IN.contains(&total) {
                record_height(profile, captures[0].trim(), total, 60);
            }
        }
    }
}

fn record_height(profile: &mut CandidateProfile, raw: &str, inches: f64, confidence: u8) {
    profile.height_text = Some(raw.to_string());
    profile.height_inches = Some(inches);
    profile.set_field_confidence(ProfileField::Height, confidence);
}

/// Fills BMI from height and weight when it was not stated directly.
pub(crate) fn derive_bmi(profile: &mut CandidateProfile) {
    if profile.bmi.is_some() {
        return;
    }
    let (Some(height), Some(weight)) = (profile.height_inches, profile.weight_lbs) else {
        return;
    };
    if height <= 0.0 {
        return;
    }

    let bmi = round_tenth(703.0 * weight / (height * height));
    if !BMI_RANGE.contains(&bmi) {
        return;
    }

    let height_confidence = profile.field_confidence(ProfileField::Height).unwrap_or(0);
    let weight_confidence = profile.field_confidence(ProfileField::Weight).unwrap_or(0);
    profile.bmi = Some(bmi);
    profile.set_field_confidence(
        ProfileField::Bmi,
        height_confidence.min(weight_confidence).saturating_sub(10),
    );
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
