//! Layer 2: glossary lookup over phrase windows, exact or fuzzy.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::negation;
use super::normalizer::tokenize;
use super::{ExtractionStrategy, PartialExtraction};
use crate::workflows::candidate::{CandidateProfile, ConditionCode, ExtractionLayer, ProfileField};

const EMBEDDED_GLOSSARY: &str = include_str!("../../../data/glossary.csv");

const MAX_WINDOW_TOKENS: usize = 6;
const FUZZY_MIN_CHARS: usize = 6;
const FUZZY_THRESHOLD: f64 = 0.93;
const EXACT_CONFIDENCE: u8 = 65;
const FUZZY_CONFIDENCE: u8 = 55;

#[derive(Debug, thiserror::Error)]
pub enum GlossaryError {
    #[error("failed to read glossary: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid glossary CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("glossary row {row}: unknown condition code `{code}`")]
    UnknownCode { row: usize, code: String },
    #[error("glossary row {row}: unknown severity `{severity}`")]
    UnknownSeverity { row: usize, severity: String },
}

/// Display severity carried by each glossary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlossarySeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl GlossarySeverity {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Self::Minor),
            "moderate" => Some(Self::Moderate),
            "major" => Some(Self::Major),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlossaryEntry {
    pub condition: String,
    pub code: ConditionCode,
    pub severity: GlossarySeverity,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GlossaryRow {
    #[serde(rename = "Condition")]
    condition: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Severity")]
    severity: String,
    #[serde(rename = "Synonyms", default)]
    synonyms: String,
}

#[derive(Debug, Clone)]
struct GlossaryTerm {
    text: String,
    entry: usize,
    order: usize,
}

/// A glossary hit inside the narrative.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryMatch {
    pub code: ConditionCode,
    pub term: String,
    pub matched_text: String,
    pub similarity: f64,
    pub start: usize,
    pub end: usize,
}

impl GlossaryMatch {
    pub fn is_exact(&self) -> bool {
        self.similarity >= 1.0
    }
}

/// Immutable condition glossary, indexed by token count and first character.
#[derive(Debug, Clone)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
    terms: Vec<GlossaryTerm>,
    buckets: HashMap<(usize, char), Vec<usize>>,
}

fn term_key(raw: &str) -> String {
    tokenize(raw)
        .into_iter()
        .map(|(token, _, _)| token)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Glossary {
    /// Glossary compiled into the crate.
    pub fn embedded() -> Result<Self, GlossaryError> {
        Self::from_reader(EMBEDDED_GLOSSARY.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GlossaryError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GlossaryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (index, record) in csv_reader.deserialize::<GlossaryRow>().enumerate() {
            let row = record?;
            let row_number = index + 2;
            let code = ConditionCode::from_code(&row.code).ok_or_else(|| {
                GlossaryError::UnknownCode {
                    row: row_number,
                    code: row.code.clone(),
                }
            })?;
            let severity = GlossarySeverity::parse(&row.severity).ok_or_else(|| {
                GlossaryError::UnknownSeverity {
                    row: row_number,
                    severity: row.severity.clone(),
                }
            })?;

            let mut synonyms: Vec<String> = row
                .synonyms
                .split('|')
                .map(str::trim)
                .filter(|synonym| !synonym.is_empty())
                .map(str::to_string)
                .collect();
            if !synonyms
                .iter()
                .any(|synonym| synonym.eq_ignore_ascii_case(&row.condition))
            {
                synonyms.insert(0, row.condition.clone());
            }

            entries.push(GlossaryEntry {
                condition: row.condition,
                code,
                severity,
                synonyms,
            });
        }

        Ok(Self::index(entries))
    }

    fn index(entries: Vec<GlossaryEntry>) -> Self {
        let mut terms = Vec::new();
        let mut buckets: HashMap<(usize, char), Vec<usize>> = HashMap::new();

        for (entry_index, entry) in entries.iter().enumerate() {
            for synonym in &entry.synonyms {
                let text = term_key(synonym);
                let Some(first) = text.chars().next() else {
                    continue;
                };
                let token_count = text.split(' ').count();
                if token_count > MAX_WINDOW_TOKENS {
                    continue;
                }
                let order = terms.len();
                buckets
                    .entry((token_count, first))
                    .or_default()
                    .push(order);
                terms.push(GlossaryTerm {
                    text,
                    entry: entry_index,
                    order,
                });
            }
        }

        Self {
            entries,
            terms,
            buckets,
        }
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn severity_of(&self, code: ConditionCode) -> Option<GlossarySeverity> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.severity)
    }

    /// Non-overlapping, non-negated glossary hits in text order. Overlaps resolve to the
    /// longest phrase, then the higher similarity, then the earlier glossary row.
    pub fn match_text(&self, text: &str) -> Vec<GlossaryMatch> {
        struct Candidate {
            first_token: usize,
            token_count: usize,
            similarity: f64,
            term: usize,
        }

        let tokens = tokenize(text);
        let mut candidates = Vec::new();

        for first_token in 0..tokens.len() {
            let longest = MAX_WINDOW_TOKENS.min(tokens.len() - first_token);
            for token_count in 1..=longest {
                let window = &tokens[first_token..first_token + token_count];
                let phrase = window
                    .iter()
                    .map(|(token, _, _)| token.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let Some(first) = phrase.chars().next() else {
                    continue;
                };
                let Some(bucket) = self.buckets.get(&(token_count, first)) else {
                    continue;
                };

                let best = bucket
                    .iter()
                    .filter_map(|&term_index| {
                        let term = &self.terms[term_index];
                        let similarity = if term.text == phrase {
                            1.0
                        } else if term.text.chars().count() >= FUZZY_MIN_CHARS
                            && phrase.chars().count() >= FUZZY_MIN_CHARS
                        {
                            strsim::jaro_winkler(&phrase, &term.text)
                        } else {
                            return None;
                        };
                        (similarity >= FUZZY_THRESHOLD).then_some((term_index, similarity))
                    })
                    .max_by(|left, right| {
                        left.1
                            .total_cmp(&right.1)
                            .then(self.terms[right.0].order.cmp(&self.terms[left.0].order))
                    });

                if let Some((term, similarity)) = best {
                    let start = window[0].1;
                    let end = window[token_count - 1].2;
                    if negation::mention_applies(text, start, end) {
                        candidates.push(Candidate {
                            first_token,
                            token_count,
                            similarity,
                            term,
                        });
                    }
                }
            }
        }

        candidates.sort_by(|left, right| {
            right
                .token_count
                .cmp(&left.token_count)
                .then(right.similarity.total_cmp(&left.similarity))
                .then(self.terms[left.term].order.cmp(&self.terms[right.term].order))
                .then(left.first_token.cmp(&right.first_token))
        });

        let mut claimed = vec![false; tokens.len()];
        let mut selected = Vec::new();
        for candidate in candidates {
            let span = candidate.first_token..candidate.first_token + candidate.token_count;
            if claimed[span.clone()].iter().any(|taken| *taken) {
                continue;
            }
            claimed[span.clone()].iter_mut().for_each(|taken| *taken = true);

            let term = &self.terms[candidate.term];
            let start = tokens[span.start].1;
            let end = tokens[span.end - 1].2;
            selected.push(GlossaryMatch {
                code: self.entries[term.entry].code,
                term: term.text.clone(),
                matched_text: text[start..end].to_string(),
                similarity: candidate.similarity,
                start,
                end,
            });
        }

        selected.sort_by_key(|hit| hit.start);
        selected
    }
}

/// Adds conditions the pattern layer missed, using the shared glossary.
#[derive(Debug, Clone)]
pub struct GlossaryMapper {
    glossary: Arc<Glossary>,
}

impl GlossaryMapper {
    pub fn new(glossary: Arc<Glossary>) -> Self {
        Self { glossary }
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }
}

impl ExtractionStrategy for GlossaryMapper {
    fn layer(&self) -> ExtractionLayer {
        ExtractionLayer::Glossary
    }

    fn try_extract(&self, text: &str, current: &CandidateProfile) -> PartialExtraction {
        let mut profile = CandidateProfile::new();
        let mut confidence = None;

        for hit in self.glossary.match_text(text) {
            if current.has_condition(hit.code) {
                continue;
            }
            profile.record_condition(hit.code, &hit.matched_text);
            let hit_confidence = if hit.is_exact() {
                EXACT_CONFIDENCE
            } else {
                FUZZY_CONFIDENCE
            };
            confidence = Some(confidence.map_or(hit_confidence, |best: u8| best.max(hit_confidence)));
        }

        if let Some(confidence) = confidence {
            profile.set_field_confidence(ProfileField::MedicalConditions, confidence);
        }

        PartialExtraction {
            layer: self.layer(),
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary() -> Glossary {
        Glossary::embedded().expect("embedded glossary parses")
    }

    #[test]
    fn embedded_glossary_covers_every_code() {
        let glossary = glossary();
        for code in ConditionCode::all() {
            assert!(glossary.severity_of(code).is_some(), "missing {code:?}");
        }
        assert_eq!(
            glossary.severity_of(ConditionCode::HellpSyndrome),
            Some(GlossarySeverity::Critical)
        );
    }

    #[test]
    fn lay_phrasing_is_mapped() {
        let hits = glossary().match_text("She had heavy bleeding after birth with her second");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, ConditionCode::PostpartumHemorrhage);
        assert!(hits[0].is_exact());
        assert_eq!(hits[0].matched_text, "heavy bleeding after birth");
    }

    #[test]
    fn misspellings_match_fuzzily() {
        let hits = glossary().match_text("Diagnosed with preclampsia in 2019");
        assert!(hits
            .iter()
            .any(|hit| hit.code == ConditionCode::Preeclampsia && !hit.is_exact()));
    }

    #[test]
    fn short_terms_never_match_fuzzily() {
        let hits = glossary().match_text("hiz and adhx");
        assert!(hits.is_empty());
    }

    #[test]
    fn negated_phrases_are_skipped() {
        let hits = glossary().match_text("Denies high blood pressure");
        assert!(hits.is_empty());
    }

    #[test]
    fn mapper_only_adds_codes_missing_from_current_profile() {
        let mapper = GlossaryMapper::new(Arc::new(glossary()));
        let mut current = CandidateProfile::new();
        current.record_condition(ConditionCode::ChronicHypertension, "htn");

        let partial = mapper.try_extract(
            "high blood pressure and a clotting disorder",
            &current,
        );
        let codes: Vec<_> = partial.profile.medical_conditions.iter().copied().collect();
        assert_eq!(codes, vec![ConditionCode::Thrombophilia]);
        assert_eq!(
            partial.profile.field_confidence(ProfileField::MedicalConditions),
            Some(EXACT_CONFIDENCE)
        );
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let csv = "Condition,Code,Severity,Synonyms\nMystery,not_a_code,minor,thing\n";
        let err = Glossary::from_reader(csv.as_bytes()).expect_err("unknown code");
        assert!(matches!(err, GlossaryError::UnknownCode { row: 2, .. }));

        let csv = "Condition,Code,Severity,Synonyms\nAsthma,asthma,severe,wheeze\n";
        let err = Glossary::from_reader(csv.as_bytes()).expect_err("unknown severity");
        assert!(matches!(err, GlossaryError::UnknownSeverity { .. }));
    }
}
