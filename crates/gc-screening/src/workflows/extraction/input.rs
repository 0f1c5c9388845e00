use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::cascade::finalize;
use crate::workflows::candidate::{CandidateProfile, PregnancyHistory, ProfileField};

const STRUCTURED_CONFIDENCE: u8 = 100;
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "json", "csv"];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },
    #[error("input is empty")]
    Empty,
    #[error("structured profile could not be parsed: {0}")]
    MalformedProfile(String),
    #[error("none of the submitted documents could be decoded")]
    NoReadableDocuments,
}

/// What a caller submitted for assessment: free narrative for the extraction cascade, or an
/// already structured profile that bypasses it.
#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentInput {
    Narrative(String),
    Structured(Box<CandidateProfile>),
}

impl AssessmentInput {
    /// Text starting with `{` is read as a structured profile; anything else is narrative.
    pub fn from_text(raw: &str) -> Result<Self, InputError> {
        let text = raw.trim_start_matches('\u{feff}').trim();
        if text.is_empty() {
            return Err(InputError::Empty);
        }

        if text.starts_with('{') {
            let value: Value = serde_json::from_str(text)
                .map_err(|err| InputError::MalformedProfile(err.to_string()))?;
            return Self::from_value(value);
        }

        Ok(Self::Narrative(text.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InputError> {
        let text = std::str::from_utf8(bytes).map_err(|err| InputError::NotUtf8 {
            valid_up_to: err.valid_up_to(),
        })?;
        Self::from_text(text)
    }

    pub fn from_value(value: Value) -> Result<Self, InputError> {
        parse_structured(value).map(|profile| Self::Structured(Box::new(profile)))
    }

    /// Decodes every document, concatenates the readable ones in submission order and treats
    /// the result as one input.
    pub fn from_documents(
        documents: &[SourceDocument],
        decoder: &dyn DocumentDecoder,
    ) -> Result<Self, InputError> {
        let decoded: Vec<DecodedDocument> = documents
            .iter()
            .map(|document| {
                let result = decoder.decode(document);
                if !result.success {
                    warn!(
                        document = %document.name,
                        file_type = %result.file_type,
                        error = result.error.as_deref().unwrap_or("unknown"),
                        "document could not be decoded"
                    );
                }
                result
            })
            .collect();

        let combined = combine_documents(&decoded);
        if combined.is_empty() {
            return Err(InputError::NoReadableDocuments);
        }
        Self::from_text(&combined)
    }
}

/// Joins the text of successfully decoded documents with blank lines.
pub fn combine_documents(documents: &[DecodedDocument]) -> String {
    documents
        .iter()
        .filter(|document| document.success)
        .map(|document| document.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    fn mime(&self) -> Option<mime::Mime> {
        self.media_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Media type essence when known, otherwise the file extension.
    pub fn file_type(&self) -> String {
        self.mime()
            .map(|mime| mime.essence_str().to_string())
            .or_else(|| self.extension())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedDocument {
    pub success: bool,
    pub text: String,
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecodedDocument {
    pub fn decoded(file_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            file_type: file_type.into(),
            error: None,
        }
    }

    pub fn failed(file_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            file_type: file_type.into(),
            error: Some(error.into()),
        }
    }
}

/// Turns uploaded bytes into text. Decoders report failure in the result rather than
/// returning an error so that one unreadable file never sinks a batch.
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, document: &SourceDocument) -> DecodedDocument;
}

/// Decodes UTF-8 text formats. Binary formats such as PDF are reported as undecodable.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextDecoder;

impl PlainTextDecoder {
    pub fn accepts(&self, document: &SourceDocument) -> bool {
        match document.mime() {
            Some(mime) => {
                mime.type_() == mime::TEXT
                    || mime.essence_str() == mime::APPLICATION_JSON.essence_str()
            }
            None => document
                .extension()
                .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str())),
        }
    }
}

impl DocumentDecoder for PlainTextDecoder {
    fn decode(&self, document: &SourceDocument) -> DecodedDocument {
        let file_type = document.file_type();
        if !self.accepts(document) {
            return DecodedDocument::failed(file_type.clone(), format!("no decoder for {file_type}"));
        }

        match std::str::from_utf8(&document.bytes) {
            Ok(text) => DecodedDocument::decoded(file_type, text.trim_start_matches('\u{feff}')),
            Err(err) => DecodedDocument::failed(file_type, format!("not valid UTF-8: {err}")),
        }
    }
}

/// Lenient structured parse: fields whose JSON type does not match are dropped and listed in
/// `malformed_fields` instead of failing the whole profile.
fn parse_structured(value: Value) -> Result<CandidateProfile, InputError> {
    let Value::Object(object) = value else {
        return Err(InputError::MalformedProfile(
            "expected a JSON object".to_string(),
        ));
    };

    let mut malformed = BTreeSet::new();
    let mut cleaned = Map::new();
    let mut present = BTreeSet::new();

    for (key, value) in object {
        if key == "pregnancyHistory" {
            match clean_history(value, &mut malformed) {
                Some(history) => {
                    present.insert(key.clone());
                    cleaned.insert(key, history);
                }
                None => {
                    malformed.insert(key);
                }
            }
            continue;
        }

        if field_parses::<CandidateProfile>(&key, &value) {
            if !value.is_null() {
                present.insert(key.clone());
            }
            cleaned.insert(key, value);
        } else {
            malformed.insert(key);
        }
    }

    let mut profile: CandidateProfile = serde_json::from_value(Value::Object(cleaned))
        .map_err(|err| InputError::MalformedProfile(err.to_string()))?;

    // Supplied confidences are kept; every other present field is fully trusted.
    for field in present.iter().filter_map(|key| structured_field(key)) {
        if profile.field_confidence(field).is_none() {
            profile.set_field_confidence(field, STRUCTURED_CONFIDENCE);
        }
    }

    let missing_evidence: Vec<_> = profile
        .medical_conditions
        .iter()
        .copied()
        .filter(|code| {
            code.complication_category()
                .is_some_and(|category| !profile.pregnancy_specific_complications.contains_key(&category))
        })
        .collect();
    for code in missing_evidence {
        profile.record_condition(code, code.label());
    }

    let history = &mut profile.pregnancy_history;
    history.has_completed_pregnancy |=
        history.total_deliveries > 0 || history.number_of_term_pregnancies > 0;

    profile.parsing_metadata.malformed_fields.extend(malformed);
    Ok(finalize(profile))
}

fn clean_history(value: Value, malformed: &mut BTreeSet<String>) -> Option<Value> {
    let Value::Object(object) = value else {
        return None;
    };

    let mut cleaned = Map::new();
    for (key, value) in object {
        if field_parses::<PregnancyHistory>(&key, &value) {
            cleaned.insert(key, value);
        } else {
            malformed.insert(format!("pregnancyHistory.{key}"));
        }
    }
    Some(Value::Object(cleaned))
}

fn field_parses<T: serde::de::DeserializeOwned>(key: &str, value: &Value) -> bool {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());
    serde_json::from_value::<T>(Value::Object(single)).is_ok()
}

fn structured_field(key: &str) -> Option<ProfileField> {
    let field = match key {
        "age" => ProfileField::Age,
        "heightText" | "heightInches" => ProfileField::Height,
        "weightLbs" => ProfileField::Weight,
        "bmi" => ProfileField::Bmi,
        "pregnancyHistory" => ProfileField::PregnancyHistory,
        "medicalConditions" => ProfileField::MedicalConditions,
        "psychological" => ProfileField::Psychological,
        "lifestyle" => ProfileField::Lifestyle,
        "environmental" => ProfileField::Environmental,
        _ => return None,
    };
    Some(field)
}
