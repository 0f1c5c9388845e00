use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use gc_screening::config::ExtractionConfig;
use gc_screening::error::AppError;
use gc_screening::workflows::extraction::{
    AssessmentInput, DecodedDocument, DocumentDecoder, PlainTextDecoder, SourceDocument,
};
use gc_screening::ScreeningService;
use metrics_exporter_prometheus::PrometheusHandle;

/// Env var consulted when `--external` is passed without `--credential`.
pub(crate) const CREDENTIAL_ENV: &str = "SCREENING_EXTERNAL_CREDENTIAL";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(config: &ExtractionConfig) -> Result<Arc<ScreeningService>, AppError> {
    Ok(Arc::new(ScreeningService::from_config(config)?))
}

/// Plain-text decoding with the media type guessed from the file name when the caller did
/// not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct GuessingDecoder {
    inner: PlainTextDecoder,
}

impl DocumentDecoder for GuessingDecoder {
    fn decode(&self, document: &SourceDocument) -> DecodedDocument {
        if document.media_type.is_some() {
            return self.inner.decode(document);
        }
        match mime_guess::from_path(&document.name).first() {
            Some(guessed) => self
                .inner
                .decode(&document.clone().with_media_type(guessed.essence_str())),
            None => self.inner.decode(document),
        }
    }
}

pub(crate) fn load_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>, AppError> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)?;
            Ok(SourceDocument::new(display_name(path), bytes))
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Documents win over inline text; with neither, stdin is read.
pub(crate) fn read_input(
    files: &[PathBuf],
    text: Option<&str>,
) -> Result<AssessmentInput, AppError> {
    if !files.is_empty() {
        let documents = load_documents(files)?;
        return Ok(AssessmentInput::from_documents(
            &documents,
            &GuessingDecoder::default(),
        )?);
    }
    if let Some(text) = text {
        return Ok(AssessmentInput::from_text(text)?);
    }

    let mut bytes = Vec::new();
    std::io::stdin().read_to_end(&mut bytes)?;
    Ok(AssessmentInput::from_bytes(&bytes)?)
}

pub(crate) fn resolve_credential(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var(CREDENTIAL_ENV).ok())
        .filter(|value| !value.trim().is_empty())
}
