//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Service-side options shared by every job of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// Model identifier
    pub model: String,
    /// Source language code
    pub src_lang: String,
    /// Target language code
    pub tgt_lang: String,
    /// Terminology mapping applied by the service
    pub glossary_id: String,
    /// List of terms the service leaves untranslated
    pub do_not_translate_id: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            model: "ibm".to_string(),
            src_lang: "en".to_string(),
            tgt_lang: "ja".to_string(),
            glossary_id: "glos_v1".to_string(),
            do_not_translate_id: "dnt_v1".to_string(),
        }
    }
}

/// One document to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    /// Model identifier
    pub model: String,
    /// Document text
    pub content: String,
    /// Lowercased file extension, selects the synthetic filename
    pub extension: String,
    /// Source language code
    pub src_lang: String,
    /// Target language code
    pub tgt_lang: String,
    /// Glossary identifier
    pub glossary_id: String,
    /// Do-not-translate list identifier
    pub do_not_translate_id: String,
}

impl TranslationJob {
    /// Create a job for `content` using the run-wide settings
    pub fn new(
        settings: &TranslationSettings,
        content: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            model: settings.model.clone(),
            content: content.into(),
            extension: extension.into(),
            src_lang: settings.src_lang.clone(),
            tgt_lang: settings.tgt_lang.clone(),
            glossary_id: settings.glossary_id.clone(),
            do_not_translate_id: settings.do_not_translate_id.clone(),
        }
    }

    /// Key under which the document travels in the request and response bodies
    pub fn synthetic_filename(&self) -> String {
        format!("temp.{}", self.extension)
    }
}

/// Derive the job extension from a path: the lowercased text after the last
/// dot of the file name, or the whole file name when there is none.
pub fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// Outcome of one call to the translation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    /// Translated document content
    Translated(String),
    /// Translation did not succeed; the cause has been logged
    Failed,
}

impl TranslationResult {
    /// Check if translation succeeded
    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationResult::Translated(_))
    }
}

/// Body of `POST /translate-document`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateDocumentRequest {
    /// Model identifier
    pub model: String,
    /// Source language code
    pub src_lang: String,
    /// Target language code
    pub tgt_lang: String,
    /// Document content keyed by synthetic filename
    pub files: HashMap<String, String>,
    /// Glossary identifier
    pub glossary_id: String,
    /// Do-not-translate list identifier
    pub do_not_translate_id: String,
}

impl TranslateDocumentRequest {
    /// Build the request body, keying the content by `filename`
    pub fn from_job(job: &TranslationJob, filename: &str) -> Self {
        let mut files = HashMap::with_capacity(1);
        files.insert(filename.to_string(), job.content.clone());

        Self {
            model: job.model.clone(),
            src_lang: job.src_lang.clone(),
            tgt_lang: job.tgt_lang.clone(),
            files,
            glossary_id: job.glossary_id.clone(),
            do_not_translate_id: job.do_not_translate_id.clone(),
        }
    }
}

/// Body returned by `POST /translate-document`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateDocumentResponse {
    /// Translated content keyed by synthetic filename
    pub files: HashMap<String, String>,
}
