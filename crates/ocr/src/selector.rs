use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

use crate::document::{DocumentSource, SourceError};
use crate::garbled::{self, DEFAULT_GARBLED_THRESHOLD};
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrError, TextRecognizer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    /// Language code handed to the recognizer (`eng`, `afr`, …).
    pub language: String,
    pub garbled_threshold: f64,
    /// Check the direct text layer for corruption before trusting it.
    pub auto_detect: bool,
    /// Leading non-blank lines of the direct text inspected by the garbled check.
    pub sample_lines: usize,
    /// Normalize page images before recognition.
    pub preprocess: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            garbled_threshold: DEFAULT_GARBLED_THRESHOLD,
            auto_detect: true,
            sample_lines: 20,
            preprocess: true,
        }
    }
}

/// Why the direct text layer was not used.
#[derive(Debug, Error)]
pub enum DirectFailure {
    #[error("not attempted (OCR forced)")]
    NotAttempted,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("text layer looks garbled ({suspicious_ratio:.2} suspicious characters)")]
    Garbled { suspicious_ratio: f64 },
}

#[derive(Debug, Error)]
pub enum OcrFailure {
    #[error(transparent)]
    Source(SourceError),
    #[error("page {page}: {source}")]
    Preprocess {
        page: usize,
        source: PreprocessError,
    },
    #[error("page {page}: {source}")]
    Recognize { page: usize, source: OcrError },
}

/// Neither direct extraction nor OCR produced usable text. Fatal for this
/// document; document corruption is not transient so nothing is retried.
#[derive(Debug, Error)]
#[error("Text extraction failed for '{document}' (direct: {direct}; OCR: {ocr})")]
pub struct ExtractionFailure {
    pub document: String,
    pub direct: DirectFailure,
    pub ocr: OcrFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub lines: Vec<String>,
    pub ocr_used: bool,
}

/// Chooses between a document's own text layer and OCR.
///
/// OCR is only ever run when OCR is forced, the text layer is unavailable or
/// unreadable, or the text layer is judged garbled.
pub struct TextSourceSelector<R: TextRecognizer> {
    recognizer: R,
    config: SelectorConfig,
}

impl<R: TextRecognizer> TextSourceSelector<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, SelectorConfig::default())
    }

    pub fn with_config(recognizer: R, config: SelectorConfig) -> Self {
        Self { recognizer, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// [`extract_text`](Self::extract_text) with the configured auto-detect flag.
    pub fn extract(
        &self,
        document: &dyn DocumentSource,
        force_ocr: bool,
    ) -> Result<ExtractedText, ExtractionFailure> {
        self.extract_text(document, force_ocr, self.config.auto_detect)
    }

    pub fn extract_text(
        &self,
        document: &dyn DocumentSource,
        force_ocr: bool,
        auto_detect: bool,
    ) -> Result<ExtractedText, ExtractionFailure> {
        let name = document.name();

        let direct = if force_ocr {
            tracing::info!(document = name, "OCR forced; skipping text layer");
            DirectFailure::NotAttempted
        } else {
            match document.text_pages() {
                Ok(pages) => {
                    let lines = split_pages(pages.iter().map(String::as_str));
                    if !auto_detect {
                        return Ok(direct_result(name, lines));
                    }
                    let sample = sample_text(&lines, self.config.sample_lines);
                    if !garbled::is_garbled(&sample, self.config.garbled_threshold) {
                        return Ok(direct_result(name, lines));
                    }
                    let suspicious_ratio = garbled::suspicious_ratio(&sample);
                    tracing::warn!(
                        document = name,
                        suspicious_ratio,
                        "Garbled text layer, falling back to OCR"
                    );
                    DirectFailure::Garbled { suspicious_ratio }
                }
                Err(e) => {
                    tracing::warn!(document = name, error = %e, "Direct extraction failed, trying OCR");
                    DirectFailure::Source(e)
                }
            }
        };

        match self.recognize_pages(document) {
            Ok(lines) => {
                tracing::info!(document = name, lines = lines.len(), "Extracted text via OCR");
                Ok(ExtractedText { lines, ocr_used: true })
            }
            Err(ocr) => Err(ExtractionFailure {
                document: name.to_string(),
                direct,
                ocr,
            }),
        }
    }

    fn recognize_pages(&self, document: &dyn DocumentSource) -> Result<Vec<String>, OcrFailure> {
        let images = document.page_images().map_err(OcrFailure::Source)?;
        let mut texts = Vec::with_capacity(images.len());

        for (idx, image) in images.iter().enumerate() {
            let page = idx + 1;
            let bytes: Cow<'_, [u8]> = if self.config.preprocess {
                Cow::Owned(
                    preprocess::prepare_page(image)
                        .map_err(|source| OcrFailure::Preprocess { page, source })?,
                )
            } else {
                Cow::Borrowed(image.as_slice())
            };
            let text = self
                .recognizer
                .recognize(&bytes, &self.config.language)
                .map_err(|source| OcrFailure::Recognize { page, source })?;
            tracing::debug!(document = document.name(), page, chars = text.len(), "Page recognized");
            texts.push(text);
        }

        Ok(split_pages(texts.iter().map(String::as_str)))
    }
}

fn direct_result(document: &str, lines: Vec<String>) -> ExtractedText {
    tracing::info!(document, lines = lines.len(), "Extracted text from text layer");
    ExtractedText { lines, ocr_used: false }
}

/// Pages concatenated into one line sequence, blank lines kept so line
/// numbers stay traceable to the source.
fn split_pages<'a>(pages: impl Iterator<Item = &'a str>) -> Vec<String> {
    pages.flat_map(str::lines).map(str::to_string).collect()
}

fn sample_text(lines: &[String], max_lines: usize) -> String {
    lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .take(max_lines.max(1))
        .collect::<Vec<_>>()
        .join(" ")
}
