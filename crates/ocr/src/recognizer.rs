use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("No OCR engine available: build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an image-to-text engine.
///
/// Implementations accept one rasterized page (PNG/JPEG bytes) and a language
/// code, and return the recognized text. Calls are synchronous and may take
/// seconds per page; never hold a lock across one.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8], language: &str) -> Result<String, OcrError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for std::sync::Arc<R> {
    fn recognize(&self, image_bytes: &[u8], language: &str) -> Result<String, OcrError> {
        (**self).recognize(image_bytes, language)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set text, one entry per call in order; the last entry repeats.
/// Lets the extraction path be tested without Tesseract installed.
pub struct MockRecognizer {
    pages: Vec<String>,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self::pages([text.into()])
    }

    pub fn pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// How many times `recognize` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8], _language: &str) -> Result<String, OcrError> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self
            .pages
            .get(n)
            .or_else(|| self.pages.last())
            .cloned()
            .unwrap_or_default())
    }
}

/// Stand-in used when no OCR engine is compiled in. Every call fails.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8], _language: &str) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextRecognizer};
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8], language: &str) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), language)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            // Statement pages are one uniform block of tabular text.
            lt.set_variable(Variable::TesseditPagesegMode, "6")
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
