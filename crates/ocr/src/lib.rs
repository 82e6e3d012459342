pub mod document;
pub mod garbled;
pub mod preprocess;
pub mod recognizer;
pub mod selector;

pub use document::{DocumentSource, InMemoryDocument, SourceError};
pub use garbled::{is_garbled, suspicious_ratio, DEFAULT_GARBLED_THRESHOLD};
pub use preprocess::{prepare_page, PreprocessError};
pub use recognizer::{MockRecognizer, OcrError, TextRecognizer, UnavailableRecognizer};
pub use selector::{
    DirectFailure, ExtractedText, ExtractionFailure, OcrFailure, SelectorConfig,
    TextSourceSelector,
};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
