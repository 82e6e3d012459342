use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Document has no text layer")]
    NoTextLayer,
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("Document has no page images")]
    NoPageImages,
}

/// What the core needs from a statement document. File I/O, PDF parsing and
/// page rasterization live with the implementor.
pub trait DocumentSource: Send + Sync {
    /// Identity used in logs and failure reports.
    fn name(&self) -> &str;

    /// Text pages from the document's own text layer (direct extraction).
    fn text_pages(&self) -> Result<Vec<String>, SourceError>;

    /// Rasterized pages for OCR, in page order.
    fn page_images(&self) -> Result<Vec<Vec<u8>>, SourceError>;
}

/// A document already decoded into memory by the caller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    pub name: String,
    pub text_layer: Option<Result<Vec<String>, SourceError>>,
    pub page_images: Vec<Vec<u8>>,
}

impl InMemoryDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Use `text` as a single-page text layer.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_layer = Some(Ok(vec![text.into()]));
        self
    }

    pub fn with_text_pages(mut self, pages: Vec<String>) -> Self {
        self.text_layer = Some(Ok(pages));
        self
    }

    /// Make direct extraction fail with `error`.
    pub fn with_text_error(mut self, error: SourceError) -> Self {
        self.text_layer = Some(Err(error));
        self
    }

    pub fn with_page_image(mut self, image: Vec<u8>) -> Self {
        self.page_images.push(image);
        self
    }
}

impl DocumentSource for InMemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn text_pages(&self) -> Result<Vec<String>, SourceError> {
        self.text_layer.clone().unwrap_or(Err(SourceError::NoTextLayer))
    }

    fn page_images(&self) -> Result<Vec<Vec<u8>>, SourceError> {
        if self.page_images.is_empty() {
            Err(SourceError::NoPageImages)
        } else {
            Ok(self.page_images.clone())
        }
    }
}
