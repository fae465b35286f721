//! Error types for the passbook-core library.

use thiserror::Error;

/// Main error type for the passbook library.
#[derive(Error, Debug)]
pub enum PassbookError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// No schema is registered under the requested institution key.
    #[error("unsupported institution: {0}")]
    UnsupportedInstitution(String),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and the supplied password did not open it.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised while turning raw content into transaction records.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A raw content provider failed while a strategy was running.
    #[error("{strategy} strategy failed: {reason}")]
    RawExtraction { strategy: String, reason: String },

    /// A block could not be mapped onto a record.
    #[error("failed to map block: {reason}")]
    FieldParse { reason: String },

    /// A block carried no amount-shaped tokens.
    #[error("no amounts found in block")]
    NoAmounts,

    /// The schema has no mapping for the requested source kind.
    #[error("institution {institution} has no {source_kind} layout")]
    NoLayout {
        institution: String,
        source_kind: String,
    },
}

impl ExtractionError {
    /// Wrap any provider failure as a raw extraction error for `strategy`.
    pub fn raw(strategy: impl Into<String>, reason: impl ToString) -> Self {
        Self::RawExtraction {
            strategy: strategy.into(),
            reason: reason.to_string(),
        }
    }

    pub fn field(reason: impl Into<String>) -> Self {
        Self::FieldParse {
            reason: reason.into(),
        }
    }
}

/// Result type for the passbook library.
pub type Result<T> = std::result::Result<T, PassbookError>;
