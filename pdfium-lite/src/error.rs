//! Error types for pdfium-lite

use thiserror::Error;

// `FPDF_GetLastError` codes (fpdfview.h).
pub(crate) const ERR_FILE: u32 = 2;
pub(crate) const ERR_FORMAT: u32 = 3;
pub(crate) const ERR_PASSWORD: u32 = 4;
pub(crate) const ERR_SECURITY: u32 = 5;

/// Result type for pdfium-lite operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Error types for PDF operations
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open PDF document
    #[error("Failed to open PDF document: {cause}")]
    LoadFailed { cause: LoadFailure },

    /// Page index out of bounds
    #[error("Page index {index} out of bounds (document has {count} pages)")]
    PageIndexOutOfBounds { index: usize, count: usize },

    /// Native rasterization failed for a page that exists
    #[error("Failed to render page {page_index}: {reason}")]
    RenderFailed { page_index: usize, reason: String },

    /// The document was closed before the call
    #[error("Document has been closed")]
    DocumentClosed,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl PdfError {
    pub(crate) fn render_failed(page_index: usize, reason: impl Into<String>) -> Self {
        PdfError::RenderFailed {
            page_index,
            reason: reason.into(),
        }
    }
}

impl From<LoadFailure> for PdfError {
    fn from(cause: LoadFailure) -> Self {
        PdfError::LoadFailed { cause }
    }
}

/// Why a document could not be opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// File not found or could not be read
    #[error("file not found or unreadable: {0}")]
    FileNotFound(String),

    /// Wrong or missing password
    #[error("wrong or missing password")]
    InvalidPassword,

    /// Not a PDF, or corrupted
    #[error("corrupt or unsupported format")]
    InvalidFormat,

    /// Encrypted with an unsupported security handler
    #[error("unsupported security scheme")]
    UnsupportedSecurity,

    /// Path cannot be handed to the native engine
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Any other native error code
    #[error("PDFium error code: {0}")]
    Unknown(u32),
}

impl LoadFailure {
    /// Map a native `FPDF_GetLastError` code to a load failure cause.
    ///
    /// File, format, password and security errors map to their causes.
    /// Everything else (including 0, "success", which PDFium reports for some
    /// null returns) is `Unknown`.
    pub fn from_error_code(code: u32, path: &str) -> Self {
        match code {
            ERR_FILE => LoadFailure::FileNotFound(path.to_string()),
            ERR_FORMAT => LoadFailure::InvalidFormat,
            ERR_PASSWORD => LoadFailure::InvalidPassword,
            ERR_SECURITY => LoadFailure::UnsupportedSecurity,
            other => LoadFailure::Unknown(other),
        }
    }
}
