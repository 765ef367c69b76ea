//! Error types for the fapiao-core library.

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Missing or malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The first page carries no decodable scan image.
    #[error("no decodable image on first page")]
    NoPageImage,
}

/// Errors related to the external OCR collaborator.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine could not be reached.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// Recognition failed on a valid image.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors from the SQLite-backed record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No record with the given id.
    #[error("record not found: {0}")]
    NotFound(i64),

    /// An update request named no updatable field.
    #[error("no valid fields in update")]
    NoValidFields,

    /// A stored or supplied enum value is not recognized.
    #[error("invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    /// Schema migration failed.
    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
