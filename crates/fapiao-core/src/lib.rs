//! Core library for the Chinese VAT invoice (fapiao) archive.
//!
//! This crate provides:
//! - PDF handling for scanned invoices (embedded image extraction)
//! - OCR-text field extraction (invoice number, date, amount, seller,
//!   content, bank details)
//! - Content-hash and invoice-number duplicate detection
//! - SQLite persistence with a recycle-bin lifecycle and statistics

pub mod dedup;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod service;
pub mod store;
pub mod vault;

pub use dedup::{DuplicateVerdict, fingerprint};
pub use error::{FapiaoError, OcrError, PdfError, Result, StoreError};
pub use extract::{FieldExtractor, extract_fields, normalize_lines};
pub use models::config::FapiaoConfig;
pub use models::record::{Category, InvoiceFields, InvoiceRecord, RecycledRecord};
pub use ocr::{OcrEngine, RecognizedLine, SharedOcr};
pub use pdf::{PageRasterizer, ScanRasterizer};
pub use service::{IngestOutcome, InvoiceService};
pub use store::{SearchFilter, SortDirection, SortKey, Statistics};
pub use vault::DocumentVault;
