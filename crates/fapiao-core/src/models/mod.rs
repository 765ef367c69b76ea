//! Data models for the archive.

pub mod config;
pub mod record;

pub use config::{FapiaoConfig, OcrConfig, StorageConfig};
pub use record::{
    Category, InvoiceFields, InvoiceRecord, RecycledRecord, UPDATABLE_FIELDS, filter_update_fields,
};
