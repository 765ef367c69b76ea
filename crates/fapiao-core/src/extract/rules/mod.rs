//! Rule-based field extractors for Chinese VAT invoices.
//!
//! Each extractor runs an ordered cascade of label-anchored patterns
//! over the normalized OCR text; the first valid match wins and
//! candidates are never merged. A cascade that matches nothing yields
//! `None`, never an error.

pub mod amounts;
pub mod bank;
pub mod content;
pub mod dates;
pub mod patterns;
pub mod seller;

pub use amounts::AmountExtractor;
pub use bank::{BankAccountExtractor, BankNameExtractor};
pub use content::ContentExtractor;
pub use dates::{DateExtractor, normalize_date};
pub use seller::SellerExtractor;

/// Trait for single-field cascade extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Run the cascade; `None` means the field is not recoverable.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}
