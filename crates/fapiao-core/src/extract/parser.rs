//! Field extraction over normalized OCR text.

use tracing::debug;

use crate::models::record::InvoiceFields;

use super::rules::{
    AmountExtractor, BankAccountExtractor, BankNameExtractor, ContentExtractor, DateExtractor,
    FieldExtractor, SellerExtractor, patterns::INVOICE_NUMBER,
};

/// Run every field cascade over the normalized text.
///
/// Never fails: a field whose cascade matches nothing comes back empty.
/// Output is bit-identical for identical input text.
pub fn extract_fields(text: &str) -> InvoiceFields {
    let fields = InvoiceFields {
        invoice_number: extract_invoice_number(text).unwrap_or_default(),
        invoice_date: DateExtractor::new().extract(text).unwrap_or_default(),
        total_amount: AmountExtractor::new().extract(text).unwrap_or_default(),
        invoice_content: ContentExtractor::new().extract(text).unwrap_or_default(),
        seller_name: SellerExtractor::new().extract(text).unwrap_or_default(),
        bank_name: BankNameExtractor::new().extract(text).unwrap_or_default(),
        bank_account: BankAccountExtractor::new().extract(text).unwrap_or_default(),
    };

    let missing = fields.missing();
    if !missing.is_empty() {
        debug!(missing = ?missing, "Some invoice fields not recoverable");
    }

    fields
}

fn extract_invoice_number(text: &str) -> Option<String> {
    INVOICE_NUMBER.captures(text).map(|caps| caps[1].to_string())
}
