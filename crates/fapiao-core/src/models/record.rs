//! Invoice record models for the archive.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Invoice classification. Closed set; every record carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Incoming invoice (sales).
    Income,
    /// Outgoing invoice (purchases).
    Expense,
    /// Anything else.
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income => "income",
            Category::Expense => "expense",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Category::Income),
            "expense" => Ok(Category::Expense),
            "other" => Ok(Category::Other),
            _ => Err(StoreError::InvalidEnum {
                field: "category".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// The seven fields recovered from OCR text.
///
/// Each field is independently empty (not recoverable) or populated.
/// Extraction never fails; absence is data, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Invoice number, 8-20 digits, captured verbatim.
    pub invoice_number: String,

    /// Issue date in canonical YYYYMMDD form.
    pub invoice_date: String,

    /// Tax-inclusive total as a decimal string, no thousands separators.
    pub total_amount: String,

    /// Goods/service description.
    pub invoice_content: String,

    /// Seller legal name.
    pub seller_name: String,

    /// Seller's account-opening bank.
    pub bank_name: String,

    /// Seller's bank account number, 10-30 digits.
    pub bank_account: String,
}

impl InvoiceFields {
    /// Names of fields that could not be recovered.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.invoice_number.is_empty() {
            out.push("invoice_number");
        }
        if self.invoice_date.is_empty() {
            out.push("invoice_date");
        }
        if self.total_amount.is_empty() {
            out.push("total_amount");
        }
        if self.invoice_content.is_empty() {
            out.push("invoice_content");
        }
        if self.seller_name.is_empty() {
            out.push("seller_name");
        }
        if self.bank_name.is_empty() {
            out.push("bank_name");
        }
        if self.bank_account.is_empty() {
            out.push("bank_account");
        }
        out
    }
}

/// A stored invoice record in the Active state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Assigned once by the store, never reused.
    pub id: i64,

    /// Invoice classification.
    pub category: Category,

    /// Buying party this invoice was filed under.
    pub buyer: String,

    /// Extracted fields.
    #[serde(flatten)]
    pub fields: InvoiceFields,

    /// Vault-relative filename of the stored original document.
    pub source_file: String,

    /// Hex SHA-256 of the original document bytes. Set at creation,
    /// never mutated.
    pub fingerprint: String,

    /// Creation timestamp, local time.
    pub created_at: NaiveDateTime,

    /// Last field-update timestamp, local time.
    pub updated_at: NaiveDateTime,
}

/// A soft-deleted record in the recycle bin.
///
/// 1:1 shadow of the Active row it replaced; the `id` is carried over
/// so restoring is identity-preserving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecycledRecord {
    #[serde(flatten)]
    pub record: InvoiceRecord,

    /// When the record was moved to the recycle bin.
    pub deleted_at: NaiveDateTime,
}

/// Mutable fields accepted by single and batch updates.
///
/// Anything else in an update request is silently ignored.
pub const UPDATABLE_FIELDS: [&str; 9] = [
    "category",
    "buyer",
    "invoice_number",
    "invoice_date",
    "total_amount",
    "invoice_content",
    "seller_name",
    "bank_name",
    "bank_account",
];

/// Filter an update request down to the allow-listed fields.
pub fn filter_update_fields(fields: &HashMap<String, String>) -> HashMap<String, String> {
    fields
        .iter()
        .filter(|(k, _)| UPDATABLE_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
