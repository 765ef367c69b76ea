//! Duplicate detection for ingested documents.
//!
//! Two independent checks at two ingestion stages: a whole-file
//! fingerprint before any extraction work, and the extracted invoice
//! number afterwards. Both consult Active records only; recycled rows
//! do not block re-ingestion.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::store::records;

/// Outcome of a duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum DuplicateVerdict {
    /// No Active record conflicts.
    Unique,
    /// An Active record was ingested from the same document bytes.
    ByFingerprint { existing_id: i64 },
    /// An Active record carries the same invoice number.
    ByInvoiceNumber { existing_id: i64 },
}

impl DuplicateVerdict {
    pub fn is_unique(&self) -> bool {
        matches!(self, DuplicateVerdict::Unique)
    }
}

/// Hex SHA-256 of the original document bytes (the file as uploaded,
/// not the rendered image).
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Pre-extraction check: does an Active record share this fingerprint?
///
/// `force` bypasses the check entirely.
pub fn check_fingerprint(
    conn: &Connection,
    fp: &str,
    force: bool,
) -> Result<DuplicateVerdict, StoreError> {
    if force {
        return Ok(DuplicateVerdict::Unique);
    }
    match records::find_id_by_fingerprint(conn, fp)? {
        Some(existing_id) => Ok(DuplicateVerdict::ByFingerprint { existing_id }),
        None => Ok(DuplicateVerdict::Unique),
    }
}

/// Post-extraction check: does an Active record share this invoice
/// number? An empty number (not recoverable) never conflicts.
pub fn check_invoice_number(
    conn: &Connection,
    invoice_number: &str,
    force: bool,
) -> Result<DuplicateVerdict, StoreError> {
    if force || invoice_number.is_empty() {
        return Ok(DuplicateVerdict::Unique);
    }
    match records::find_id_by_invoice_number(conn, invoice_number)? {
        Some(existing_id) => Ok(DuplicateVerdict::ByInvoiceNumber { existing_id }),
        None => Ok(DuplicateVerdict::Unique),
    }
}
