//! CRUD over Active invoice records.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDateTime, ParseResult};
use rusqlite::{Connection, params, params_from_iter};

use crate::error::StoreError;
use crate::models::record::{
    Category, InvoiceFields, InvoiceRecord, RecycledRecord, filter_update_fields,
};

/// Timestamp storage format (local business time).
pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) const RECORD_COLUMNS: &str = "id, category, buyer, invoice_number, invoice_date, \
     total_amount, invoice_content, seller_name, bank_name, bank_account, \
     source_file, fingerprint, created_at, updated_at";

/// A record about to be committed by ingestion.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub category: Category,
    pub buyer: String,
    pub fields: InvoiceFields,
    pub source_file: String,
    pub fingerprint: String,
}

pub fn insert_record(
    conn: &Connection,
    new: &NewRecord,
    now: NaiveDateTime,
) -> Result<InvoiceRecord, StoreError> {
    let ts = now.format(TIMESTAMP_FMT).to_string();
    conn.execute(
        "INSERT INTO invoices (category, buyer, invoice_number, invoice_date,
         total_amount, invoice_content, seller_name, bank_name, bank_account,
         source_file, fingerprint, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            new.category.as_str(),
            new.buyer,
            new.fields.invoice_number,
            new.fields.invoice_date,
            new.fields.total_amount,
            new.fields.invoice_content,
            new.fields.seller_name,
            new.fields.bank_name,
            new.fields.bank_account,
            new.source_file,
            new.fingerprint,
            ts,
            ts,
        ],
    )?;

    Ok(InvoiceRecord {
        id: conn.last_insert_rowid(),
        category: new.category,
        buyer: new.buyer.clone(),
        fields: new.fields.clone(),
        source_file: new.source_file.clone(),
        fingerprint: new.fingerprint.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_record(conn: &Connection, id: i64) -> Result<Option<InvoiceRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM invoices WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], row_to_raw);
    match result {
        Ok(raw) => Ok(Some(record_from_raw(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_id_by_fingerprint(conn: &Connection, fp: &str) -> Result<Option<i64>, StoreError> {
    let result = conn.query_row(
        "SELECT id FROM invoices WHERE fingerprint = ?1 LIMIT 1",
        params![fp],
        |row| row.get::<_, i64>(0),
    );
    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_id_by_invoice_number(
    conn: &Connection,
    invoice_number: &str,
) -> Result<Option<i64>, StoreError> {
    let result = conn.query_row(
        "SELECT id FROM invoices WHERE invoice_number = ?1 LIMIT 1",
        params![invoice_number],
        |row| row.get::<_, i64>(0),
    );
    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Apply an allow-list-filtered field update to one record.
///
/// Unknown fields were already dropped by the filter; a request that
/// names no updatable field at all is rejected before any mutation.
/// `updated_at` is refreshed on every accepted update.
pub fn update_fields(
    conn: &Connection,
    id: i64,
    fields: &HashMap<String, String>,
    now: NaiveDateTime,
) -> Result<(), StoreError> {
    let filtered = filter_update_fields(fields);
    if filtered.is_empty() {
        return Err(StoreError::NoValidFields);
    }

    // Category values come from a closed set.
    if let Some(cat) = filtered.get("category") {
        Category::from_str(cat)?;
    }

    let mut assignments = Vec::with_capacity(filtered.len() + 1);
    let mut values: Vec<String> = Vec::with_capacity(filtered.len() + 1);
    for (name, value) in &filtered {
        assignments.push(format!("{name} = ?{}", values.len() + 1));
        values.push(value.clone());
    }
    assignments.push(format!("updated_at = ?{}", values.len() + 1));
    values.push(now.format(TIMESTAMP_FMT).to_string());

    let sql = format!(
        "UPDATE invoices SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len() + 1
    );

    let mut all_params: Vec<rusqlite::types::Value> =
        values.into_iter().map(rusqlite::types::Value::from).collect();
    all_params.push(rusqlite::types::Value::from(id));

    let rows = conn.execute(&sql, params_from_iter(all_params))?;
    if rows == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

/// Apply the same field update to many records. Missing ids are
/// skipped; the caller gets the number of records actually updated.
pub fn batch_update_fields(
    conn: &Connection,
    ids: &[i64],
    fields: &HashMap<String, String>,
    now: NaiveDateTime,
) -> Result<usize, StoreError> {
    if filter_update_fields(fields).is_empty() {
        return Err(StoreError::NoValidFields);
    }

    let mut updated = 0;
    for &id in ids {
        match update_fields(conn, id, fields, now) {
            Ok(()) => updated += 1,
            Err(StoreError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(updated)
}

// Internal raw row shape, mapped before parsing.
pub(crate) struct RawRecord {
    pub id: i64,
    pub category: String,
    pub buyer: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub total_amount: String,
    pub invoice_content: String,
    pub seller_name: String,
    pub bank_name: String,
    pub bank_account: String,
    pub source_file: String,
    pub fingerprint: String,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        category: row.get(1)?,
        buyer: row.get(2)?,
        invoice_number: row.get(3)?,
        invoice_date: row.get(4)?,
        total_amount: row.get(5)?,
        invoice_content: row.get(6)?,
        seller_name: row.get(7)?,
        bank_name: row.get(8)?,
        bank_account: row.get(9)?,
        source_file: row.get(10)?,
        fingerprint: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn record_from_raw(raw: RawRecord) -> Result<InvoiceRecord, StoreError> {
    Ok(InvoiceRecord {
        id: raw.id,
        category: Category::from_str(&raw.category)?,
        buyer: raw.buyer,
        fields: InvoiceFields {
            invoice_number: raw.invoice_number,
            invoice_date: raw.invoice_date,
            total_amount: raw.total_amount,
            invoice_content: raw.invoice_content,
            seller_name: raw.seller_name,
            bank_name: raw.bank_name,
            bank_account: raw.bank_account,
        },
        source_file: raw.source_file,
        fingerprint: raw.fingerprint,
        created_at: parse_timestamp(&raw.created_at).unwrap_or_default(),
        updated_at: parse_timestamp(&raw.updated_at).unwrap_or_default(),
    })
}

pub(crate) fn recycled_from_raw(
    raw: RawRecord,
    deleted_at: String,
) -> Result<RecycledRecord, StoreError> {
    let record = record_from_raw(raw)?;
    Ok(RecycledRecord {
        record,
        deleted_at: parse_timestamp(&deleted_at).unwrap_or_default(),
    })
}

pub(crate) fn parse_timestamp(s: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
}
