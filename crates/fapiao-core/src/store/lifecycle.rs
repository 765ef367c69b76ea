//! Record lifecycle: Active -> Recycled -> Purged.
//!
//! Moves between the invoices and recycle_bin tables are explicit
//! column-for-column mappings executed inside a transaction, so a
//! record is never visible in both sets and never lost between them.

use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::record::{Category, RecycledRecord};

use super::records::{RECORD_COLUMNS, TIMESTAMP_FMT, recycled_from_raw, row_to_raw};

/// Recycle-bin retention window.
pub const RETENTION_DAYS: i64 = 30;

/// Move Active records into the recycle bin. Missing ids are skipped;
/// returns the number of records moved.
pub fn move_to_recycle(
    conn: &Connection,
    ids: &[i64],
    now: NaiveDateTime,
) -> Result<usize, StoreError> {
    let deleted_at = now.format(TIMESTAMP_FMT).to_string();
    let tx = conn.unchecked_transaction()?;

    let mut moved = 0;
    for &id in ids {
        let copied = tx.execute(
            "INSERT INTO recycle_bin (id, category, buyer, invoice_number, invoice_date,
             total_amount, invoice_content, seller_name, bank_name, bank_account,
             source_file, fingerprint, created_at, updated_at, deleted_at)
             SELECT id, category, buyer, invoice_number, invoice_date,
             total_amount, invoice_content, seller_name, bank_name, bank_account,
             source_file, fingerprint, created_at, updated_at, ?2
             FROM invoices WHERE id = ?1",
            params![id, deleted_at],
        )?;
        if copied == 0 {
            continue;
        }
        tx.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
        moved += 1;
    }

    tx.commit()?;
    debug!(moved, "Moved records to recycle bin");
    Ok(moved)
}

/// Move recycled records back to the Active set, dropping `deleted_at`.
/// All other field values are preserved as they were.
pub fn restore(conn: &Connection, ids: &[i64]) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;

    let mut restored = 0;
    for &id in ids {
        let copied = tx.execute(
            "INSERT INTO invoices (id, category, buyer, invoice_number, invoice_date,
             total_amount, invoice_content, seller_name, bank_name, bank_account,
             source_file, fingerprint, created_at, updated_at)
             SELECT id, category, buyer, invoice_number, invoice_date,
             total_amount, invoice_content, seller_name, bank_name, bank_account,
             source_file, fingerprint, created_at, updated_at
             FROM recycle_bin WHERE id = ?1",
            params![id],
        )?;
        if copied == 0 {
            continue;
        }
        tx.execute("DELETE FROM recycle_bin WHERE id = ?1", params![id])?;
        restored += 1;
    }

    tx.commit()?;
    debug!(restored, "Restored records from recycle bin");
    Ok(restored)
}

/// Permanently delete recycled records. Irreversible. Returns the
/// source files of the purged rows so the caller can release the
/// stored originals.
pub fn permanent_delete(conn: &Connection, ids: &[i64]) -> Result<Vec<String>, StoreError> {
    let tx = conn.unchecked_transaction()?;

    let mut purged_files = Vec::new();
    for &id in ids {
        let file: Option<String> = match tx.query_row(
            "SELECT source_file FROM recycle_bin WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(f) => Some(f),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
        let Some(file) = file else { continue };

        tx.execute("DELETE FROM recycle_bin WHERE id = ?1", params![id])?;
        purged_files.push(file);
    }

    tx.commit()?;
    Ok(purged_files)
}

/// Delete recycled rows whose `deleted_at` is past the retention
/// window. Invoked on every recycle-bin read (lazy, read-triggered
/// garbage collection), not on a background schedule.
pub fn purge_expired(conn: &Connection, now: NaiveDateTime) -> Result<Vec<String>, StoreError> {
    let cutoff = (now - Duration::days(RETENTION_DAYS))
        .format(TIMESTAMP_FMT)
        .to_string();

    let mut stmt =
        conn.prepare("SELECT id, source_file FROM recycle_bin WHERE deleted_at < ?1")?;
    let expired: Vec<(i64, String)> = stmt
        .query_map(params![cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);

    if expired.is_empty() {
        return Ok(Vec::new());
    }

    let tx = conn.unchecked_transaction()?;
    let mut files = Vec::with_capacity(expired.len());
    for (id, file) in expired {
        tx.execute("DELETE FROM recycle_bin WHERE id = ?1", params![id])?;
        files.push(file);
    }
    tx.commit()?;

    info!(purged = files.len(), "Purged expired recycle-bin records");
    Ok(files)
}

/// Purge all recycled rows (optionally one category), regardless of
/// age. Returns their source files for release.
pub fn empty_recycle_bin(
    conn: &Connection,
    category: Option<Category>,
) -> Result<Vec<String>, StoreError> {
    let (sql, cat): (&str, Option<&str>) = match &category {
        Some(c) => (
            "SELECT id, source_file FROM recycle_bin WHERE category = ?1",
            Some(c.as_str()),
        ),
        None => ("SELECT id, source_file FROM recycle_bin", None),
    };

    let mut stmt = conn.prepare(sql)?;
    let rows: Vec<(i64, String)> = match cat {
        Some(c) => stmt
            .query_map(params![c], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?,
    };
    drop(stmt);

    let tx = conn.unchecked_transaction()?;
    let mut files = Vec::with_capacity(rows.len());
    for (id, file) in rows {
        tx.execute("DELETE FROM recycle_bin WHERE id = ?1", params![id])?;
        files.push(file);
    }
    tx.commit()?;
    Ok(files)
}

/// List recycled records, optionally filtered by category, newest
/// deletion first. Does not sweep; callers that expose the recycle bin
/// run [`purge_expired`] first so the sweep can also release files.
pub fn list_recycled(
    conn: &Connection,
    category: Option<Category>,
) -> Result<Vec<RecycledRecord>, StoreError> {
    let base = format!(
        "SELECT {RECORD_COLUMNS}, deleted_at FROM recycle_bin {} ORDER BY deleted_at DESC",
        if category.is_some() { "WHERE category = ?1" } else { "" }
    );

    let mut stmt = conn.prepare(&base)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        let raw = row_to_raw(row)?;
        let deleted_at: String = row.get(14)?;
        Ok((raw, deleted_at))
    };

    let rows: Vec<_> = match category {
        Some(c) => stmt
            .query_map(params![c.as_str()], map_row)?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<_>>()?,
    };

    rows.into_iter()
        .map(|(raw, deleted_at)| recycled_from_raw(raw, deleted_at))
        .collect()
}
