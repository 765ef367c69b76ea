//! High-level invoice archive operations.
//!
//! [`InvoiceService`] owns the database connection, the document
//! vault, an OCR engine and a PDF rasterizer, and sequences them into
//! the archive's operations. Callers (the CLI, tests) only talk to
//! this type.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::{self, DuplicateVerdict};
use crate::error::{FapiaoError, Result, StoreError};
use crate::extract::{extract_fields, normalize_lines};
use crate::models::config::FapiaoConfig;
use crate::models::record::{Category, InvoiceRecord, RecycledRecord};
use crate::ocr::SharedOcr;
use crate::pdf::PageRasterizer;
use crate::store::{
    self, NewRecord, SearchFilter, SortDirection, SortKey, Statistics,
};
use crate::vault::DocumentVault;

/// Result of an ingest attempt.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// A new record was created.
    Accepted(InvoiceRecord),
    /// A duplicate was detected and nothing was stored.
    Rejected(DuplicateVerdict),
}

pub struct InvoiceService {
    conn: Mutex<Connection>,
    vault: DocumentVault,
    ocr: SharedOcr,
    rasterizer: Box<dyn PageRasterizer + Send + Sync>,
}

impl InvoiceService {
    pub fn new(
        conn: Connection,
        vault: DocumentVault,
        ocr: SharedOcr,
        rasterizer: Box<dyn PageRasterizer + Send + Sync>,
    ) -> Self {
        Self {
            conn: Mutex::new(conn),
            vault,
            ocr,
            rasterizer,
        }
    }

    /// Open the service from configuration: database at
    /// `storage.db_path`, vault at `storage.vault_dir`.
    pub fn open(
        config: &FapiaoConfig,
        ocr: SharedOcr,
        rasterizer: Box<dyn PageRasterizer + Send + Sync>,
    ) -> Result<Self> {
        let conn = store::open_database(&config.storage.db_path)?;
        let vault = DocumentVault::new(&config.storage.vault_dir)?;
        Ok(Self::new(conn, vault, ocr, rasterizer))
    }

    pub fn vault(&self) -> &DocumentVault {
        &self.vault
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ingest one uploaded invoice PDF.
    ///
    /// Duplicate checks run twice: on the raw bytes before anything is
    /// stored, and on the extracted invoice number before the record
    /// is inserted. `force` bypasses both. A rejection or failure
    /// after the original was written removes it again, so no blob
    /// outlives its record.
    pub fn ingest(
        &self,
        bytes: &[u8],
        original_name: &str,
        category: Category,
        buyer: &str,
        force: bool,
    ) -> Result<IngestOutcome> {
        let buyer = buyer.trim();
        if buyer.is_empty() {
            return Err(FapiaoError::Validation("buyer must not be empty".to_string()));
        }

        let fp = dedup::fingerprint(bytes);
        {
            let conn = self.conn();
            let verdict = dedup::check_fingerprint(&conn, &fp, force)?;
            if !verdict.is_unique() {
                info!(?verdict, "Rejected upload before storage");
                return Ok(IngestOutcome::Rejected(verdict));
            }
        }

        let now = timestamp();
        let stored_name = self.vault.save(original_name, bytes, now)?;

        match self.ingest_stored(bytes, &stored_name, category, buyer, &fp, force, now) {
            Ok(outcome) => {
                if matches!(outcome, IngestOutcome::Rejected(_)) {
                    self.vault.delete(&stored_name);
                }
                Ok(outcome)
            }
            Err(e) => {
                self.vault.delete(&stored_name);
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn ingest_stored(
        &self,
        bytes: &[u8],
        stored_name: &str,
        category: Category,
        buyer: &str,
        fp: &str,
        force: bool,
        now: NaiveDateTime,
    ) -> Result<IngestOutcome> {
        let page = self.rasterizer.rasterize_first_page(bytes)?;
        let lines = self.ocr.recognize(&page)?;
        let text = normalize_lines(&lines);
        debug!(lines = lines.len(), chars = text.len(), "OCR complete");

        let fields = extract_fields(&text);
        if !fields.missing().is_empty() {
            warn!(missing = ?fields.missing(), "Some invoice fields were not recognized");
        }

        let conn = self.conn();
        // OCR ran outside the lock, so an identical upload may have
        // committed in the meantime. Re-check under the same guard as
        // the insert.
        let verdict = dedup::check_fingerprint(&conn, fp, force)?;
        if !verdict.is_unique() {
            info!(?verdict, "Rejected upload after extraction");
            return Ok(IngestOutcome::Rejected(verdict));
        }
        let verdict = dedup::check_invoice_number(&conn, &fields.invoice_number, force)?;
        if !verdict.is_unique() {
            info!(?verdict, "Rejected upload after extraction");
            return Ok(IngestOutcome::Rejected(verdict));
        }

        let record = store::insert_record(
            &conn,
            &NewRecord {
                category,
                buyer: buyer.to_string(),
                fields,
                source_file: stored_name.to_string(),
                fingerprint: fp.to_string(),
            },
            now,
        )?;
        info!(id = record.id, number = %record.fields.invoice_number, "Archived invoice");
        Ok(IngestOutcome::Accepted(record))
    }

    pub fn list(
        &self,
        category: Option<Category>,
        sort: SortKey,
        direction: SortDirection,
    ) -> Result<Vec<InvoiceRecord>> {
        Ok(store::list_records(&self.conn(), category, sort, direction)?)
    }

    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<InvoiceRecord>> {
        Ok(store::search_records(&self.conn(), filter)?)
    }

    pub fn get(&self, id: i64) -> Result<InvoiceRecord> {
        store::get_record(&self.conn(), id)?
            .ok_or_else(|| StoreError::NotFound(id).into())
    }

    /// Update editable fields of one Active record.
    pub fn update(&self, id: i64, fields: &HashMap<String, String>) -> Result<InvoiceRecord> {
        let conn = self.conn();
        store::update_fields(&conn, id, fields, timestamp())?;
        store::get_record(&conn, id)?.ok_or_else(|| StoreError::NotFound(id).into())
    }

    /// Apply the same field values to several records; returns how
    /// many were updated. Fails if none of the ids exist.
    pub fn batch_update(
        &self,
        ids: &[i64],
        fields: &HashMap<String, String>,
    ) -> Result<usize> {
        let updated = store::batch_update_fields(&self.conn(), ids, fields, timestamp())?;
        if updated == 0 {
            if let Some(&first) = ids.first() {
                return Err(StoreError::NotFound(first).into());
            }
        }
        Ok(updated)
    }

    /// Move records to the recycle bin; returns how many moved.
    pub fn delete(&self, ids: &[i64]) -> Result<usize> {
        Ok(store::move_to_recycle(&self.conn(), ids, timestamp())?)
    }

    /// Bring recycled records back to the Active set.
    pub fn restore(&self, ids: &[i64]) -> Result<usize> {
        Ok(store::restore(&self.conn(), ids)?)
    }

    /// Purge recycled records and their stored originals.
    pub fn permanent_delete(&self, ids: &[i64]) -> Result<usize> {
        let files = store::permanent_delete(&self.conn(), ids)?;
        let purged = files.len();
        for file in files {
            self.vault.delete(&file);
        }
        Ok(purged)
    }

    /// Purge everything in the recycle bin, optionally one category.
    pub fn empty_recycle_bin(&self, category: Option<Category>) -> Result<usize> {
        let files = store::empty_recycle_bin(&self.conn(), category)?;
        let purged = files.len();
        for file in files {
            self.vault.delete(&file);
        }
        Ok(purged)
    }

    /// List the recycle bin. Expired entries (past the retention
    /// window) are swept first, together with their stored originals.
    pub fn list_recycle_bin(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<RecycledRecord>> {
        let recycled = {
            let conn = self.conn();
            let expired = store::purge_expired(&conn, timestamp())?;
            for file in &expired {
                self.vault.delete(file);
            }
            store::list_recycled(&conn, category)?
        };
        Ok(recycled)
    }

    pub fn statistics(&self, category: Option<Category>) -> Result<Statistics> {
        Ok(store::statistics(&self.conn(), category)?)
    }
}

fn timestamp() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::ocr::{OcrEngine, RecognizedLine};
    use crate::store::open_memory_database;

    const SAMPLE_TEXT: &[&str] = &[
        "电子发票 发票号码: 24312000000123456789",
        "开票日期: 2024年3月15日",
        "购买方 名称: 杭州测试科技有限公司",
        "销售方 名称: 北京办公用品有限公司",
        "*办公用品*A4打印纸",
        "价税合计 ¥1,234.56",
        "开户行: 中国工商银行北京分行; 账号: 6222021234567890123",
    ];

    struct FakeOcr {
        lines: Vec<String>,
    }

    impl FakeOcr {
        fn sample() -> Self {
            Self {
                lines: SAMPLE_TEXT.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl OcrEngine for FakeOcr {
        fn recognize(
            &self,
            _image: &DynamicImage,
        ) -> std::result::Result<Vec<RecognizedLine>, OcrError> {
            Ok(self
                .lines
                .iter()
                .map(|text| RecognizedLine {
                    text: text.clone(),
                    confidence: 0.99,
                    bbox: [0.0, 0.0, 100.0, 20.0],
                })
                .collect())
        }
    }

    struct FakeRasterizer;

    impl PageRasterizer for FakeRasterizer {
        fn rasterize_first_page(
            &self,
            _data: &[u8],
        ) -> std::result::Result<DynamicImage, PdfError> {
            Ok(DynamicImage::new_rgba8(4, 4))
        }
    }

    struct FailingRasterizer;

    impl PageRasterizer for FailingRasterizer {
        fn rasterize_first_page(
            &self,
            _data: &[u8],
        ) -> std::result::Result<DynamicImage, PdfError> {
            Err(PdfError::NoPageImage)
        }
    }

    fn service_with(dir: &TempDir, ocr: FakeOcr) -> InvoiceService {
        let conn = open_memory_database().unwrap();
        let vault = DocumentVault::new(dir.path()).unwrap();
        InvoiceService::new(conn, vault, Arc::new(ocr), Box::new(FakeRasterizer))
    }

    fn vault_file_count(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_ingest_extracts_and_archives() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let outcome = service
            .ingest(b"%PDF-A", "invoice.pdf", Category::Expense, "杭州测试科技", false)
            .unwrap();
        let IngestOutcome::Accepted(record) = outcome else {
            panic!("expected acceptance");
        };

        assert_eq!(record.fields.invoice_number, "24312000000123456789");
        assert_eq!(record.fields.invoice_date, "20240315");
        assert_eq!(record.fields.total_amount, "1234.56");
        assert_eq!(record.fields.seller_name, "北京办公用品有限公司");
        assert_eq!(record.buyer, "杭州测试科技");
        assert!(service.vault().exists(&record.source_file));
    }

    #[test]
    fn test_ingest_rejects_duplicate_bytes() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let first = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap();
        let IngestOutcome::Accepted(record) = first else {
            panic!("expected acceptance");
        };

        let second = service
            .ingest(b"%PDF-A", "b.pdf", Category::Expense, "买方", false)
            .unwrap();
        let IngestOutcome::Rejected(DuplicateVerdict::ByFingerprint { existing_id }) = second
        else {
            panic!("expected fingerprint rejection");
        };
        assert_eq!(existing_id, record.id);

        // Nothing stored for the duplicate.
        assert_eq!(service.list(None, SortKey::default(), SortDirection::default()).unwrap().len(), 1);
        assert_eq!(vault_file_count(&dir), 1);
    }

    /// OCR engine that archives an identical upload through its own
    /// connection while recognition is in flight.
    struct InterleavingOcr {
        inner: FakeOcr,
        side: Mutex<Connection>,
        fp: String,
    }

    impl OcrEngine for InterleavingOcr {
        fn recognize(
            &self,
            image: &DynamicImage,
        ) -> std::result::Result<Vec<RecognizedLine>, OcrError> {
            let side = self.side.lock().unwrap_or_else(PoisonError::into_inner);
            crate::store::tests_support::insert_sample(&side, "99999999", &self.fp);
            self.inner.recognize(image)
        }
    }

    #[test]
    fn test_ingest_rechecks_fingerprint_after_recognition() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("race.db");
        let conn = store::open_database(&db_path).unwrap();
        let side = store::open_database(&db_path).unwrap();
        let ocr = InterleavingOcr {
            inner: FakeOcr::sample(),
            side: Mutex::new(side),
            fp: dedup::fingerprint(b"%PDF-A"),
        };
        let vault_dir = dir.path().join("vault");
        let vault = DocumentVault::new(&vault_dir).unwrap();
        let service = InvoiceService::new(conn, vault, Arc::new(ocr), Box::new(FakeRasterizer));

        let outcome = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap();
        assert!(matches!(
            outcome,
            IngestOutcome::Rejected(DuplicateVerdict::ByFingerprint { .. })
        ));
        // The losing upload's blob was released.
        assert_eq!(std::fs::read_dir(&vault_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_ingest_rejects_duplicate_invoice_number() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap();
        // Different bytes, same OCR text, so the number collides.
        let second = service
            .ingest(b"%PDF-B", "b.pdf", Category::Expense, "买方", false)
            .unwrap();
        assert!(matches!(
            second,
            IngestOutcome::Rejected(DuplicateVerdict::ByInvoiceNumber { .. })
        ));
        // The rejected upload's blob was removed again.
        assert_eq!(vault_file_count(&dir), 1);
    }

    #[test]
    fn test_ingest_force_bypasses_both_checks() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap();
        let outcome = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", true)
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::Accepted(_)));
        assert_eq!(
            service
                .list(None, SortKey::default(), SortDirection::default())
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_ingest_requires_buyer() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let err = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "   ", false)
            .unwrap_err();
        assert!(matches!(err, FapiaoError::Validation(_)));
        assert_eq!(vault_file_count(&dir), 0);
    }

    #[test]
    fn test_ingest_failure_removes_blob() {
        let dir = TempDir::new().unwrap();
        let conn = open_memory_database().unwrap();
        let vault = DocumentVault::new(dir.path()).unwrap();
        let service = InvoiceService::new(
            conn,
            vault,
            Arc::new(FakeOcr::sample()),
            Box::new(FailingRasterizer),
        );

        let err = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap_err();
        assert!(matches!(err, FapiaoError::Pdf(PdfError::NoPageImage)));
        assert_eq!(vault_file_count(&dir), 0);
    }

    #[test]
    fn test_delete_restore_permanent_flow() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let IngestOutcome::Accepted(record) = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap()
        else {
            panic!("expected acceptance");
        };

        assert_eq!(service.delete(&[record.id]).unwrap(), 1);
        assert!(service.get(record.id).is_err());
        assert_eq!(service.list_recycle_bin(None).unwrap().len(), 1);
        // The original is kept while the record sits in the bin.
        assert!(service.vault().exists(&record.source_file));

        assert_eq!(service.restore(&[record.id]).unwrap(), 1);
        assert_eq!(service.get(record.id).unwrap().id, record.id);

        service.delete(&[record.id]).unwrap();
        assert_eq!(service.permanent_delete(&[record.id]).unwrap(), 1);
        assert!(!service.vault().exists(&record.source_file));
        assert!(service.list_recycle_bin(None).unwrap().is_empty());
    }

    #[test]
    fn test_restored_record_can_conflict_again() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let IngestOutcome::Accepted(record) = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap()
        else {
            panic!("expected acceptance");
        };

        // While the record is recycled, re-upload is allowed (dedup
        // only consults the Active set).
        service.delete(&[record.id]).unwrap();
        let outcome = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap();
        assert!(matches!(outcome, IngestOutcome::Accepted(_)));
    }

    #[test]
    fn test_update_returns_fresh_record() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let IngestOutcome::Accepted(record) = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap()
        else {
            panic!("expected acceptance");
        };

        let mut fields = HashMap::new();
        fields.insert("total_amount".to_string(), "99.99".to_string());
        let updated = service.update(record.id, &fields).unwrap();
        assert_eq!(updated.fields.total_amount, "99.99");
    }

    #[test]
    fn test_batch_update_all_missing_errors() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let mut fields = HashMap::new();
        fields.insert("buyer".to_string(), "新买方".to_string());
        let err = service.batch_update(&[404, 405], &fields).unwrap_err();
        assert!(matches!(err, FapiaoError::Store(StoreError::NotFound(404))));
    }

    #[test]
    fn test_statistics_counts_recycled() {
        let dir = TempDir::new().unwrap();
        let service = service_with(&dir, FakeOcr::sample());

        let IngestOutcome::Accepted(record) = service
            .ingest(b"%PDF-A", "a.pdf", Category::Expense, "买方", false)
            .unwrap()
        else {
            panic!("expected acceptance");
        };
        service.delete(&[record.id]).unwrap();

        let stats = service.statistics(None).unwrap();
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.recycled_count, 1);
    }
}
