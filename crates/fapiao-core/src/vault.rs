//! On-disk storage for uploaded invoice originals.
//!
//! Files are kept under a single directory and renamed on save to
//! `YYYYMMDDHHMMSS_<name>` so repeated uploads of the same filename
//! never collide. The database stores only the stored filename, not
//! the full path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::FapiaoError;

/// Storage-name timestamp prefix.
const STAMP_FMT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone)]
pub struct DocumentVault {
    root: PathBuf,
}

impl DocumentVault {
    /// Open a vault rooted at `root`, creating the directory if
    /// needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FapiaoError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a timestamped name derived from the
    /// uploaded filename, returning the stored name.
    pub fn save(
        &self,
        original_name: &str,
        bytes: &[u8],
        now: NaiveDateTime,
    ) -> Result<String, FapiaoError> {
        let stored_name = format!(
            "{}_{}",
            now.format(STAMP_FMT),
            sanitize_name(original_name)
        );
        let path = self.root.join(&stored_name);
        fs::write(&path, bytes)?;
        debug!(file = %stored_name, size = bytes.len(), "Stored original document");
        Ok(stored_name)
    }

    /// Remove a stored file. Missing files are logged and ignored so
    /// that purging a record whose blob is already gone still
    /// succeeds.
    pub fn delete(&self, stored_name: &str) {
        let path = self.root.join(stored_name);
        match fs::remove_file(&path) {
            Ok(()) => debug!(file = %stored_name, "Deleted stored document"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file = %stored_name, "Stored document already missing")
            }
            Err(e) => warn!(file = %stored_name, error = %e, "Failed to delete stored document"),
        }
    }

    pub fn exists(&self, stored_name: &str) -> bool {
        self.root.join(stored_name).is_file()
    }

    pub fn path(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }
}

/// Keep only the final path component and replace separator
/// characters, so an uploaded name can never escape the vault root.
fn sanitize_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn test_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_save_prefixes_timestamp() {
        let dir = TempDir::new().unwrap();
        let vault = DocumentVault::new(dir.path()).unwrap();

        let name = vault.save("发票.pdf", b"%PDF-1.4", test_now()).unwrap();
        assert_eq!(name, "20240315103000_发票.pdf");
        assert!(vault.exists(&name));
        assert_eq!(fs::read(vault.path(&name)).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_save_strips_path_components() {
        let dir = TempDir::new().unwrap();
        let vault = DocumentVault::new(dir.path()).unwrap();

        let name = vault
            .save("../../etc/passwd.pdf", b"x", test_now())
            .unwrap();
        assert_eq!(name, "20240315103000_passwd.pdf");
        assert!(vault.path(&name).starts_with(dir.path()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let vault = DocumentVault::new(dir.path()).unwrap();

        let name = vault.save("a.pdf", b"x", test_now()).unwrap();
        vault.delete(&name);
        assert!(!vault.exists(&name));
        // No panic or error on the second delete.
        vault.delete(&name);
    }

    #[test]
    fn test_empty_name_gets_placeholder() {
        assert_eq!(sanitize_name("  "), "document.pdf");
        assert_eq!(sanitize_name("scan.pdf"), "scan.pdf");
    }
}
