//! Configuration structures for the archive.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the fapiao archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// OCR collaborator configuration.
    pub ocr: OcrConfig,
}

impl Default for FapiaoConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

/// Database and document-vault paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Directory holding the original uploaded documents.
    pub vault_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("invoices.db"),
            vault_dir: PathBuf::from("uploads"),
        }
    }
}

/// External OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// HTTP endpoint of the recognition service.
    pub endpoint: String,

    /// Construct and probe the engine handle at startup instead of on
    /// first use.
    pub eager_init: bool,

    /// Drop recognized lines below this confidence.
    pub min_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8868/predict/ocr_system".to_string(),
            eager_init: false,
            min_confidence: 0.0,
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
