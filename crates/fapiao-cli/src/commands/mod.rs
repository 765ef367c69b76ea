//! Subcommand implementations.

pub mod bin;
pub mod ingest;
pub mod list;
pub mod search;
pub mod stats;
pub mod update;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use fapiao_core::{
    Category, FapiaoConfig, InvoiceRecord, InvoiceService, ScanRasterizer,
};

use crate::ocr_client::RemoteOcr;

/// Load configuration from `--config`, falling back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    match config_path {
        Some(path) => {
            debug!(path, "Loading configuration");
            Ok(FapiaoConfig::from_file(Path::new(path))?)
        }
        None => Ok(FapiaoConfig::default()),
    }
}

/// Open the archive service with the remote OCR engine.
pub fn open_service(config_path: Option<&str>) -> anyhow::Result<InvoiceService> {
    let config = load_config(config_path)?;

    let ocr = RemoteOcr::new(&config.ocr.endpoint, config.ocr.min_confidence)?;
    if config.ocr.eager_init {
        ocr.probe()?;
    }

    let service = InvoiceService::open(&config, Arc::new(ocr), Box::new(ScanRasterizer::new()))?;
    Ok(service)
}

/// Category value accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CategoryArg {
    Income,
    Expense,
    Other,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Income => Category::Income,
            CategoryArg::Expense => Category::Expense,
            CategoryArg::Other => Category::Other,
        }
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

/// One-line summary used by the list and search commands.
pub fn format_record_line(record: &InvoiceRecord) -> String {
    format!(
        "#{:<5} {:8} {:>12}  {:10}  {}  {}",
        record.id,
        record.category.as_str(),
        or_dash(&record.fields.total_amount),
        or_dash(&record.fields.invoice_date),
        or_dash(&record.fields.invoice_number),
        record.fields.seller_name,
    )
}
