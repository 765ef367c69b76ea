//! Ingest command - upload and archive one or more invoice PDFs.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use fapiao_core::{DuplicateVerdict, IngestOutcome};

use super::{CategoryArg, open_service};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Invoice PDF files to archive
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Expense category
    #[arg(short = 'g', long, value_enum, default_value = "expense")]
    category: CategoryArg,

    /// Buyer (reimbursing party) name
    #[arg(short, long)]
    buyer: String,

    /// Archive even if a duplicate is detected
    #[arg(long)]
    force: bool,

    /// Print the created records as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let service = open_service(config_path)?;

    let pb = ProgressBar::new(args.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut failed = 0usize;

    for input in &args.inputs {
        pb.set_message(input.display().to_string());

        if !input.exists() {
            pb.println(format!(
                "{} {}: file not found",
                style("✗").red(),
                input.display()
            ));
            failed += 1;
            pb.inc(1);
            continue;
        }

        let bytes = fs::read(input)?;
        let original_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        match service.ingest(
            &bytes,
            &original_name,
            args.category.into(),
            &args.buyer,
            args.force,
        ) {
            Ok(IngestOutcome::Accepted(record)) => {
                accepted += 1;
                if args.json {
                    pb.println(serde_json::to_string(&record)?);
                } else {
                    pb.println(format!(
                        "{} {} -> record #{} (invoice {}, {} yuan)",
                        style("✓").green(),
                        original_name,
                        record.id,
                        if record.fields.invoice_number.is_empty() {
                            "unknown"
                        } else {
                            &record.fields.invoice_number
                        },
                        if record.fields.total_amount.is_empty() {
                            "?"
                        } else {
                            &record.fields.total_amount
                        },
                    ));
                }
                info!(id = record.id, file = %original_name, "Archived");
            }
            Ok(IngestOutcome::Rejected(verdict)) => {
                rejected += 1;
                let reason = match verdict {
                    DuplicateVerdict::ByFingerprint { existing_id } => {
                        format!("identical file already archived as #{existing_id}")
                    }
                    DuplicateVerdict::ByInvoiceNumber { existing_id } => {
                        format!("invoice number already archived as #{existing_id}")
                    }
                    DuplicateVerdict::Unique => unreachable!("unique uploads are accepted"),
                };
                pb.println(format!(
                    "{} {}: {} (use --force to archive anyway)",
                    style("!").yellow(),
                    original_name,
                    reason
                ));
            }
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", style("✗").red(), original_name, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!(
        "{} archived, {} duplicates rejected, {} failed",
        style(accepted).green(),
        style(rejected).yellow(),
        style(failed).red()
    );

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to ingest", failed);
    }
    Ok(())
}
