//! Bin command - recycle-bin management.

use clap::{Args, Subcommand};
use console::style;

use fapiao_core::RecycledRecord;

use super::{CategoryArg, open_service};

/// Arguments for the bin command.
#[derive(Args)]
pub struct BinArgs {
    #[command(subcommand)]
    action: BinAction,
}

#[derive(Subcommand)]
enum BinAction {
    /// Move records to the recycle bin
    Delete {
        /// Record ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// List recycled records (sweeps expired entries first)
    List {
        /// Only this category
        #[arg(short = 'g', long, value_enum)]
        category: Option<CategoryArg>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move recycled records back to the archive
    Restore {
        /// Record ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Permanently delete recycled records and their files
    Purge {
        /// Record ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Permanently delete everything in the recycle bin
    Empty {
        /// Only this category
        #[arg(short = 'g', long, value_enum)]
        category: Option<CategoryArg>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub fn run(args: BinArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let service = open_service(config_path)?;

    match args.action {
        BinAction::Delete { ids } => {
            let moved = service.delete(&ids)?;
            println!(
                "{} Moved {} of {} record(s) to the recycle bin",
                style("✓").green(),
                moved,
                ids.len()
            );
        }
        BinAction::List { category, json } => {
            let recycled = service.list_recycle_bin(category.map(Into::into))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&recycled)?);
            } else if recycled.is_empty() {
                println!("{}", style("Recycle bin is empty.").dim());
            } else {
                for entry in &recycled {
                    println!("{}", format_recycled_line(entry));
                }
                println!();
                println!("{} recycled record(s)", recycled.len());
            }
        }
        BinAction::Restore { ids } => {
            let restored = service.restore(&ids)?;
            println!(
                "{} Restored {} of {} record(s)",
                style("✓").green(),
                restored,
                ids.len()
            );
        }
        BinAction::Purge { ids } => {
            let purged = service.permanent_delete(&ids)?;
            println!(
                "{} Permanently deleted {} record(s)",
                style("✓").green(),
                purged
            );
        }
        BinAction::Empty { category, yes } => {
            if !yes {
                anyhow::bail!("emptying the recycle bin is irreversible; pass --yes to confirm");
            }
            let purged = service.empty_recycle_bin(category.map(Into::into))?;
            println!(
                "{} Permanently deleted {} record(s)",
                style("✓").green(),
                purged
            );
        }
    }
    Ok(())
}

fn format_recycled_line(entry: &RecycledRecord) -> String {
    format!(
        "#{:<5} {:8} deleted {}  {}  {}",
        entry.record.id,
        entry.record.category.as_str(),
        entry.deleted_at,
        entry.record.fields.invoice_number,
        entry.record.fields.seller_name,
    )
}
