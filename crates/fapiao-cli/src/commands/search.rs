//! Search command - filtered lookup over the archive.

use clap::Args;
use console::style;
use rust_decimal::Decimal;

use fapiao_core::SearchFilter;

use super::{CategoryArg, format_record_line, open_service};

/// Arguments for the search command. All given filters must match.
#[derive(Args)]
pub struct SearchArgs {
    /// Substring matched against number, buyer, seller and content
    keyword: Option<String>,

    /// Only this category
    #[arg(short = 'g', long, value_enum)]
    category: Option<CategoryArg>,

    /// Earliest invoice date (YYYYMMDD, inclusive)
    #[arg(long)]
    from: Option<String>,

    /// Latest invoice date (YYYYMMDD, inclusive)
    #[arg(long)]
    to: Option<String>,

    /// Minimum amount
    #[arg(long)]
    min: Option<Decimal>,

    /// Maximum amount
    #[arg(long)]
    max: Option<Decimal>,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: SearchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let service = open_service(config_path)?;

    let filter = SearchFilter {
        keyword: args.keyword,
        category: args.category.map(Into::into),
        date_from: args.from,
        date_to: args.to,
        amount_min: args.min,
        amount_max: args.max,
    };
    let records = service.search(&filter)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", style("No matches.").dim());
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record_line(record));
    }
    println!();
    println!("{} match(es)", records.len());
    Ok(())
}
