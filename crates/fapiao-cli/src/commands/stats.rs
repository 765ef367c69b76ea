//! Stats command - archive-wide aggregates.

use clap::Args;
use console::style;

use super::{CategoryArg, open_service};

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Restrict statistics to one category
    #[arg(short = 'g', long, value_enum)]
    category: Option<CategoryArg>,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let service = open_service(config_path)?;
    let stats = service.statistics(args.category.map(Into::into))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", style("Archive statistics").bold());
    println!("  Records:      {}", stats.total_count);
    println!("  Total amount: {}", stats.total_amount);
    println!("  Average:      {}", stats.average_amount);
    if let (Some(max), Some(min)) = (stats.max_amount, stats.min_amount) {
        println!("  Largest:      {}", max);
        println!("  Smallest:     {}", min);
    }
    println!("  In bin:       {}", stats.recycled_count);

    if !stats.by_category.is_empty() {
        println!();
        println!("{}", style("By category").bold());
        for (category, entry) in &stats.by_category {
            println!(
                "  {:8} {:>6} record(s)  {:>14}",
                category, entry.count, entry.total_amount
            );
        }
    }

    if !stats.by_month.is_empty() {
        println!();
        println!("{}", style("Recent months").bold());
        for month in &stats.by_month {
            println!(
                "  {}-{}  {:>6} record(s)  {:>14}",
                &month.month[..4],
                &month.month[4..],
                month.count,
                month.total_amount
            );
        }
    }

    Ok(())
}
