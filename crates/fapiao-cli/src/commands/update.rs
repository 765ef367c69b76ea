//! Update command - edit fields of archived invoices.

use std::collections::HashMap;

use clap::Args;
use console::style;

use super::open_service;

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// Record ids to update
    #[arg(required = true)]
    ids: Vec<i64>,

    /// Field assignment, e.g. --set total_amount=99.50 (repeatable)
    #[arg(short, long = "set", value_name = "FIELD=VALUE", required = true)]
    sets: Vec<String>,

    /// Print the updated record as JSON (single id only)
    #[arg(long)]
    json: bool,
}

pub fn run(args: UpdateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut fields = HashMap::new();
    for set in &args.sets {
        let Some((field, value)) = set.split_once('=') else {
            anyhow::bail!("invalid assignment '{}', expected FIELD=VALUE", set);
        };
        fields.insert(field.trim().to_string(), value.to_string());
    }

    let service = open_service(config_path)?;

    if let [id] = args.ids[..] {
        let record = service.update(id, &fields)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            println!("{} Updated record #{}", style("✓").green(), record.id);
        }
        return Ok(());
    }

    let updated = service.batch_update(&args.ids, &fields)?;
    println!(
        "{} Updated {} of {} record(s)",
        style("✓").green(),
        updated,
        args.ids.len()
    );
    Ok(())
}
