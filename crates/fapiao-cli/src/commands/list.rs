//! List command - show archived invoices.

use clap::Args;
use console::style;

use fapiao_core::{InvoiceRecord, SortDirection, SortKey};

use super::{CategoryArg, format_record_line, open_service};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Show full detail for one record instead of the listing
    #[arg(long)]
    id: Option<i64>,

    /// Only show this category
    #[arg(short = 'g', long, value_enum)]
    category: Option<CategoryArg>,

    /// Sort column (created_at, invoice_date, invoice_number,
    /// total_amount, buyer)
    #[arg(short, long, default_value = "created_at")]
    sort: String,

    /// Sort order (asc or desc)
    #[arg(short = 'o', long, default_value = "desc")]
    order: String,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let service = open_service(config_path)?;

    if let Some(id) = args.id {
        let record = service.get(id)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            print_detail(&record);
        }
        return Ok(());
    }

    let records = service.list(
        args.category.map(Into::into),
        SortKey::parse_lossy(&args.sort),
        SortDirection::parse_lossy(&args.order),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", style("No archived invoices.").dim());
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record_line(record));
    }
    println!();
    println!("{} record(s)", records.len());
    Ok(())
}

fn print_detail(record: &InvoiceRecord) {
    println!("{} #{}", style("Record").bold(), record.id);
    println!("  Category:       {}", record.category.as_str());
    println!("  Buyer:          {}", record.buyer);
    println!("  Invoice number: {}", record.fields.invoice_number);
    println!("  Invoice date:   {}", record.fields.invoice_date);
    println!("  Total amount:   {}", record.fields.total_amount);
    println!("  Content:        {}", record.fields.invoice_content);
    println!("  Seller:         {}", record.fields.seller_name);
    println!("  Bank:           {}", record.fields.bank_name);
    println!("  Account:        {}", record.fields.bank_account);
    println!("  Source file:    {}", record.source_file);
    println!("  Created:        {}", record.created_at);
    println!("  Updated:        {}", record.updated_at);
}
