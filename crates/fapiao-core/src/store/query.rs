//! Read-side queries over the Active set: listing, filtered search,
//! and aggregate statistics.
//!
//! Sort columns are a closed whitelist. Amounts are stored as text
//! (OCR output, possibly empty), so numeric ordering and range
//! filters go through `CAST(total_amount AS REAL)` in SQL while
//! statistics sum with [`Decimal`] to avoid float accumulation drift.

use std::collections::BTreeMap;
use std::str::FromStr;

use rusqlite::{Connection, ToSql, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::models::record::{Category, InvoiceRecord};

use super::records::{RECORD_COLUMNS, record_from_raw, row_to_raw};

/// Cap on search results; the interface is meant for narrowing, not
/// paging through the archive.
pub const SEARCH_LIMIT: usize = 100;

/// Columns list queries may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    InvoiceDate,
    InvoiceNumber,
    TotalAmount,
    Buyer,
}

impl SortKey {
    /// Unknown names fall back to the default ordering instead of
    /// erroring, so callers can pass user input through unchecked.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "created_at" => SortKey::CreatedAt,
            "invoice_date" => SortKey::InvoiceDate,
            "invoice_number" => SortKey::InvoiceNumber,
            "total_amount" => SortKey::TotalAmount,
            "buyer" => SortKey::Buyer,
            other => {
                warn!(column = other, "Unknown sort column, using created_at");
                SortKey::CreatedAt
            }
        }
    }

    fn sql_expr(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::InvoiceDate => "invoice_date",
            SortKey::InvoiceNumber => "invoice_number",
            // Empty amounts cast to 0.0 and group at one end.
            SortKey::TotalAmount => "CAST(total_amount AS REAL)",
            SortKey::Buyer => "buyer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl SortDirection {
    pub fn parse_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    fn sql_expr(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// List Active records, optionally filtered to one category.
pub fn list_records(
    conn: &Connection,
    category: Option<Category>,
    sort: SortKey,
    direction: SortDirection,
) -> Result<Vec<InvoiceRecord>, StoreError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM invoices {} ORDER BY {} {}",
        if category.is_some() { "WHERE category = ?1" } else { "" },
        sort.sql_expr(),
        direction.sql_expr(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let raws: Vec<_> = match category {
        Some(c) => stmt
            .query_map(params![c.as_str()], row_to_raw)?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt.query_map([], row_to_raw)?.collect::<rusqlite::Result<_>>()?,
    };

    raws.into_iter().map(record_from_raw).collect()
}

/// Search criteria. All set fields must match (AND semantics).
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Substring match against invoice number, buyer, seller and
    /// content.
    pub keyword: Option<String>,
    pub category: Option<Category>,
    /// Inclusive YYYYMMDD bounds on the invoice date.
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Inclusive bounds on the numeric amount. Records with an empty
    /// amount never match a range filter.
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
}

/// Search the Active set. Results are newest-first, capped at
/// [`SEARCH_LIMIT`].
pub fn search_records(
    conn: &Connection,
    filter: &SearchFilter,
) -> Result<Vec<InvoiceRecord>, StoreError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
        let n = values.len() + 1;
        clauses.push(format!(
            "(invoice_number LIKE ?{n} OR buyer LIKE ?{n} \
             OR seller_name LIKE ?{n} OR invoice_content LIKE ?{n})"
        ));
        values.push(Box::new(format!("%{keyword}%")));
    }
    if let Some(category) = filter.category {
        let n = values.len() + 1;
        clauses.push(format!("category = ?{n}"));
        values.push(Box::new(category.as_str().to_string()));
    }
    if let Some(from) = filter.date_from.as_deref().filter(|d| !d.is_empty()) {
        let n = values.len() + 1;
        clauses.push(format!("invoice_date >= ?{n}"));
        values.push(Box::new(from.to_string()));
    }
    if let Some(to) = filter.date_to.as_deref().filter(|d| !d.is_empty()) {
        let n = values.len() + 1;
        clauses.push(format!("invoice_date <= ?{n}"));
        values.push(Box::new(to.to_string()));
    }
    if let Some(min) = filter.amount_min {
        let n = values.len() + 1;
        clauses.push(format!(
            "total_amount != '' AND CAST(total_amount AS REAL) >= ?{n}"
        ));
        values.push(Box::new(min.to_string().parse::<f64>().unwrap_or(0.0)));
    }
    if let Some(max) = filter.amount_max {
        let n = values.len() + 1;
        clauses.push(format!(
            "total_amount != '' AND CAST(total_amount AS REAL) <= ?{n}"
        ));
        values.push(Box::new(max.to_string().parse::<f64>().unwrap_or(0.0)));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM invoices {where_clause} \
         ORDER BY created_at DESC LIMIT {SEARCH_LIMIT}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params = rusqlite::params_from_iter(values.iter().map(|v| v.as_ref()));
    let raws: Vec<_> = stmt
        .query_map(params, row_to_raw)?
        .collect::<rusqlite::Result<_>>()?;

    raws.into_iter().map(record_from_raw).collect()
}

/// Per-category slice of the archive.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryStats {
    pub count: u64,
    pub total_amount: Decimal,
}

/// Invoice count and sum for one YYYYMM month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthStats {
    /// YYYYMM, taken from the invoice date, not the ingest time.
    pub month: String,
    pub count: u64,
    pub total_amount: Decimal,
}

/// Aggregates over the Active set plus the recycle-bin count.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Statistics {
    pub total_count: u64,
    /// Sum over records with a parseable amount; empty and malformed
    /// amounts contribute nothing.
    pub total_amount: Decimal,
    /// Mean of the parseable amounts; zero when there are none.
    pub average_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub min_amount: Option<Decimal>,
    pub by_category: BTreeMap<String, CategoryStats>,
    /// The 12 most recent months that have any record, newest first.
    pub by_month: Vec<MonthStats>,
    /// Recycle-bin population, restricted to the same category filter
    /// as the other aggregates.
    pub recycled_count: u64,
}

const MONTH_WINDOW: usize = 12;

/// Compute archive statistics, optionally restricted to one category.
pub fn statistics(
    conn: &Connection,
    category: Option<Category>,
) -> Result<Statistics, StoreError> {
    let sql = format!(
        "SELECT category, invoice_date, total_amount FROM invoices {}",
        if category.is_some() { "WHERE category = ?1" } else { "" },
    );
    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    };
    let rows: Vec<(String, String, String)> = match category {
        Some(c) => stmt
            .query_map(params![c.as_str()], map_row)?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<_>>()?,
    };
    drop(stmt);

    let mut total_count = 0u64;
    let mut total_amount = Decimal::ZERO;
    let mut amount_count = 0u64;
    let mut max_amount: Option<Decimal> = None;
    let mut min_amount: Option<Decimal> = None;
    let mut by_category: BTreeMap<String, CategoryStats> = BTreeMap::new();
    // BTreeMap keyed by YYYYMM keeps months sorted for the window cut.
    let mut months: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();

    for (cat, date, amount) in rows {
        total_count += 1;
        let parsed = if amount.is_empty() {
            None
        } else {
            Decimal::from_str(&amount).ok()
        };
        if let Some(value) = parsed {
            total_amount += value;
            amount_count += 1;
            max_amount = Some(max_amount.map_or(value, |m| m.max(value)));
            min_amount = Some(min_amount.map_or(value, |m| m.min(value)));
        }

        let entry = by_category.entry(cat).or_insert(CategoryStats {
            count: 0,
            total_amount: Decimal::ZERO,
        });
        entry.count += 1;
        if let Some(value) = parsed {
            entry.total_amount += value;
        }

        // A month bucket needs a full 8-digit date.
        if date.len() == 8 && date.chars().all(|c| c.is_ascii_digit()) {
            let bucket = months.entry(date[..6].to_string()).or_insert((0, Decimal::ZERO));
            bucket.0 += 1;
            if let Some(value) = parsed {
                bucket.1 += value;
            }
        }
    }

    let by_month: Vec<MonthStats> = months
        .into_iter()
        .rev()
        .take(MONTH_WINDOW)
        .map(|(month, (count, total_amount))| MonthStats {
            month,
            count,
            total_amount,
        })
        .collect();

    let recycled_count: u64 = match category {
        Some(c) => conn.query_row(
            "SELECT COUNT(*) FROM recycle_bin WHERE category = ?1",
            params![c.as_str()],
            |r| r.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM recycle_bin", [], |r| r.get(0))?,
    };

    let average_amount = if amount_count > 0 {
        total_amount / Decimal::from(amount_count)
    } else {
        Decimal::ZERO
    };

    Ok(Statistics {
        total_count,
        total_amount,
        average_amount,
        max_amount,
        min_amount,
        by_category,
        by_month,
        recycled_count,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;
    use crate::models::record::InvoiceFields;
    use crate::store::records::{NewRecord, insert_record};
    use crate::store::sqlite::open_memory_database;
    use crate::store::tests_support::{insert_sample, sample_time};

    fn insert_full(
        conn: &Connection,
        number: &str,
        date: &str,
        amount: &str,
        seller: &str,
        category: Category,
    ) -> i64 {
        let record = NewRecord {
            category,
            buyer: "测试公司".to_string(),
            fields: InvoiceFields {
                invoice_number: number.to_string(),
                invoice_date: date.to_string(),
                total_amount: amount.to_string(),
                invoice_content: "*办公用品*打印纸".to_string(),
                seller_name: seller.to_string(),
                bank_name: "中国银行".to_string(),
                bank_account: "1234567890123456".to_string(),
            },
            source_file: format!("{number}.pdf"),
            fingerprint: format!("fp-{number}"),
        };
        insert_record(conn, &record, sample_time()).unwrap().id
    }

    #[test]
    fn test_sort_key_parse_lossy_falls_back() {
        assert_eq!(SortKey::parse_lossy("total_amount"), SortKey::TotalAmount);
        assert_eq!(
            SortKey::parse_lossy("total_amount; DROP TABLE invoices"),
            SortKey::CreatedAt
        );
        assert_eq!(SortKey::parse_lossy(""), SortKey::CreatedAt);
    }

    #[test]
    fn test_numeric_amount_sort() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "9.50", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240102", "100.00", "乙公司", Category::Expense);
        insert_full(&conn, "00000003", "20240103", "25.00", "丙公司", Category::Expense);
        // Empty amount casts to 0 and sorts first ascending.
        insert_full(&conn, "00000004", "20240104", "", "丁公司", Category::Expense);

        let records = list_records(
            &conn,
            None,
            SortKey::TotalAmount,
            SortDirection::Ascending,
        )
        .unwrap();
        let amounts: Vec<&str> = records
            .iter()
            .map(|r| r.fields.total_amount.as_str())
            .collect();
        // Lexicographic order would put "100.00" before "25.00".
        assert_eq!(amounts, vec!["", "9.50", "25.00", "100.00"]);
    }

    #[test]
    fn test_list_filters_by_category() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "10.00", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240102", "20.00", "乙公司", Category::Income);

        let expense = list_records(
            &conn,
            Some(Category::Expense),
            SortKey::CreatedAt,
            SortDirection::Descending,
        )
        .unwrap();
        assert_eq!(expense.len(), 1);
        assert_eq!(expense[0].fields.invoice_number, "00000001");
    }

    #[test]
    fn test_search_and_combines_filters() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "10.00", "北京甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240215", "250.00", "北京乙公司", Category::Expense);
        insert_full(&conn, "00000003", "20240320", "250.00", "上海丙公司", Category::Income);

        let filter = SearchFilter {
            keyword: Some("北京".to_string()),
            amount_min: Some("100".parse::<Decimal>().unwrap()),
            ..Default::default()
        };
        let hits = search_records(&conn, &filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields.invoice_number, "00000002");
    }

    #[test]
    fn test_search_date_range_inclusive() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "1.00", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240215", "1.00", "乙公司", Category::Expense);
        insert_full(&conn, "00000003", "20240320", "1.00", "丙公司", Category::Expense);

        let filter = SearchFilter {
            date_from: Some("20240215".to_string()),
            date_to: Some("20240320".to_string()),
            ..Default::default()
        };
        let hits = search_records(&conn, &filter).unwrap();
        let numbers: Vec<&str> = hits
            .iter()
            .map(|r| r.fields.invoice_number.as_str())
            .collect();
        assert!(numbers.contains(&"00000002"));
        assert!(numbers.contains(&"00000003"));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_amount_range_skips_empty_amounts() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240102", "50.00", "乙公司", Category::Expense);

        let filter = SearchFilter {
            amount_max: Some("1000".parse::<Decimal>().unwrap()),
            ..Default::default()
        };
        let hits = search_records(&conn, &filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields.invoice_number, "00000002");
    }

    #[test]
    fn test_search_empty_filter_lists_newest_first() {
        let conn = open_memory_database().unwrap();
        insert_sample(&conn, "00000001", "fp-1");
        insert_sample(&conn, "00000002", "fp-2");

        let hits = search_records(&conn, &SearchFilter::default()).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_statistics_excludes_empty_amounts() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "10.50", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240102", "", "乙公司", Category::Expense);
        insert_full(&conn, "00000003", "20240201", "5.25", "丙公司", Category::Income);

        let stats = statistics(&conn, None).unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.total_amount, "15.75".parse::<Decimal>().unwrap());
        // The empty amount is excluded from the mean, not counted as 0.
        assert_eq!(stats.average_amount, "7.875".parse::<Decimal>().unwrap());
        assert_eq!(stats.max_amount, Some("10.50".parse::<Decimal>().unwrap()));
        assert_eq!(stats.min_amount, Some("5.25".parse::<Decimal>().unwrap()));
        assert_eq!(stats.by_category["expense"].count, 2);
        assert_eq!(stats.by_category["expense"].total_amount, "10.50".parse::<Decimal>().unwrap());
        assert_eq!(stats.by_category["income"].total_amount, "5.25".parse::<Decimal>().unwrap());
        assert_eq!(stats.recycled_count, 0);
    }

    #[test]
    fn test_statistics_month_window() {
        let conn = open_memory_database().unwrap();
        // 14 distinct months; only the 12 newest survive.
        for (i, ym) in (1..=12)
            .map(|m| format!("2024{m:02}"))
            .chain(["202501".to_string(), "202502".to_string()])
            .enumerate()
        {
            insert_full(
                &conn,
                &format!("{:08}", i + 1),
                &format!("{ym}15"),
                "1.00",
                "甲公司",
                Category::Expense,
            );
        }

        let stats = statistics(&conn, None).unwrap();
        assert_eq!(stats.by_month.len(), 12);
        assert_eq!(stats.by_month[0].month, "202502");
        assert_eq!(stats.by_month[11].month, "202403");
    }

    #[test]
    fn test_statistics_empty_archive() {
        let conn = open_memory_database().unwrap();
        let stats = statistics(&conn, None).unwrap();
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.average_amount, Decimal::ZERO);
        assert_eq!(stats.max_amount, None);
        assert_eq!(stats.min_amount, None);
        assert!(stats.by_month.is_empty());
    }

    #[test]
    fn test_statistics_category_scope() {
        let conn = open_memory_database().unwrap();
        insert_full(&conn, "00000001", "20240101", "10.00", "甲公司", Category::Expense);
        insert_full(&conn, "00000002", "20240102", "20.00", "乙公司", Category::Income);

        let stats = statistics(&conn, Some(Category::Income)).unwrap();
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.total_amount, "20".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_statistics_recycled_count_follows_category_scope() {
        let conn = open_memory_database().unwrap();
        let expense = insert_full(&conn, "00000001", "20240101", "10.00", "甲公司", Category::Expense);
        let income = insert_full(&conn, "00000002", "20240102", "20.00", "乙公司", Category::Income);
        crate::store::lifecycle::move_to_recycle(&conn, &[expense, income], sample_time()).unwrap();

        let stats = statistics(&conn, None).unwrap();
        assert_eq!(stats.recycled_count, 2);

        let stats = statistics(&conn, Some(Category::Income)).unwrap();
        assert_eq!(stats.recycled_count, 1);
        assert_eq!(stats.total_count, 0);
    }
}
