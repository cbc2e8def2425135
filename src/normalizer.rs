use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{Result, SpendSaveError};
use crate::models::{AccountType, Transaction};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a signed amount. Accepts thousands separators, `$` and
/// parenthesised negatives; anything else is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// A record that could not be turned into a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub transactions: Vec<Transaction>,
    pub errors: Vec<RowError>,
}

// ---------------------------------------------------------------------------
// Column layouts
// ---------------------------------------------------------------------------

struct Layout {
    date: &'static str,
    description: &'static str,
    amount: &'static str,
    source_type: Option<&'static str>,
    vendor_category: Option<&'static str>,
}

// Details, Posting Date, Description, Amount, Type, Balance, Check or Slip #
const BANK_LAYOUT: Layout = Layout {
    date: "posting date",
    description: "description",
    amount: "amount",
    source_type: None,
    vendor_category: None,
};

// Transaction Date, Post Date, Description, Category, Type, Amount, Memo
const CARD_LAYOUT: Layout = Layout {
    date: "transaction date",
    description: "description",
    amount: "amount",
    source_type: Some("type"),
    vendor_category: Some("category"),
};

fn layout_for(account: AccountType) -> &'static Layout {
    match account {
        AccountType::CreditCard => &CARD_LAYOUT,
        AccountType::Checking | AccountType::Savings => &BANK_LAYOUT,
    }
}

struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    source_type: Option<usize>,
    vendor_category: Option<usize>,
}

fn resolve_columns(headers: &[String], layout: &Layout, file: &str) -> Result<Columns> {
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SpendSaveError::MissingColumn {
                column: name.to_string(),
                file: file.to_string(),
            })
    };
    Ok(Columns {
        date: find(layout.date)?,
        description: find(layout.description)?,
        amount: find(layout.amount)?,
        source_type: layout.source_type.map(&find).transpose()?,
        vendor_category: layout.vendor_category.map(&find).transpose()?,
    })
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

pub fn normalize_file(file_path: &Path, account: AccountType) -> Result<Normalized> {
    let file = std::fs::File::open(file_path)?;
    normalize_reader(std::io::BufReader::new(file), account, &file_path.display().to_string())
}

/// Read an export, lower-case text and headers, keep only the canonical
/// fields and stamp the account. Bad rows are collected, not fatal.
pub fn normalize_reader<R: Read>(reader: R, account: AccountType, file: &str) -> Result<Normalized> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_lowercase).collect();
    let cols = resolve_columns(&headers, layout_for(account), file)?;

    let mut out = Normalized::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize);
                warn!(line, error = %e, "unreadable row");
                out.errors.push(RowError { line, reason: e.to_string() });
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let field = |idx: usize| record.get(idx).unwrap_or("").to_lowercase();
        let optional = |idx: Option<usize>| idx.map(&field).filter(|v| !v.is_empty());

        let raw_date = field(cols.date);
        let Some(date) = parse_date(&raw_date) else {
            warn!(line, value = %raw_date, "unparseable date");
            out.errors.push(RowError { line, reason: format!("invalid date '{raw_date}'") });
            continue;
        };
        let raw_amount = field(cols.amount);
        let Some(amount) = parse_amount(&raw_amount) else {
            warn!(line, value = %raw_amount, "unparseable amount");
            out.errors.push(RowError { line, reason: format!("invalid amount '{raw_amount}'") });
            continue;
        };

        let mut txn = Transaction::new(account, date, &field(cols.description), amount);
        txn.line = line;
        txn.source_type = optional(cols.source_type);
        txn.vendor_category = optional(cols.vendor_category);
        out.transactions.push(txn);
    }
    Ok(out)
}
