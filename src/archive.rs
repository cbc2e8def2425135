use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AccountType, Category, Transaction};
use crate::triage::Triage;

/// Column order of the target `transaction_facts` schema.
pub const TRANSACTION_COLUMNS: [&str; 6] = [
    "account_id",
    "transaction_type_id",
    "category_id",
    "short_date",
    "transaction_description",
    "transaction_amount",
];

/// One archived row. `0` marks an unassigned id; an empty `category_id`
/// means no category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRow {
    pub account_id: i64,
    pub transaction_type_id: i64,
    pub category_id: Option<i64>,
    pub short_date: String,
    pub transaction_description: String,
    pub transaction_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
}

impl ArchiveRow {
    pub fn from_transaction(txn: &Transaction, review_reason: Option<String>) -> Self {
        let category_id = match txn.category {
            Category::Unassigned => Some(0),
            Category::NoCategory => None,
            Category::Id(id) => Some(id),
        };
        Self {
            account_id: txn.account_id(),
            transaction_type_id: txn.transaction_type.map_or(0, |t| t.id()),
            category_id,
            short_date: txn.date.format("%Y-%m-%d").to_string(),
            transaction_description: txn.description.clone(),
            transaction_amount: txn.amount,
            review_reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchivePaths {
    pub accepted: PathBuf,
    pub needs_review: PathBuf,
}

pub fn write_rows(path: &Path, rows: &[ArchiveRow], with_reason: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    let mut header: Vec<&str> = TRANSACTION_COLUMNS.to_vec();
    if with_reason {
        header.push("review_reason");
    }
    wtr.write_record(&header)?;
    for row in rows {
        if with_reason {
            wtr.serialize(row)?;
        } else {
            wtr.serialize(ArchiveRow { review_reason: None, ..row.clone() })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_rows(path: &Path) -> Result<Vec<(usize, csv::Result<ArchiveRow>)>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = rdr.headers()?.clone();
    Ok(rdr
        .records()
        .map(|record| {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            Ok((line, record.deserialize(Some(&headers))))
        })
        .collect::<csv::Result<Vec<_>>>()?)
}

/// Write both sets next to each other, stamped with `stamp`.
pub fn archive_triage(dir: &Path, account: AccountType, stamp: &str, triage: &Triage) -> Result<ArchivePaths> {
    let accepted: Vec<ArchiveRow> = triage
        .accepted
        .iter()
        .map(|t| ArchiveRow::from_transaction(t, None))
        .collect();
    let review: Vec<ArchiveRow> = triage
        .needs_review
        .iter()
        .map(|f| ArchiveRow::from_transaction(&f.transaction, Some(f.reason.to_string())))
        .collect();

    let paths = ArchivePaths {
        accepted: dir.join(format!("{}-{stamp}-accepted.csv", account.key())),
        needs_review: dir.join(format!("{}-{stamp}-review.csv", account.key())),
    };
    write_rows(&paths.accepted, &accepted, false)?;
    write_rows(&paths.needs_review, &review, true)?;
    Ok(paths)
}
