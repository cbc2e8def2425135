use std::path::Path;

use rusqlite::Connection;
use tracing::{info, warn};

use crate::archive::{read_rows, ArchiveRow};
use crate::db::insert_transactions;
use crate::error::Result;
use crate::models::{AccountType, Category, Transaction, TransactionType};
use crate::normalizer::{parse_date, RowError};

pub struct ResubmitResult {
    pub stored: usize,
    pub errors: Vec<RowError>,
}

/// Turn a hand-corrected review row back into a storable transaction.
/// Corrections are taken as given; rules are not re-run.
fn corrected_transaction(
    line: usize,
    row: &ArchiveRow,
    account: AccountType,
) -> std::result::Result<Transaction, String> {
    if row.account_id != account.id() {
        return Err(format!(
            "account_id {} does not belong to {}",
            row.account_id,
            account.name()
        ));
    }
    let transaction_type = TransactionType::from_id(row.transaction_type_id)
        .ok_or_else(|| format!("transaction_type_id {} is not assigned", row.transaction_type_id))?;
    let category = match row.category_id {
        None => Category::NoCategory,
        Some(0) => return Err("category_id is 0; leave it empty for no category".to_string()),
        Some(id) => Category::Id(id),
    };
    let date = parse_date(&row.short_date)
        .ok_or_else(|| format!("invalid short_date '{}'", row.short_date))?;

    let mut txn = Transaction::new(account, date, &row.transaction_description.to_lowercase(), row.transaction_amount);
    txn.line = line;
    txn.transaction_type = Some(transaction_type);
    txn.category = category;
    Ok(txn)
}

pub fn resubmit_file(
    conn: &Connection,
    file_path: &Path,
    account: AccountType,
    description_limit: usize,
) -> Result<ResubmitResult> {
    let mut ready = Vec::new();
    let mut errors = Vec::new();

    for (line, row) in read_rows(file_path)? {
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|row| corrected_transaction(line, &row, account));
        match parsed {
            Ok(mut txn) => {
                txn.truncate_description(description_limit);
                ready.push(txn);
            }
            Err(reason) => {
                warn!(line, reason = %reason, "review row not accepted");
                errors.push(RowError { line, reason });
            }
        }
    }

    let stored = insert_transactions(conn, &ready, None)?;
    info!(stored, rejected = errors.len(), "resubmitted reviewed transactions");
    Ok(ResubmitResult { stored, errors })
}
