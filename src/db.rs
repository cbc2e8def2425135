use std::path::Path;

use rusqlite::Connection;

use crate::error::{Result, SpendSaveError};
use crate::lookup::CategoryLookup;
use crate::models::{AccountType, Transaction, TransactionType};
use crate::rules::INSURANCE_CATEGORY_ID;

pub const DB_FILE: &str = "spend_save.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS account (
    account_id INTEGER PRIMARY KEY,
    account_description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transaction_type (
    transaction_type_id INTEGER PRIMARY KEY,
    transaction_type_description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    category_id INTEGER PRIMARY KEY,
    category_description TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    accepted_count INTEGER,
    review_count INTEGER,
    error_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    FOREIGN KEY (account_id) REFERENCES account(account_id)
);

CREATE TABLE IF NOT EXISTS transaction_facts (
    transaction_id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    transaction_type_id INTEGER NOT NULL,
    category_id INTEGER,
    short_date TEXT NOT NULL,
    transaction_description VARCHAR(100) NOT NULL,
    transaction_amount REAL NOT NULL,
    import_id INTEGER,
    FOREIGN KEY (account_id) REFERENCES account(account_id),
    FOREIGN KEY (transaction_type_id) REFERENCES transaction_type(transaction_type_id),
    FOREIGN KEY (category_id) REFERENCES category(category_id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    for account in AccountType::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO account (account_id, account_description) VALUES (?1, ?2)",
            rusqlite::params![account.id(), account.name()],
        )?;
    }
    for t in TransactionType::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO transaction_type (transaction_type_id, transaction_type_description) VALUES (?1, ?2)",
            rusqlite::params![t.id(), t.description()],
        )?;
    }
    conn.execute(
        "INSERT OR IGNORE INTO category (category_id, category_description) VALUES (?1, 'insurance')",
        [INSURANCE_CATEGORY_ID],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub fn list_categories(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(
        "SELECT category_id, category_description FROM category ORDER BY category_id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add_category(conn: &Connection, description: &str) -> Result<i64> {
    let description = description.trim().to_lowercase();
    if description.is_empty() {
        return Err(SpendSaveError::Other("category description is empty".to_string()));
    }
    conn.execute(
        "INSERT INTO category (category_description) VALUES (?1)",
        [&description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Snapshot the category table for one run.
pub fn load_category_lookup(conn: &Connection) -> Result<CategoryLookup> {
    Ok(list_categories(conn)?
        .into_iter()
        .map(|(id, desc)| (desc, id))
        .collect())
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Append classified records in one SQLite transaction.
pub fn insert_transactions(
    conn: &Connection,
    transactions: &[Transaction],
    import_id: Option<i64>,
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let stored = insert_rows(&tx, transactions, import_id)?;
    tx.commit()?;
    Ok(stored)
}

/// Append classified records on `conn` without opening a transaction. The
/// caller owns commit or rollback.
pub fn insert_rows(conn: &Connection, transactions: &[Transaction], import_id: Option<i64>) -> Result<usize> {
    {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO transaction_facts \
             (account_id, transaction_type_id, category_id, short_date, transaction_description, transaction_amount, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for txn in transactions {
            let Some(transaction_type) = txn.transaction_type else {
                return Err(SpendSaveError::Other(format!(
                    "refusing to store unclassified transaction (line {})",
                    txn.line
                )));
            };
            if txn.category.is_unassigned() {
                return Err(SpendSaveError::Other(format!(
                    "refusing to store transaction with unassigned category (line {})",
                    txn.line
                )));
            }
            stmt.execute(rusqlite::params![
                txn.account_id(),
                transaction_type.id(),
                txn.category.to_sql(),
                txn.date.format("%Y-%m-%d").to_string(),
                txn.description,
                txn.amount,
                import_id,
            ])?;
        }
    }
    Ok(transactions.len())
}

// ---------------------------------------------------------------------------
// Import history
// ---------------------------------------------------------------------------

pub struct ImportRecord {
    pub filename: String,
    pub account: AccountType,
    pub accepted_count: usize,
    pub review_count: usize,
    pub error_count: usize,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub checksum: String,
}

pub struct ImportHistoryRow {
    pub id: i64,
    pub filename: String,
    pub account_id: i64,
    pub import_date: String,
    pub accepted_count: i64,
    pub review_count: i64,
    pub error_count: i64,
}

pub fn file_already_imported(conn: &Connection, checksum: &str, account: AccountType) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND account_id = ?2")?;
    Ok(stmt.exists(rusqlite::params![checksum, account.id()])?)
}

pub fn record_import(conn: &Connection, record: &ImportRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO imports (filename, account_id, accepted_count, review_count, error_count, \
         date_range_start, date_range_end, checksum) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            record.filename,
            record.account.id(),
            record.accepted_count as i64,
            record.review_count as i64,
            record.error_count as i64,
            record.date_range_start,
            record.date_range_end,
            record.checksum,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_imports(conn: &Connection) -> Result<Vec<ImportHistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, account_id, import_date, accepted_count, review_count, error_count \
         FROM imports ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ImportHistoryRow {
                id: row.get(0)?,
                filename: row.get(1)?,
                account_id: row.get(2)?,
                import_date: row.get(3)?,
                accepted_count: row.get(4)?,
                review_count: row.get(5)?,
                error_count: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn classified(t: TransactionType, category: Category) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut txn = Transaction::new(AccountType::Checking, date, "allstate", -130.0);
        txn.transaction_type = Some(t);
        txn.category = category;
        txn
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["account", "transaction_type", "category", "transaction_facts", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM account", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_seeded_types_match_enum() {
        let (_dir, conn) = test_db();
        let desc: String = conn
            .query_row(
                "SELECT transaction_type_description FROM transaction_type WHERE transaction_type_id = 11",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(desc, TransactionType::FeeAdjustment.description());
    }

    #[test]
    fn test_category_lookup_from_table() {
        let (_dir, conn) = test_db();
        let id = add_category(&conn, "Restaurants").unwrap();
        let lookup = load_category_lookup(&conn).unwrap();
        assert_eq!(lookup.get("restaurants"), Some(id));
        assert_eq!(lookup.get("insurance"), Some(INSURANCE_CATEGORY_ID));
    }

    #[test]
    fn test_insert_stores_null_for_no_category() {
        let (_dir, conn) = test_db();
        let rows = vec![
            classified(TransactionType::InsurancePayment, Category::Id(INSURANCE_CATEGORY_ID)),
            classified(TransactionType::TransferOut, Category::NoCategory),
        ];
        assert_eq!(insert_transactions(&conn, &rows, None).unwrap(), 2);
        let nulls: i64 = conn
            .query_row("SELECT count(*) FROM transaction_facts WHERE category_id IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_insert_rejects_unassigned_and_rolls_back() {
        let (_dir, conn) = test_db();
        let rows = vec![
            classified(TransactionType::TransferOut, Category::NoCategory),
            classified(TransactionType::Purchase, Category::Unassigned),
        ];
        assert!(insert_transactions(&conn, &rows, None).is_err());
        let count: i64 = conn.query_row("SELECT count(*) FROM transaction_facts", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_import_history() {
        let (_dir, conn) = test_db();
        assert!(!file_already_imported(&conn, "abc", AccountType::Savings).unwrap());
        record_import(&conn, &ImportRecord {
            filename: "sav.csv".to_string(),
            account: AccountType::Savings,
            accepted_count: 4,
            review_count: 1,
            error_count: 0,
            date_range_start: Some("2025-01-01".to_string()),
            date_range_end: Some("2025-01-31".to_string()),
            checksum: "abc".to_string(),
        })
        .unwrap();
        assert!(file_already_imported(&conn, "abc", AccountType::Savings).unwrap());
        assert!(!file_already_imported(&conn, "abc", AccountType::Checking).unwrap());
        let history = list_imports(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].accepted_count, 4);
    }
}
