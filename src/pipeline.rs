use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::archive::{archive_triage, ArchivePaths};
use crate::categorizer::{CategorizeResult, Categorizer};
use crate::db;
use crate::error::Result;
use crate::lookup::CategoryLookup;
use crate::models::{AccountType, Transaction};
use crate::normalizer::{normalize_file, RowError};
use crate::rules::RuleTable;
use crate::triage::{triage, Triage};

pub struct ImportOptions {
    pub archive_dir: PathBuf,
    pub description_limit: usize,
    pub dry_run: bool,
}

pub struct ImportResult {
    pub triage: Triage,
    pub errors: Vec<RowError>,
    pub categorize: CategorizeResult,
    pub stored: usize,
    pub archive: Option<ArchivePaths>,
    pub duplicate_file: bool,
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Classify and partition one batch. No I/O.
pub fn classify_batch(
    account: AccountType,
    lookup: &CategoryLookup,
    mut transactions: Vec<Transaction>,
) -> (Triage, CategorizeResult) {
    let table = RuleTable::for_account(account);
    let categorize = Categorizer::new(table, lookup).categorize(&mut transactions);
    (triage(table, transactions), categorize)
}

pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    account: AccountType,
    opts: &ImportOptions,
) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    if !opts.dry_run && db::file_already_imported(conn, &checksum, account)? {
        info!(file = %file_path.display(), "file already imported, skipping");
        return Ok(ImportResult {
            triage: Triage::default(),
            errors: Vec::new(),
            categorize: CategorizeResult::default(),
            stored: 0,
            archive: None,
            duplicate_file: true,
        });
    }

    let table = RuleTable::for_account(account);
    let lookup = if table.uses_lookup {
        let lookup = db::load_category_lookup(conn)?;
        if lookup.is_empty() {
            warn!("category table is empty; every purchase will need review");
        }
        debug!(categories = lookup.len(), "loaded category lookup");
        lookup
    } else {
        CategoryLookup::default()
    };

    let normalized = normalize_file(file_path, account)?;
    let dates: Vec<String> = normalized
        .transactions
        .iter()
        .map(|t| t.date.format("%Y-%m-%d").to_string())
        .collect();

    let (mut triage, categorize) = classify_batch(account, &lookup, normalized.transactions);
    triage.truncate_descriptions(opts.description_limit);
    info!(
        account = %account,
        total = triage.len(),
        accepted = triage.accepted.len(),
        needs_review = triage.needs_review.len(),
        malformed = normalized.errors.len(),
        "classified"
    );

    if opts.dry_run {
        return Ok(ImportResult {
            triage,
            errors: normalized.errors,
            categorize,
            stored: 0,
            archive: None,
            duplicate_file: false,
        });
    }

    // The import record, the stored rows and the archive succeed together.
    // Otherwise nothing is recorded and the file can be imported again.
    let tx = conn.unchecked_transaction()?;
    let import_id = db::record_import(&tx, &db::ImportRecord {
        filename: file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string(),
        account,
        accepted_count: triage.accepted.len(),
        review_count: triage.needs_review.len(),
        error_count: normalized.errors.len(),
        date_range_start: dates.iter().min().cloned(),
        date_range_end: dates.iter().max().cloned(),
        checksum,
    })?;
    let stored = db::insert_rows(&tx, &triage.accepted, Some(import_id))?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let archive = archive_triage(&opts.archive_dir, account, &stamp, &triage)?;
    tx.commit()?;
    info!(stored, review_file = %archive.needs_review.display(), "import complete");

    Ok(ImportResult {
        triage,
        errors: normalized.errors,
        categorize,
        stored,
        archive: Some(archive),
        duplicate_file: false,
    })
}
