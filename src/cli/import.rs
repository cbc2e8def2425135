use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::fmt::{clip, money};
use crate::models::AccountType;
use crate::normalizer::RowError;
use crate::pipeline::{import_file, ImportOptions};
use crate::settings::load_settings;
use crate::triage::Flagged;

pub(crate) fn print_review_table(flagged: &[Flagged]) {
    let mut table = Table::new();
    table.set_header(vec!["Line", "Date", "Description", "Amount", "Type", "Category", "Reason"]);
    for f in flagged {
        let t = &f.transaction;
        table.add_row(vec![
            Cell::new(t.line),
            Cell::new(t.date.format("%Y-%m-%d")),
            Cell::new(clip(&t.description, 40)),
            Cell::new(money(t.amount)),
            Cell::new(t.transaction_type.map_or("?".to_string(), |tt| tt.id().to_string())),
            Cell::new(t.category),
            Cell::new(&f.reason),
        ]);
    }
    println!("Needs review\n{table}");
}

pub(crate) fn print_row_errors(errors: &[RowError]) {
    for err in errors {
        eprintln!("{} line {}: {}", "malformed".red(), err.line, err.reason);
    }
}

pub fn run(file: &str, account: &str, dry_run: bool) -> Result<()> {
    let account: AccountType = account.parse()?;
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let opts = ImportOptions {
        archive_dir: settings.archive_path(),
        description_limit: settings.description_limit,
        dry_run,
    };

    let result = import_file(&conn, &PathBuf::from(file), account, &opts)?;
    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!(
        "{} accepted, {} need review, {} malformed",
        result.triage.accepted.len().to_string().green(),
        result.triage.needs_review.len().to_string().yellow(),
        result.errors.len().to_string().red(),
    );
    let hits: Vec<String> = result
        .categorize
        .hits
        .iter()
        .map(|(rule, n)| format!("{rule} {n}"))
        .collect();
    println!(
        "{} classified, {} unclassified ({})",
        result.categorize.categorized,
        result.categorize.unassigned,
        hits.join(", ")
    );
    if dry_run {
        println!("Dry run: nothing stored.");
    } else {
        println!("{} stored in {}", result.stored, account.name());
    }
    if let Some(archive) = &result.archive {
        println!("Accepted: {}", archive.accepted.display());
        println!("Review:   {}", archive.needs_review.display());
    }

    if !result.triage.needs_review.is_empty() {
        print_review_table(&result.triage.needs_review);
        println!(
            "Fill in transaction_type_id and category_id (empty for no category), then run `spend-save resubmit <file> --account {account}`."
        );
    }
    print_row_errors(&result.errors);
    Ok(())
}
