use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::list_imports;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let conn = open_db(&load_settings())?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "File", "Account", "Imported", "Accepted", "Review", "Malformed"]);
    for row in list_imports(&conn)? {
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.filename),
            Cell::new(row.account_id),
            Cell::new(row.import_date),
            Cell::new(row.accepted_count),
            Cell::new(row.review_count),
            Cell::new(row.error_count),
        ]);
    }
    println!("Imports\n{table}");
    Ok(())
}
