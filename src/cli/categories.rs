use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db;
use crate::error::Result;
use crate::settings::load_settings;

pub fn add(description: &str) -> Result<()> {
    let conn = open_db(&load_settings())?;
    let id = db::add_category(&conn, description)?;
    println!("Added category {id}: {}", description.trim().to_lowercase());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db(&load_settings())?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Description"]);
    for (id, description) in db::list_categories(&conn)? {
        table.add_row(vec![Cell::new(id), Cell::new(description)]);
    }
    println!("Categories\n{table}");
    Ok(())
}
