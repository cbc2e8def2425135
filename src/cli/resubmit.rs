use std::path::PathBuf;

use crate::cli::import::print_row_errors;
use crate::cli::open_db;
use crate::error::Result;
use crate::models::AccountType;
use crate::reviewer::resubmit_file;
use crate::settings::load_settings;

pub fn run(file: &str, account: &str) -> Result<()> {
    let account: AccountType = account.parse()?;
    let settings = load_settings();
    let conn = open_db(&settings)?;

    let result = resubmit_file(&conn, &PathBuf::from(file), account, settings.description_limit)?;
    println!("{} stored, {} rejected", result.stored, result.errors.len());
    print_row_errors(&result.errors);
    Ok(())
}
