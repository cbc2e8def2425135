pub mod categories;
pub mod history;
pub mod import;
pub mod init;
pub mod resubmit;
pub mod rules;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{Result, SpendSaveError};
use crate::settings::Settings;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(SpendSaveError::Settings(format!(
            "No database found at {}\nRun `spend-save init` first.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

#[derive(Parser)]
#[command(
    name = "spend-save",
    about = "Classify bank and credit card exports and load them into the spend_save database."
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/spend-save)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Classify a CSV export, store accepted rows and archive both sets.
    Import {
        /// Path to the CSV export
        file: String,
        /// Account the export came from: savings, checking or credit-card
        #[arg(long)]
        account: String,
        /// Classify and print without storing or archiving
        #[arg(long)]
        dry_run: bool,
    },
    /// Store a hand-corrected review CSV.
    Resubmit {
        /// Path to the corrected review CSV
        file: String,
        /// Account the rows belong to
        #[arg(long)]
        account: String,
    },
    /// Manage the category table used for credit card lookups.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show the classification rules for an account.
    Rules {
        /// savings, checking or credit-card
        account: String,
    },
    /// List previous imports.
    History,
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category description.
    Add {
        /// Description as it appears in card exports (e.g. "food & drink")
        description: String,
    },
    /// List categories.
    List,
}
