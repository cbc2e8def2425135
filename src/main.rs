mod archive;
mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod lookup;
mod models;
mod normalizer;
mod pipeline;
mod reviewer;
mod rules;
mod settings;
mod triage;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, prelude::*, EnvFilter};

use cli::{CategoriesCommands, Cli, Commands};

fn init_logging(verbose: bool) {
    // RUST_LOG > --verbose > info
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            account,
            dry_run,
        } => cli::import::run(&file, &account, dry_run),
        Commands::Resubmit { file, account } => cli::resubmit::run(&file, &account),
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { description } => cli::categories::add(&description),
            CategoriesCommands::List => cli::categories::list(),
        },
        Commands::Rules { account } => cli::rules::list(&account),
        Commands::History => cli::history::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
