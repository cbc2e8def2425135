use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Archive:    {}", settings.archive_path().display());

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let transactions: i64 = conn.query_row("SELECT count(*) FROM transaction_facts", [], |r| r.get(0))?;
        let uncategorized: i64 = conn.query_row(
            "SELECT count(*) FROM transaction_facts WHERE category_id IS NULL",
            [],
            |r| r.get(0),
        )?;
        let categories: i64 = conn.query_row("SELECT count(*) FROM category", [], |r| r.get(0))?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;

        println!();
        println!("Transactions:  {transactions}");
        println!("No category:   {uncategorized}");
        println!("Categories:    {categories}");
        println!("Imports:       {imports}");
    } else {
        println!();
        println!("Database not found. Run `spend-save init` to set up.");
    }

    Ok(())
}
