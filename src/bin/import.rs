//! A command line tool that imports a transaction CSV file for one user.

use std::fs::File;

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use coinlog::{UserID, batch::DEFAULT_BATCH_SIZE, cache::CategoryCache, import_transactions, initialize_db};

/// Import a CSV of transactions (date, description, category, amount) into
/// the coinlog database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// File path to the CSV file to import.
    #[arg(long)]
    file: String,

    /// The ID of the user to import the transactions for.
    #[arg(long)]
    user_id: i64,

    /// The maximum number of rows committed per batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

fn main() {
    setup_logging();

    let args = Args::parse();

    let connection = Connection::open(&args.db_path).expect("Could not open the database");
    initialize_db(&connection).expect("Could not initialize the database");

    let file = File::open(&args.file).expect("Could not open the CSV file");
    let cache = CategoryCache::in_memory();

    match import_transactions(
        file,
        UserID::new(args.user_id),
        &connection,
        &cache,
        args.batch_size,
    ) {
        Ok(summary) => {
            tracing::info!(
                "imported {} rows for user {} ({} failed) in {} batches",
                summary.rows_imported,
                args.user_id,
                summary.rows_failed,
                summary.batches_committed
            );
        }
        Err(error) => {
            tracing::error!("import failed: {error}");
            std::process::exit(1);
        }
    }
}

fn setup_logging() {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty().with_filter(env_filter))
        .init();
}
