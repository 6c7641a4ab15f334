//! Functions for initializing the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{category, transaction, user};

/// Create the application's database tables if they do not exist.
///
/// # Errors
/// Returns an error if a table could not be created or if the schema
/// transaction could not be committed.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let schema_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    user::create_user_table(&schema_transaction)?;
    category::create_category_table(&schema_transaction)?;
    transaction::create_transaction_table(&schema_transaction)?;

    schema_transaction.commit()?;

    Ok(())
}
