//! Transaction storage for the import pipeline.
//!
//! This module contains the `Transaction` model, the staged `NewTransaction`
//! form, and the database functions for storing and querying transactions.
//! Amounts are exact decimals and are stored as TEXT so no precision is lost
//! crossing the database boundary.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::DatabaseID, user::UserID};

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// The amount of money spent or earned in this transaction.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The category the transaction was filed under, if any.
    pub category_id: Option<DatabaseID>,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
}

/// A transaction that has been decoded and resolved but not yet persisted.
///
/// Staged rows accumulate in a [TransactionBatch] until the batch commits
/// them, at which point each becomes a [Transaction] with a database-assigned
/// ID.
///
/// [TransactionBatch]: crate::batch::TransactionBatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The amount of money spent or earned in this transaction.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The category the transaction was filed under, if any.
    pub category_id: Option<DatabaseID>,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
}

/// Create a single transaction in the database.
///
/// Bulk inserts during an import go through [TransactionBatch::flush] instead.
///
/// [TransactionBatch::flush]: crate::batch::TransactionBatch::flush
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, date, description, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, date, description, category_id, user_id",
        )?
        .query_row(
            (
                new_transaction.amount.to_string(),
                new_transaction.date,
                new_transaction.description,
                new_transaction.category_id,
                new_transaction.user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: DatabaseID, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, category_id, user_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve all transactions owned by the user with `user_id`, in insertion
/// order.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, category_id, user_id
             FROM \"transaction\" WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Count the transactions owned by the user with `user_id`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn count_transactions_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<usize, Error> {
    let count: i64 = connection
        .prepare("SELECT COUNT(*) FROM \"transaction\" WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?;

    Ok(count as usize)
}

pub(crate) fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id INTEGER REFERENCES category(id),
                user_id INTEGER NOT NULL REFERENCES user(id)
            );",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_amount: String = row.get(1)?;
    let amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(error)))?;
    let date = row.get(2)?;
    let description = row.get(3)?;
    let category_id = row.get(4)?;
    let user_id = UserID::new(row.get(5)?);

    Ok(Transaction {
        id,
        amount,
        date,
        description,
        category_id,
        user_id,
    })
}
