//! Decoding of one raw delimited-text record into a typed transaction
//! candidate.
//!
//! Decoding is pure: it never touches the cache or the database. A failed row
//! is reported to the caller, who decides whether to skip or abort.

use csv::StringRecord;
use rust_decimal::Decimal;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{database_id::DatabaseID, transaction::NewTransaction, user::UserID};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The number of fields expected in a transaction record: date, description,
/// category name, amount.
pub const FIELDS_PER_ROW: usize = 4;

/// The errors that can make a single row undecodable.
///
/// These are recoverable: the import run skips the row, counts the failure and
/// continues.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RowDecodeError {
    /// The record did not have exactly [FIELDS_PER_ROW] fields.
    #[error("expected {FIELDS_PER_ROW} fields but got {0}")]
    WrongFieldCount(usize),

    /// The date field could not be parsed as a `year-month-day` date.
    #[error("could not parse '{0}' as a date")]
    InvalidDate(String),

    /// The amount field was not numeric after stripping currency formatting.
    #[error("could not parse '{0}' as an amount")]
    InvalidAmount(String),
}

/// A decoded, validated transaction row that has not been resolved or
/// persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCandidate {
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The raw category name from the source file, `None` when the field was
    /// empty.
    pub category_name: Option<String>,
    /// The amount of money spent or earned in this transaction.
    pub amount: Decimal,
}

impl TransactionCandidate {
    /// Pair the candidate with its resolved category and owner, ready for
    /// staging.
    pub fn into_new_transaction(
        self,
        category_id: Option<DatabaseID>,
        user_id: UserID,
    ) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            date: self.date,
            description: self.description,
            category_id,
            user_id,
        }
    }
}

/// Decode one raw record with fields in the order date, description, category
/// name, amount.
///
/// The amount field may carry a currency symbol (`$`) and thousands
/// separators (`,`); both are stripped before parsing. An empty category
/// field yields `category_name = None` rather than an error.
///
/// # Errors
/// Returns a [RowDecodeError] describing the first field that failed to
/// decode.
pub fn decode_row(record: &StringRecord) -> Result<TransactionCandidate, RowDecodeError> {
    if record.len() != FIELDS_PER_ROW {
        return Err(RowDecodeError::WrongFieldCount(record.len()));
    }

    let raw_date = record[0].trim();
    let date = Date::parse(raw_date, &DATE_FORMAT)
        .map_err(|_| RowDecodeError::InvalidDate(raw_date.to_owned()))?;

    let description = record[1].to_owned();

    let raw_category = record[2].trim();
    let category_name = if raw_category.is_empty() {
        None
    } else {
        Some(raw_category.to_owned())
    };

    let raw_amount = &record[3];
    let stripped_amount = raw_amount.replace(['$', ','], "");
    let amount = stripped_amount
        .trim()
        .parse::<Decimal>()
        .map_err(|_| RowDecodeError::InvalidAmount(raw_amount.to_owned()))?;

    Ok(TransactionCandidate {
        date,
        description,
        category_name,
        amount,
    })
}
