//! Coinlog is the import core of a personal spending tracker.
//!
//! It streams user-supplied delimited transaction files into a SQLite
//! database, resolving each row's category name against an owner-scoped
//! cache of known categories and committing rows in bounded batches so that
//! memory use stays flat however large the file is.
//!
//! The entry point is [import::import_transactions]; the supporting pieces
//! are the row decoder ([decode]), the category cache ([cache]), the batch
//! unit-of-work ([batch]) and the storage functions ([category],
//! [transaction], [user]).

#![warn(missing_docs)]

pub mod batch;
pub mod cache;
pub mod category;
mod database_id;
pub mod db;
pub mod decode;
pub mod import;
pub mod transaction;
pub mod user;

pub use database_id::DatabaseID;
pub use db::initialize as initialize_db;
pub use import::{ImportSummary, import_transactions};
pub use user::{User, UserID};

/// The errors that may occur in the application.
///
/// Row-level decode failures are deliberately not represented here: they are
/// recoverable, live in [decode::RowDecodeError] and never abort an import
/// run.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The source stream for an import failed mid-read.
    ///
    /// This aborts the run; batches committed before the failure remain
    /// durable.
    #[error("could not read the source stream: {0}")]
    SourceRead(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
