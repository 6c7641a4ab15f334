//! The end-to-end import pipeline: stream a delimited transaction file,
//! decode each row, resolve its category and commit the rows in bounded
//! batches.
//!
//! This module is the only place that triggers persistence flushes and the
//! only place that logs import diagnostics. The first record of every source
//! is discarded as a header, unconditionally: a file without a header line
//! silently loses its first data row.

use std::io::Read;

use csv::ReaderBuilder;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, batch::TransactionBatch, cache::CategoryCache, decode::decode_row, user::UserID,
};

/// The outcome of an import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// The number of rows decoded, resolved and committed.
    pub rows_imported: usize,
    /// The number of rows skipped because they could not be decoded.
    pub rows_failed: usize,
    /// The number of batch commits performed.
    pub batches_committed: usize,
}

/// Import transactions for `user_id` from a stream of comma-separated rows
/// with fields in the order date, description, category name, amount.
///
/// The category index is primed once at the start of the run and not
/// re-validated per row. Rows that fail to decode are counted in the summary
/// and skipped; they never abort the run. Rows whose category name is unknown
/// are imported uncategorized. Staged rows are committed every `batch_size`
/// rows and once more at end-of-stream.
///
/// # Errors
/// This function will return a:
/// - [Error::SourceRead] if the source stream fails mid-read,
/// - or [Error::SqlError] if priming the index or committing a batch fails.
///
/// Batches committed before a fatal error remain durable; there is no
/// rollback and no retry at this layer.
pub fn import_transactions<R: Read>(
    reader: R,
    user_id: UserID,
    connection: &Connection,
    cache: &CategoryCache,
    batch_size: usize,
) -> Result<ImportSummary, Error> {
    // flexible() lets short or long rows through so they fail per-row in the
    // decoder instead of poisoning the whole stream.
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let index = cache.get_index(user_id, connection)?;
    let mut batch = TransactionBatch::with_limit(batch_size);
    let mut summary = ImportSummary::default();

    tracing::debug!(
        "starting import for user {user_id}: {} categories in index, {} rows pending",
        index.len(),
        batch.pending_len()
    );

    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) if error.is_io_error() => {
                tracing::error!(
                    "aborting import for user {user_id}: source stream failed after \
                     {} rows committed: {error}",
                    summary.rows_imported - batch.pending_len()
                );
                return Err(Error::SourceRead(error.to_string()));
            }
            Err(error) => {
                summary.rows_failed += 1;
                tracing::debug!("skipping unreadable record: {error}");
                continue;
            }
        };

        let candidate = match decode_row(&record) {
            Ok(candidate) => candidate,
            Err(error) => {
                summary.rows_failed += 1;
                tracing::debug!(
                    "skipping row at line {:?}: {error}",
                    record.position().map(|position| position.line())
                );
                continue;
            }
        };

        let category_id = index
            .resolve(candidate.category_name.as_deref())
            .map(|category| category.id);
        batch.stage(candidate.into_new_transaction(category_id, user_id));
        summary.rows_imported += 1;

        if batch.should_flush() {
            flush_or_abort(&mut batch, connection, user_id, &summary)?;
        }
    }

    let staged = batch.pending_len();
    if let Err(error) = batch.drain_final(connection) {
        log_fatal_flush(user_id, summary.rows_imported - staged, &batch, &error);
        return Err(error);
    }
    summary.batches_committed = batch.flushes();

    tracing::debug!(
        "finished import for user {user_id}: {} imported, {} failed, {} batches, \
         {} rows pending",
        summary.rows_imported,
        summary.rows_failed,
        summary.batches_committed,
        batch.pending_len()
    );

    Ok(summary)
}

fn flush_or_abort(
    batch: &mut TransactionBatch,
    connection: &Connection,
    user_id: UserID,
    summary: &ImportSummary,
) -> Result<(), Error> {
    // The batch discards its staged rows whether or not the flush succeeds,
    // so the committed-row count must be taken before flushing.
    let staged = batch.pending_len();

    match batch.flush(connection) {
        Ok(flushed) => {
            tracing::debug!("committed a batch of {flushed} rows for user {user_id}");
            Ok(())
        }
        Err(error) => {
            log_fatal_flush(user_id, summary.rows_imported - staged, batch, &error);
            Err(error)
        }
    }
}

fn log_fatal_flush(user_id: UserID, committed: usize, batch: &TransactionBatch, error: &Error) {
    tracing::error!(
        "aborting import for user {user_id}: batch commit failed after {committed} rows \
         committed in {} batches: {error}",
        batch.flushes()
    );
}
