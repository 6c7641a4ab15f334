//! A bounded batch of staged transactions with an explicit flush/reset cycle.
//!
//! Long imports must not accumulate every row in memory. The batch holds at
//! most `limit` staged transactions; a flush commits them durably as a single
//! SQL transaction, then releases the working memory and resets the counter.
//! Already-committed batches are never touched again, so a failed flush loses
//! at most the rows staged since the previous commit.

use rusqlite::Connection;

use crate::{Error, transaction::NewTransaction};

/// The number of rows committed per batch unless the caller configures
/// otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Accumulates resolved transactions and commits them in bounded batches.
#[derive(Debug)]
pub struct TransactionBatch {
    pending: Vec<NewTransaction>,
    limit: usize,
    flushes: usize,
}

impl Default for TransactionBatch {
    fn default() -> Self {
        Self::with_limit(DEFAULT_BATCH_SIZE)
    }
}

impl TransactionBatch {
    /// Create a batch that wants to flush after `limit` staged transactions.
    ///
    /// A `limit` of zero is treated as one so that staging always makes
    /// progress.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit: limit.max(1),
            flushes: 0,
        }
    }

    /// Append a transaction to the pending batch.
    pub fn stage(&mut self, transaction: NewTransaction) {
        self.pending.push(transaction);
    }

    /// Whether the pending batch has reached the configured limit and should
    /// be flushed before staging more rows.
    pub fn should_flush(&self) -> bool {
        self.pending.len() >= self.limit
    }

    /// The number of staged transactions waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The number of commits this batch has performed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Commit all pending transactions durably as a single unit, then clear
    /// the pending batch, release its working memory and reset the counter.
    ///
    /// Calling this with nothing staged is a no-op that returns 0 and does not
    /// count as a commit.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the insert or commit fails. The staged
    /// rows are discarded either way; batches committed by earlier calls are
    /// unaffected.
    pub fn flush(&mut self, connection: &Connection) -> Result<usize, Error> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        // Taking the vector releases its capacity once the insert is done and
        // leaves the batch empty even when the flush fails.
        let staged = std::mem::take(&mut self.pending);

        let tx = connection.unchecked_transaction()?;
        let mut statement = tx.prepare(
            "INSERT INTO \"transaction\" (amount, date, description, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for transaction in &staged {
            statement.execute((
                transaction.amount.to_string(),
                transaction.date,
                &transaction.description,
                transaction.category_id,
                transaction.user_id.as_i64(),
            ))?;
        }

        drop(statement);
        tx.commit()?;

        self.flushes += 1;

        Ok(staged.len())
    }

    /// Flush whatever remains staged at end-of-stream, regardless of the
    /// counter state.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the flush fails.
    pub fn drain_final(&mut self, connection: &Connection) -> Result<usize, Error> {
        self.flush(connection)
    }
}
