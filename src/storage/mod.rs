//! Storage abstractions for card persistence.
//!
//! Rows are written with an insert-then-update protocol:
//!
//! ```text
//! INSERT ──ok──────────────────────> Inserted
//!    │
//!    ├─unique violation─> UPDATE ──ok──> Updated
//!    │                       └──err───> Failed (logged)
//!    └─other error─────────────────────> Failed (logged)
//! ```
//!
//! Each statement runs in its own transaction, so a failed write leaves the
//! row as it was. Write failures never abort the batch.

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::Result;
use crate::models::{CardId, CardRecord};

// Re-export for convenience
pub use postgres::PgCardStore;

/// A failed single-statement write.
#[derive(Debug, Error)]
pub enum WriteError {
    /// A row with this id already exists.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other store failure.
    #[error("{0}")]
    Store(String),
}

/// Destination table for card rows.
///
/// Implementations translate store-specific errors into [`WriteError`] and
/// roll back the failed statement before returning.
#[async_trait]
pub trait CardTable: Send {
    async fn insert(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError>;

    async fn update(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError>;
}

/// Ordered source of card ids to process.
#[async_trait]
pub trait Worklist: Send {
    async fn card_ids(&mut self) -> Result<Vec<CardId>>;
}

/// How an upsert ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Failed,
}

/// Writes records with upsert semantics keyed on card id.
pub struct CardWriter<T> {
    table: T,
}

impl<T: CardTable> CardWriter<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn into_inner(self) -> T {
        self.table
    }

    /// Insert the record, or update the existing row with the same id.
    pub async fn upsert(&mut self, record: &CardRecord) -> UpsertOutcome {
        let id = record.id;

        match self.table.insert(record).await {
            Ok(()) => UpsertOutcome::Inserted,
            Err(WriteError::UniqueViolation(_)) => match self.table.update(record).await {
                Ok(()) => UpsertOutcome::Updated,
                Err(e) => {
                    log::error!("Update failed for card {id}: {e}");
                    UpsertOutcome::Failed
                }
            },
            Err(e) => {
                log::error!("Insert failed for card {id}: {e}");
                UpsertOutcome::Failed
            }
        }
    }
}
