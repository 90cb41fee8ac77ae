//! Storage collaborators for full event records
//!
//! The update service only needs `get` and `put`; the read side also uses
//! `delete`, `search` and `health_check`. Implementations upsert whole
//! records keyed by event id and scan in id order for search.

use async_trait::async_trait;
use std::io;
use thiserror::Error;
use tokio::time::Instant;
use types::event::Event;
use types::ids::EventId;

pub mod journal;
pub mod memory;
pub mod search;

pub use journal::JournalEventStore;
pub use memory::InMemoryEventStore;
pub use search::{SearchFilter, SearchPage, MAX_PAGE_SIZE};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Checksum mismatch at byte offset {offset}: entry seq={sequence}")]
    ChecksumMismatch { offset: u64, sequence: u64 },

    #[error("Corrupted journal at byte offset {offset}: {reason}")]
    Corrupted { offset: u64, reason: String },

    #[error("Entry of {len} bytes exceeds the {limit} byte limit")]
    EntryTooLarge { len: usize, limit: usize },

    #[error("Deadline passed before the write began")]
    DeadlineExceeded,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Persistence layer for full event records.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Previously persisted record, `Ok(None)` when there is none.
    async fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    /// Upsert the full record under its id.
    async fn put(&self, event: &Event) -> Result<(), StoreError>;

    /// Remove the record. Deleting a missing id is not an error.
    async fn delete(&self, id: &EventId) -> Result<(), StoreError>;

    /// `put` that gives up with `DeadlineExceeded` if the write has not
    /// begun by `deadline`. A write that has begun runs to completion and
    /// reports its real outcome.
    ///
    /// The default is correct for stores whose `put` applies the record in
    /// a single poll.
    async fn put_within(&self, event: &Event, deadline: Instant) -> Result<(), StoreError> {
        tokio::time::timeout_at(deadline, self.put(event))
            .await
            .map_err(|_| StoreError::DeadlineExceeded)?
    }

    /// `delete` with the same deadline contract as `put_within`.
    async fn delete_within(&self, id: &EventId, deadline: Instant) -> Result<(), StoreError> {
        tokio::time::timeout_at(deadline, self.delete(id))
            .await
            .map_err(|_| StoreError::DeadlineExceeded)?
    }

    /// One page of matching records in ascending id order.
    ///
    /// `page_token` is the last id of the previous page (exclusive).
    async fn search(
        &self,
        filter: &SearchFilter,
        page_size: u64,
        page_token: Option<&str>,
    ) -> Result<SearchPage, StoreError>;

    async fn health_check(&self) -> bool;
}
