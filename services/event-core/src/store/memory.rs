//! In-memory event store
//!
//! Records live in an id-ordered map so search pages come out in
//! canonical order without sorting.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use types::event::Event;
use types::ids::EventId;

use super::search::{scan_page, SearchFilter, SearchPage};
use super::{EventStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: RwLock<BTreeMap<EventId, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let record = self.records.read().await.get(id).cloned();
        if record.is_none() {
            debug!(event_id = %id, "Event not found");
        }
        Ok(record)
    }

    async fn put(&self, event: &Event) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        page_size: u64,
        page_token: Option<&str>,
    ) -> Result<SearchPage, StoreError> {
        let records = self.records.read().await;
        Ok(scan_page(&records, filter, page_size, page_token))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
