//! Update orchestration and read paths
//!
//! ```text
//! validate ─► lock(id) ─► get ─► merge(existing, partial) ─► transforms ─► put
//! ```
//!
//! Updates to one event id are serialized; different ids proceed in
//! parallel. Every store call is bounded by the configured timeout; for
//! writes the bound covers the wait before the write begins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use merger::try_merge_event;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use types::errors::ValidationError;
use types::event::Event;
use types::ids::EventId;
use uuid::Uuid;

use crate::error::CoreError;
use crate::projection::{RaceEventView, SportEventView};
use crate::store::{EventStore, SearchFilter, SearchPage, StoreError};
use crate::transforms::TransformPipeline;
use crate::validation::validate_partial;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub filter: Option<SearchFilter>,
    pub page_size: u64,
    pub page_token: Option<String>,
}

type LockTable = DashMap<EventId, Arc<Mutex<()>>>;

/// Holds the per-event lock; drops the table entry once nobody else
/// is waiting on it.
struct EventLock<'a> {
    table: &'a LockTable,
    id: EventId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EventLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

pub struct EventService {
    store: Arc<dyn EventStore>,
    pipeline: TransformPipeline,
    store_timeout: Duration,
    locks: LockTable,
}

impl EventService {
    pub fn new(
        store: Arc<dyn EventStore>,
        pipeline: TransformPipeline,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            pipeline,
            store_timeout,
            locks: DashMap::new(),
        }
    }

    pub fn transform_names(&self) -> Vec<&'static str> {
        self.pipeline.names()
    }

    /// Merge a partial update into the stored record, derive fields and
    /// persist the result.
    pub async fn update(&self, partial: Event) -> Result<UpdateResponse, CoreError> {
        validate_partial(&partial).map_err(|err| {
            debug!(event_id = %partial.id, error = %err, "Rejected partial update");
            err
        })?;

        let span = info_span!("update", update_id = %Uuid::now_v7(), event_id = %partial.id);
        self.apply_update(partial).instrument(span).await
    }

    async fn apply_update(&self, partial: Event) -> Result<UpdateResponse, CoreError> {
        let _lock = self.lock_event(&partial.id).await;

        let existing = self
            .bounded("get", self.store.get(&partial.id))
            .await?
            .map_err(|err| {
                error!(error = %err, "Failed to retrieve event");
                CoreError::Retrieval(err)
            })?;

        let (merged, message) = match existing {
            None => (
                partial.clone(),
                format!("New Event born {}", partial.id),
            ),
            Some(existing) => (try_merge_event(&existing, &partial)?, "Success".to_string()),
        };

        let derived = self.pipeline.run(&partial, merged);

        self.store
            .put_within(&derived, self.deadline())
            .await
            .map_err(|err| self.write_failure("put", err))?;

        info!(markets = derived.markets.len(), "{message}");
        Ok(UpdateResponse { message })
    }

    pub async fn get_event(&self, id: &EventId) -> Result<Option<Event>, CoreError> {
        if id.is_empty() {
            return Err(ValidationError::EmptyEventId.into());
        }
        self.bounded("get", self.store.get(id))
            .await?
            .map_err(|err| {
                error!(event_id = %id, error = %err, "Failed to retrieve event");
                CoreError::Retrieval(err)
            })
    }

    pub async fn get_sport_event(&self, id: &EventId) -> Result<Option<SportEventView>, CoreError> {
        Ok(self.get_event(id).await?.as_ref().map(SportEventView::from))
    }

    pub async fn get_race_event(&self, id: &EventId) -> Result<Option<RaceEventView>, CoreError> {
        Ok(self.get_event(id).await?.as_ref().map(RaceEventView::from))
    }

    pub async fn search_events(&self, request: &SearchRequest) -> Result<SearchPage, CoreError> {
        let filter = request.filter.as_ref().ok_or(ValidationError::NoFilter)?;
        filter.validate()?;

        self.bounded(
            "search",
            self.store
                .search(filter, request.page_size, request.page_token.as_deref()),
        )
        .await?
        .map_err(|err| {
            error!(error = %err, "Failed to search events");
            CoreError::Retrieval(err)
        })
    }

    pub async fn delete_event(&self, id: &EventId) -> Result<(), CoreError> {
        if id.is_empty() {
            return Err(ValidationError::EmptyEventId.into());
        }
        let _lock = self.lock_event(id).await;
        self.store
            .delete_within(id, self.deadline())
            .await
            .map_err(|err| self.write_failure("delete", err))?;
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn health(&self) -> bool {
        tokio::time::timeout(self.store_timeout, self.store.health_check())
            .await
            .unwrap_or(false)
    }

    async fn lock_event(&self, id: &EventId) -> EventLock<'_> {
        let mutex = Arc::clone(&self.locks.entry(id.clone()).or_default());
        let guard = mutex.lock_owned().await;
        EventLock {
            table: &self.locks,
            id: id.clone(),
            guard: Some(guard),
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.store_timeout
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Writes are bounded up to the point they begin, so a timeout here
    /// always means nothing was written.
    fn write_failure(&self, operation: &'static str, err: StoreError) -> CoreError {
        match err {
            StoreError::DeadlineExceeded => {
                let timeout_ms = self.timeout_ms();
                error!(operation, timeout_ms, "Store write did not start in time");
                CoreError::Timeout {
                    operation,
                    timeout_ms,
                }
            }
            err => {
                error!(operation, error = %err, "Failed to persist event");
                CoreError::Persistence(err)
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<Result<T, StoreError>, CoreError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| {
                let timeout_ms = self.timeout_ms();
                error!(operation, timeout_ms, "Store call timed out");
                CoreError::Timeout {
                    operation,
                    timeout_ms,
                }
            })
    }

    #[cfg(test)]
    fn held_locks(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEventStore;
    use types::optional::set;

    fn service() -> EventService {
        EventService::new(
            Arc::new(InMemoryEventStore::new()),
            TransformPipeline::standard(),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_new_then_merge_messages() {
        let service = service();
        let first = service
            .update(Event {
                name: set("Test"),
                ..Event::new("E1")
            })
            .await
            .unwrap();
        assert_eq!(first.message, "New Event born E1");

        let second = service.update(Event::new("E1")).await.unwrap();
        assert_eq!(second.message, "Success");
    }

    #[tokio::test]
    async fn test_lock_table_entries_released() {
        let service = service();
        service.update(Event::new("E1")).await.unwrap();
        service.delete_event(&EventId::new("E1")).await.unwrap();
        assert_eq!(service.held_locks(), 0);
    }

    #[tokio::test]
    async fn test_search_requires_filter() {
        let err = service()
            .search_events(&SearchRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::NoFilter)));
    }

    #[tokio::test]
    async fn test_empty_id_rejected_on_reads() {
        let err = service().get_event(&EventId::new("")).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
