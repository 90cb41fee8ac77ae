//! Durability tests for the journal-backed store

use std::fs::{self, OpenOptions};
use std::sync::Arc;
use std::time::Duration;

use event_core::store::journal::JOURNAL_FILE;
use event_core::store::{EventStore, JournalEventStore, SearchFilter, StoreError};
use event_core::transforms::TransformPipeline;
use event_core::{CoreError, EventService};
use tempfile::TempDir;
use tokio::time::Instant;
use types::event::{BettingStatus, Event, Market, Selection};
use types::ids::EventId;
use types::optional::{set, Optional};

fn sample(id: &str) -> Event {
    Event {
        name: set(format!("Event {id}")),
        betting_status: set(BettingStatus::Open),
        markets: vec![Market {
            selections: vec![Selection {
                price: set(2.75),
                ..Selection::new("s1")
            }],
            ..Market::new("m1")
        }],
        ..Event::new(id)
    }
}

#[tokio::test]
async fn test_reopen_replays_records() {
    let dir = TempDir::new().unwrap();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        store.put(&sample("E1")).await.unwrap();
        store.put(&sample("E2")).await.unwrap();

        let mut renamed = sample("E1");
        renamed.name = Some(Optional::with_deleted("Event E1".to_string(), true));
        store.put(&renamed).await.unwrap();
    }

    let store = JournalEventStore::open(dir.path()).unwrap();
    let e1 = store.get(&EventId::new("E1")).await.unwrap().unwrap();
    assert!(e1.name.as_ref().unwrap().is_deleted());
    assert_eq!(e1.markets[0].selections[0].price, set(2.75));
    assert_eq!(store.get(&EventId::new("E2")).await.unwrap(), Some(sample("E2")));
}

#[tokio::test]
async fn test_delete_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        store.put(&sample("E1")).await.unwrap();
        store.put(&sample("E2")).await.unwrap();
        store.delete(&EventId::new("E1")).await.unwrap();
        // missing id is a no-op
        store.delete(&EventId::new("E9")).await.unwrap();
    }

    let store = JournalEventStore::open(dir.path()).unwrap();
    assert!(store.get(&EventId::new("E1")).await.unwrap().is_none());
    let page = store
        .search(&SearchFilter::default(), 0, None)
        .await
        .unwrap();
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].id.as_str(), "E2");
}

#[tokio::test]
async fn test_torn_tail_is_truncated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(JOURNAL_FILE);
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        store.put(&sample("E1")).await.unwrap();
    }
    let intact_len = fs::metadata(&path).unwrap().len();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        store.put(&sample("E2")).await.unwrap();
    }
    let full_len = fs::metadata(&path).unwrap().len();

    // Crash inside the header, then inside the body, of the second frame
    for cut in [intact_len + 7, intact_len + (full_len - intact_len) / 2] {
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(cut).unwrap();
        drop(file);

        let store = JournalEventStore::open(dir.path()).unwrap();
        assert!(store.get(&EventId::new("E1")).await.unwrap().is_some());
        assert!(store.get(&EventId::new("E2")).await.unwrap().is_none());
        assert_eq!(fs::metadata(&path).unwrap().len(), intact_len);

        // appends continue cleanly after the cut
        store.put(&sample("E2")).await.unwrap();
        drop(store);
        let store = JournalEventStore::open(dir.path()).unwrap();
        assert!(store.get(&EventId::new("E2")).await.unwrap().is_some());
        assert_eq!(fs::metadata(&path).unwrap().len(), full_len);
    }
}

#[tokio::test]
async fn test_corrupt_length_mid_file_is_reported() {
    let dir = TempDir::new().unwrap();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        for id in ["E1", "E2", "E3"] {
            store.put(&sample(id)).await.unwrap();
        }
    }

    let path = dir.path().join(JOURNAL_FILE);
    let mut bytes = fs::read(&path).unwrap();
    let len_before = bytes.len() as u64;
    bytes[..4].copy_from_slice(&u32::MAX.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    let result = JournalEventStore::open(dir.path());
    assert!(matches!(
        result,
        Err(StoreError::ChecksumMismatch {
            offset: 0,
            sequence: 1
        })
    ));
    // nothing truncated; the damage is left for inspection
    assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
}

#[tokio::test]
async fn test_damaged_middle_frame_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(JOURNAL_FILE);
    let mut frame_ends = Vec::new();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        for id in ["E1", "E2", "E3"] {
            store.put(&sample(id)).await.unwrap();
            frame_ends.push(fs::metadata(&path).unwrap().len());
        }
    }

    let mut bytes = fs::read(&path).unwrap();
    let middle = ((frame_ends[0] + frame_ends[1]) / 2) as usize;
    bytes[middle] ^= 0x55;
    fs::write(&path, &bytes).unwrap();

    let result = JournalEventStore::open(dir.path());
    assert!(matches!(
        result,
        Err(StoreError::ChecksumMismatch { sequence: 2, .. })
    ));
    assert_eq!(fs::metadata(&path).unwrap().len(), frame_ends[2]);
}

#[tokio::test]
async fn test_oversized_entry_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(JOURNAL_FILE);
    let store = JournalEventStore::open(dir.path())
        .unwrap()
        .with_max_payload_len(512);

    let mut event = sample("E1");
    event.name = set("x".repeat(2048));
    let err = store.put(&event).await.unwrap_err();
    assert!(matches!(err, StoreError::EntryTooLarge { limit: 512, .. }));

    assert!(store.get(&EventId::new("E1")).await.unwrap().is_none());
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    // smaller records still go through
    store.put(&sample("E2")).await.unwrap();
    assert!(store.get(&EventId::new("E2")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_write_past_deadline_is_not_applied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(JOURNAL_FILE);
    let store = JournalEventStore::open(dir.path()).unwrap();

    let err = store
        .put_within(&sample("E1"), Instant::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DeadlineExceeded));
    assert!(store.get(&EventId::new("E1")).await.unwrap().is_none());
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    // the writer is free again afterwards
    store
        .put_within(&sample("E1"), Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();
    assert!(store.get(&EventId::new("E1")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_timed_out_update_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JournalEventStore::open(dir.path()).unwrap());
    let service = EventService::new(
        store.clone(),
        TransformPipeline::standard(),
        Duration::from_millis(2),
    );

    let partial = Event {
        markets: (0..60_000)
            .map(|i| Market::new(format!("m{i:05}")))
            .collect(),
        ..Event::new("E1")
    };

    let id = EventId::new("E1");
    match service.update(partial).await {
        Ok(_) => {
            let stored = store.get(&id).await.unwrap().unwrap();
            assert_eq!(stored.markets.len(), 60_000);
        }
        Err(CoreError::Timeout { .. }) => {
            assert!(store.get(&id).await.unwrap().is_none());
            drop(service);
            drop(store);
            let reopened = JournalEventStore::open(dir.path()).unwrap();
            assert!(reopened.get(&id).await.unwrap().is_none());
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_checksum_corruption_detected() {
    let dir = TempDir::new().unwrap();
    {
        let store = JournalEventStore::open(dir.path()).unwrap();
        store.put(&sample("E1")).await.unwrap();
        store.put(&sample("E2")).await.unwrap();
    }

    let path = dir.path().join(JOURNAL_FILE);
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let result = JournalEventStore::open(dir.path());
    assert!(matches!(
        result,
        Err(StoreError::ChecksumMismatch { sequence: 2, .. })
    ));
}

#[tokio::test]
async fn test_healthy_when_open() {
    let dir = TempDir::new().unwrap();
    let store = JournalEventStore::open(dir.path()).unwrap();
    assert!(store.health_check().await);
    assert!(store.path().ends_with(JOURNAL_FILE));
}
