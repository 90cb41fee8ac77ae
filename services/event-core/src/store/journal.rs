//! Journal-backed event store: an append-only file of upserts and deletes
//!
//! Every write appends one frame to `events.journal` and is fsynced before
//! it is acknowledged. Opening the store replays the file into an
//! id-ordered map.
//!
//! # Frame layout
//! ```text
//! [body_len: u32][sequence: u64][header_crc: u32]   header, CRC32C of len+seq
//! [op: u8][payload: body_len - 5 bytes][body_crc: u32]   CRC32C of seq+op+payload
//! ```
//!
//! `op` 1 is an upsert whose payload is the bincode-encoded event; `op` 2 is
//! a delete whose payload is the UTF-8 event id. Sequences start at 1 and
//! increase by one per frame.
//!
//! Replay distinguishes a crash from damage. A frame whose header or body
//! is cut off by the end of the file is the write that was in flight and
//! gets truncated away. A checksum mismatch, an implausible length or a
//! sequence gap anywhere is reported and nothing is truncated.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use crc32c::{crc32c, crc32c_append};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use types::event::Event;
use types::ids::EventId;

use super::search::{scan_page, SearchFilter, SearchPage};
use super::{EventStore, StoreError};

pub const JOURNAL_FILE: &str = "events.journal";

const HEADER_LEN: usize = 16;
/// op byte + body checksum
const BODY_OVERHEAD: usize = 5;
/// Largest body replay will accept.
const MAX_BODY_LEN: usize = 64 * 1024 * 1024;
/// Largest payload a write will accept.
pub const MAX_PAYLOAD_LEN: usize = MAX_BODY_LEN - BODY_OVERHEAD;

const OP_UPSERT: u8 = 1;
const OP_DELETE: u8 = 2;

// ── Operations ──────────────────────────────────────────────────────

/// One durable change to the event map.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalOp {
    Upsert(Event),
    Delete(EventId),
}

impl JournalOp {
    fn code(&self) -> u8 {
        match self {
            JournalOp::Upsert(_) => OP_UPSERT,
            JournalOp::Delete(_) => OP_DELETE,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, StoreError> {
        match self {
            JournalOp::Upsert(event) => Ok(bincode::serialize(event)?),
            JournalOp::Delete(id) => Ok(id.as_str().as_bytes().to_vec()),
        }
    }

    fn decode(code: u8, payload: &[u8]) -> Result<Self, String> {
        match code {
            OP_UPSERT => bincode::deserialize(payload)
                .map(JournalOp::Upsert)
                .map_err(|e| format!("undecodable upsert: {e}")),
            OP_DELETE => std::str::from_utf8(payload)
                .map(|id| JournalOp::Delete(EventId::new(id)))
                .map_err(|e| format!("undecodable delete: {e}")),
            other => Err(format!("unknown op {other}")),
        }
    }

    fn apply(self, records: &mut BTreeMap<EventId, Event>) {
        match self {
            JournalOp::Upsert(event) => {
                records.insert(event.id.clone(), event);
            }
            JournalOp::Delete(id) => {
                records.remove(&id);
            }
        }
    }
}

// ── Frames ──────────────────────────────────────────────────────────

/// An operation as it sits on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sequence: u64,
    pub op: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    fn header_crc(body_len: u32, sequence: u64) -> u32 {
        crc32c_append(crc32c(&body_len.to_le_bytes()), &sequence.to_le_bytes())
    }

    fn body_crc(sequence: u64, op: u8, payload: &[u8]) -> u32 {
        let crc = crc32c_append(crc32c(&sequence.to_le_bytes()), &[op]);
        crc32c_append(crc, payload)
    }

    /// Callers keep `payload` within `MAX_PAYLOAD_LEN`.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = (self.payload.len() + BODY_OVERHEAD) as u32;
        let mut buf = Vec::with_capacity(HEADER_LEN + body_len as usize);
        buf.extend_from_slice(&body_len.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&Self::header_crc(body_len, self.sequence).to_le_bytes());
        buf.push(self.op);
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&Self::body_crc(self.sequence, self.op, &self.payload).to_le_bytes());
        buf
    }

    /// Read the frame at the front of `data`, which starts at `offset` in
    /// the file.
    ///
    /// `Ok(None)` means the frame runs past the end of `data`: a torn tail.
    pub fn decode(data: &[u8], offset: u64) -> Result<Option<(Self, usize)>, StoreError> {
        if data.len() < HEADER_LEN {
            return Ok(None);
        }

        let body_len = read_u32(data, 0)?;
        let sequence = read_u64(data, 4)?;
        if read_u32(data, 12)? != Self::header_crc(body_len, sequence) {
            return Err(StoreError::ChecksumMismatch { offset, sequence });
        }

        let body_len = body_len as usize;
        if !(BODY_OVERHEAD..=MAX_BODY_LEN).contains(&body_len) {
            return Err(StoreError::Corrupted {
                offset,
                reason: format!("implausible body length {body_len}"),
            });
        }

        let total = HEADER_LEN + body_len;
        let Some(body) = data.get(HEADER_LEN..total) else {
            return Ok(None);
        };

        let op = body[0];
        let payload = &body[1..body_len - 4];
        if read_u32(body, body_len - 4)? != Self::body_crc(sequence, op, payload) {
            return Err(StoreError::ChecksumMismatch { offset, sequence });
        }

        Ok(Some((
            Self {
                sequence,
                op,
                payload: payload.to_vec(),
            },
            total,
        )))
    }
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, StoreError> {
    data.get(pos..pos + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| StoreError::Serialization(format!("no u32 at {pos}")))
}

fn read_u64(data: &[u8], pos: usize) -> Result<u64, StoreError> {
    data.get(pos..pos + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| StoreError::Serialization(format!("no u64 at {pos}")))
}

// ── Writer ──────────────────────────────────────────────────────────

struct JournalWriter {
    file: File,
    /// Length of the file up to the last complete frame.
    len: u64,
    next_sequence: u64,
}

impl JournalWriter {
    fn append(&mut self, op: u8, payload: Vec<u8>) -> Result<u64, StoreError> {
        let frame = Frame {
            sequence: self.next_sequence,
            op,
            payload,
        };
        let bytes = frame.encode();

        if let Err(err) = self.write_durably(&bytes) {
            // Cut off whatever part of the frame made it to disk
            if let Err(truncate_err) = self.file.set_len(self.len) {
                warn!(error = %truncate_err, "Failed to roll back partial journal frame");
            }
            return Err(err);
        }

        self.len += bytes.len() as u64;
        self.next_sequence += 1;
        Ok(frame.sequence)
    }

    fn write_durably(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        Ok(())
    }
}

// ── Replay ──────────────────────────────────────────────────────────

struct Replay {
    records: BTreeMap<EventId, Event>,
    next_sequence: u64,
    /// Bytes covered by complete frames.
    valid_len: u64,
    frames: u64,
}

fn replay(path: &Path) -> Result<Replay, StoreError> {
    let mut data = Vec::new();
    if path.exists() {
        File::open(path)?.read_to_end(&mut data)?;
    }

    let mut records = BTreeMap::new();
    let mut next_sequence = 1;
    let mut pos = 0usize;

    while pos < data.len() {
        let offset = pos as u64;
        let Some((frame, consumed)) = Frame::decode(&data[pos..], offset)? else {
            warn!(
                offset,
                remaining = data.len() - pos,
                "Discarding torn journal tail"
            );
            break;
        };

        if frame.sequence != next_sequence {
            return Err(StoreError::Corrupted {
                offset,
                reason: format!(
                    "expected sequence {next_sequence}, found {}",
                    frame.sequence
                ),
            });
        }
        JournalOp::decode(frame.op, &frame.payload)
            .map_err(|reason| StoreError::Corrupted { offset, reason })?
            .apply(&mut records);

        next_sequence += 1;
        pos += consumed;
    }

    Ok(Replay {
        records,
        next_sequence,
        valid_len: pos as u64,
        frames: next_sequence - 1,
    })
}

// ── Write gate ──────────────────────────────────────────────────────

const QUEUED: u8 = 0;
const WRITING: u8 = 1;
const ABANDONED: u8 = 2;

/// Handshake between a caller and its queued blocking write. Whichever
/// side moves first wins: the write starts, or the caller walks away and
/// the write is skipped. A write that has started always finishes.
struct WriteGate(Arc<AtomicU8>);

impl WriteGate {
    fn new() -> (Self, Arc<AtomicU8>) {
        let state = Arc::new(AtomicU8::new(QUEUED));
        (Self(Arc::clone(&state)), state)
    }

    fn begin(state: &AtomicU8) -> bool {
        state
            .compare_exchange(QUEUED, WRITING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `false` once the write has started.
    fn abandon(&self) -> bool {
        self.0
            .compare_exchange(QUEUED, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Drop for WriteGate {
    fn drop(&mut self) {
        self.abandon();
    }
}

// ── Store ───────────────────────────────────────────────────────────

pub struct JournalEventStore {
    path: PathBuf,
    writer: Arc<Mutex<JournalWriter>>,
    records: Arc<RwLock<BTreeMap<EventId, Event>>>,
    max_payload_len: usize,
}

impl JournalEventStore {
    /// Open (or create) the journal in `dir` and replay it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE);

        let replayed = replay(&path)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let on_disk = file.metadata()?.len();
        if on_disk > replayed.valid_len {
            file.set_len(replayed.valid_len)?;
        }

        info!(
            path = %path.display(),
            frames = replayed.frames,
            records = replayed.records.len(),
            "Journal replayed"
        );

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(JournalWriter {
                file,
                len: replayed.valid_len,
                next_sequence: replayed.next_sequence,
            })),
            records: Arc::new(RwLock::new(replayed.records)),
            max_payload_len: MAX_PAYLOAD_LEN,
        })
    }

    /// Lower the largest accepted payload; never above `MAX_PAYLOAD_LEN`.
    pub fn with_max_payload_len(mut self, bytes: usize) -> Self {
        self.max_payload_len = bytes.min(MAX_PAYLOAD_LEN);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `op` and apply it to the map.
    ///
    /// The deadline bounds the wait for the writer and for a blocking
    /// thread. Once the append begins it runs to completion even if this
    /// future is dropped or the deadline passes, so `DeadlineExceeded`
    /// always means nothing was written.
    async fn commit(&self, op: JournalOp, deadline: Option<Instant>) -> Result<(), StoreError> {
        let payload = op.payload()?;
        if payload.len() > self.max_payload_len {
            return Err(StoreError::EntryTooLarge {
                len: payload.len(),
                limit: self.max_payload_len,
            });
        }

        let writer = Arc::clone(&self.writer).lock_owned();
        let mut writer = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, writer)
                .await
                .map_err(|_| StoreError::DeadlineExceeded)?,
            None => writer.await,
        };

        let records = Arc::clone(&self.records);
        let (gate, state) = WriteGate::new();
        let std_deadline = deadline.map(Instant::into_std);

        let mut handle = tokio::task::spawn_blocking(move || {
            if std_deadline.is_some_and(|d| std::time::Instant::now() >= d)
                || !WriteGate::begin(&state)
            {
                return Err(StoreError::DeadlineExceeded);
            }
            let code = op.code();
            let sequence = writer.append(code, payload)?;
            let mut records = records
                .write()
                .map_err(|_| StoreError::Unavailable("journal index poisoned".into()))?;
            op.apply(&mut records);
            debug!(sequence, op = code, "Journal frame appended");
            Ok(())
        });

        let joined = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined,
                Err(_) if gate.abandon() => return Err(StoreError::DeadlineExceeded),
                // Already writing; wait for the real outcome
                Err(_) => handle.await,
            },
            None => handle.await,
        };
        drop(gate);
        joined.map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    fn read_records(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<EventId, Event>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("journal index poisoned".into()))
    }

    fn contains(&self, id: &EventId) -> Result<bool, StoreError> {
        Ok(self.read_records()?.contains_key(id))
    }
}

#[async_trait]
impl EventStore for JournalEventStore {
    async fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let record = self.read_records()?.get(id).cloned();
        if record.is_none() {
            debug!(event_id = %id, "Event not found");
        }
        Ok(record)
    }

    async fn put(&self, event: &Event) -> Result<(), StoreError> {
        self.commit(JournalOp::Upsert(event.clone()), None).await
    }

    async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        if !self.contains(id)? {
            return Ok(());
        }
        self.commit(JournalOp::Delete(id.clone()), None).await
    }

    async fn put_within(&self, event: &Event, deadline: Instant) -> Result<(), StoreError> {
        self.commit(JournalOp::Upsert(event.clone()), Some(deadline))
            .await
    }

    async fn delete_within(&self, id: &EventId, deadline: Instant) -> Result<(), StoreError> {
        if !self.contains(id)? {
            return Ok(());
        }
        self.commit(JournalOp::Delete(id.clone()), Some(deadline))
            .await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        page_size: u64,
        page_token: Option<&str>,
    ) -> Result<SearchPage, StoreError> {
        let records = self.read_records()?;
        Ok(scan_page(&records, filter, page_size, page_token))
    }

    async fn health_check(&self) -> bool {
        let readable = self.records.read().is_ok();
        if !readable {
            warn!(path = %self.path.display(), "Journal index unavailable");
        }
        readable && self.path.exists()
    }
}
