//! In-memory [`EventLog`].
//!
//! Keeps every record in a `Vec` and fans live appends out to open tails
//! over one broadcast channel per record kind, so a tail only ever lags
//! behind records of its own kind. Useful for tests, demos and embedding.
//!
//! The backlog snapshot of a tail and its live subscription are taken under
//! the same lock that `append` writes under, so a record is either in the
//! snapshot or delivered live, never both and never neither.

use std::future::ready;

use async_trait::async_trait;
use chessdb_core::TailItem;
use futures::{stream, StreamExt};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::config::{DEFAULT_LIVE_BUFFER, MAX_LIVE_BUFFER, MIN_LIVE_BUFFER};
use crate::event::{Event, EventKey, EventKind};
use crate::ingest::{self, DecodeError};
use crate::log::{EventLog, EventTail, LogError};

type LiveItem = Result<Event, LogError>;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Event>,
    by_key: FxHashMap<EventKey, usize>,
    fault: Option<LogError>,
}

/// Append-only log held in memory.
#[derive(Debug)]
pub struct MemoryLog {
    inner: RwLock<Inner>,
    live: [broadcast::Sender<LiveItem>; 3],
}

fn channel(kind: EventKind) -> usize {
    match kind {
        EventKind::Invite => 0,
        EventKind::Accept => 1,
        EventKind::End => 2,
    }
}

impl MemoryLog {
    /// Creates an empty log with the default live buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_live_buffer(DEFAULT_LIVE_BUFFER)
    }

    /// Creates an empty log whose live tails may fall at most `capacity`
    /// records of their kind behind before they fail with
    /// [`LogError::Lagged`].
    #[must_use]
    pub fn with_live_buffer(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_LIVE_BUFFER, MAX_LIVE_BUFFER);
        let live = std::array::from_fn(|_| broadcast::channel(capacity).0);
        Self {
            inner: RwLock::new(Inner::default()),
            live,
        }
    }

    /// Appends `event`.
    ///
    /// Returns `false` (and stores nothing) if a record with the same key is
    /// already stored.
    pub fn append(&self, event: Event) -> bool {
        let mut inner = self.inner.write();
        if inner.by_key.contains_key(&event.key) {
            tracing::trace!(key = %event.key, "duplicate record ignored");
            return false;
        }
        let index = inner.records.len();
        inner.by_key.insert(event.key.clone(), index);
        let sender = &self.live[channel(event.kind())];
        inner.records.push(event.clone());
        // No receivers is not an error: nobody is tailing live.
        let _ = sender.send(Ok(event));
        true
    }

    /// Decodes a raw JSON record and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the record cannot be normalized.
    pub fn append_json(&self, raw: &str) -> Result<bool, DecodeError> {
        Ok(self.append(ingest::decode_str(raw)?))
    }

    /// Appends every event in order. Returns how many were stored.
    pub fn append_all(&self, events: impl IntoIterator<Item = Event>) -> usize {
        events
            .into_iter()
            .map(|event| usize::from(self.append(event)))
            .sum()
    }

    /// Puts the log into a failed state.
    ///
    /// Open live tails receive `error`; later tails and lookups fail with it
    /// until [`recover`](Self::recover) is called.
    pub fn fail(&self, error: LogError) {
        let mut inner = self.inner.write();
        inner.fault = Some(error.clone());
        for sender in &self.live {
            let _ = sender.send(Err(error.clone()));
        }
    }

    /// Clears a fault set by [`fail`](Self::fail).
    pub fn recover(&self) {
        self.inner.write().fault = None;
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns `true` if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of open live tails.
    #[must_use]
    pub fn live_tails(&self) -> usize {
        self.live.iter().map(broadcast::Sender::receiver_count).sum()
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

fn live_item(
    kind: EventKind,
    item: Result<LiveItem, BroadcastStreamRecvError>,
) -> Option<Result<TailItem<Event>, LogError>> {
    match item {
        Ok(Ok(event)) => Some(Ok(TailItem::Record(event))),
        Ok(Err(error)) => Some(Err(error)),
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::warn!(%kind, missed, "live tail lagged");
            Some(Err(LogError::Lagged(missed)))
        }
    }
}

#[async_trait]
impl EventLog for MemoryLog {
    fn tail(&self, kind: EventKind, live: bool) -> EventTail {
        let inner = self.inner.read();
        if let Some(fault) = &inner.fault {
            return stream::once(ready(Err(fault.clone()))).boxed();
        }

        let backlog: Vec<Result<TailItem<Event>, LogError>> = inner
            .records
            .iter()
            .filter(|event| event.kind() == kind)
            .map(|event| Ok(TailItem::Record(event.clone())))
            .collect();
        let receiver = live.then(|| self.live[channel(kind)].subscribe());
        drop(inner);

        tracing::trace!(%kind, backlog = backlog.len(), live, "tail opened");
        let replay = stream::iter(backlog).chain(stream::once(ready(Ok(TailItem::Sync))));

        match receiver {
            None => replay.boxed(),
            Some(receiver) => replay
                .chain(
                    BroadcastStream::new(receiver)
                        .filter_map(move |item| ready(live_item(kind, item))),
                )
                .chain(stream::once(ready(Err(LogError::Closed))))
                .boxed(),
        }
    }

    async fn resolve(&self, key: &EventKey) -> Result<Option<Event>, LogError> {
        let inner = self.inner.read();
        if let Some(fault) = &inner.fault {
            return Err(fault.clone());
        }
        Ok(inner
            .by_key
            .get(key)
            .map(|&index| inner.records[index].clone()))
    }
}
