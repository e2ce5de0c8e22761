//! The log collaborator.
//!
//! Storage, replication and transport of the append-only log live outside
//! this crate. Views only need two things from it: a per-kind tail and a
//! point lookup by key.

use async_trait::async_trait;
use chessdb_core::TailStream;

use crate::event::{Event, EventKey, EventKind};

/// Faults reported by the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// The underlying store cannot be read.
    #[error("log unavailable: {0}")]
    Unavailable(String),

    /// A live tail fell behind and records were dropped.
    #[error("live tail lagged, {0} records missed")]
    Lagged(u64),

    /// The log was shut down while a tail was open.
    #[error("log closed")]
    Closed,
}

/// A channel tail of normalized events.
pub type EventTail = TailStream<Event, LogError>;

/// Read access to the append-only log.
///
/// # Tail contract
///
/// [`tail`](EventLog::tail) replays every stored record of `kind` in log
/// order, then yields exactly one sync marker. With `live = true` it then
/// keeps yielding records as they are appended and never ends on its own;
/// with `live = false` it ends right after the marker.
///
/// Dropping the returned stream must release whatever the tail holds.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Opens a tail over records of `kind`.
    fn tail(&self, kind: EventKind, live: bool) -> EventTail;

    /// Looks up a single record by key.
    ///
    /// Returns `Ok(None)` if no such record is stored.
    async fn resolve(&self, key: &EventKey) -> Result<Option<Event>, LogError>;
}
