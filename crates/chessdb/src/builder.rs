//! Fluent builder for [`ChessIndex`] construction.

use std::sync::Arc;

use crate::config::{DedupMode, IndexConfig};
use crate::index::ChessIndex;
use crate::log::EventLog;

/// Fluent builder for a [`ChessIndex`].
///
/// # Example
///
/// ```rust,ignore
/// let index = ChessIndex::builder()
///     .live(false)
///     .dedup(DedupMode::Cardinality)
///     .build(log);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChessIndexBuilder {
    config: IndexConfig,
}

impl ChessIndexBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tail the log after backlog replay (`true`) or end every view once it
    /// is caught up (`false`).
    #[must_use]
    pub fn live(mut self, live: bool) -> Self {
        self.config.live = live;
        self
    }

    /// Sets the change filter used by streaming views.
    #[must_use]
    pub fn dedup(mut self, mode: DedupMode) -> Self {
        self.config.dedup = mode;
        self
    }

    /// Builds the index over `log`.
    #[must_use]
    pub fn build(self, log: Arc<dyn EventLog>) -> ChessIndex {
        ChessIndex::with_config(log, self.config)
    }
}
