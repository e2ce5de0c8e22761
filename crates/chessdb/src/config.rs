//! Configuration for a [`ChessIndex`](crate::ChessIndex).

/// Default capacity of the in-memory log's live broadcast buffer.
pub const DEFAULT_LIVE_BUFFER: usize = 1024;

/// Minimum live buffer (must hold at least a burst of appends).
pub const MIN_LIVE_BUFFER: usize = 16;

/// Maximum live buffer.
pub const MAX_LIVE_BUFFER: usize = 1 << 16;

/// Equivalence used to suppress unchanged snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// Suppress only snapshots equal to the last one emitted.
    #[default]
    Structural,

    /// Suppress snapshots with the same number of entries as the last one
    /// emitted.
    ///
    /// Cheaper, but a change that keeps the list length (one game ends while
    /// another starts) is not reported.
    Cardinality,
}

impl DedupMode {
    /// The equivalence predicate for list snapshots.
    #[must_use]
    pub fn equivalence<T: PartialEq>(self) -> fn(&Vec<T>, &Vec<T>) -> bool {
        match self {
            Self::Structural => chessdb_core::dedup::structural::<Vec<T>>,
            Self::Cardinality => chessdb_core::dedup::same_len::<T>,
        }
    }
}

/// Configuration for a `ChessIndex` instance.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Keep tailing the log after the backlog is replayed. With `false`,
    /// every view ends once it has emitted its caught-up snapshot.
    pub live: bool,
    /// Change filter for streaming views.
    pub dedup: DedupMode,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            live: true,
            dedup: DedupMode::Structural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert!(config.live);
        assert_eq!(config.dedup, DedupMode::Structural);
    }

    #[test]
    fn test_equivalences() {
        let structural = DedupMode::Structural.equivalence::<u8>();
        let cardinality = DedupMode::Cardinality.equivalence::<u8>();
        assert!(!structural(&vec![1], &vec![2]));
        assert!(cardinality(&vec![1], &vec![2]));
        assert!(structural(&vec![3], &vec![3]));
        assert!(!cardinality(&vec![1], &vec![1, 2]));
    }
}
