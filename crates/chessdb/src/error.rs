//! Error types for the `chessdb` facade.

use crate::log::LogError;

/// Errors from index operations.
///
/// Malformed records and unknown game ids are not errors: views skip the
/// former and point queries report the latter as a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The log failed while a view or query was reading it.
    #[error("Log error: {0}")]
    Log(#[from] LogError),
}
