//! Per-view folds.
//!
//! Each view pairs a [`Reducer`](chessdb_core::Reducer) with the channels it
//! reads. The [`ChessIndex`](crate::ChessIndex) wires them into live views.

pub mod finished;
pub mod games;
pub mod pending;

pub use finished::{finished_game, games_finished};
pub use games::{GameScope, GameStatus, GameTable, GamesReducer};
pub use pending::{Direction, InviteSummary, PendingInvites, PendingReducer};
