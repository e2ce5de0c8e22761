//! # `chessdb` Core
//!
//! The incremental view engine behind `chessdb`. It derives continuously
//! updated snapshots from several independently tailed channels of an
//! append-only log.
//!
//! This crate provides:
//! - **Tailing**: sync-marker tagging and fair multiplexing of channel tails
//! - **Liveness gate**: suppresses output until every channel has replayed
//!   its backlog
//! - **Reducers**: total fold functions over an explicitly owned accumulator
//! - **Change filter**: drops snapshots equivalent to the last one emitted
//! - **Live views**: the assembled pipeline, exposed as a `Stream`
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────┐   ┌─────┐   ┌───────────┐   ┌──────┐   ┌─────────┐   ┌───────┐
//! │ tail A │──▶│ tag │──▶│           │   │      │   │         │   │       │
//! ├────────┤   ├─────┤   │ multiplex │──▶│ gate │──▶│ reducer │──▶│ dedup │──▶ consumer
//! │ tail B │──▶│ tag │──▶│           │   │      │   │         │   │       │
//! └────────┘   └─────┘   └───────────┘   └──────┘   └─────────┘   └───────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **One owner per accumulator** - each pipeline folds into its own state
//! 2. **Order-tolerant folds** - nothing is assumed about cross-channel order
//! 3. **Never emit early** - no snapshot before every backlog is replayed
//! 4. **Never stall** - bad records are skipped, only upstream faults end a view
//!
//! ## Example
//!
//! ```rust,ignore
//! use chessdb_core::{LiveView, Reducer, dedup::structural};
//!
//! let view = LiveView::new(
//!     vec![(Channel::Invite, invites), (Channel::Accept, accepts)],
//!     MyReducer::new(player),
//!     structural,
//! );
//!
//! while let Some(snapshot) = view.next().await {
//!     render(snapshot?);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dedup;
pub mod gate;
pub mod reducer;
pub mod tail;
pub mod view;

// Re-export key types
pub use dedup::{Dedup, DedupExt, DedupStream};
pub use gate::{GateTransition, LivenessGate};
pub use reducer::{fold_to_end, Reducer};
pub use tail::{
    multiplex, tag, tag_and_multiplex, StopOnError, StopOnErrorExt, TailItem, TailStream, Tagged,
    TaggedStream,
};
pub use view::LiveView;
