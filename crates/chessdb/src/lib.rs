//! # chessdb
//!
//! Live materialized views of chess invites and games, derived from an
//! append-only log that many authors write to.
//!
//! Writers append three kinds of records: invites, accepts and game ends.
//! Nothing orders records of different authors, so an accept or an end can
//! be read before the invite it refers to. [`ChessIndex`] folds the stored
//! backlog and every later append into small snapshots that update as the
//! log grows:
//!
//! - pending challenges, sent and received
//! - games in progress and games open to observers
//! - finished games
//! - one-shot queries: all games, game membership, play frequency
//!
//! The log itself is a collaborator behind the [`EventLog`] trait.
//! [`MemoryLog`] is an in-process implementation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chessdb::{ChessIndex, Color, Event, MemoryLog};
//! use futures::StreamExt;
//!
//! let log = Arc::new(MemoryLog::new());
//! let index = ChessIndex::new(log.clone());
//! let mut pending = index.pending_challenges_received(&"@bob".into());
//!
//! log.append(Event::invite("%game", "@alice", "@bob", Color::White, now));
//! while let Some(open) = pending.next().await {
//!     println!("{} open invites", open?.len());
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod builder;
pub mod config;
mod error;
pub mod event;
mod index;
pub mod ingest;
pub mod log;
pub mod memory;
pub mod queries;
pub mod views;

pub use builder::ChessIndexBuilder;
pub use config::{DedupMode, IndexConfig};
pub use error::IndexError;
pub use event::{AuthorId, Color, Content, Event, EventKey, EventKind, Invite};
pub use index::{ChessIndex, ViewStream};
pub use ingest::DecodeError;
pub use log::{EventLog, EventTail, LogError};
pub use memory::MemoryLog;
pub use queries::{Participation, PlayFrequency};
pub use views::{GameStatus, InviteSummary};
