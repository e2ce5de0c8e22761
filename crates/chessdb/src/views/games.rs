//! Game lifecycle fold shared by the in-progress and observable views.
//!
//! Invite, accept and end records for one game arrive on three channels with
//! no ordering between them. The table below folds them so that the result
//! only depends on *which* records were seen, not on their order:
//!
//! | record | game known            | game unknown                     |
//! |--------|-----------------------|----------------------------------|
//! | invite | kept as is            | `Live` if pre-accepted, else `Invited`; dropped if pre-finished |
//! | accept | `Live`                | remembered as pre-accepted       |
//! | end    | removed, pre-finished | remembered as pre-finished       |
//!
//! `Finished` is absorbing: once a game is pre-finished no later record can
//! bring it back.

use chessdb_core::Reducer;
use fxhash::{FxHashMap, FxHashSet};

use crate::event::{AuthorId, Content, Event, EventKey};

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Invite seen, not yet accepted.
    Invited,
    /// Accepted and not ended.
    Live,
    /// Ended.
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct GameEntry {
    status: GameStatus,
    invited_at: u64,
}

/// Accumulator of the game fold.
#[derive(Debug, Default)]
pub struct GameTable {
    games: FxHashMap<EventKey, GameEntry>,
    pre_accepted: FxHashSet<EventKey>,
    pre_finished: FxHashSet<EventKey>,
}

impl GameTable {
    /// Folds an invite for `game`, sent at `invited_at`.
    pub fn invite(&mut self, game: &EventKey, invited_at: u64) {
        if self.pre_finished.contains(game) || self.games.contains_key(game) {
            return;
        }
        let status = if self.pre_accepted.remove(game) {
            GameStatus::Live
        } else {
            GameStatus::Invited
        };
        self.games.insert(game.clone(), GameEntry { status, invited_at });
    }

    /// Folds an acceptance of `game`.
    pub fn accept(&mut self, game: &EventKey) {
        if self.pre_finished.contains(game) {
            return;
        }
        match self.games.get_mut(game) {
            Some(entry) => entry.status = GameStatus::Live,
            None => {
                self.pre_accepted.insert(game.clone());
            }
        }
    }

    /// Folds the end of `game`.
    pub fn end(&mut self, game: &EventKey) {
        self.games.remove(game);
        self.pre_accepted.remove(game);
        self.pre_finished.insert(game.clone());
    }

    /// Current status of `game`, or `None` if no invite for it has been
    /// folded and it has not ended.
    #[must_use]
    pub fn status(&self, game: &EventKey) -> Option<GameStatus> {
        if self.pre_finished.contains(game) {
            return Some(GameStatus::Finished);
        }
        self.games.get(game).map(|entry| entry.status)
    }

    /// Live games, oldest invite first.
    #[must_use]
    pub fn live_games(&self) -> Vec<EventKey> {
        let mut live: Vec<(&EventKey, u64)> = self
            .games
            .iter()
            .filter(|(_, entry)| entry.status == GameStatus::Live)
            .map(|(game, entry)| (game, entry.invited_at))
            .collect();
        live.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        live.into_iter().map(|(game, _)| game.clone()).collect()
    }
}

/// Which invites a game view keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameScope {
    /// Games the player sent or received an invite for.
    Playing,
    /// Games the player takes no part in.
    Observing,
}

/// Fold for the in-progress and observable game views.
#[derive(Debug, Clone)]
pub struct GamesReducer {
    player: AuthorId,
    scope: GameScope,
}

impl GamesReducer {
    /// Creates a reducer for `player` over `scope`.
    #[must_use]
    pub fn new(player: AuthorId, scope: GameScope) -> Self {
        Self { player, scope }
    }

    fn in_scope(&self, invite: &Event) -> bool {
        let involved = invite.involves(&self.player);
        match self.scope {
            GameScope::Playing => involved,
            GameScope::Observing => !involved,
        }
    }
}

impl Reducer for GamesReducer {
    type Event = Event;
    type State = GameTable;
    type Output = Vec<EventKey>;

    fn apply(&self, state: &mut GameTable, event: &Event) {
        match &event.content {
            Content::Invite(_) => {
                if self.in_scope(event) {
                    state.invite(&event.key, event.timestamp);
                }
            }
            Content::Accept { game } => state.accept(game),
            Content::End { game } => state.end(game),
            Content::Malformed(kind) => {
                tracing::debug!(key = %event.key, %kind, "skipping malformed record");
            }
        }
    }

    fn project(&self, state: &GameTable) -> Vec<EventKey> {
        state.live_games()
    }
}
