//! Pending challenge views: open invites a player sent or received.

use chessdb_core::Reducer;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::event::{AuthorId, Color, Content, Event, EventKey};

/// An invite that has not been accepted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteSummary {
    /// Key of the invite, which is also the game id.
    pub game_id: EventKey,
    /// Inviter.
    pub sent_by: AuthorId,
    /// Invitee.
    pub invitee: AuthorId,
    /// Side the inviter plays.
    pub inviter_color: Color,
    /// When the invite was sent, in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl InviteSummary {
    fn from_event(event: &Event) -> Option<Self> {
        let invite = event.as_invite()?;
        Some(Self {
            game_id: event.key.clone(),
            sent_by: event.author.clone(),
            invitee: invite.invitee.clone(),
            inviter_color: invite.inviter_color,
            timestamp: event.timestamp,
        })
    }
}

/// Which side of an invite the player is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Invites the player sent.
    Sent,
    /// Invites the player received.
    Received,
}

/// Accumulator of the pending fold.
#[derive(Debug, Default)]
pub struct PendingInvites {
    open: Vec<InviteSummary>,
    started: FxHashSet<EventKey>,
}

impl PendingInvites {
    fn open(&mut self, summary: InviteSummary) {
        if self.started.contains(&summary.game_id)
            || self.open.iter().any(|s| s.game_id == summary.game_id)
        {
            return;
        }
        self.open.push(summary);
    }

    fn close(&mut self, game: &EventKey) {
        self.open.retain(|s| s.game_id != *game);
        self.started.insert(game.clone());
    }

    /// Invites still waiting for an answer, in the order they were folded.
    #[must_use]
    pub fn open_invites(&self) -> &[InviteSummary] {
        &self.open
    }
}

/// Fold for the pending-sent and pending-received views.
///
/// Reads the invite and accept channels only. A sent invite closes when
/// anyone accepts it; a received one closes only when the player accepts it.
#[derive(Debug, Clone)]
pub struct PendingReducer {
    player: AuthorId,
    direction: Direction,
}

impl PendingReducer {
    /// Creates a reducer over `player`'s invites in `direction`.
    #[must_use]
    pub fn new(player: AuthorId, direction: Direction) -> Self {
        Self { player, direction }
    }
}

impl Reducer for PendingReducer {
    type Event = Event;
    type State = PendingInvites;
    type Output = Vec<InviteSummary>;

    fn apply(&self, state: &mut PendingInvites, event: &Event) {
        match &event.content {
            Content::Invite(invite) => {
                let relevant = match self.direction {
                    Direction::Sent => event.author == self.player,
                    Direction::Received => invite.invitee == self.player,
                };
                if let (true, Some(summary)) = (relevant, InviteSummary::from_event(event)) {
                    state.open(summary);
                }
            }
            Content::Accept { game } => {
                if self.direction == Direction::Sent || event.author == self.player {
                    state.close(game);
                }
            }
            Content::End { .. } => {}
            Content::Malformed(kind) => {
                tracing::debug!(key = %event.key, %kind, "skipping malformed record");
            }
        }
    }

    fn project(&self, state: &PendingInvites) -> Vec<InviteSummary> {
        state.open.clone()
    }
}
