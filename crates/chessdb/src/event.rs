//! Normalized log events.
//!
//! Every record read from the log is turned into one [`Event`] at the
//! ingestion boundary (see [`crate::ingest`]). Views only ever see this shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Log-assigned identity of a record. The key of an invite doubles as the
/// game id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Wraps a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for EventKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Identity of a log writer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Wraps a raw author id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw author id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AuthorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Record kinds, one log channel each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// A game invitation. Its key is the game id.
    Invite,
    /// An invitation was accepted; the game is now live.
    Accept,
    /// A game ended.
    End,
}

impl EventKind {
    /// All kinds, in channel order.
    pub const ALL: [EventKind; 3] = [EventKind::Invite, EventKind::Accept, EventKind::End];

    /// The `type` string used in log records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invite => "chess_invite",
            Self::Accept => "chess_invite_accept",
            Self::End => "chess_game_end",
        }
    }

    /// Parses a record `type` string.
    #[must_use]
    pub fn from_type(type_str: &str) -> Option<Self> {
        match type_str {
            "chess_invite" => Some(Self::Invite),
            "chess_invite_accept" => Some(Self::Accept),
            "chess_game_end" => Some(Self::End),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side the inviter plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// White moves first.
    White,
    /// Black.
    Black,
}

impl Color {
    /// Parses `"white"` / `"black"`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Self::White),
            "black" => Some(Self::Black),
            _ => None,
        }
    }
}

/// Payload of an invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Who is being invited.
    pub invitee: AuthorId,
    /// Side the inviter will play.
    pub inviter_color: Color,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    /// Invitation to a new game.
    Invite(Invite),
    /// Acceptance of the invite `game`.
    Accept {
        /// Key of the accepted invite.
        game: EventKey,
    },
    /// End of the game `game`.
    End {
        /// Key of the invite that started the game.
        game: EventKey,
    },
    /// A record of a known kind missing the fields its kind requires.
    /// Folds treat it as a no-op.
    Malformed(EventKind),
}

/// One immutable log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique key of this record.
    pub key: EventKey,
    /// Writer of this record.
    pub author: AuthorId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Payload.
    pub content: Content,
}

impl Event {
    /// Builds an invite from `author` to `invitee`.
    #[must_use]
    pub fn invite(
        key: impl Into<EventKey>,
        author: impl Into<AuthorId>,
        invitee: impl Into<AuthorId>,
        inviter_color: Color,
        timestamp: u64,
    ) -> Self {
        Self {
            key: key.into(),
            author: author.into(),
            timestamp,
            content: Content::Invite(Invite {
                invitee: invitee.into(),
                inviter_color,
            }),
        }
    }

    /// Builds an acceptance of `game`.
    #[must_use]
    pub fn accept(
        key: impl Into<EventKey>,
        author: impl Into<AuthorId>,
        game: impl Into<EventKey>,
        timestamp: u64,
    ) -> Self {
        Self {
            key: key.into(),
            author: author.into(),
            timestamp,
            content: Content::Accept { game: game.into() },
        }
    }

    /// Builds an end of `game`.
    #[must_use]
    pub fn end(
        key: impl Into<EventKey>,
        author: impl Into<AuthorId>,
        game: impl Into<EventKey>,
        timestamp: u64,
    ) -> Self {
        Self {
            key: key.into(),
            author: author.into(),
            timestamp,
            content: Content::End { game: game.into() },
        }
    }

    /// The channel this record belongs to.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match &self.content {
            Content::Invite(_) => EventKind::Invite,
            Content::Accept { .. } => EventKind::Accept,
            Content::End { .. } => EventKind::End,
            Content::Malformed(kind) => *kind,
        }
    }

    /// The invite payload, if this is a well-formed invite.
    #[must_use]
    pub fn as_invite(&self) -> Option<&Invite> {
        match &self.content {
            Content::Invite(invite) => Some(invite),
            _ => None,
        }
    }

    /// The game an accept or end refers to.
    #[must_use]
    pub fn refers_to(&self) -> Option<&EventKey> {
        match &self.content {
            Content::Accept { game } | Content::End { game } => Some(game),
            _ => None,
        }
    }

    /// Returns `true` if this is a well-formed invite that `player` sent or
    /// received.
    #[must_use]
    pub fn involves(&self, player: &AuthorId) -> bool {
        self.as_invite()
            .is_some_and(|invite| self.author == *player || invite.invitee == *player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_type_strings_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_type(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_type("post"), None);
    }

    #[test]
    fn test_involves() {
        let invite = Event::invite("%g", "@a", "@b", Color::White, 1);
        assert!(invite.involves(&"@a".into()));
        assert!(invite.involves(&"@b".into()));
        assert!(!invite.involves(&"@c".into()));

        let accept = Event::accept("%x", "@b", "%g", 2);
        assert!(!accept.involves(&"@b".into()));
        assert_eq!(accept.refers_to(), Some(&EventKey::from("%g")));
    }

    #[test]
    fn test_malformed_keeps_kind() {
        let event = Event {
            key: "%m".into(),
            author: "@a".into(),
            timestamp: 0,
            content: Content::Malformed(EventKind::Accept),
        };
        assert_eq!(event.kind(), EventKind::Accept);
        assert_eq!(event.refers_to(), None);
        assert!(event.as_invite().is_none());
    }
}
