//! Ingestion boundary: raw log records to [`Event`].
//!
//! Log replicas hand out records in two physical shapes. Some wrap the
//! signed message in a `value` envelope alongside a receive timestamp:
//!
//! ```json
//! { "key": "%…", "timestamp": 1520000000123,
//!   "value": { "author": "@…", "timestamp": 1520000000000,
//!              "content": { "type": "chess_invite", "inviting": "@…", "myColor": "white" } } }
//! ```
//!
//! others are flat:
//!
//! ```json
//! { "key": "%…", "author": "@…", "timestamp": 1520000000000,
//!   "content": { "type": "chess_invite_accept", "root": "%…" } }
//! ```
//!
//! Both decode to the same [`Event`]. A record whose envelope is broken is
//! rejected with a [`DecodeError`]; a record of a known kind whose *content*
//! lacks required fields becomes [`Content::Malformed`] so that views can
//! skip it without failing.

use serde::Deserialize;

use crate::event::{AuthorId, Color, Content, Event, EventKey, EventKind, Invite};

/// Errors decoding a raw record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not valid JSON, or not an object of either record shape.
    #[error("invalid record: {0}")]
    Json(#[from] serde_json::Error),

    /// The content `type` is not a chess record type.
    #[error("unknown record type '{0}'")]
    UnknownType(String),

    /// The content is not an object (e.g. an encrypted string).
    #[error("record '{0}' has no readable content")]
    OpaqueContent(String),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    author: String,
    #[serde(default)]
    timestamp: Option<f64>,
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Wrapped {
        key: String,
        #[serde(default)]
        timestamp: Option<f64>,
        value: RawMessage,
    },
    Flat {
        key: String,
        #[serde(flatten)]
        value: RawMessage,
    },
}

/// Decodes a record given as a JSON string.
///
/// # Errors
///
/// See [`decode_record`].
pub fn decode_str(raw: &str) -> Result<Event, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    decode_record(value)
}

/// Decodes a record given as a JSON value.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if the record matches neither shape,
/// [`DecodeError::OpaqueContent`] if its content is not an object and
/// [`DecodeError::UnknownType`] if the content type is not a chess type.
pub fn decode_record(value: serde_json::Value) -> Result<Event, DecodeError> {
    let (key, outer_ts, message) = match serde_json::from_value::<RawRecord>(value)? {
        RawRecord::Wrapped {
            key,
            timestamp,
            value,
        } => (key, timestamp, value),
        RawRecord::Flat { key, value } => (key, None, value),
    };

    let Some(fields) = message.content.as_object() else {
        return Err(DecodeError::OpaqueContent(key));
    };
    let type_str = str_field(fields, "type").unwrap_or_default();
    let kind = EventKind::from_type(type_str)
        .ok_or_else(|| DecodeError::UnknownType(type_str.to_string()))?;

    let content = normalize_content(kind, fields);
    if let Content::Malformed(kind) = &content {
        tracing::debug!(%key, %kind, "record is missing required fields");
    }

    Ok(Event {
        key: EventKey::new(key),
        author: AuthorId::new(message.author),
        timestamp: to_millis(outer_ts.or(message.timestamp)),
        content,
    })
}

type Fields = serde_json::Map<String, serde_json::Value>;

fn str_field<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(serde_json::Value::as_str)
}

fn normalize_content(kind: EventKind, fields: &Fields) -> Content {
    let root = || str_field(fields, "root").map(EventKey::new);
    let normalized = match kind {
        EventKind::Invite => {
            let invitee = str_field(fields, "inviting");
            let color = str_field(fields, "myColor").and_then(Color::parse);
            invitee.zip(color).map(|(invitee, inviter_color)| {
                Content::Invite(Invite {
                    invitee: AuthorId::new(invitee),
                    inviter_color,
                })
            })
        }
        EventKind::Accept => root().map(|game| Content::Accept { game }),
        EventKind::End => root().map(|game| Content::End { game }),
    };
    normalized.unwrap_or(Content::Malformed(kind))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_millis(ts: Option<f64>) -> u64 {
    match ts {
        Some(ts) if ts.is_finite() && ts > 0.0 => ts as u64,
        _ => 0,
    }
}
