//! Event model for observed call and message facts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of an observed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// An incoming call.
    Call,
    /// An incoming text message.
    Message,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Message => write!(f, "sms"),
        }
    }
}

/// An observed fact from an event source.
///
/// Created transiently per poll cycle or per reactive trigger and
/// discarded after being routed through the pipeline. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Kind of the event.
    pub kind: EventKind,

    /// Source-local identifier. May be reused across sources; only the
    /// `(kind, id)` pair is globally unique.
    pub id: String,

    /// When the event occurred, in milliseconds since the epoch on the
    /// source clock.
    pub occurred_at: i64,

    /// Originating number or address. `"unknown"` when the source could
    /// not resolve one.
    pub counterpart: String,

    /// Text content. Present for messages only.
    pub body: Option<String>,
}

impl Event {
    /// Creates a call event.
    pub fn call(id: impl Into<String>, occurred_at: i64, counterpart: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Call,
            id: id.into(),
            occurred_at,
            counterpart: counterpart.into(),
            body: None,
        }
    }

    /// Creates a message event.
    pub fn message(
        id: impl Into<String>,
        occurred_at: i64,
        counterpart: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Message,
            id: id.into(),
            occurred_at,
            counterpart: counterpart.into(),
            body: Some(body.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_wire_names() {
        assert_eq!(EventKind::Call.to_string(), "call");
        assert_eq!(EventKind::Message.to_string(), "sms");
    }

    #[test]
    fn constructors_set_kind_and_body() {
        let call = Event::call("7", 1_000, "+15550100");
        assert_eq!(call.kind, EventKind::Call);
        assert!(call.body.is_none());

        let sms = Event::message("8", 2_000, "+15550101", "hello");
        assert_eq!(sms.kind, EventKind::Message);
        assert_eq!(sms.body.as_deref(), Some("hello"));
    }
}
