//! Request body construction for forwarded batches.
//!
//! One batch maps to one request body. The JSON mode is the primary
//! wire format: an array of per-event records. The plaintext mode is
//! the legacy newline-delimited format some receivers still speak, and
//! encrypted mode seals the JSON body with the shared secret so only
//! the backend can read it.

use std::str::FromStr;

use relay_cipher::SecretCipher;
use relay_core::{ConfigSnapshot, Event, EventKind, RelayError, Result};
use serde::Serialize;

/// Label reported for the receiving line on call records. Sources that
/// track multiple lines can override it per event later; today it is a
/// fixed single-line label.
pub const DEFAULT_LINE_LABEL: &str = "SIM 1";

/// How a batch is serialized onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    /// JSON array of per-event records. The primary format.
    #[default]
    Json,
    /// Legacy newline-delimited plaintext records.
    PlainText,
    /// The JSON body, sealed with the shared secret.
    Encrypted,
}

impl FromStr for PayloadMode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "plaintext" | "plain" | "text" => Ok(Self::PlainText),
            "encrypted" => Ok(Self::Encrypted),
            other => Err(RelayError::configuration(format!(
                "unknown payload mode {other:?}, expected json, plaintext, or encrypted"
            ))),
        }
    }
}

/// A serialized batch ready to hand to the HTTP client.
#[derive(Debug, Clone)]
pub struct RequestBody {
    /// Value for the `Content-Type` header.
    pub content_type: &'static str,
    /// Serialized body.
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireRecord<'a> {
    Message {
        ids: &'a str,
        sms: &'a str,
    },
    Call {
        ids: &'a str,
        call: bool,
        from: &'a str,
        to: &'a str,
    },
}

impl<'a> WireRecord<'a> {
    fn from_event(event: &'a Event, ids: &'a str) -> Self {
        match event.kind {
            EventKind::Message => {
                Self::Message { ids, sms: event.body.as_deref().unwrap_or_default() }
            },
            EventKind::Call => {
                Self::Call { ids, call: true, from: &event.counterpart, to: DEFAULT_LINE_LABEL }
            },
        }
    }
}

/// Serializes a batch of events according to the configured mode.
///
/// # Errors
///
/// Returns `RelayError::CryptoAuth` if encrypted mode cannot seal the
/// body, or a serialization error surfaced as `Configuration` (which
/// indicates a bug rather than an operational condition).
pub fn build_body(
    mode: PayloadMode,
    events: &[Event],
    snapshot: &ConfigSnapshot,
) -> Result<RequestBody> {
    match mode {
        PayloadMode::Json => Ok(RequestBody {
            content_type: "application/json",
            body: render_json(events, snapshot)?,
        }),
        PayloadMode::PlainText => Ok(RequestBody {
            content_type: "text/plain",
            body: render_plaintext(events, snapshot),
        }),
        PayloadMode::Encrypted => {
            let plaintext = render_json(events, snapshot)?;
            let sealed = SecretCipher::new(&snapshot.secret)
                .encrypt(&plaintext)
                .map_err(|_| RelayError::CryptoAuth)?;
            Ok(RequestBody { content_type: "text/plain", body: sealed })
        },
    }
}

fn render_json(events: &[Event], snapshot: &ConfigSnapshot) -> Result<String> {
    let records: Vec<WireRecord<'_>> =
        events.iter().map(|e| WireRecord::from_event(e, &snapshot.recipient_ids)).collect();

    serde_json::to_string(&records)
        .map_err(|e| RelayError::configuration(format!("failed to serialize batch: {e}")))
}

fn render_plaintext(events: &[Event], snapshot: &ConfigSnapshot) -> String {
    let records: Vec<String> = events
        .iter()
        .map(|event| {
            let data = match event.kind {
                EventKind::Message => event.body.as_deref().unwrap_or_default(),
                EventKind::Call => event.counterpart.as_str(),
            };
            format!("{}\n{}\n{}", snapshot.recipient_ids, event.kind, data)
        })
        .collect();
    records.join("\n")
}
