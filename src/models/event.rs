//! # models::event
//!
//! The LINE webhook payload that arrives on `POST /callback`.
//!
//! Only the fields the pipeline actually reads are modelled.  Every other
//! event type (follow, join, postback, ...) and every non-text message type
//! (image, sticker, ...) collapses into an `Unsupported` / `Other` variant.
//! Events are decoded one by one, so a single event of an unexpected shape
//! is ignored instead of failing the whole batch.

use serde::{Deserialize, Deserializer};
use tracing::warn;

// ─── Envelope ─────────────────────────────────────────────────────────────────

/// Top-level webhook body.
///
/// ```json
/// { "destination": "Uxxxxxxxx", "events": [ { "type": "message", ... } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    /// Bot user ID the events were sent to.
    #[serde(default)]
    pub destination: Option<String>,

    /// Ordered list of events.  LINE sends an empty list when verifying the
    /// webhook URL from the console.
    #[serde(default, deserialize_with = "lenient_events")]
    pub events: Vec<WebhookEvent>,
}

fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<WebhookEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable webhook event treated as unsupported");
                WebhookEvent::Unsupported
            })
        })
        .collect())
}

// ─── Event ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message(MessageEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// One-shot token used to answer this event through the reply API.
    /// Absent for events delivered while the channel is in standby mode.
    #[serde(default)]
    pub reply_token: Option<String>,

    pub message: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text(TextContent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// Borrowed view of a text-message event: the only event shape the pipeline
/// answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingText<'a> {
    pub reply_token: &'a str,
    pub text: &'a str,
}

impl WebhookEvent {
    /// Short label used in log spans.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::Message(m) => match m.message {
                MessageContent::Text(_) => "message/text",
                MessageContent::Other => "message/other",
            },
            WebhookEvent::Unsupported => "unsupported",
        }
    }

    /// Returns the reply token and text if this is a text message event that
    /// can be answered.
    pub fn as_text(&self) -> Option<IncomingText<'_>> {
        match self {
            WebhookEvent::Message(MessageEvent {
                reply_token: Some(reply_token),
                message: MessageContent::Text(content),
            }) => Some(IncomingText {
                reply_token,
                text: &content.text,
            }),
            _ => None,
        }
    }
}
