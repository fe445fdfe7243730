//! # models::reply
//!
//! What goes back to the user.

use serde::Serialize;

/// Reply when the model mapped the message to the `"undefined"` ticker.
pub const NO_DATA_REPLY: &str = "查無此股票資料，請確認股票名稱或代碼後再試一次。";

/// Reply when the model did not produce a usable function call.
pub const UNIDENTIFIED_REPLY: &str =
    "無法辨識您想查詢的股票，請提供股票名稱或代碼，例如：台積電 或 2330.TW。";

/// LINE rejects text messages longer than this (counted in characters).
pub const MAX_TEXT_CHARS: usize = 5000;

const ELLIPSIS: char = '…';

// ─── NarrativeReply ───────────────────────────────────────────────────────────

/// The two model narratives for one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeReply {
    /// K-line (technical analysis) verdict.
    pub technical: String,
    /// Financial-report summary with a 0–10 score.
    pub fundamentals: String,
}

impl NarrativeReply {
    pub fn text(&self) -> String {
        format!("{}\n{}", self.technical, self.fundamentals)
    }
}

// ─── TextMessage ──────────────────────────────────────────────────────────────

/// `{ "type": "text", "text": "..." }` message object of the LINE reply API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    pub text: String,
}

impl TextMessage {
    /// Builds a text message, truncating to [`MAX_TEXT_CHARS`] on a char
    /// boundary.
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.chars().count() > MAX_TEXT_CHARS {
            if let Some((cut, _)) = text.char_indices().nth(MAX_TEXT_CHARS - 1) {
                text.truncate(cut);
                text.push(ELLIPSIS);
            }
        }
        Self { kind: "text", text }
    }
}
