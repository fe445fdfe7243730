//! # engine::pipeline
//!
//! One webhook event, start to finish:
//!
//! ```text
//! text message ─▶ intent ─┬─ ticker ──────▶ history ─▶ fundamentals ─▶ 2× narrative ─▶ reply
//!                         ├─ "undefined" ─▶ reply (no data)
//!                         └─ unusable ────▶ reply (unidentified)
//! anything else ─▶ ignored (no outbound call)
//! ```

use std::sync::atomic::Ordering;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{intent, market, narrative, reply};
use crate::models::reply::{NO_DATA_REPLY, UNIDENTIFIED_REPLY};
use crate::models::{TickerExtraction, WebhookEvent};
use crate::state::AppState;

/// Per-event result, returned to LINE in the webhook response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Not a text message; nothing was called.
    Ignored,
    /// The model mapped the text to no security.
    NoData,
    /// The model did not produce a usable function call.
    Unidentified,
    /// Full analysis sent.
    Replied { ticker: String },
}

pub async fn handle_event(state: &AppState, event: &WebhookEvent) -> anyhow::Result<EventOutcome> {
    handle_event_on(state, event, Utc::now().date_naive()).await
}

/// [`handle_event`] with an explicit "today" for the history window.
pub async fn handle_event_on(
    state: &AppState,
    event: &WebhookEvent,
    today: NaiveDate,
) -> anyhow::Result<EventOutcome> {
    let Some(incoming) = event.as_text() else {
        debug!(kind = event.kind(), "Non-text event ignored");
        return Ok(EventOutcome::Ignored);
    };

    state.events_handled.fetch_add(1, Ordering::Relaxed);

    // ── 1. Intent ─────────────────────────────────────────────────────────────
    let stock = match intent::extract_ticker(state.model.as_ref(), incoming.text).await? {
        TickerExtraction::Ticker(stock) if stock.is_undefined() => {
            info!("Model found no matching security, replying no-data");
            reply::send_text(state.messenger.as_ref(), incoming.reply_token, NO_DATA_REPLY).await?;
            state.replies_sent.fetch_add(1, Ordering::Relaxed);
            return Ok(EventOutcome::NoData);
        }
        TickerExtraction::Ticker(stock) => stock,
        TickerExtraction::NoFunctionCall { content } => {
            info!(content = content.as_deref().unwrap_or(""), "Model answered without a function call");
            reply::send_text(state.messenger.as_ref(), incoming.reply_token, UNIDENTIFIED_REPLY).await?;
            state.replies_sent.fetch_add(1, Ordering::Relaxed);
            return Ok(EventOutcome::Unidentified);
        }
        TickerExtraction::MalformedArguments { raw, reason } => {
            warn!(raw = %raw, reason = %reason, "Model returned malformed function arguments");
            reply::send_text(state.messenger.as_ref(), incoming.reply_token, UNIDENTIFIED_REPLY).await?;
            state.replies_sent.fetch_add(1, Ordering::Relaxed);
            return Ok(EventOutcome::Unidentified);
        }
    };

    let ticker = stock.market_code.trim().to_string();
    info!(ticker = %ticker, name = %stock.market_name, "🔎 Ticker extracted");

    // ── 2. Market data (failures degrade, never abort) ────────────────────────
    let data = market::fetch_market_data(state.quotes.as_ref(), &ticker, today).await;

    // ── 3. Narratives ─────────────────────────────────────────────────────────
    let narrative = narrative::generate(state.model.as_ref(), &data).await?;

    // ── 4. Reply ──────────────────────────────────────────────────────────────
    reply::send_text(state.messenger.as_ref(), incoming.reply_token, &narrative.text()).await?;
    state.replies_sent.fetch_add(1, Ordering::Relaxed);

    Ok(EventOutcome::Replied { ticker })
}
