//! # state
//!
//! The shared application state injected into every Axum handler.
//!
//! The three outbound clients are built once in `main` and held behind trait
//! objects, so tests can hand the router scripted doubles instead of the
//! real LINE / OpenAI / Yahoo clients.  Apart from two counters nothing here
//! is mutable; every webhook event owns its own data.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use anyhow::Context;

use crate::{
    ai::{LanguageModel, OpenAiClient},
    config::Config,
    line::{LineClient, Messenger},
    quotes::{QuoteProvider, YahooClient},
};

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    /// Key for `x-line-signature` verification.
    pub channel_secret: String,

    pub model:     Arc<dyn LanguageModel>,
    pub messenger: Arc<dyn Messenger>,
    pub quotes:    Arc<dyn QuoteProvider>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    /// Text-message events that entered the pipeline.
    pub events_handled: AtomicU64,
    /// Replies accepted by LINE.
    pub replies_sent:   AtomicU64,
}

impl AppState {
    pub fn new(
        channel_secret: impl Into<String>,
        model: Arc<dyn LanguageModel>,
        messenger: Arc<dyn Messenger>,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            model,
            messenger,
            quotes,
            events_handled: AtomicU64::new(0),
            replies_sent:   AtomicU64::new(0),
        }
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

/// Wire the production clients from `config`.
pub fn build_state(config: &Config) -> anyhow::Result<SharedState> {
    // reqwest Client is shared by LINE and OpenAI (connection pooling);
    // Yahoo keeps its own because of the cookie jar.
    let http = reqwest::Client::new();

    let model = OpenAiClient::new(
        http.clone(),
        &config.openai_api_key,
        &config.openai_model,
        &config.openai_base_url,
        config.http_timeout,
    );
    let messenger = LineClient::new(
        http,
        &config.channel_access_token,
        &config.line_api_base_url,
        config.http_timeout,
    );
    let quotes = YahooClient::new(config.http_timeout).context("Failed to build Yahoo client")?;

    Ok(Arc::new(AppState::new(
        &config.channel_secret,
        Arc::new(model),
        Arc::new(messenger),
        Arc::new(quotes),
    )))
}
