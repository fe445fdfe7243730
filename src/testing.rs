//! Scripted doubles for the three outbound seams, shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde_json::json;

use crate::ai::{FunctionCall, FunctionSpec, LanguageModel, ModelMessage};
use crate::line::Messenger;
use crate::models::{FundamentalsSnapshot, PricePoint, TextMessage};
use crate::prompt::STOCK_LOOKUP_FUNCTION;
use crate::quotes::QuoteProvider;
use crate::state::{AppState, SharedState};

pub const SECRET: &str = "test-channel-secret";

// ─── Language model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user:   String,
}

type ExtractFn = dyn Fn(&str) -> anyhow::Result<ModelMessage> + Send + Sync;

pub struct ScriptedModel {
    extract:     Box<ExtractFn>,
    pub extractions: Mutex<Vec<String>>,
    pub chats:   Mutex<Vec<Prompt>>,
}

impl ScriptedModel {
    /// `extract` decides the function-call answer from the user text.
    pub fn answering(
        extract: impl Fn(&str) -> anyhow::Result<ModelMessage> + Send + Sync + 'static,
    ) -> Self {
        Self {
            extract:     Box::new(extract),
            extractions: Mutex::new(Vec::new()),
            chats:       Mutex::new(Vec::new()),
        }
    }

    pub fn with_ticker(code: &str) -> Self {
        let code = code.to_string();
        Self::answering(move |_| Ok(ticker_call(&code)))
    }

    pub fn chats(&self) -> Vec<Prompt> {
        self.chats.lock().unwrap().clone()
    }

    pub fn extraction_count(&self) -> usize {
        self.extractions.lock().unwrap().len()
    }
}

pub fn ticker_call(code: &str) -> ModelMessage {
    ModelMessage {
        content: None,
        function_call: Some(FunctionCall {
            name:      STOCK_LOOKUP_FUNCTION.to_string(),
            arguments: json!({ "market_code": code, "market_name": "TSMC" }).to_string(),
        }),
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String> {
        self.chats.lock().unwrap().push(Prompt {
            system: system.to_string(),
            user:   user.to_string(),
        });
        Ok(format!("{system}回覆"))
    }

    async fn chat_with_function(
        &self,
        _system: &str,
        user: &str,
        _function: &FunctionSpec,
    ) -> anyhow::Result<ModelMessage> {
        self.extractions.lock().unwrap().push(user.to_string());
        (self.extract)(user)
    }
}

// ─── Messenger ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMessenger {
    pub fail:    bool,
    pub replies: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn reply(&self, reply_token: &str, messages: Vec<TextMessage>) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("LINE rejected reply: HTTP 400: Invalid reply token");
        }
        let mut replies = self.replies.lock().unwrap();
        for msg in messages {
            replies.push((reply_token.to_string(), msg.text));
        }
        Ok(())
    }
}

// ─── Quotes ───────────────────────────────────────────────────────────────────

/// `None` makes the corresponding call fail.
#[derive(Default)]
pub struct StubQuotes {
    pub history:      Option<Vec<PricePoint>>,
    pub fundamentals: Option<FundamentalsSnapshot>,
    pub calls:        AtomicUsize,
}

impl StubQuotes {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn history(
        &self,
        ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.history {
            Some(points) => Ok(points.clone()),
            None => anyhow::bail!("Yahoo chart error 404: no data for {ticker}"),
        }
    }

    async fn fundamentals(&self, ticker: &str) -> anyhow::Result<FundamentalsSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fundamentals {
            Some(snapshot) => Ok(snapshot.clone()),
            None => anyhow::bail!("Yahoo quoteSummary error 404: no data for {ticker}"),
        }
    }
}

/// `n` weekday bars ending at `end`, oldest first.
pub fn weekday_bars(n: usize, end: NaiveDate) -> Vec<PricePoint> {
    let mut bars = Vec::with_capacity(n);
    let mut day = end;
    while bars.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let base = 700.0 + bars.len() as f64;
            bars.push(PricePoint { date: day, open: base, high: base + 5.0, low: base - 5.0, close: base + 1.0 });
        }
        day = day.checked_sub_days(Days::new(1)).unwrap();
    }
    bars.reverse();
    bars
}

pub fn tsmc_snapshot() -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        company_name: Some("Taiwan Semiconductor Manufacturing Company Limited".into()),
        current_price: Some(780.0),
        target_mean_price: Some(905.25),
        number_of_analyst_opinions: Some(31),
        ..Default::default()
    }
}

pub fn state(
    model: &Arc<ScriptedModel>,
    messenger: &Arc<RecordingMessenger>,
    quotes: &Arc<StubQuotes>,
) -> SharedState {
    Arc::new(AppState::new(
        SECRET,
        model.clone(),
        messenger.clone(),
        quotes.clone(),
    ))
}
