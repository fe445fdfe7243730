//! # line: LINE Messaging API reply client

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::models::TextMessage;

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Answer an event through its one-shot reply token.
    async fn reply(&self, reply_token: &str, messages: Vec<TextMessage>) -> anyhow::Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages:    Vec<TextMessage>,
}

pub struct LineClient {
    http:         reqwest::Client,
    access_token: String,
    base_url:     String,
    timeout:      Duration,
}

impl LineClient {
    pub fn new(
        http: reqwest::Client,
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Messenger for LineClient {
    async fn reply(&self, reply_token: &str, messages: Vec<TextMessage>) -> anyhow::Result<()> {
        let url = format!("{}/v2/bot/message/reply", self.base_url);
        let count = messages.len();

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&ReplyRequest { reply_token, messages })
            .timeout(self.timeout)
            .send()
            .await
            .context("LINE API unreachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("LINE rejected reply: HTTP {status}: {body}");
        }

        info!(messages = count, "💬 Reply delivered to LINE");
        Ok(())
    }
}
