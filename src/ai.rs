//! # ai: chat-completion client
//!
//! [`LanguageModel`] is the seam the pipeline talks to; [`OpenAiClient`] is
//! the production implementation against an OpenAI-compatible
//! `/chat/completions` endpoint.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ─── Seam ─────────────────────────────────────────────────────────────────────

/// A callable declared to the model.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name:        &'static str,
    pub description: &'static str,
    /// JSON schema of the argument object.
    pub parameters:  serde_json::Value,
}

/// A function call the model chose to make.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionCall {
    pub name:      String,
    /// JSON-encoded argument object, exactly as the model produced it.
    pub arguments: String,
}

/// Assistant message returned by a function-enabled completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMessage {
    pub content:       Option<String>,
    pub function_call: Option<FunctionCall>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// System + user prompt → assistant text.  Empty content is an error.
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String>;

    /// Same, but declares `function` and lets the model decide whether to
    /// call it.
    async fn chat_with_function(
        &self,
        system: &str,
        user: &str,
        function: &FunctionSpec,
    ) -> anyhow::Result<ModelMessage>;
}

// ─── OpenAI ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model:    &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools:       Option<Vec<ToolSpec<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind:     &'a str,
    function: &'a FunctionSpec,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content:       Option<String>,
    #[serde(default)]
    tool_calls:    Option<Vec<ToolCall>>,
    /// Legacy `functions` API shape, still returned by some compatible servers.
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

impl From<ResponseMessage> for ModelMessage {
    fn from(msg: ResponseMessage) -> Self {
        let function_call = msg
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| call.function)
            .or(msg.function_call);

        ModelMessage {
            content: msg.content.filter(|c| !c.trim().is_empty()),
            function_call,
        }
    }
}

pub struct OpenAiClient {
    http:     reqwest::Client,
    api_key:  String,
    model:    String,
    base_url: String,
    timeout:  Duration,
}

impl OpenAiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn complete(&self, body: &ChatRequest<'_>) -> anyhow::Result<ResponseMessage> {
        debug!(model = %self.model, tools = body.tools.is_some(), "Calling chat completion API...");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .context("OpenAI API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error {status}: {text}");
        }

        let data: ChatResponse = resp.json().await.context("OpenAI response parse error")?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .context("OpenAI returned no choices")
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model:       &self.model,
            messages:    vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user",   content: user },
            ],
            tools:       None,
            tool_choice: None,
        };

        ModelMessage::from(self.complete(&body).await?)
            .content
            .context("OpenAI returned empty content")
    }

    async fn chat_with_function(
        &self,
        system: &str,
        user: &str,
        function: &FunctionSpec,
    ) -> anyhow::Result<ModelMessage> {
        let body = ChatRequest {
            model:       &self.model,
            messages:    vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user",   content: user },
            ],
            tools:       Some(vec![ToolSpec { kind: "function", function }]),
            tool_choice: Some("auto"),
        };

        Ok(self.complete(&body).await?.into())
    }
}
