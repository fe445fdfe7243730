//! # config: read Config from environment variables

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";

/// Everything the webhook server needs at startup.
#[derive(Clone)]
pub struct Config {
    /// LINE channel access token (reply API bearer).
    pub channel_access_token: String,
    /// LINE channel secret (webhook signature key).
    pub channel_secret:       String,
    pub openai_api_key:       String,
    pub openai_model:         String,
    pub openai_base_url:      String,
    pub line_api_base_url:    String,
    pub bind_host:            String,
    pub port:                 u16,
    /// Upper bound for every outbound HTTP call.
    pub http_timeout:         Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} environment variable is required"))
        };

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a number between 0 and 65535")?;

        let timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a number")?;

        Ok(Self {
            channel_access_token: required("CHANNEL_ACCESS_TOKEN")?,
            channel_secret:       required("CHANNEL_SECRET")?,
            openai_api_key:       required("OPENAI_API_KEY")?,
            openai_model:         lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url:      trim_slash(lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())),
            line_api_base_url:    trim_slash(lookup("LINE_API_BASE_URL").unwrap_or_else(|| DEFAULT_LINE_API_BASE_URL.to_string())),
            bind_host:            lookup("BIND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            http_timeout:         Duration::from_secs(timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind_host, self.port))
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("channel_access_token", &"<redacted>")
            .field("channel_secret", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("line_api_base_url", &self.line_api_base_url)
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
