//! # klinebot: LINE stock-analysis bot
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  POST /callback   ┌───────────────────────────────────────┐
//!  │  LINE        │ ────────────────▶ │  verify x-line-signature              │
//!  │  Platform    │                   │        │                              │
//!  └──────────────┘                   │        ▼  (one task per event)        │
//!         ▲                           │  OpenAI ─▶ ticker                     │
//!         │  reply API                │  Yahoo  ─▶ K-line + fundamentals      │
//!         └───────────────────────────│  OpenAI ─▶ K-line + financial reports │
//!                                     └───────────────────────────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable               | Default                     | Description                     |
//! |------------------------|-----------------------------|---------------------------------|
//! | `CHANNEL_ACCESS_TOKEN` | *(required)*                | LINE reply API bearer token     |
//! | `CHANNEL_SECRET`       | *(required)*                | LINE webhook signing secret     |
//! | `OPENAI_API_KEY`       | *(required)*                | OpenAI bearer token             |
//! | `OPENAI_MODEL`         | `gpt-4-turbo-preview`       | Chat model for all three calls  |
//! | `OPENAI_BASE_URL`      | `https://api.openai.com/v1` | OpenAI-compatible endpoint      |
//! | `LINE_API_BASE_URL`    | `https://api.line.me`       | LINE Messaging API endpoint     |
//! | `BIND_HOST`            | `0.0.0.0`                   | Interface Axum listens on       |
//! | `PORT`                 | `3000`                      | Port Axum listens on            |
//! | `HTTP_TIMEOUT_SECS`    | `60`                        | Timeout for every outbound call |
//! | `RUST_LOG`             | `klinebot=debug`            | Tracing filter                  |

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod ai;
mod auth;
mod config;
mod engine;
mod error;
mod line;
mod models;
mod prompt;
mod quotes;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use config::Config;
use state::build_state;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional, real env vars win) ───────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("klinebot=debug".parse()?)
            .add_directive("tower_http=info".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        KLINEBOT — LINE Stock Analyst          ║
  ║        Rust + Axum  ·  OpenAI · Yahoo         ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Configuration ─────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(?config, "⚙️  Configuration loaded");

    // ── 4. Build shared state (outbound clients) ─────────────────────────────
    let state = build_state(&config)?;

    // ── 5. Build the Axum router ─────────────────────────────────────────────
    let app = routes::build_router(state);

    // ── 6. Resolve bind address ──────────────────────────────────────────────
    let addr = config.bind_addr()?;
    info!(%addr, "🚀 klinebot listening");

    // ── 7. Start the server ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
