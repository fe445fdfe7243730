//! # engine::narrative
//!
//! **Narrative Generator**: two independent completions, awaited in order.
//! Both answers are opaque text; nothing is parsed out of them.

use anyhow::Context;
use tracing::info;

use super::market::MarketData;
use crate::ai::LanguageModel;
use crate::models::NarrativeReply;
use crate::prompt::{self, FINANCE_ANALYST_PERSONA, KLINE_ANALYST_PERSONA};

pub async fn generate(
    model: &dyn LanguageModel,
    data: &MarketData,
) -> anyhow::Result<NarrativeReply> {
    let technical = model
        .chat(KLINE_ANALYST_PERSONA, &prompt::technical_prompt(&data.history))
        .await
        .context("K-line analysis call failed")?;

    let fundamentals = model
        .chat(FINANCE_ANALYST_PERSONA, &prompt::fundamentals_prompt(&data.fundamentals))
        .await
        .context("Financial report analysis call failed")?;

    info!(
        technical_chars    = technical.chars().count(),
        fundamentals_chars = fundamentals.chars().count(),
        "🧠 Narratives generated"
    );

    Ok(NarrativeReply { technical, fundamentals })
}
