//! # engine::intent
//!
//! **Intent Extractor**: ask the model which security the user means.

use anyhow::Context;
use tracing::debug;

use crate::ai::{LanguageModel, ModelMessage};
use crate::models::TickerExtraction;
use crate::prompt::{self, ASSISTANT_PERSONA};

/// Send `text` with the single `Get_stock_name_and_code` function declared.
///
/// Transport and API errors propagate; anything the model *says* is mapped
/// onto a [`TickerExtraction`] variant.
pub async fn extract_ticker(
    model: &dyn LanguageModel,
    text: &str,
) -> anyhow::Result<TickerExtraction> {
    let function = prompt::stock_lookup_function();

    let message = model
        .chat_with_function(ASSISTANT_PERSONA, text, &function)
        .await
        .context("Ticker extraction call failed")?;

    let extraction = classify(message, function.name);
    debug!(?extraction, "Intent extracted");
    Ok(extraction)
}

fn classify(message: ModelMessage, expected_function: &str) -> TickerExtraction {
    match message.function_call {
        None => TickerExtraction::NoFunctionCall { content: message.content },
        Some(call) if call.name != expected_function => TickerExtraction::MalformedArguments {
            raw:    call.arguments,
            reason: format!("unexpected function '{}'", call.name),
        },
        Some(call) => TickerExtraction::from_arguments(&call.arguments),
    }
}
