//! # models::ticker
//!
//! What the language model told us about the stock the user asked for.

use serde::{Deserialize, Serialize};

/// Arguments of the `Get_stock_name_and_code` function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIdentity {
    /// Exchange-qualified symbol, e.g. `"2330.TW"`.
    pub market_code: String,

    /// Display name, e.g. `"TSMC"`.  Not used downstream, so a model that
    /// omits it still yields a usable ticker.
    #[serde(default)]
    pub market_name: String,
}

impl StockIdentity {
    /// The model answers `"undefined"` (or nothing) when it could not map the
    /// conversation to a listed security.
    pub fn is_undefined(&self) -> bool {
        let code = self.market_code.trim();
        code.is_empty() || code.eq_ignore_ascii_case("undefined")
    }
}

/// Outcome of the intent-extraction call.  Each variant drives its own branch
/// of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerExtraction {
    /// The model called the function with well-formed arguments.
    Ticker(StockIdentity),

    /// The model answered in prose instead of calling the function.
    NoFunctionCall { content: Option<String> },

    /// The model called the function but the argument payload was unusable.
    MalformedArguments { raw: String, reason: String },
}

impl TickerExtraction {
    /// Parse the JSON-encoded argument string of a function call.
    pub fn from_arguments(raw: &str) -> Self {
        match serde_json::from_str::<StockIdentity>(raw) {
            Ok(identity) => TickerExtraction::Ticker(identity),
            Err(e) => TickerExtraction::MalformedArguments {
                raw: raw.to_string(),
                reason: e.to_string(),
            },
        }
    }
}
