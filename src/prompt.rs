//! # prompt: personas, instructions and the declared function
//!
//! The bot answers Traditional Chinese users, so every instruction the model
//! sees is written in Chinese as well.

use serde_json::json;

use crate::ai::FunctionSpec;
use crate::models::{Fetched, FundamentalsSnapshot, PricePoint};

/// System persona for the ticker-extraction call.
pub const ASSISTANT_PERSONA: &str = "盧振興的AI助手";

/// System persona for the technical-analysis call.
pub const KLINE_ANALYST_PERSONA: &str = "K線分析師";

/// System persona for the fundamentals call.
pub const FINANCE_ANALYST_PERSONA: &str = "財報分析師";

pub const STOCK_LOOKUP_FUNCTION: &str = "Get_stock_name_and_code";

const TECHNICAL_INSTRUCTION: &str =
    "這是過去兩個月K線資料以rsi,日均線,MACD和布林線分析,寫出分析結果以及是否適合購買,如果適合給買入點,不需要解釋技術:";

const FUNDAMENTALS_INSTRUCTION: &str = "根據財報為該公司寫一段總結並且進行評分,滿分10分: ";

/// The single function the intent extractor declares.
pub fn stock_lookup_function() -> FunctionSpec {
    FunctionSpec {
        name:        STOCK_LOOKUP_FUNCTION,
        description: "根據對話取得對應的股市名字和代碼",
        parameters:  json!({
            "type": "object",
            "properties": {
                "market_code": {
                    "type": "string",
                    "description": "股市代碼 ,如 2330.TW "
                },
                "market_name": {
                    "type": "string",
                    "description": "股市名字 ,如 TSMC"
                }
            },
            "required": ["market_code", "market_name"]
        }),
    }
}

/// Instruction + JSON bar series (or the unavailable marker).
pub fn technical_prompt(history: &Fetched<Vec<PricePoint>>) -> String {
    format!("{TECHNICAL_INSTRUCTION}{}", history.to_prompt_text())
}

/// Instruction + JSON fundamentals snapshot (or the unavailable marker).
pub fn fundamentals_prompt(fundamentals: &Fetched<FundamentalsSnapshot>) -> String {
    format!("{FUNDAMENTALS_INSTRUCTION}{}", fundamentals.to_prompt_text())
}
