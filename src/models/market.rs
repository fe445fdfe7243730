//! # models::market
//!
//! Market data handed from the quotes provider to the narrative prompts.
//!
//! Nothing here outlives a single webhook event.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Text that stands in for missing data inside a prompt.
pub const UNAVAILABLE_MARKER: &str = "undefined";

// ─── PricePoint ───────────────────────────────────────────────────────────────

/// One daily OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date:  NaiveDate,
    pub open:  f64,
    pub high:  f64,
    pub low:   f64,
    pub close: f64,
}

// ─── FundamentalsSnapshot ─────────────────────────────────────────────────────

/// Point-in-time company metrics projected out of the provider's summary
/// modules.  Field names serialise in camelCase, which is also what the
/// financial-report prompt shows to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundamentalsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_high_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_low_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mean_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_analyst_opinions: Option<u32>,
    /// 1.0 = strong buy ... 5.0 = sell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_per_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_on_assets: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_on_equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_profits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_margins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_margins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_margins: Option<f64>,

    /// Actual EPS per reported quarter, keyed by the provider's quarter label
    /// (`"1Q2024"`, `"2Q2024"`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub quarterly_earnings: BTreeMap<String, f64>,
}

// ─── Fetched ──────────────────────────────────────────────────────────────────

/// Result of a provider read whose failure must not abort the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Available(T),
    /// The provider call failed; the error has already been logged.
    Unavailable,
}

impl<T: Serialize> Fetched<T> {
    /// Compact JSON for embedding in a prompt, or [`UNAVAILABLE_MARKER`].
    pub fn to_prompt_text(&self) -> String {
        match self {
            Fetched::Available(v) => {
                serde_json::to_string(v).unwrap_or_else(|_| UNAVAILABLE_MARKER.to_string())
            }
            Fetched::Unavailable => UNAVAILABLE_MARKER.to_string(),
        }
    }
}
