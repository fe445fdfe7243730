//! # quotes: market data provider seam

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{FundamentalsSnapshot, PricePoint};

pub mod yahoo;

pub use yahoo::YahooClient;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Daily OHLC bars for `ticker` between `from` and `to` (both inclusive).
    async fn history(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>>;

    /// Company name, analyst targets, margins, returns and quarterly EPS.
    async fn fundamentals(&self, ticker: &str) -> anyhow::Result<FundamentalsSnapshot>;
}
