//! # engine::market
//!
//! **Market Data Fetcher**: history first, fundamentals second.
//!
//! Provider failures never abort the pipeline: each one is logged and turns
//! into [`Fetched::Unavailable`], which the prompts render as `undefined`.

use chrono::{Months, NaiveDate};
use tracing::{debug, error, info};

use crate::models::{Fetched, FundamentalsSnapshot, PricePoint};
use crate::quotes::QuoteProvider;

/// Length of the trailing K-line window.
pub const HISTORY_MONTHS: u32 = 2;

/// Both reads for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub history:      Fetched<Vec<PricePoint>>,
    pub fundamentals: Fetched<FundamentalsSnapshot>,
}

/// `[today − 2 months, today]`.  Month arithmetic clamps to the last valid
/// day (e.g. 30 Apr → 29 Feb in a leap year).
pub fn history_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from = today
        .checked_sub_months(Months::new(HISTORY_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    (from, today)
}

pub async fn fetch_market_data(
    quotes: &dyn QuoteProvider,
    ticker: &str,
    today: NaiveDate,
) -> MarketData {
    let history = fetch_history(quotes, ticker, today).await;
    let fundamentals = fetch_fundamentals(quotes, ticker).await;
    MarketData { history, fundamentals }
}

pub async fn fetch_history(
    quotes: &dyn QuoteProvider,
    ticker: &str,
    today: NaiveDate,
) -> Fetched<Vec<PricePoint>> {
    let (from, to) = history_window(today);

    match quotes.history(ticker, from, to).await {
        Ok(mut points) => {
            points.retain(|p| p.date >= from && p.date <= to);
            points.sort_by_key(|p| p.date);

            info!(ticker, points = points.len(), %from, %to, "📈 Price history fetched");
            debug!(
                ticker,
                history = %serde_json::to_string_pretty(&points).unwrap_or_default(),
                "historical data"
            );
            Fetched::Available(points)
        }
        Err(e) => {
            error!(ticker, error = %format!("{e:#}"), "Error fetching historical data");
            Fetched::Unavailable
        }
    }
}

pub async fn fetch_fundamentals(
    quotes: &dyn QuoteProvider,
    ticker: &str,
) -> Fetched<FundamentalsSnapshot> {
    match quotes.fundamentals(ticker).await {
        Ok(snapshot) => {
            info!(
                ticker,
                company = snapshot.company_name.as_deref().unwrap_or("?"),
                quarters = snapshot.quarterly_earnings.len(),
                "📊 Fundamentals fetched"
            );
            debug!(
                ticker,
                fundamentals = %serde_json::to_string_pretty(&snapshot).unwrap_or_default(),
                "stock data"
            );
            Fetched::Available(snapshot)
        }
        Err(e) => {
            error!(ticker, error = %format!("{e:#}"), "Error fetching fundamentals");
            Fetched::Unavailable
        }
    }
}
