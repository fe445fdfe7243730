//! # quotes::yahoo: Yahoo Finance client
//!
//! Two endpoints are used:
//!
//! | Data         | Endpoint                                   | Auth         |
//! |--------------|--------------------------------------------|--------------|
//! | Daily OHLC   | `/v8/finance/chart/{ticker}`               | none         |
//! | Fundamentals | `/v10/finance/quoteSummary/{ticker}`       | cookie+crumb |
//!
//! quoteSummary only answers requests that carry the session cookie from
//! `fc.yahoo.com` *and* a crumb obtained with that cookie.  The crumb is
//! cached until Yahoo rejects it, then refreshed once per failing call.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use reqwest::{header::REFERER, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::QuoteProvider;
use crate::models::{FundamentalsSnapshot, PricePoint};

pub const DEFAULT_QUERY_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData,earnings,defaultKeyStatistics";

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct YahooClient {
    /// Own client: the cookie jar must not leak into LINE / OpenAI calls.
    http:       reqwest::Client,
    query_base: String,
    cookie_url: String,
    timeout:    Duration,
    crumb:      RwLock<Option<String>>,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_endpoints(DEFAULT_QUERY_BASE_URL, DEFAULT_COOKIE_URL, timeout)
    }

    pub fn with_endpoints(
        query_base: impl Into<String>,
        cookie_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("Failed to build Yahoo HTTP client")?;

        Ok(Self {
            http,
            query_base: query_base.into(),
            cookie_url: cookie_url.into(),
            timeout,
            crumb: RwLock::new(None),
        })
    }

    async fn crumb(&self) -> anyhow::Result<String> {
        if let Some(crumb) = self.crumb.read().await.clone() {
            return Ok(crumb);
        }

        let mut guard = self.crumb.write().await;
        // another event may have refreshed it while we waited for the lock
        if let Some(crumb) = guard.clone() {
            return Ok(crumb);
        }

        let fresh = self.fetch_crumb().await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch_crumb(&self) -> anyhow::Result<String> {
        // fc.yahoo.com answers 404 but still sets the session cookie
        self.http
            .get(&self.cookie_url)
            .header(REFERER, "https://finance.yahoo.com/")
            .timeout(self.timeout)
            .send()
            .await
            .context("Yahoo cookie endpoint unreachable")?;

        let resp = self
            .http
            .get(format!("{}/v1/test/getcrumb", self.query_base))
            .header(REFERER, "https://finance.yahoo.com/")
            .timeout(self.timeout)
            .send()
            .await
            .context("Yahoo crumb endpoint unreachable")?;

        let status = resp.status();
        let body = resp.text().await.context("Failed to read Yahoo crumb")?;
        let crumb = body.trim();

        if !status.is_success()
            || crumb.is_empty()
            || crumb.len() >= 100
            || crumb.contains('<')
            || crumb.contains(' ')
        {
            bail!("Yahoo returned no usable crumb (HTTP {status})");
        }

        debug!("Yahoo crumb refreshed");
        Ok(crumb.to_string())
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.write().await = None;
    }

    async fn request_summary(&self, ticker: &str) -> anyhow::Result<reqwest::Response> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.query_base,
            urlencoding::encode(ticker),
            SUMMARY_MODULES,
            urlencoding::encode(&crumb),
        );

        self.http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .context("Yahoo quoteSummary unreachable")
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn history(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>> {
        // period2 is exclusive
        let until = to.checked_add_days(Days::new(1)).unwrap_or(to);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.query_base,
            urlencoding::encode(ticker),
            midnight_utc(from),
            midnight_utc(until),
        );

        let resp = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .context("Yahoo chart unreachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Yahoo chart error {status}: {body}");
        }

        let chart: ChartResponse = resp.json().await.context("Yahoo chart parse error")?;
        parse_chart(chart)
    }

    async fn fundamentals(&self, ticker: &str) -> anyhow::Result<FundamentalsSnapshot> {
        let mut resp = self.request_summary(ticker).await?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(ticker, status = %resp.status(), "Yahoo crumb rejected, refreshing once");
            self.invalidate_crumb().await;
            resp = self.request_summary(ticker).await?;
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Yahoo quoteSummary error {status}: {body}");
        }

        let summary: QuoteSummaryResponse =
            resp.json().await.context("Yahoo quoteSummary parse error")?;
        parse_summary(summary)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

// ─── Chart payload ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error:  Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta:       Option<ChartMeta>,
    #[serde(default)]
    timestamp:  Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (28800 for Taipei).
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open:  Vec<Option<f64>>,
    #[serde(default)]
    high:  Vec<Option<f64>>,
    #[serde(default)]
    low:   Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code:        String,
    #[serde(default)]
    description: String,
}

/// Rows with any missing price are dropped; the result is sorted oldest
/// first with one bar per exchange-local date.
fn parse_chart(chart: ChartResponse) -> anyhow::Result<Vec<PricePoint>> {
    if let Some(err) = chart.chart.error {
        bail!("Yahoo chart error {}: {}", err.code, err.description);
    }

    let result = chart
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("Yahoo chart returned no result")?;

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(PricePoint {
                date:  DateTime::from_timestamp(ts + offset, 0)?.date_naive(),
                open:  value_at(&quote.open, i)?,
                high:  value_at(&quote.high, i)?,
                low:   value_at(&quote.low, i)?,
                close: value_at(&quote.close, i)?,
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}

fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten().filter(|v| v.is_finite())
}

// ─── quoteSummary payload ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error:  Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price:          Option<PriceModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    earnings:       Option<EarningsModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name:            Option<String>,
    short_name:           Option<String>,
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialDataModule {
    target_high_price:          Option<RawValue>,
    target_low_price:           Option<RawValue>,
    target_mean_price:          Option<RawValue>,
    number_of_analyst_opinions: Option<RawValue>,
    recommendation_mean:        Option<RawValue>,
    revenue_per_share:          Option<RawValue>,
    return_on_assets:           Option<RawValue>,
    return_on_equity:           Option<RawValue>,
    gross_profits:              Option<RawValue>,
    gross_margins:              Option<RawValue>,
    ebitda_margins:             Option<RawValue>,
    operating_margins:          Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsModule {
    #[serde(default)]
    earnings_chart: Option<EarningsChart>,
}

#[derive(Debug, Deserialize)]
struct EarningsChart {
    #[serde(default)]
    quarterly: Vec<QuarterlyEarnings>,
}

#[derive(Debug, Deserialize)]
struct QuarterlyEarnings {
    /// Quarter label such as `"1Q2024"`.
    #[serde(default)]
    date:   Option<String>,
    #[serde(default)]
    actual: Option<RawValue>,
}

/// Yahoo wraps numbers as `{ "raw": 1.5, "fmt": "1.50" }` (or `{}` when
/// missing) unless `formatted=false` is requested; accept both shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Plain(f64),
    Wrapped {
        #[serde(default)]
        raw: Option<f64>,
    },
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    let number = match value? {
        RawValue::Plain(v) => Some(v),
        RawValue::Wrapped { raw } => raw,
    };
    number.filter(|v| v.is_finite())
}

fn parse_summary(summary: QuoteSummaryResponse) -> anyhow::Result<FundamentalsSnapshot> {
    if let Some(err) = summary.quote_summary.error {
        bail!("Yahoo quoteSummary error {}: {}", err.code, err.description);
    }

    let result = summary
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .context("Yahoo quoteSummary returned no result")?;

    let price = result.price.unwrap_or_default();
    let fin = result.financial_data.unwrap_or_default();

    let quarterly_earnings = result
        .earnings
        .and_then(|e| e.earnings_chart)
        .map(|chart| chart.quarterly)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|q| Some((q.date?, raw(q.actual)?)))
        .collect();

    Ok(FundamentalsSnapshot {
        company_name:               price.long_name.or(price.short_name),
        current_price:              raw(price.regular_market_price),
        target_high_price:          raw(fin.target_high_price),
        target_low_price:           raw(fin.target_low_price),
        target_mean_price:          raw(fin.target_mean_price),
        number_of_analyst_opinions: raw(fin.number_of_analyst_opinions)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u32),
        recommendation_mean:        raw(fin.recommendation_mean),
        revenue_per_share:          raw(fin.revenue_per_share),
        return_on_assets:           raw(fin.return_on_assets),
        return_on_equity:           raw(fin.return_on_equity),
        gross_profits:              raw(fin.gross_profits),
        gross_margins:              raw(fin.gross_margins),
        ebitda_margins:             raw(fin.ebitda_margins),
        operating_margins:          raw(fin.operating_margins),
        quarterly_earnings,
    })
}
