// =============================================================================
// Binance USDⓈ-M Futures REST Client: public market data
// =============================================================================
//
// Only unsigned endpoints are used: klines and the 24h ticker. Every request
// is checked against the shared `RateLimitTracker` first and feeds the
// returned weight header back into it.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::rate_limit::{RateLimitTracker, KLINES_WEIGHT, TICKER_WEIGHT};
use crate::types::Candle;

pub const FUTURES_BASE_URL: &str = "https://fapi.binance.com";

/// Attempts made by [`fetch_klines_with_retry`].
pub const FETCH_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// 24h rolling ticker for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    #[serde(rename = "high24h")]
    pub high_24h: f64,
    #[serde(rename = "low24h")]
    pub low_24h: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
}

#[derive(Clone)]
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    rate_limit: Arc<RateLimitTracker>,
}

impl BinanceClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(FUTURES_BASE_URL)
    }

    /// Client against another host (testnet, local mock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(%base_url, "BinanceClient initialised");

        Ok(Self {
            base_url,
            client,
            rate_limit: Arc::new(RateLimitTracker::new()),
        })
    }

    pub fn rate_limit(&self) -> &Arc<RateLimitTracker> {
        &self.rate_limit
    }

    /// GET /fapi/v1/klines.
    #[instrument(skip(self), name = "binance::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        let body = self.get_json(&url, KLINES_WEIGHT).await?;
        let candles = parse_klines(&body)?;

        debug!(symbol, interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }

    /// GET /fapi/v1/ticker/24hr for a single symbol.
    #[instrument(skip(self), name = "binance::get_ticker")]
    pub async fn get_ticker(&self, symbol: &str) -> Result<Ticker> {
        let url = format!("{}/fapi/v1/ticker/24hr?symbol={}", self.base_url, symbol);
        let body = self.get_json(&url, TICKER_WEIGHT).await?;
        let ticker = parse_ticker(&body)?;

        debug!(symbol, price = ticker.price, "ticker fetched");
        Ok(ticker)
    }

    async fn get_json(&self, url: &str, weight: u32) -> Result<serde_json::Value> {
        if !self.rate_limit.can_send_request(weight) {
            anyhow::bail!("request weight budget exhausted, retry after the minute rolls over");
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} request failed"))?;

        self.rate_limit.update_from_headers(resp.headers());

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse response from {url}"))?;

        if !status.is_success() {
            anyhow::bail!("Binance GET {} returned {}: {}", url, status, body);
        }
        Ok(body)
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

/// Fetch klines, retrying transient failures with a fixed back-off.
pub async fn fetch_klines_with_retry(
    client: &BinanceClient,
    symbol: &str,
    interval: &str,
    limit: u32,
) -> Result<Vec<Candle>> {
    let mut attempt = 1;
    loop {
        match client.get_klines(symbol, interval, limit).await {
            Ok(candles) => return Ok(candles),
            Err(e) if attempt < FETCH_ATTEMPTS => {
                warn!(symbol, interval, attempt, error = %e, "kline fetch failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("klines for {symbol} {interval} failed after {FETCH_ATTEMPTS} attempts")
                })
            }
        }
    }
}

/// Parse Binance's array-of-arrays kline payload.
///
/// Array indices: [0] openTime (ms), [1] open, [2] high, [3] low, [4] close,
/// [5] volume. `time` is stored in seconds; open times must strictly
/// increase.
pub fn parse_klines(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let raw = body.as_array().context("klines response is not an array")?;

    let mut candles: Vec<Candle> = Vec::with_capacity(raw.len());
    for entry in raw {
        let arr = entry.as_array().context("kline entry is not an array")?;
        if arr.len() < 6 {
            warn!("skipping malformed kline entry with {} elements", arr.len());
            continue;
        }

        let open_time_ms = arr[0].as_i64().context("kline open time is not an integer")?;
        let candle = Candle::new(
            open_time_ms / 1000,
            parse_str_f64(&arr[1])?,
            parse_str_f64(&arr[2])?,
            parse_str_f64(&arr[3])?,
            parse_str_f64(&arr[4])?,
            parse_str_f64(&arr[5])?,
        );

        if let Some(prev) = candles.last() {
            if candle.time <= prev.time {
                anyhow::bail!(
                    "kline times not strictly increasing ({} after {})",
                    candle.time,
                    prev.time
                );
            }
        }
        candles.push(candle);
    }

    Ok(candles)
}

/// Parse the `/fapi/v1/ticker/24hr` payload.
pub fn parse_ticker(body: &serde_json::Value) -> Result<Ticker> {
    let field = |name: &str| -> Result<f64> {
        parse_str_f64(&body[name]).with_context(|| format!("ticker field '{name}'"))
    };

    Ok(Ticker {
        symbol: body["symbol"]
            .as_str()
            .context("ticker response missing 'symbol'")?
            .to_string(),
        price: field("lastPrice")?,
        price_change: field("priceChange")?,
        price_change_percent: field("priceChangePercent")?,
        high_24h: field("highPrice")?,
        low_24h: field("lowPrice")?,
        volume_24h: field("volume")?,
    })
}

/// Parse a JSON value that may be either a string or a number into a finite
/// `f64`. `"NaN"` and `"inf"` are rejected.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    let n = if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))?
    } else if let Some(n) = val.as_f64() {
        n
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    };
    if !n.is_finite() {
        anyhow::bail!("non-finite number: {val}");
    }
    Ok(n)
}
