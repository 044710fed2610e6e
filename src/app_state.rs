// =============================================================================
// Central Application State: CoinLens
// =============================================================================
//
// Owned by `main` and shared as `Arc<AppState>` between the HTTP handlers and
// the refresh task. Holds the user's selection (timeframe, coin), a kline
// cache keyed by (symbol, interval) and a version counter bumped on every
// mutation. The analysis pipeline never reads from here; handlers pass it
// plain candle slices.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for every mutable collection.
//   - No lock is held across an `.await`.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::binance::{fetch_klines_with_retry, BinanceClient, RateLimitSnapshot};
use crate::runtime_config::RuntimeConfig;
use crate::types::{Candle, TimeFrame};

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded failure (refresh loop, upstream fetch) for the state endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// Kline cache
// =============================================================================

#[derive(Debug, Clone)]
struct CachedKlines {
    candles: Arc<Vec<Candle>>,
    fetched_at: Instant,
}

/// Cache entry as reported by [`AppState::build_snapshot`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntrySummary {
    pub symbol: String,
    pub interval: String,
    pub candles: usize,
    pub age_secs: u64,
}

// =============================================================================
// AppState
// =============================================================================

pub struct AppState {
    /// Bumped after every mutation of the selection or the cache.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    selected_timeframe: RwLock<TimeFrame>,
    selected_coin: RwLock<Option<String>>,

    kline_cache: RwLock<HashMap<(String, String), CachedKlines>>,
    cache_ttl: Duration,

    recent_errors: RwLock<Vec<ErrorRecord>>,

    pub client: BinanceClient,
    start_time: Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, client: BinanceClient) -> Self {
        let cache_ttl = Duration::from_secs(config.cache_ttl_secs);
        info!(
            cache_ttl_secs = config.cache_ttl_secs,
            symbols = ?config.symbols,
            "AppState initialised"
        );

        Self {
            state_version: AtomicU64::new(0),
            runtime_config: Arc::new(RwLock::new(config)),
            selected_timeframe: RwLock::new(TimeFrame::default()),
            selected_coin: RwLock::new(None),
            kline_cache: RwLock::new(HashMap::new()),
            cache_ttl,
            recent_errors: RwLock::new(Vec::new()),
            client,
            start_time: Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version, returning the previous value.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn selected_timeframe(&self) -> TimeFrame {
        *self.selected_timeframe.read()
    }

    pub fn set_selected_timeframe(&self, timeframe: TimeFrame) {
        *self.selected_timeframe.write() = timeframe;
        self.increment_version();
        debug!(%timeframe, "selected timeframe changed");
    }

    pub fn selected_coin(&self) -> Option<String> {
        self.selected_coin.read().clone()
    }

    /// `None` clears the selection.
    pub fn set_selected_coin(&self, coin: Option<String>) {
        debug!(coin = ?coin, "selected coin changed");
        *self.selected_coin.write() = coin;
        self.increment_version();
    }

    // ── Kline cache ─────────────────────────────────────────────────────

    /// Cached candles for `(symbol, interval)` if they are younger than the
    /// TTL and hold at least `limit` candles. Returns the last `limit`.
    pub fn cached_klines(&self, symbol: &str, interval: &str, limit: usize) -> Option<Vec<Candle>> {
        let cache = self.kline_cache.read();
        let entry = cache.get(&(symbol.to_string(), interval.to_string()))?;
        if entry.fetched_at.elapsed() >= self.cache_ttl || entry.candles.len() < limit {
            return None;
        }
        let start = entry.candles.len() - limit;
        Some(entry.candles[start..].to_vec())
    }

    pub fn store_klines(&self, symbol: &str, interval: &str, candles: Vec<Candle>) {
        let count = candles.len();
        self.kline_cache.write().insert(
            (symbol.to_string(), interval.to_string()),
            CachedKlines {
                candles: Arc::new(candles),
                fetched_at: Instant::now(),
            },
        );
        self.increment_version();
        debug!(symbol, interval, count, "klines cached");
    }

    /// Serve from cache when fresh, otherwise fetch (with retry) and cache.
    pub async fn get_or_fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        if let Some(candles) = self.cached_klines(symbol, interval, limit as usize) {
            debug!(symbol, interval, "kline cache hit");
            return Ok(candles);
        }

        let candles = fetch_klines_with_retry(&self.client, symbol, interval, limit).await?;
        self.store_klines(symbol, interval, candles.clone());
        Ok(candles)
    }

    /// Drop entries older than the TTL. Returns how many were removed.
    pub fn evict_stale_klines(&self) -> usize {
        let mut cache = self.kline_cache.write();
        let before = cache.len();
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.cache_ttl);
        let removed = before - cache.len();
        if removed > 0 {
            debug!(removed, "stale kline cache entries evicted");
        }
        removed
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message; the oldest entry is evicted past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable view served by `GET /api/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();

        let mut cache: Vec<CacheEntrySummary> = self
            .kline_cache
            .read()
            .iter()
            .map(|((symbol, interval), entry)| CacheEntrySummary {
                symbol: symbol.clone(),
                interval: interval.clone(),
                candles: entry.candles.len(),
                age_secs: entry.fetched_at.elapsed().as_secs(),
            })
            .collect();
        cache.sort_by(|a, b| (&a.symbol, &a.interval).cmp(&(&b.symbol, &b.interval)));

        StateSnapshot {
            state_version: self.current_state_version(),
            selected_timeframe: self.selected_timeframe(),
            selected_coin: self.selected_coin(),
            symbols: config.symbols.clone(),
            cache,
            rate_limit: self.client.rate_limit().snapshot(),
            recent_errors: self.recent_errors(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            server_time: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub state_version: u64,
    pub selected_timeframe: TimeFrame,
    pub selected_coin: Option<String>,
    pub symbols: Vec<String>,
    pub cache: Vec<CacheEntrySummary>,
    pub rate_limit: RateLimitSnapshot,
    pub recent_errors: Vec<ErrorRecord>,
    pub uptime_secs: u64,
    /// Epoch milliseconds.
    pub server_time: i64,
}
