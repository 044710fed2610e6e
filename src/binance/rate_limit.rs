// =============================================================================
// Rate-Limit Tracker: keeps market-data polling clear of 429s
// =============================================================================
//
// USDⓈ-M futures allow 2400 request weight per minute per IP; we hard-cap
// ourselves at 2000. The tracker reads the `X-MBX-USED-WEIGHT-1M` response
// header after every request and keeps an atomic counter that any task may
// query lock-free.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, warn};

/// Hard ceiling at which we refuse to send additional requests.
const WEIGHT_HARD_LIMIT: u32 = 2000;
/// Soft warning threshold.
const WEIGHT_WARN_THRESHOLD: u32 = 1600;

/// Weight of `GET /fapi/v1/klines` for limits in [100, 500).
pub const KLINES_WEIGHT: u32 = 2;
/// Weight of `GET /fapi/v1/ticker/24hr` for a single symbol.
pub const TICKER_WEIGHT: u32 = 1;

pub struct RateLimitTracker {
    used_weight_1m: AtomicU32,
    blocked_requests: AtomicU64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub used_weight_1m: u32,
    pub hard_limit: u32,
    pub blocked_requests: u64,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
            blocked_requests: AtomicU64::new(0),
        }
    }

    /// Record the weight Binance reports in `X-MBX-USED-WEIGHT-1M`.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(weight) = headers
            .get("X-MBX-USED-WEIGHT-1M")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };

        let prev = self.used_weight_1m.swap(weight, Ordering::Relaxed);
        if weight >= WEIGHT_WARN_THRESHOLD && prev < WEIGHT_WARN_THRESHOLD {
            warn!(
                used_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "rate-limit weight crossed warning threshold"
            );
        }
        debug!(used_weight_1m = weight, "rate-limit weight updated from header");
    }

    /// Return `true` if `weight` more request weight stays under the hard
    /// limit. A refusal is counted.
    pub fn can_send_request(&self, weight: u32) -> bool {
        let current = self.used_weight_1m.load(Ordering::Relaxed);
        let allowed = current.saturating_add(weight) <= WEIGHT_HARD_LIMIT;
        if !allowed {
            self.blocked_requests.fetch_add(1, Ordering::Relaxed);
            warn!(
                current_weight = current,
                requested_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "request blocked: would exceed rate limit"
            );
        }
        allowed
    }

    /// Reset the 1-minute weight counter (call from a periodic timer).
    pub fn reset_1m_weight(&self) {
        self.used_weight_1m.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            used_weight_1m: self.used_weight_1m.load(Ordering::Relaxed),
            hard_limit: WEIGHT_HARD_LIMIT,
            blocked_requests: self.blocked_requests.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("used_weight_1m", &self.used_weight_1m.load(Ordering::Relaxed))
            .field("blocked_requests", &self.blocked_requests.load(Ordering::Relaxed))
            .finish()
    }
}
