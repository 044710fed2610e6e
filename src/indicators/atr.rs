// =============================================================================
// Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// ATR% = ATR / lastClose * 100, bucketed into a volatility class:
//   < 2 low, < 4 medium, < 7 high, otherwise extreme.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
    Extreme,
}

impl Volatility {
    /// Classify an ATR percentage. Bucket bounds are lower-inclusive.
    pub fn from_atr_percent(atr_percent: f64) -> Self {
        if atr_percent < 2.0 {
            Self::Low
        } else if atr_percent < 4.0 {
            Self::Medium
        } else if atr_percent < 7.0 {
            Self::High
        } else {
            Self::Extreme
        }
    }
}

impl Default for Volatility {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtrData {
    pub atr: f64,
    pub atr_percent: f64,
    pub volatility: Volatility,
}

/// True Range of every candle after the first.
fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let prev_close = w[0].close;
            let hl = w[1].high - w[1].low;
            let hc = (w[1].high - prev_close).abs();
            let lc = (w[1].low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Most recent Wilder ATR value.
///
/// Returns `None` when `period` is zero, there are fewer than `period + 1`
/// candles, or any intermediate value is non-finite.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let tr_values = true_ranges(candles);

    let seed: f64 = tr_values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return None;
    }

    let period_f = period as f64;
    let mut atr = seed;
    for &tr in &tr_values[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            return None;
        }
    }

    Some(atr)
}

/// ATR with its percentage of the last close and the volatility class.
///
/// Falls back to `{0, 0, medium}` when the ATR cannot be computed.
///
/// # Panics
/// When `period` is zero.
pub fn atr(candles: &[Candle], period: usize) -> AtrData {
    assert!(period >= 1, "ATR period must be >= 1");

    let (Some(atr), Some(last)) = (calculate_atr(candles, period), candles.last()) else {
        return AtrData::default();
    };

    let atr_percent = if last.close != 0.0 {
        atr / last.close * 100.0
    } else {
        0.0
    };

    AtrData {
        atr,
        atr_percent,
        volatility: Volatility::from_atr_percent(atr_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, open, high, low, close, 100.0)
    }

    #[test]
    fn atr_insufficient_data() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 14];
        assert!(calculate_atr(&candles, 14).is_none());
        assert_eq!(atr(&candles, 14), AtrData::default());
        assert_eq!(atr(&[], 14).volatility, Volatility::Medium);
    }

    #[test]
    fn atr_exact_minimum_data() {
        // TR: 5, 6, 6
        let candles = vec![
            candle(100.0, 102.0, 98.0, 101.0),
            candle(101.0, 104.0, 99.0, 103.0),
            candle(103.0, 106.0, 100.0, 105.0),
            candle(105.0, 108.0, 102.0, 107.0),
        ];
        let value = calculate_atr(&candles, 3).unwrap();
        assert!((value - 17.0 / 3.0).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        let candles = vec![
            candle(100.0, 105.0, 95.0, 95.0),
            candle(110.0, 115.0, 108.0, 112.0), // |115 - 95| = 20
            candle(112.0, 118.0, 110.0, 115.0),
            candle(115.0, 120.0, 113.0, 118.0),
        ];
        let value = calculate_atr(&candles, 3).unwrap();
        assert!(value > 7.0, "ATR should reflect the gap, got {value}");
    }

    #[test]
    fn atr_wilder_smoothing_alternating_ranges() {
        // TR alternates 3, 1 from the second candle; seed over 14 TRs is 2.
        let candles: Vec<Candle> = (0..17)
            .map(|i| {
                if i % 2 == 1 {
                    candle(100.0, 101.5, 98.5, 100.0)
                } else {
                    candle(100.0, 100.5, 99.5, 100.0)
                }
            })
            .collect();
        let data = atr(&candles, 14);
        let expected = 391.0 / 196.0;
        assert!((data.atr - expected).abs() < 1e-12, "got {}", data.atr);
        assert!((data.atr_percent - expected).abs() < 1e-12);
        assert_eq!(data.volatility, Volatility::Low);
    }

    #[test]
    fn volatility_buckets_are_lower_inclusive() {
        assert_eq!(Volatility::from_atr_percent(0.0), Volatility::Low);
        assert_eq!(Volatility::from_atr_percent(1.99), Volatility::Low);
        assert_eq!(Volatility::from_atr_percent(2.0), Volatility::Medium);
        assert_eq!(Volatility::from_atr_percent(3.99), Volatility::Medium);
        assert_eq!(Volatility::from_atr_percent(4.0), Volatility::High);
        assert_eq!(Volatility::from_atr_percent(6.99), Volatility::High);
        assert_eq!(Volatility::from_atr_percent(7.0), Volatility::Extreme);
    }

    #[test]
    #[should_panic(expected = "ATR period must be >= 1")]
    fn atr_zero_period_panics() {
        atr(&[], 0);
    }
}
