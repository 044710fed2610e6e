// =============================================================================
// Trend Classification
// =============================================================================
//
// Points per side:
//   EMA7 > EMA20 > EMA50 (or fully reversed)   2
//   EMA7 vs EMA20                              1
//   RSI > 60 / RSI < 40                        1
//
// A side with 3 or more points wins; everything else is neutral.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::ema;
use super::rsi::{rsi, RSI_NEUTRAL};
use crate::types::{closes, Candle, Trend};

const TREND_THRESHOLD: u32 = 3;

/// EMA/RSI snapshot of the full candle history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    pub ema7: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi: f64,
    pub trend: Trend,
}

impl Default for TechnicalAnalysis {
    fn default() -> Self {
        Self {
            ema7: 0.0,
            ema20: 0.0,
            ema50: 0.0,
            rsi: RSI_NEUTRAL,
            trend: Trend::Neutral,
        }
    }
}

pub fn determine_trend(ema7: f64, ema20: f64, ema50: f64, rsi: f64) -> Trend {
    let mut bullish = 0;
    let mut bearish = 0;

    if ema7 > ema20 && ema20 > ema50 {
        bullish += 2;
    } else if ema7 < ema20 && ema20 < ema50 {
        bearish += 2;
    }

    if ema7 > ema20 {
        bullish += 1;
    } else if ema7 < ema20 {
        bearish += 1;
    }

    if rsi > 60.0 {
        bullish += 1;
    } else if rsi < 40.0 {
        bearish += 1;
    }

    if bullish >= TREND_THRESHOLD {
        Trend::Bullish
    } else if bearish >= TREND_THRESHOLD {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// EMA 7/20/50 and RSI over the given RSI period, plus the derived trend.
pub fn calculate_technical_analysis(candles: &[Candle], rsi_period: usize) -> TechnicalAnalysis {
    let prices = closes(candles);

    let ema7 = ema(&prices, 7);
    let ema20 = ema(&prices, 20);
    let ema50 = ema(&prices, 50);
    let rsi = rsi(&prices, rsi_period);

    TechnicalAnalysis {
        ema7,
        ema20,
        ema50,
        rsi,
        trend: determine_trend(ema7, ema20, ema50, rsi),
    }
}
