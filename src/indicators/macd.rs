// =============================================================================
// MACD: Moving Average Convergence / Divergence
// =============================================================================
//
//   macd_line   = EMA(fast) - EMA(slow)
//   signal_line = EMA(signal) of the MACD history
//   histogram   = macd_line - signal_line
//
// The MACD history holds one value per prefix length `slow..=n`. Every prefix
// EMA shares the SMA seed of the first `period` prices, so the prefix value
// equals the matching element of the full EMA series and the history is read
// off the aligned fast/slow series in one pass.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::{calculate_ema, ema};

/// MACD line crossing its signal line on the latest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crossover {
    Golden,
    Death,
    None,
}

impl Default for Crossover {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdResult {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub crossover: Crossover,
}

/// MACD history: `fast EMA - slow EMA` for every prefix length from `slow`
/// to `prices.len()`.
pub fn macd_history(prices: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_series = calculate_ema(prices, fast);
    let slow_series = calculate_ema(prices, slow);

    (slow.max(fast)..=prices.len())
        .map(|n| fast_series[n - fast] - slow_series[n - slow])
        .collect()
}

/// Compute MACD with crossover detection.
///
/// Returns [`MacdResult::default`] (all zero, no crossover) when
/// `prices.len() < slow + signal`.
///
/// # Panics
/// When any period is zero.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> MacdResult {
    assert!(
        fast >= 1 && slow >= 1 && signal >= 1,
        "MACD periods must be >= 1"
    );
    if prices.len() < slow + signal {
        return MacdResult::default();
    }

    let macd_line = ema(prices, fast) - ema(prices, slow);
    let history = macd_history(prices, fast, slow);

    let signal_line = if history.len() >= signal {
        ema(&history, signal)
    } else {
        macd_line
    };
    let histogram = macd_line - signal_line;

    let crossover = if history.len() >= 2 {
        let prev_macd = history[history.len() - 2];
        let prev_window = &history[..history.len() - 1];
        let prev_signal = if prev_window.len() >= signal {
            ema(prev_window, signal)
        } else {
            prev_macd
        };
        detect_crossover(prev_macd, prev_signal, macd_line, signal_line)
    } else {
        Crossover::None
    };

    MacdResult {
        macd_line,
        signal_line,
        histogram,
        crossover,
    }
}

fn detect_crossover(prev_macd: f64, prev_signal: f64, macd: f64, signal: f64) -> Crossover {
    if prev_macd <= prev_signal && macd > signal {
        Crossover::Golden
    } else if prev_macd >= prev_signal && macd < signal {
        Crossover::Death
    } else {
        Crossover::None
    }
}
