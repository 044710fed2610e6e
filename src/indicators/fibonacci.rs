// =============================================================================
// Fibonacci Retracement
// =============================================================================
//
// Swing high / low over the last `lookback` candles. Each level sits at
//   price = high - (high - low) * ratio
// so the 0% level is the swing high and the 100% level the swing low.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Candle;

/// Standard retracement fractions with their labels, shallowest first.
pub const FIB_RATIOS: [(f64, &str); 7] = [
    (0.0, "0%"),
    (0.236, "23.6%"),
    (0.382, "38.2%"),
    (0.5, "50%"),
    (0.618, "61.8%"),
    (0.786, "78.6%"),
    (1.0, "100%"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    pub ratio: f64,
    /// Percentage label such as `"61.8%"`.
    pub label: String,
    pub price: f64,
}

/// Retracement levels across the recent swing range.
///
/// Returns an empty list when fewer than `lookback` candles are available.
///
/// # Panics
/// When `lookback` is zero.
pub fn fibonacci_levels(candles: &[Candle], lookback: usize) -> Vec<FibonacciLevel> {
    assert!(lookback >= 1, "Fibonacci lookback must be >= 1");
    if candles.len() < lookback {
        return Vec::new();
    }

    let window = &candles[candles.len() - lookback..];
    let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let range = high - low;

    FIB_RATIOS
        .iter()
        .map(|&(ratio, label)| FibonacciLevel {
            ratio,
            label: label.to_string(),
            price: high - range * ratio,
        })
        .collect()
}
