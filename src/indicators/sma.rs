// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA = (p_{n-period} + ... + p_{n-1}) / period
//
// Only the most recent `period` values contribute.
// =============================================================================

/// Mean of the last `period` values.
///
/// Returns `0.0` (the insufficient-data sentinel) when `prices.len() < period`.
///
/// # Panics
/// When `period` is zero.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    assert!(period >= 1, "SMA period must be >= 1");
    if prices.len() < period {
        return 0.0;
    }
    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}
