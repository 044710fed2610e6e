// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   k     = 2 / (period + 1)
//   EMA_t = price_t * k + EMA_{t-1} * (1 - k)
//
// The first EMA value is seeded with the SMA of the first `period` prices, and
// the whole series is recomputed from the full history on every call.
// =============================================================================

/// Compute the EMA series for `prices` and look-back `period`.
///
/// Element `i` of the result corresponds to `prices[i + period - 1]`, so the
/// value for any prefix `prices[..n]` (n >= period) is `series[n - period]`.
///
/// Returns an empty `Vec` when `period == 0` or `prices.len() < period`.
/// A non-finite price propagates into every later value.
pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period + 1) as f64;

    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(prices.len() - period + 1);
    result.push(seed);

    let mut prev = seed;
    for &price in &prices[period..] {
        let ema = price * k + prev * (1.0 - k);
        result.push(ema);
        prev = ema;
    }

    result
}

/// Most recent EMA value, or `0.0` when there are fewer than `period` prices.
///
/// # Panics
/// When `period` is zero.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    assert!(period >= 1, "EMA period must be >= 1");
    calculate_ema(prices, period).last().copied().unwrap_or(0.0)
}
