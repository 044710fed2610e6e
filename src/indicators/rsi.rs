// =============================================================================
// Relative Strength Index (RSI): Wilder's Smoothing
// =============================================================================
//
// Step 1: Compute price changes from consecutive prices.
// Step 2: Seed average gain / average loss with the mean of the first
//          `period` gains / losses.
// Step 3: Wilder smoothing over the remaining changes:
//            avg = (prev_avg * (period - 1) + current) / period
// Step 4: RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//
// avg_loss == 0 yields 100, for an all-gain window and for a completely flat
// one alike. Signal scoring depends on that exact sentinel.
// =============================================================================

/// Neutral value returned when there are fewer than `period + 1` prices.
pub const RSI_NEUTRAL: f64 = 50.0;

/// Compute the full RSI series for `prices` and `period`.
///
/// The result has one value per price starting at index `period`.
/// Returns an empty `Vec` when `period == 0` or `prices.len() < period + 1`.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period + 1 {
        return Vec::new();
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..period].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l + d.abs())
        }
    });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    result.push(rsi_from_averages(avg_gain, avg_loss));

    for &delta in &deltas[period..] {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result.push(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

/// Most recent RSI value, or [`RSI_NEUTRAL`] with fewer than `period + 1`
/// prices.
///
/// # Panics
/// When `period` is zero.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    assert!(period >= 1, "RSI period must be >= 1");
    calculate_rsi(prices, period)
        .last()
        .copied()
        .unwrap_or(RSI_NEUTRAL)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_insufficient_data_is_neutral() {
        let prices: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(calculate_rsi(&prices, 14).is_empty());
        assert_eq!(rsi(&prices, 14), RSI_NEUTRAL);
        assert_eq!(rsi(&[], 14), RSI_NEUTRAL);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        for v in calculate_rsi(&prices, 14) {
            assert_eq!(v, 100.0);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let prices: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        for v in calculate_rsi(&prices, 14) {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_series_hits_zero_loss_sentinel() {
        let prices = vec![100.0; 30];
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn rsi_hand_computed_period_3() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Seed: gain 0.34/3, loss 0.73/3
        // Smoothed: gain (0.34/3*2 + 0.72)/3, loss (0.73/3*2)/3
        let prices = [44.0, 44.34, 44.09, 43.61, 44.33];
        let gain = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let loss = (0.73 / 3.0 * 2.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + gain / loss);
        assert!((rsi(&prices, 3) - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_range_check() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in calculate_rsi(&prices, 14) {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
