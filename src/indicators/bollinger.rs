// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA(period), upper / lower = middle ± k·σ where σ is the
// population standard deviation over the same window.
//
//   bandwidth = (upper - lower) / middle * 100
//   %B        = (last - lower) / (upper - lower) * 100
//
// %B is not clamped: it leaves [0, 100] whenever price closes outside the
// bands.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub bandwidth: f64,
    pub percent_b: f64,
}

impl BollingerBands {
    /// Collapsed bands at `price`, used when there is not enough data.
    pub fn degenerate(price: f64) -> Self {
        Self {
            upper: price,
            middle: price,
            lower: price,
            bandwidth: 0.0,
            percent_b: 50.0,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::degenerate(0.0)
    }
}

/// Calculate Bollinger Bands over the last `period` prices.
///
/// With fewer than `period` prices every band equals the last available price
/// (0 for an empty slice) and %B is 50.
///
/// # Panics
/// When `period` is zero.
pub fn calculate_bollinger(prices: &[f64], period: usize, num_std: f64) -> BollingerBands {
    assert!(period >= 1, "Bollinger period must be >= 1");

    let last = prices.last().copied().unwrap_or(0.0);
    if prices.len() < period {
        return BollingerBands::degenerate(last);
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;

    let bandwidth = if middle != 0.0 {
        (upper - lower) / middle * 100.0
    } else {
        0.0
    };

    let percent_b = if upper == lower {
        50.0
    } else {
        (last - lower) / (upper - lower) * 100.0
    };

    BollingerBands {
        upper,
        middle,
        lower,
        bandwidth,
        percent_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let prices: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&prices, 20, 2.0);
        assert!(bb.upper > bb.middle);
        assert!(bb.lower < bb.middle);
        assert!((bb.middle - 10.5).abs() < 1e-12);
        assert!(bb.bandwidth > 0.0);
        assert!(bb.percent_b > 50.0 && bb.percent_b < 100.0);
    }

    #[test]
    fn bollinger_population_std_dev() {
        // Mean 5, squared deviations sum to 32 over 8 values -> sigma = 2.
        let prices = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bb = calculate_bollinger(&prices, 8, 2.0);
        assert!((bb.middle - 5.0).abs() < 1e-12);
        assert!((bb.upper - 9.0).abs() < 1e-12);
        assert!((bb.lower - 1.0).abs() < 1e-12);
        assert!((bb.bandwidth - 160.0).abs() < 1e-9);
        assert!((bb.percent_b - 100.0).abs() < 1e-9);
    }

    #[test]
    fn bollinger_insufficient_data_collapses_to_last_price() {
        let bb = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert_eq!(bb, BollingerBands::degenerate(3.0));
        assert_eq!(calculate_bollinger(&[], 20, 2.0), BollingerBands::default());
    }

    #[test]
    fn bollinger_flat_series() {
        let bb = calculate_bollinger(&[100.0; 20], 20, 2.0);
        assert_eq!(bb.upper, 100.0);
        assert_eq!(bb.middle, 100.0);
        assert_eq!(bb.lower, 100.0);
        assert_eq!(bb.bandwidth, 0.0);
        assert_eq!(bb.percent_b, 50.0);
    }

    #[test]
    fn percent_b_is_not_clamped() {
        let mut prices = vec![100.0, 101.0, 99.0, 100.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        prices.push(130.0);
        let bb = calculate_bollinger(&prices, 10, 2.0);
        assert!(bb.percent_b > 100.0, "got {}", bb.percent_b);
    }
}
