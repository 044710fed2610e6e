//! End-to-end runs of the analysis pipeline over synthetic candle series.

use coinlens::analysis::{analyze, AnalysisParams};
use coinlens::indicators::{atr, Crossover, Volatility};
use coinlens::position_sizing::RiskLevel;
use coinlens::signals::{Confidence, SignalAction};
use coinlens::types::{Candle, TimeFrame, Trend};

const HOUR: i64 = 3600;

fn flat_series(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(i as i64 * HOUR, 100.0, 100.0, 100.0, 100.0, 1000.0))
        .collect()
}

/// Closes compound 1% per bar; wicks are too tight to form pivots.
fn compounding_series(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let c = 100.0 * 1.01_f64.powi(i as i32);
            Candle::new(i as i64 * HOUR, c, c * 1.001, c * 0.999, c, 1000.0)
        })
        .collect()
}

/// Close fixed at 100, true range alternating 3 and 1 from the second bar.
fn alternating_range_series(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let (high, low) = if i % 2 == 1 { (101.5, 98.5) } else { (100.5, 99.5) };
            Candle::new(i as i64 * HOUR, 100.0, high, low, 100.0, 1000.0)
        })
        .collect()
}

#[test]
fn flat_market_is_a_hold() {
    let result = analyze(&flat_series(30), TimeFrame::H1, &AnalysisParams::default());

    // avg_loss == 0 reads as fully overbought, even on a flat series.
    assert_eq!(result.analysis.rsi, 100.0);
    assert_eq!(result.analysis.trend, Trend::Neutral);

    assert_eq!(result.bollinger.upper, 100.0);
    assert_eq!(result.bollinger.middle, 100.0);
    assert_eq!(result.bollinger.lower, 100.0);
    assert_eq!(result.bollinger.percent_b, 50.0);

    assert_eq!(result.macd.histogram, 0.0);
    assert_eq!(result.macd.crossover, Crossover::None);

    assert!(result.levels.is_empty());

    let signal = &result.trading_signal;
    assert_eq!(signal.score, -20);
    assert_eq!(signal.action, SignalAction::Hold);
    assert_eq!(signal.confidence, Confidence::Medium);
    assert_eq!(signal.reasons.len(), 1);
    assert_eq!(signal.timestamp, 29 * HOUR);

    assert_eq!(result.position_sizing.base_position, 50.0);
    assert_eq!(result.price_change_24h, 0.0);
}

#[test]
fn steady_uptrend_is_penalised_as_overbought() {
    let result = analyze(&compounding_series(60), TimeFrame::H1, &AnalysisParams::default());

    let ta = &result.analysis;
    assert_eq!(ta.rsi, 100.0);
    assert!(ta.ema7 > ta.ema20 && ta.ema20 > ta.ema50);
    assert_eq!(ta.trend, Trend::Bullish);

    assert!(result.macd.histogram > 0.0);
    assert_eq!(result.macd.crossover, Crossover::None);
    assert!(result.bollinger.percent_b > 90.0);
    assert!(result.levels.is_empty());

    // -20 (RSI) + 10 (MACD momentum) - 20 (upper band)
    let signal = &result.trading_signal;
    assert_eq!(signal.score, -30);
    assert_eq!(signal.action, SignalAction::Sell);
    assert_eq!(signal.confidence, Confidence::Low);
    assert_ne!(signal.action, SignalAction::StrongBuy);

    assert_eq!(result.atr.volatility, Volatility::Low);
    assert!((result.atr.atr_percent - 0.96708).abs() < 1e-4);

    // max(10, 30 - 5 * 0.8) = 26, then x1.2 for low volatility.
    let sizing = &result.position_sizing;
    assert_eq!(sizing.base_position, 26.0);
    assert_eq!(sizing.volatility_adjusted, 31.0);
    assert_eq!(sizing.risk_level, RiskLevel::Conservative);
    assert_eq!(sizing.max_leverage, 5);

    assert!(!result.long_plan.recommended);
    assert!(result.short_plan.position > 0.0);

    // 24 hourly bars back from the last close.
    let expected_change = (1.01_f64.powi(24) - 1.0) * 100.0;
    assert!((result.price_change_24h - expected_change).abs() < 1e-9);
}

#[test]
fn alternating_true_range_atr() {
    let candles = alternating_range_series(17);
    let data = atr(&candles, 14);

    // Seed: seven 3s and seven 1s over TR[1..=14] -> 2.0.
    // TR[15] = 3 -> (2*13 + 3)/14 = 29/14; TR[16] = 1 -> (29/14*13 + 1)/14.
    let expected = (29.0 / 14.0 * 13.0 + 1.0) / 14.0;
    assert!((data.atr - expected).abs() < 1e-12);
    assert!((data.atr - 391.0 / 196.0).abs() < 1e-12);
    assert!((data.atr_percent - 391.0 / 196.0).abs() < 1e-12);
    assert_eq!(data.volatility, Volatility::Low);
}

#[test]
fn volatility_buckets_at_exact_boundaries() {
    assert_eq!(Volatility::from_atr_percent(1.999_999), Volatility::Low);
    assert_eq!(Volatility::from_atr_percent(2.0), Volatility::Medium);
    assert_eq!(Volatility::from_atr_percent(4.0), Volatility::High);
    assert_eq!(Volatility::from_atr_percent(7.0), Volatility::Extreme);
}

#[test]
fn empty_input_yields_documented_defaults() {
    let result = analyze(&[], TimeFrame::H4, &AnalysisParams::default());

    assert_eq!(result.current_price, 0.0);
    assert_eq!(result.analysis.rsi, 50.0);
    assert_eq!(result.trading_signal.action, SignalAction::Hold);
    assert_eq!(result.trading_signal.confidence, Confidence::Medium);
    assert_eq!(result.trading_signal.score, 0);
    assert!(result.trading_signal.reasons.is_empty());
    assert!(result.fibonacci.is_empty());
    assert!(result.levels.is_empty());
    assert_eq!(result.atr.volatility, Volatility::Medium);
    assert_eq!(result.volume.volume_ratio, 1.0);
}
