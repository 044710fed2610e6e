// =============================================================================
// Market Analysis: the full indicator → levels → signal → sizing pipeline
// =============================================================================
//
// Every stage is recomputed from the candle slice on each call. An empty
// slice produces the documented default for every field.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{
    analyze_volume, atr, calculate_bollinger, calculate_technical_analysis, fibonacci_levels,
    macd, AtrData, BollingerBands, FibonacciLevel, MacdResult, TechnicalAnalysis,
    VolumeAnalysis,
};
use crate::levels::{find_support_resistance, prices_of, Level, LevelType};
use crate::position_sizing::{calculate_position_sizing, PositionSizing};
use crate::signals::{generate_trading_signal, SignalInput, TradingSignal};
use crate::trade_plan::{plan_long, plan_short, scenarios, DirectionalPlan, ScenarioAnalysis};
use crate::types::{closes, Candle, TimeFrame};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

fn default_rsi_period() -> usize {
    14
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_bollinger_period() -> usize {
    20
}
fn default_bollinger_std_dev() -> f64 {
    2.0
}
fn default_volume_period() -> usize {
    20
}
fn default_fibonacci_lookback() -> usize {
    50
}
fn default_atr_period() -> usize {
    14
}
fn default_pivot_lookback() -> usize {
    crate::levels::DEFAULT_PIVOT_LOOKBACK
}
fn default_cluster_tolerance() -> f64 {
    crate::levels::DEFAULT_CLUSTER_TOLERANCE
}
fn default_min_level_candles() -> usize {
    crate::levels::MIN_CANDLES_FOR_LEVELS
}

/// Indicator periods and level-detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_std_dev")]
    pub bollinger_std_dev: f64,
    #[serde(default = "default_volume_period")]
    pub volume_period: usize,
    #[serde(default = "default_fibonacci_lookback")]
    pub fibonacci_lookback: usize,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default = "default_pivot_lookback")]
    pub pivot_lookback: usize,
    #[serde(default = "default_cluster_tolerance")]
    pub cluster_tolerance: f64,
    #[serde(default = "default_min_level_candles")]
    pub min_level_candles: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_std_dev: default_bollinger_std_dev(),
            volume_period: default_volume_period(),
            fibonacci_lookback: default_fibonacci_lookback(),
            atr_period: default_atr_period(),
            pivot_lookback: default_pivot_lookback(),
            cluster_tolerance: default_cluster_tolerance(),
            min_level_candles: default_min_level_candles(),
        }
    }
}

impl AnalysisParams {
    /// Reject settings the indicator functions treat as caller bugs.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("rsiPeriod", self.rsi_period),
            ("macdFast", self.macd_fast),
            ("macdSlow", self.macd_slow),
            ("macdSignal", self.macd_signal),
            ("bollingerPeriod", self.bollinger_period),
            ("volumePeriod", self.volume_period),
            ("fibonacciLookback", self.fibonacci_lookback),
            ("atrPeriod", self.atr_period),
            ("pivotLookback", self.pivot_lookback),
        ];
        for (name, value) in periods {
            if value == 0 {
                bail!("analysis.{name} must be >= 1");
            }
        }
        if self.macd_fast >= self.macd_slow {
            bail!(
                "analysis.macdFast ({}) must be below analysis.macdSlow ({})",
                self.macd_fast,
                self.macd_slow
            );
        }
        if !(self.cluster_tolerance.is_finite() && self.cluster_tolerance > 0.0) {
            bail!("analysis.clusterTolerance must be > 0, got {}", self.cluster_tolerance);
        }
        if !(self.bollinger_std_dev.is_finite() && self.bollinger_std_dev >= 0.0) {
            bail!("analysis.bollingerStdDev must be >= 0, got {}", self.bollinger_std_dev);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub analysis: TechnicalAnalysis,
    pub levels: Vec<Level>,
    pub macd: MacdResult,
    pub bollinger: BollingerBands,
    pub volume: VolumeAnalysis,
    pub fibonacci: Vec<FibonacciLevel>,
    pub atr: AtrData,
    pub trading_signal: TradingSignal,
    pub position_sizing: PositionSizing,
    pub long_plan: DirectionalPlan,
    pub short_plan: DirectionalPlan,
    pub scenarios: ScenarioAnalysis,
    pub current_price: f64,
    pub price_change_24h: f64,
}

/// Run the whole pipeline over `candles` (oldest first).
pub fn analyze(
    candles: &[Candle],
    timeframe: TimeFrame,
    params: &AnalysisParams,
) -> MarketAnalysis {
    let prices = closes(candles);
    let current_price = prices.last().copied().unwrap_or(0.0);

    let analysis = calculate_technical_analysis(candles, params.rsi_period);
    let levels = find_support_resistance(
        candles,
        params.pivot_lookback,
        params.cluster_tolerance,
        params.min_level_candles,
    );
    let macd = macd(
        &prices,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );
    let bollinger = calculate_bollinger(&prices, params.bollinger_period, params.bollinger_std_dev);
    let volume = analyze_volume(candles, params.volume_period);
    let fibonacci = fibonacci_levels(candles, params.fibonacci_lookback);
    let atr = atr(candles, params.atr_period);

    // Levels are stored price-descending: supports come out nearest first,
    // resistances need reversing for that.
    let supports = prices_of(&levels, LevelType::Support);
    let mut resistances = prices_of(&levels, LevelType::Resistance);
    resistances.reverse();

    let trading_signal = match candles.last() {
        Some(last) => generate_trading_signal(&SignalInput {
            analysis: &analysis,
            macd: &macd,
            bollinger: &bollinger,
            volume: &volume,
            current_price,
            supports: &supports,
            resistances: &resistances,
            timestamp: last.time,
        }),
        None => TradingSignal::default(),
    };

    let position_sizing = calculate_position_sizing(&trading_signal, &atr);
    let long_plan = plan_long(trading_signal.score, &atr, trading_signal.action);
    let short_plan = plan_short(trading_signal.score, &atr, trading_signal.action);
    let scenarios = scenarios(
        current_price,
        &atr,
        trading_signal.score,
        &supports,
        &resistances,
    );

    debug!(
        candles = candles.len(),
        score = trading_signal.score,
        action = %trading_signal.action,
        trend = %analysis.trend,
        volatility = %atr.volatility,
        "market analysis complete"
    );

    MarketAnalysis {
        analysis,
        levels,
        macd,
        bollinger,
        volume,
        fibonacci,
        atr,
        trading_signal,
        position_sizing,
        long_plan,
        short_plan,
        scenarios,
        current_price,
        price_change_24h: price_change_24h(candles, timeframe),
    }
}

/// Percent change of the last close against the close one day earlier.
///
/// Fewer than 2 candles gives 0; a short history measures from the first
/// candle.
pub fn price_change_24h(candles: &[Candle], timeframe: TimeFrame) -> f64 {
    if candles.len() < 2 {
        return 0.0;
    }
    let start = candles
        .len()
        .saturating_sub(timeframe.periods_per_day() + 1);
    let start_price = candles[start].close;
    let current = candles[candles.len() - 1].close;
    if start_price == 0.0 {
        return 0.0;
    }
    (current - start_price) / start_price * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{Crossover, Volatility};
    use crate::signals::{Confidence, SignalAction};
    use crate::types::Trend;

    fn flat(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i as i64 * 3600, 100.0, 100.0, 100.0, 100.0, 1000.0))
            .collect()
    }

    #[test]
    fn empty_input_yields_defaults() {
        let result = analyze(&[], TimeFrame::H1, &AnalysisParams::default());
        assert_eq!(result.current_price, 0.0);
        assert_eq!(result.analysis.rsi, 50.0);
        assert_eq!(result.analysis.trend, Trend::Neutral);
        assert!(result.levels.is_empty());
        assert!(result.fibonacci.is_empty());
        assert_eq!(result.macd, MacdResult::default());
        assert_eq!(result.bollinger.percent_b, 50.0);
        assert_eq!(result.volume, VolumeAnalysis::default());
        assert_eq!(result.atr, AtrData::default());
        assert_eq!(result.trading_signal, TradingSignal::default());
        assert_eq!(result.price_change_24h, 0.0);
    }

    #[test]
    fn flat_market_holds() {
        let result = analyze(&flat(30), TimeFrame::H1, &AnalysisParams::default());
        assert_eq!(result.current_price, 100.0);
        assert_eq!(result.macd.crossover, Crossover::None);
        assert_eq!(result.trading_signal.action, SignalAction::Hold);
        assert_eq!(result.trading_signal.confidence, Confidence::Medium);
        assert_eq!(result.trading_signal.timestamp, 29 * 3600);
        assert_eq!(result.atr.volatility, Volatility::Low);
        assert!(result.levels.is_empty());
    }

    #[test]
    fn price_change_uses_periods_per_day() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i, c, c, c, c, 1.0)
            })
            .collect();
        // 1h: start index 30 - 25 = 5 (close 105), last close 129.
        let change = price_change_24h(&candles, TimeFrame::H1);
        assert!((change - (129.0 - 105.0) / 105.0 * 100.0).abs() < 1e-9);

        // 4h: start index 23 (close 123).
        let change = price_change_24h(&candles, TimeFrame::H4);
        assert!((change - (129.0 - 123.0) / 123.0 * 100.0).abs() < 1e-9);

        // 15m needs 97 candles; short history starts at the first one.
        let change = price_change_24h(&candles, TimeFrame::M15);
        assert!((change - 29.0).abs() < 1e-9);

        // 1d compares the previous candle.
        let change = price_change_24h(&candles, TimeFrame::D1);
        assert!((change - (129.0 - 128.0) / 128.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn price_change_needs_two_candles() {
        assert_eq!(price_change_24h(&flat(1), TimeFrame::H1), 0.0);
    }

    #[test]
    fn params_fill_missing_fields() {
        let params: AnalysisParams = serde_json::from_str(r#"{"rsiPeriod": 7}"#).unwrap();
        assert_eq!(params.rsi_period, 7);
        assert_eq!(params.macd_slow, 26);
        assert_eq!(params.cluster_tolerance, 0.015);
    }

    #[test]
    fn default_params_are_valid() {
        assert!(AnalysisParams::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unusable_params() {
        let zero_rsi: AnalysisParams = serde_json::from_str(r#"{"rsiPeriod": 0}"#).unwrap();
        let err = zero_rsi.validate().unwrap_err();
        assert!(err.to_string().contains("rsiPeriod"));

        let inverted = AnalysisParams {
            macd_fast: 26, macd_slow: 12,
            ..AnalysisParams::default()
        };
        assert!(inverted.validate().is_err());

        let equal = AnalysisParams {
            macd_fast: 12, macd_slow: 12,
            ..AnalysisParams::default()
        };
        assert!(equal.validate().is_err());

        let no_tolerance = AnalysisParams {
            cluster_tolerance: 0.0,
            ..AnalysisParams::default()
        };
        assert!(no_tolerance.validate().is_err());

        let zero_pivot = AnalysisParams {
            pivot_lookback: 0,
            ..AnalysisParams::default()
        };
        assert!(zero_pivot.validate().is_err());
    }
}
