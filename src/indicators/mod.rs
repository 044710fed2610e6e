// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators feeding the signal
// generator. Each function recomputes from the full series on every call.
// Insufficient data yields a documented sentinel value; a zero period is a
// caller bug and panics.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod trend;
pub mod volume;

pub use atr::{atr, AtrData, Volatility};
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::ema;
pub use fibonacci::{fibonacci_levels, FibonacciLevel};
pub use macd::{macd, Crossover, MacdResult};
pub use rsi::rsi;
pub use sma::sma;
pub use trend::{calculate_technical_analysis, determine_trend, TechnicalAnalysis};
pub use volume::{analyze_volume, VolumeAnalysis, VolumeTrend};
