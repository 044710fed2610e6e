// =============================================================================
// CoinLens: technical analysis for crypto futures markets
// =============================================================================
//
// The analysis core (`indicators`, `levels`, `signals`, `position_sizing`,
// `trade_plan`, `analysis`) is synchronous and pure: candles in, values out.
// `binance`, `app_state` and `api` are the async collaborators that feed it.
// =============================================================================

pub mod analysis;
pub mod api;
pub mod app_state;
pub mod binance;
pub mod format;
pub mod indicators;
pub mod levels;
pub mod position_sizing;
pub mod report;
pub mod runtime_config;
pub mod signals;
pub mod trade_plan;
pub mod types;
