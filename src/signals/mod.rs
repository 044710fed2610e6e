// =============================================================================
// Signals Module
// =============================================================================
//
// Composite trading signal: weighted rule groups over the indicator snapshot
// and the nearby support / resistance levels.

pub mod weighted_score;

pub use weighted_score::{
    classify, generate_trading_signal, Confidence, SignalAction, SignalInput, TradingSignal,
};
