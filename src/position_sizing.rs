// =============================================================================
// Position Sizer: signal strength and volatility to capital allocation
// =============================================================================
//
// Base allocation (percent of capital) per action, |s| = |score|:
//   strong_buy    80 + (|s| - 50) * 0.4
//   buy           50 + (|s| - 25) * 1.2
//   hold          50
//   sell          max(10, 30 - (|s| - 25) * 0.8)
//   strong_sell   max(0, 10 - (|s| - 50) * 0.2)
//
// Volatility adjustment:
//   low 1.2x / 5x leverage, medium 1.0x / 3x, high 0.7x / 2x,
//   extreme 0.5x / 1x
//
// Adjusted allocation is clamped to [0, 100]; >= 70 is aggressive, >= 40
// moderate, anything lower conservative.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{AtrData, Volatility};
use crate::signals::{SignalAction, TradingSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskLevel {
    pub fn from_allocation(percent: f64) -> Self {
        if percent >= 70.0 {
            Self::Aggressive
        } else if percent >= 40.0 {
            Self::Moderate
        } else {
            Self::Conservative
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conservative => write!(f, "conservative"),
            Self::Moderate => write!(f, "moderate"),
            Self::Aggressive => write!(f, "aggressive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizing {
    /// Allocation from the signal alone, whole percent.
    pub base_position: f64,
    /// Allocation after the volatility multiplier, whole percent in [0, 100].
    pub volatility_adjusted: f64,
    pub risk_level: RiskLevel,
    pub max_leverage: u32,
    /// Signal rationale first, then the volatility rationale.
    pub reasoning: Vec<String>,
}

/// Multiplier and leverage ceiling for a volatility class.
pub fn volatility_profile(volatility: Volatility) -> (f64, u32) {
    match volatility {
        Volatility::Low => (1.2, 5),
        Volatility::Medium => (1.0, 3),
        Volatility::High => (0.7, 2),
        Volatility::Extreme => (0.5, 1),
    }
}

/// Unrounded base allocation for an action and score.
pub fn base_allocation(action: SignalAction, score: i32) -> f64 {
    let s = f64::from(score.abs());
    match action {
        SignalAction::StrongBuy => 80.0 + (s - 50.0) * 0.4,
        SignalAction::Buy => 50.0 + (s - 25.0) * 1.2,
        SignalAction::Hold => 50.0,
        SignalAction::Sell => (30.0 - (s - 25.0) * 0.8).max(10.0),
        SignalAction::StrongSell => (10.0 - (s - 50.0) * 0.2).max(0.0),
    }
}

pub fn calculate_position_sizing(signal: &TradingSignal, atr: &AtrData) -> PositionSizing {
    let base = base_allocation(signal.action, signal.score);
    let (multiplier, max_leverage) = volatility_profile(atr.volatility);
    let adjusted = (base * multiplier).round().clamp(0.0, 100.0);

    let reasoning = vec![
        signal_rationale(signal),
        volatility_rationale(atr, multiplier, max_leverage),
    ];

    PositionSizing {
        base_position: base.round(),
        volatility_adjusted: adjusted,
        risk_level: RiskLevel::from_allocation(adjusted),
        max_leverage,
        reasoning,
    }
}

fn signal_rationale(signal: &TradingSignal) -> String {
    let score = signal.score;
    match signal.action {
        SignalAction::StrongBuy => format!("Strong buy signal (score {score}): large allocation"),
        SignalAction::Buy => format!("Buy signal (score {score}): moderate allocation"),
        SignalAction::Hold => {
            format!("No clear direction (score {score}): keep allocation neutral")
        }
        SignalAction::Sell => format!("Sell signal (score {score}): reduce exposure"),
        SignalAction::StrongSell => {
            format!("Strong sell signal (score {score}): minimal or no exposure")
        }
    }
}

fn volatility_rationale(atr: &AtrData, multiplier: f64, max_leverage: u32) -> String {
    let pct = atr.atr_percent;
    match atr.volatility {
        Volatility::Low => format!(
            "Low volatility (ATR {pct:.2}%): allocation x{multiplier}, \
             up to {max_leverage}x leverage"
        ),
        Volatility::Medium => format!(
            "Normal volatility (ATR {pct:.2}%): no adjustment, up to {max_leverage}x leverage"
        ),
        Volatility::High => format!(
            "High volatility (ATR {pct:.2}%): allocation x{multiplier}, \
             up to {max_leverage}x leverage"
        ),
        Volatility::Extreme => format!(
            "Extreme volatility (ATR {pct:.2}%): allocation x{multiplier}, avoid leverage"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::classify;

    fn signal(score: i32) -> TradingSignal {
        let (action, confidence) = classify(score);
        TradingSignal {
            action,
            confidence,
            score,
            reasons: Vec::new(),
            timestamp: 0,
        }
    }

    fn atr_with(volatility: Volatility) -> AtrData {
        AtrData {
            atr: 1.0,
            atr_percent: 1.0,
            volatility,
        }
    }

    #[test]
    fn base_allocation_per_action() {
        assert_eq!(base_allocation(SignalAction::StrongBuy, 50), 80.0);
        assert_eq!(base_allocation(SignalAction::StrongBuy, 100), 100.0);
        assert_eq!(base_allocation(SignalAction::Buy, 25), 50.0);
        assert_eq!(base_allocation(SignalAction::Buy, 45), 74.0);
        assert_eq!(base_allocation(SignalAction::Hold, 20), 50.0);
        assert_eq!(base_allocation(SignalAction::Hold, -20), 50.0);
        assert_eq!(base_allocation(SignalAction::Sell, -25), 30.0);
        assert_eq!(base_allocation(SignalAction::Sell, -45), 14.0);
        assert!((base_allocation(SignalAction::Sell, -49) - 10.8).abs() < 1e-9);
        assert_eq!(base_allocation(SignalAction::StrongSell, -50), 10.0);
        assert_eq!(base_allocation(SignalAction::StrongSell, -100), 0.0);
    }

    #[test]
    fn sell_floors_apply() {
        assert_eq!(base_allocation(SignalAction::Sell, -60), 10.0);
        assert_eq!(base_allocation(SignalAction::StrongSell, -150), 0.0);
    }

    #[test]
    fn volatility_scales_and_caps_leverage() {
        let s = signal(45);
        let low = calculate_position_sizing(&s, &atr_with(Volatility::Low));
        assert_eq!(low.base_position, 74.0);
        assert_eq!(low.volatility_adjusted, 89.0);
        assert_eq!(low.max_leverage, 5);
        assert_eq!(low.risk_level, RiskLevel::Aggressive);

        let medium = calculate_position_sizing(&s, &atr_with(Volatility::Medium));
        assert_eq!(medium.volatility_adjusted, 74.0);
        assert_eq!(medium.max_leverage, 3);

        let high = calculate_position_sizing(&s, &atr_with(Volatility::High));
        assert_eq!(high.volatility_adjusted, 52.0);
        assert_eq!(high.max_leverage, 2);
        assert_eq!(high.risk_level, RiskLevel::Moderate);

        let extreme = calculate_position_sizing(&s, &atr_with(Volatility::Extreme));
        assert_eq!(extreme.volatility_adjusted, 37.0);
        assert_eq!(extreme.max_leverage, 1);
        assert_eq!(extreme.risk_level, RiskLevel::Conservative);
    }

    #[test]
    fn adjusted_allocation_is_clamped() {
        let sizing = calculate_position_sizing(&signal(100), &atr_with(Volatility::Low));
        assert_eq!(sizing.base_position, 100.0);
        assert_eq!(sizing.volatility_adjusted, 100.0);
    }

    #[test]
    fn hold_is_moderate_at_medium_volatility() {
        let sizing = calculate_position_sizing(&signal(0), &AtrData::default());
        assert_eq!(sizing.base_position, 50.0);
        assert_eq!(sizing.volatility_adjusted, 50.0);
        assert_eq!(sizing.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn reasoning_lists_signal_before_volatility() {
        let sizing = calculate_position_sizing(&signal(-30), &atr_with(Volatility::High));
        assert_eq!(sizing.reasoning.len(), 2);
        assert!(sizing.reasoning[0].starts_with("Sell signal"));
        assert!(sizing.reasoning[1].starts_with("High volatility"));
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_allocation(70.0), RiskLevel::Aggressive);
        assert_eq!(RiskLevel::from_allocation(69.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_allocation(40.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_allocation(39.0), RiskLevel::Conservative);
    }
}
