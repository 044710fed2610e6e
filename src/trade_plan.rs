// =============================================================================
// Trade Plan: directional entries and post-entry scenarios
// =============================================================================
//
// Directional plan (long shown, short mirrors with -score):
//   in-direction signal   position = clamp(50 + 0.3·score, 20, 80)
//                         extreme vol -> floor(·0.5), 1x
//                         high vol    -> floor(·0.7), 2x
//                         medium vol  -> 3x, low vol -> 5x
//   hold                  10%, 1x
//   opposite signal       0%, 1x
// A plan is recommended from 30% upward.
//
// Scenario probabilities:
//   bull = 50 + 0.4·score, bear = 50 - 0.4·score, side = 100 - bull - bear + 20
//   normalised to 100, then clamped (bull / bear 10..80, side 10..50).
// Targets fall back to ATR multiples of the current price when no level is
// known: R1 +1.5 ATR%, R2 +3 ATR%, S1 -1.5 ATR%, stop -2 ATR%.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::{AtrData, Volatility};
use crate::signals::SignalAction;

const RECOMMENDED_MIN_POSITION: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalPlan {
    pub recommended: bool,
    /// Whole percent of capital.
    pub position: f64,
    pub max_leverage: u32,
    pub reason: String,
}

pub fn plan_long(score: i32, atr: &AtrData, action: SignalAction) -> DirectionalPlan {
    directional_plan(Direction::Long, score, atr, action)
}

pub fn plan_short(score: i32, atr: &AtrData, action: SignalAction) -> DirectionalPlan {
    directional_plan(Direction::Short, score, atr, action)
}

fn directional_plan(
    direction: Direction,
    score: i32,
    atr: &AtrData,
    action: SignalAction,
) -> DirectionalPlan {
    let (with_trend, side) = match direction {
        Direction::Long => (action.is_bullish(), "long"),
        Direction::Short => (action.is_bearish(), "short"),
    };

    let (position, max_leverage, reason) = if with_trend {
        let signed = match direction {
            Direction::Long => f64::from(score),
            Direction::Short => -f64::from(score),
        };
        let base = (50.0 + signed * 0.3).clamp(20.0, 80.0);
        match atr.volatility {
            Volatility::Extreme => (
                (base * 0.5).floor(),
                1,
                format!("Signal favours {side} but volatility is extreme: reduce size"),
            ),
            Volatility::High => (
                (base * 0.7).floor(),
                2,
                format!("Signal favours {side}; high volatility, size down"),
            ),
            Volatility::Medium => (base, 3, format!("Signal confirms {side}: standard size")),
            Volatility::Low => (base, 5, format!("Strong {side} signal with low volatility")),
        }
    } else if action == SignalAction::Hold {
        (10.0, 1, "Neutral zone: stay flat or keep it small".to_string())
    } else {
        (0.0, 1, format!("Signal points the other way: no {side} entry"))
    };

    DirectionalPlan {
        recommended: position >= RECOMMENDED_MIN_POSITION,
        position: position.round(),
        max_leverage,
        reason,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BullishScenario {
    pub probability: f64,
    pub target1: f64,
    pub target1_pct: f64,
    pub target2: f64,
    pub target2_pct: f64,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearishScenario {
    pub probability: f64,
    pub support1: f64,
    pub support1_pct: f64,
    pub stop_loss: f64,
    pub stop_loss_pct: f64,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidewaysScenario {
    pub probability: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub bullish: BullishScenario,
    pub bearish: BearishScenario,
    pub sideways: SidewaysScenario,
}

/// Post-entry scenarios around `current_price`.
///
/// `resistances` are expected nearest first (ascending) and `supports`
/// nearest first (descending); missing levels fall back to ATR multiples.
pub fn scenarios(
    current_price: f64,
    atr: &AtrData,
    score: i32,
    supports: &[f64],
    resistances: &[f64],
) -> ScenarioAnalysis {
    let s = f64::from(score);
    let atr_frac = atr.atr_percent / 100.0;

    let bull_raw = 50.0 + s * 0.4;
    let bear_raw = 50.0 - s * 0.4;
    let side_raw = 100.0 - bull_raw - bear_raw + 20.0;
    let total = bull_raw + bear_raw + side_raw;
    let normalise = |p: f64| (p / total * 100.0).round();

    let level_or = |levels: &[f64], idx: usize, fallback: f64| {
        levels
            .get(idx)
            .copied()
            .filter(|&p| p > 0.0)
            .unwrap_or(fallback)
    };
    let resistance1 = level_or(resistances, 0, current_price * (1.0 + atr_frac * 1.5));
    let resistance2 = level_or(resistances, 1, current_price * (1.0 + atr_frac * 3.0));
    let support1 = level_or(supports, 0, current_price * (1.0 - atr_frac * 1.5));
    let stop_loss = current_price * (1.0 - atr_frac * 2.0);

    let pct = |target: f64| {
        if current_price != 0.0 {
            (target - current_price) / current_price * 100.0
        } else {
            0.0
        }
    };

    let bullish_action = if score > 30 {
        "Take 50% profit at the first target, hold the rest"
    } else {
        "Take 70% profit at the first target"
    };
    let bearish_action = if score < -30 {
        "Cut on a support break; consider a short on the bounce"
    } else {
        "Scale out at the first support before the stop is hit"
    };

    ScenarioAnalysis {
        bullish: BullishScenario {
            probability: normalise(bull_raw).clamp(10.0, 80.0),
            target1: round_cents(resistance1),
            target1_pct: pct(resistance1),
            target2: round_cents(resistance2),
            target2_pct: pct(resistance2),
            action: bullish_action.to_string(),
        },
        bearish: BearishScenario {
            probability: normalise(bear_raw).clamp(10.0, 80.0),
            support1: round_cents(support1),
            support1_pct: pct(support1),
            stop_loss: round_cents(stop_loss),
            stop_loss_pct: pct(stop_loss),
            action: bearish_action.to_string(),
        },
        sideways: SidewaysScenario {
            probability: normalise(side_raw).clamp(10.0, 50.0),
            range_low: round_cents(support1),
            range_high: round_cents(resistance1),
            action: "Buy the range low, sell the range high".to_string(),
        },
    }
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
