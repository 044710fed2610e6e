// =============================================================================
// Weighted Signal Scorer: additive rule groups over the indicator snapshot
// =============================================================================
//
// Rule groups, evaluated in this order (the reasons list follows it):
//   1. RSI            <30 +20 | <40 +10 | >70 -20 | >60 -10
//   2. MACD           golden +25 | death -25 | hist>0 & line>0 +10
//                     | hist<0 & line<0 -10
//   3. Bollinger %B   <10 +20 | <25 +10 | >90 -20 | >75 -10
//   4. Volume         high volume only: +15 bullish | -15 bearish
//   5. S/R proximity  nearest support below  <2% +20 | <5% +10
//                     nearest resistance above <2% -20 | <5% -10
//
// The score is the unclamped sum. Action mapping, first match wins:
//   >=50 strong_buy/high, >=25 buy, <=-50 strong_sell/high, <=-25 sell,
//   else hold/medium. buy/sell are medium confidence from |score| >= 40.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{
    BollingerBands, Crossover, MacdResult, TechnicalAnalysis, VolumeAnalysis, VolumeTrend,
};
use crate::types::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalAction {
    pub fn is_bullish(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// Composite trading signal produced for one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    pub action: SignalAction,
    pub confidence: Confidence,
    pub score: i32,
    pub reasons: Vec<String>,
    /// Epoch seconds of the last candle analysed.
    pub timestamp: i64,
}

impl Default for TradingSignal {
    fn default() -> Self {
        Self {
            action: SignalAction::Hold,
            confidence: Confidence::Medium,
            score: 0,
            reasons: Vec::new(),
            timestamp: 0,
        }
    }
}

/// Everything the scorer reads.
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub analysis: &'a TechnicalAnalysis,
    pub macd: &'a MacdResult,
    pub bollinger: &'a BollingerBands,
    pub volume: &'a VolumeAnalysis,
    pub current_price: f64,
    pub supports: &'a [f64],
    pub resistances: &'a [f64],
    pub timestamp: i64,
}

/// Running total plus the reason for every non-zero contribution.
#[derive(Debug, Default)]
struct ScoreCard {
    score: i32,
    reasons: Vec<String>,
}

impl ScoreCard {
    fn add(&mut self, points: i32, reason: String) {
        self.score += points;
        self.reasons.push(reason);
    }
}

/// Score the indicator snapshot and map it to an action.
pub fn generate_trading_signal(input: &SignalInput<'_>) -> TradingSignal {
    let mut card = ScoreCard::default();

    score_rsi(&mut card, input.analysis.rsi);
    score_macd(&mut card, input.macd);
    score_bollinger(&mut card, input.bollinger.percent_b);
    score_volume(&mut card, input.volume, input.analysis.trend);
    score_levels(&mut card, input.current_price, input.supports, input.resistances);

    let (action, confidence) = classify(card.score);

    TradingSignal {
        action,
        confidence,
        score: card.score,
        reasons: card.reasons,
        timestamp: input.timestamp,
    }
}

/// Map a composite score to an action and confidence.
pub fn classify(score: i32) -> (SignalAction, Confidence) {
    if score >= 50 {
        (SignalAction::StrongBuy, Confidence::High)
    } else if score >= 25 {
        let confidence = if score >= 40 {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        (SignalAction::Buy, confidence)
    } else if score <= -50 {
        (SignalAction::StrongSell, Confidence::High)
    } else if score <= -25 {
        let confidence = if score <= -40 {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        (SignalAction::Sell, confidence)
    } else {
        (SignalAction::Hold, Confidence::Medium)
    }
}

fn score_rsi(card: &mut ScoreCard, rsi: f64) {
    if rsi < 30.0 {
        card.add(20, format!("RSI oversold ({rsi:.1})"));
    } else if rsi < 40.0 {
        card.add(10, format!("RSI weak ({rsi:.1})"));
    } else if rsi > 70.0 {
        card.add(-20, format!("RSI overbought ({rsi:.1})"));
    } else if rsi > 60.0 {
        card.add(-10, format!("RSI elevated ({rsi:.1})"));
    }
}

fn score_macd(card: &mut ScoreCard, macd: &MacdResult) {
    match macd.crossover {
        Crossover::Golden => card.add(25, "MACD golden cross".to_string()),
        Crossover::Death => card.add(-25, "MACD death cross".to_string()),
        Crossover::None => {
            if macd.histogram > 0.0 && macd.macd_line > 0.0 {
                card.add(10, "MACD bullish momentum".to_string());
            } else if macd.histogram < 0.0 && macd.macd_line < 0.0 {
                card.add(-10, "MACD bearish momentum".to_string());
            }
        }
    }
}

fn score_bollinger(card: &mut ScoreCard, percent_b: f64) {
    if percent_b < 10.0 {
        card.add(20, format!("Price at lower Bollinger band (%B {percent_b:.1})"));
    } else if percent_b < 25.0 {
        card.add(10, format!("Price near lower Bollinger band (%B {percent_b:.1})"));
    } else if percent_b > 90.0 {
        card.add(-20, format!("Price at upper Bollinger band (%B {percent_b:.1})"));
    } else if percent_b > 75.0 {
        card.add(-10, format!("Price near upper Bollinger band (%B {percent_b:.1})"));
    }
}

fn score_volume(card: &mut ScoreCard, volume: &VolumeAnalysis, trend: Trend) {
    if volume.trend != VolumeTrend::High {
        return;
    }
    let ratio = volume.volume_ratio;
    match trend {
        Trend::Bullish => card.add(15, format!("High volume confirms uptrend ({ratio:.1}x)")),
        Trend::Bearish => card.add(-15, format!("High volume confirms downtrend ({ratio:.1}x)")),
        Trend::Neutral => {}
    }
}

fn score_levels(card: &mut ScoreCard, price: f64, supports: &[f64], resistances: &[f64]) {
    if price <= 0.0 {
        return;
    }

    let nearest_support = supports
        .iter()
        .copied()
        .filter(|&s| s < price)
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
    let nearest_resistance = resistances
        .iter()
        .copied()
        .filter(|&r| r > price)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.min(r))));

    if let Some(support) = nearest_support {
        let distance = distance_percent(price, support);
        if distance < 2.0 {
            card.add(20, format!("Close to support {support:.2} ({distance:.1}% away)"));
        } else if distance < 5.0 {
            card.add(10, format!("Approaching support {support:.2} ({distance:.1}% away)"));
        }
    }

    if let Some(resistance) = nearest_resistance {
        let distance = distance_percent(price, resistance);
        if distance < 2.0 {
            card.add(-20, format!("Close to resistance {resistance:.2} ({distance:.1}% away)"));
        } else if distance < 5.0 {
            card.add(-10, format!("Approaching resistance {resistance:.2} ({distance:.1}% away)"));
        }
    }
}

/// Relative distance between price and a level, in percent of price.
fn distance_percent(price: f64, level: f64) -> f64 {
    (price - level).abs() / price * 100.0
}
