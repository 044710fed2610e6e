// =============================================================================
// Shared types used across the analysis pipeline and its collaborators
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLCV candle. `time` is the open time in epoch seconds.
///
/// Series are always chronological (oldest first) with strictly increasing
/// `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Extract the close prices of a candle series.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Directional bias derived from the EMA stack and RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for Trend {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Chart interval supported by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 5] = [Self::M3, Self::M15, Self::H1, Self::H4, Self::D1];

    /// Binance interval string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M3 => "3m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    /// Number of candles spanning 24 hours, as used for the daily change.
    pub fn periods_per_day(&self) -> usize {
        match self {
            Self::M15 => 96,
            Self::H1 => 24,
            Self::H4 => 6,
            Self::M3 | Self::D1 => 1,
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::H1
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeFrame {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unsupported timeframe '{s}'"))
    }
}

/// Symbols shown on the dashboard, with their display names.
pub const COINS: [(&str, &str); 3] = [
    ("BTCUSDT", "BTC/USDT"),
    ("ETHUSDT", "ETH/USDT"),
    ("HYPEUSDT", "HYPE/USDT"),
];

/// Display name for a known symbol (`BTCUSDT` → `BTC/USDT`).
pub fn display_name(symbol: &str) -> Option<&'static str> {
    COINS
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_parses_binance_intervals() {
        for tf in TimeFrame::ALL {
            assert_eq!(tf.as_str().parse::<TimeFrame>().unwrap(), tf);
        }
        assert!("2h".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn timeframe_serialises_as_interval() {
        let json = serde_json::to_string(&TimeFrame::H4).unwrap();
        assert_eq!(json, "\"4h\"");
        let tf: TimeFrame = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(tf, TimeFrame::M15);
    }

    #[test]
    fn periods_per_day() {
        assert_eq!(TimeFrame::M15.periods_per_day(), 96);
        assert_eq!(TimeFrame::H1.periods_per_day(), 24);
        assert_eq!(TimeFrame::H4.periods_per_day(), 6);
        assert_eq!(TimeFrame::D1.periods_per_day(), 1);
        assert_eq!(TimeFrame::M3.periods_per_day(), 1);
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("HYPEUSDT"), Some("HYPE/USDT"));
        assert_eq!(display_name("DOGEUSDT"), None);
    }

    #[test]
    fn trend_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Trend::Bullish).unwrap(), "\"bullish\"");
    }
}
