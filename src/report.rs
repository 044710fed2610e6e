//! One-shot analysis report printed by `coinlens report`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::MarketAnalysis;
use crate::format::{format_percent, format_price};
use crate::levels::{prices_of, LevelType};
use crate::types::{display_name, TimeFrame};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: String,
    pub display_name: String,
    pub interval: TimeFrame,
    pub generated_at: String,
    pub price: String,
    pub change_24h: String,
    /// Formatted support prices, nearest first.
    pub supports: Vec<String>,
    /// Formatted resistance prices, nearest first.
    pub resistances: Vec<String>,
    /// One line per signal reason, prefixed with the action.
    pub summary: Vec<String>,
    pub analysis: MarketAnalysis,
}

impl AnalysisReport {
    pub fn new(
        symbol: &str,
        interval: TimeFrame,
        analysis: MarketAnalysis,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let supports = prices_of(&analysis.levels, LevelType::Support)
            .into_iter()
            .map(format_price)
            .collect();
        let mut resistances: Vec<String> = prices_of(&analysis.levels, LevelType::Resistance)
            .into_iter()
            .map(format_price)
            .collect();
        resistances.reverse();

        let signal = &analysis.trading_signal;
        let mut summary = vec![format!(
            "{} ({} confidence, score {})",
            signal.action.to_string().to_uppercase(),
            signal.confidence,
            signal.score
        )];
        summary.extend(signal.reasons.iter().map(|r| format!("- {r}")));

        Self {
            symbol: symbol.to_string(),
            display_name: display_name(symbol)
                .map(str::to_string)
                .unwrap_or_else(|| symbol.to_string()),
            interval,
            generated_at: generated_at.to_rfc3339(),
            price: format_price(analysis.current_price),
            change_24h: format_percent(analysis.price_change_24h),
            supports,
            resistances,
            summary,
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisParams};
    use crate::types::Candle;
    use chrono::TimeZone;

    #[test]
    fn report_formats_headline_fields() {
        let candles: Vec<Candle> = (0..60)
            .map(|i| {
                let c = 1000.0 * 1.01_f64.powi(i);
                Candle::new(i as i64 * 14_400, c, c * 1.001, c * 0.999, c, 5.0)
            })
            .collect();
        let analysis = analyze(&candles, TimeFrame::H4, &AnalysisParams::default());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let report = AnalysisReport::new("BTCUSDT", TimeFrame::H4, analysis, at);
        assert_eq!(report.display_name, "BTC/USDT");
        assert_eq!(report.generated_at, "2024-05-01T12:00:00+00:00");
        assert!(report.price.contains(','));
        assert!(report.change_24h.starts_with('+'));
        assert!(report.supports.is_empty());
        assert!(report.summary[0].starts_with("SELL"));
        assert_eq!(report.summary.len(), 1 + report.analysis.trading_signal.reasons.len());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["interval"], "4h");
        assert!(json["change24h"].is_string());
    }
}
