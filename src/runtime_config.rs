// =============================================================================
// Runtime Configuration: service settings with atomic save
// =============================================================================
//
// Loaded from `coinlens_config.json` at startup; a missing or unreadable file
// falls back to the defaults. Every field carries a serde default so older
// config files keep loading when fields are added. Two environment variables
// override the file: `COINLENS_SYMBOLS` (comma separated) and
// `COINLENS_BIND_ADDR`.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::AnalysisParams;
use crate::types::{TimeFrame, COINS};

pub const CONFIG_FILE: &str = "coinlens_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    COINS.iter().map(|(sym, _)| sym.to_string()).collect()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_kline_limit() -> u32 {
    100
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_cache_ttl_secs() -> u64 {
    60
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Symbols kept warm by the refresh loop.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Timeframe the refresh loop fetches.
    #[serde(default)]
    pub timeframe: TimeFrame,

    /// Candles requested per fetch.
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// How long fetched klines are served from cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub analysis: AnalysisParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            bind_addr: default_bind_addr(),
            timeframe: TimeFrame::default(),
            kline_limit: default_kline_limit(),
            refresh_interval_secs: default_refresh_interval_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            analysis: AnalysisParams::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .analysis
            .validate()
            .with_context(|| format!("invalid analysis settings in {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            timeframe = %config.timeframe,
            "runtime config loaded"
        );

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `COINLENS_SYMBOLS` / `COINLENS_BIND_ADDR` from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("COINLENS_SYMBOLS").ok().as_deref(),
            std::env::var("COINLENS_BIND_ADDR").ok().as_deref(),
        );
    }

    fn apply_overrides(&mut self, symbols: Option<&str>, bind_addr: Option<&str>) {
        if let Some(syms) = symbols {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
        if let Some(addr) = bind_addr.map(str::trim).filter(|a| !a.is_empty()) {
            self.bind_addr = addr.to_string();
        }
        if self.symbols.is_empty() {
            self.symbols = default_symbols();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbols, vec!["BTCUSDT", "ETHUSDT", "HYPEUSDT"]);
        assert_eq!(cfg.timeframe, TimeFrame::H1);
        assert_eq!(cfg.kline_limit, 100);
        assert_eq!(cfg.refresh_interval_secs, 300);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.analysis.rsi_period, 14);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "timeframe": "4h",
            "symbols": ["ETHUSDT"],
            "analysis": { "atrPeriod": 21 }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.timeframe, TimeFrame::H4);
        assert_eq!(cfg.symbols, vec!["ETHUSDT"]);
        assert_eq!(cfg.analysis.atr_period, 21);
        assert_eq!(cfg.analysis.macd_slow, 26);
        assert_eq!(cfg.cache_ttl_secs, 60);
    }

    #[test]
    fn overrides_normalise_symbols() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(Some(" solusdt, ,btcusdt "), Some("127.0.0.1:8080"));
        assert_eq!(cfg.symbols, vec!["SOLUSDT", "BTCUSDT"]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut cfg = RuntimeConfig::default();
        cfg.symbols.clear();
        cfg.apply_overrides(Some(" , "), Some("  "));
        assert_eq!(cfg.symbols, default_symbols());
        assert_eq!(cfg.bind_addr, default_bind_addr());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("coinlens_cfg_{}.json", std::process::id()));
        let mut cfg = RuntimeConfig::default();
        cfg.kline_limit = 250;
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(RuntimeConfig::load("/nonexistent/coinlens_config.json").is_err());
    }

    #[test]
    fn load_rejects_zero_period() {
        let path = std::env::temp_dir()
            .join(format!("coinlens_cfg_invalid_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "analysis": { "rsiPeriod": 0 } }"#).unwrap();

        let err = RuntimeConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(format!("{err:#}").contains("rsiPeriod"), "{err:#}");
    }
}
