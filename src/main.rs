// =============================================================================
// CoinLens: Main Entry Point
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use coinlens::analysis::analyze;
use coinlens::api;
use coinlens::app_state::AppState;
use coinlens::binance::{fetch_klines_with_retry, BinanceClient};
use coinlens::report::AnalysisReport;
use coinlens::runtime_config::{RuntimeConfig, CONFIG_FILE};
use coinlens::types::TimeFrame;

/// Candles fetched by `coinlens report`.
const REPORT_KLINES: u32 = 100;

#[derive(Parser)]
#[command(name = "coinlens", about = "CoinLens: crypto technical analysis server and reports")]
struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server with background cache refresh.
    Serve,
    /// Print a one-shot JSON analysis for a symbol.
    Report {
        /// Futures symbol (e.g., BTCUSDT).
        symbol: String,

        /// Candle interval: 3m, 15m, 1h, 4h or 1d.
        #[arg(default_value = "4h")]
        interval: TimeFrame,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = RuntimeConfig::load(CONFIG_FILE).unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Report { symbol, interval } => {
            report(&config, &symbol.to_uppercase(), interval).await
        }
    }
}

// =============================================================================
// report
// =============================================================================

async fn report(config: &RuntimeConfig, symbol: &str, timeframe: TimeFrame) -> Result<()> {
    let client = BinanceClient::new()?;
    let candles =
        fetch_klines_with_retry(&client, symbol, timeframe.as_str(), REPORT_KLINES).await?;
    info!(symbol, %timeframe, count = candles.len(), "klines fetched for report");

    let analysis = analyze(&candles, timeframe, &config.analysis);
    let report = AnalysisReport::new(symbol, timeframe, analysis, chrono::Utc::now());

    let json = serde_json::to_string_pretty(&report).context("failed to serialise report")?;
    println!("{json}");
    Ok(())
}

// =============================================================================
// serve
// =============================================================================

async fn serve(config: RuntimeConfig) -> Result<()> {
    info!(
        symbols = ?config.symbols,
        timeframe = %config.timeframe,
        refresh_interval_secs = config.refresh_interval_secs,
        "CoinLens starting"
    );

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, BinanceClient::new()?));

    // ── API server ───────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── Rate-limit weight reset (every minute) ───────────────────────────
    let rl_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            rl_state.client.rate_limit().reset_1m_weight();
        }
    });

    // ── Cache refresh loop ───────────────────────────────────────────────
    let refresh_state = state.clone();
    tokio::spawn(async move {
        let secs = refresh_state.runtime_config.read().refresh_interval_secs.max(1);
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        loop {
            interval.tick().await;
            refresh_cache(&refresh_state).await;
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received");

    if let Err(e) = state.runtime_config.read().save(CONFIG_FILE) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("CoinLens shut down complete.");
    Ok(())
}

/// Fetch every configured symbol at the configured timeframe and the
/// currently selected one.
async fn refresh_cache(state: &AppState) {
    let (symbols, mut timeframes, limit) = {
        let config = state.runtime_config.read();
        (config.symbols.clone(), vec![config.timeframe], config.kline_limit)
    };
    let selected = state.selected_timeframe();
    if !timeframes.contains(&selected) {
        timeframes.push(selected);
    }

    state.evict_stale_klines();

    let mut refreshed = 0usize;
    for symbol in &symbols {
        for timeframe in &timeframes {
            match fetch_klines_with_retry(&state.client, symbol, timeframe.as_str(), limit).await {
                Ok(candles) => {
                    state.store_klines(symbol, timeframe.as_str(), candles);
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(%symbol, %timeframe, error = %e, "cache refresh failed");
                    state.push_error(format!("refresh {symbol} {timeframe}: {e:#}"));
                }
            }
        }
    }

    info!(refreshed, symbols = symbols.len(), "kline cache refreshed");
}
