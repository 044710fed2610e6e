pub mod client;
pub mod rate_limit;

pub use client::{fetch_klines_with_retry, BinanceClient, Ticker};
pub use rate_limit::{RateLimitSnapshot, RateLimitTracker};
