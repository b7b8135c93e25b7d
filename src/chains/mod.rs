pub mod bitcoin;
pub mod evm;
pub mod solana;

pub use bitcoin::BtcStatsSource;
pub use evm::EvmStatsSource;
pub use solana::SolanaStatsSource;

use crate::types::{Chain, WalletStats};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid response from explorer: {0}")]
    InvalidResponse(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One per-chain statistics backend. The contract every implementation
/// shares: `fetch_stats` always returns a stats object and never
/// propagates upstream failures; those degrade to `WalletStats::zeroed`.
#[async_trait]
pub trait ChainStatsSource: Send + Sync {
    fn chain(&self) -> Chain;

    async fn fetch_stats(&self, address: &str) -> WalletStats;
}

pub(crate) fn json_f64(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_i64().map(|v| v as f64))
        .or_else(|| value.as_u64().map(|v| v as f64))
}

pub(crate) fn json_u64(value: &serde_json::Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str()?.parse().ok())
}
