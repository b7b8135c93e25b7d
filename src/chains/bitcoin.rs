use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{json_f64, json_u64, ChainError, ChainStatsSource};
use crate::prices::PriceCache;
use crate::types::{Chain, LatestTransaction, TxDirection, WalletStats};

const BTC_API_BASE: &str = "https://blockstream.info/api";
const SATS_PER_BTC: f64 = 100_000_000.0;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Bitcoin statistics from an esplora-style explorer API.
pub struct BtcStatsSource {
    client: Client,
    prices: Arc<PriceCache>,
    api_base: String,
}

impl BtcStatsSource {
    pub fn new(client: Client, prices: Arc<PriceCache>) -> Self {
        Self {
            client,
            prices,
            api_base: BTC_API_BASE.to_string(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, ChainError> {
        let response = self
            .client
            .get(url)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ChainError::ApiError(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn try_fetch(&self, address: &str) -> Result<WalletStats, ChainError> {
        let mut stats = WalletStats::zeroed();

        // Address summary: confirmed + mempool funded/spent satoshi sums.
        let summary = self
            .get_json(&format!("{}/address/{}", self.api_base, address))
            .await?;

        let sum = |scope: &str, field: &str| -> f64 {
            summary
                .get(scope)
                .and_then(|stats| stats.get(field))
                .and_then(json_f64)
                .unwrap_or(0.0)
        };

        let confirmed_sats = sum("chain_stats", "funded_txo_sum") - sum("chain_stats", "spent_txo_sum");
        let pending_sats =
            sum("mempool_stats", "funded_txo_sum") - sum("mempool_stats", "spent_txo_sum");
        stats.balance = ((confirmed_sats + pending_sats).max(0.0)) / SATS_PER_BTC;
        stats.tx_count = summary
            .get("chain_stats")
            .and_then(|s| s.get("tx_count"))
            .and_then(json_u64)
            .unwrap_or(0);

        stats.price_usd = self.prices.get_price(Chain::Btc.coin_id()).await;
        stats.amount_usd = stats.balance * stats.price_usd;

        // Single page of transactions, newest first. The oldest entry of
        // this page doubles as the "first transaction" -- wrong for busy
        // addresses, and accepted as such (no walk-back).
        let txs = self
            .get_json(&format!("{}/address/{}/txs", self.api_base, address))
            .await?;
        if let Some(txs) = txs.as_array() {
            if let Some(newest) = txs.first() {
                stats.latest_tx = Some(parse_latest_tx(newest, address, stats.price_usd));
            }
            stats.first_tx_date = txs
                .last()
                .and_then(|tx| tx.get("status"))
                .and_then(|status| status.get("block_time"))
                .and_then(json_f64)
                .map(|secs| (secs as i64) * 1000);
        }

        info!(
            "✅ BTC stats for {}: {:.8} BTC, {} txs",
            address, stats.balance, stats.tx_count
        );
        Ok(stats)
    }
}

fn output_addresses(tx: &Value) -> Vec<(String, f64)> {
    tx.get("vout")
        .and_then(|v| v.as_array())
        .map(|outs| {
            outs.iter()
                .filter_map(|out| {
                    let addr = out.get("scriptpubkey_address")?.as_str()?.to_string();
                    let value = out.get("value").and_then(json_f64)?;
                    Some((addr, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn input_addresses(tx: &Value) -> Vec<String> {
    tx.get("vin")
        .and_then(|v| v.as_array())
        .map(|ins| {
            ins.iter()
                .filter_map(|input| {
                    input
                        .get("prevout")?
                        .get("scriptpubkey_address")?
                        .as_str()
                        .map(String::from)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Direction, counterparties, fee and amount for the newest transaction.
/// Incoming iff the address appears among the outputs. A self-spend with
/// a change output therefore reads as incoming; best-effort display data.
fn parse_latest_tx(tx: &Value, address: &str, price_usd: f64) -> LatestTransaction {
    let outputs = output_addresses(tx);
    let inputs = input_addresses(tx);

    let direction = if outputs.iter().any(|(a, _)| a == address) {
        TxDirection::In
    } else {
        TxDirection::Out
    };

    let amount_sats: f64 = match direction {
        TxDirection::In => outputs
            .iter()
            .filter(|(a, _)| a == address)
            .map(|(_, v)| v)
            .sum(),
        TxDirection::Out => outputs
            .iter()
            .filter(|(a, _)| a != address)
            .map(|(_, v)| v)
            .sum(),
    };

    let mut counterparties: Vec<String> = match direction {
        TxDirection::In => inputs,
        TxDirection::Out => outputs
            .into_iter()
            .map(|(a, _)| a)
            .filter(|a| a != address)
            .collect(),
    };
    counterparties.dedup();

    let amount = amount_sats / SATS_PER_BTC;

    LatestTransaction {
        hash: tx
            .get("txid")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        timestamp: tx
            .get("status")
            .and_then(|s| s.get("block_time"))
            .and_then(json_f64)
            .map(|secs| (secs as i64) * 1000)
            .unwrap_or(0),
        direction,
        counterparties,
        fee: tx.get("fee").and_then(json_f64).unwrap_or(0.0) / SATS_PER_BTC,
        amount,
        amount_usd: amount * price_usd,
    }
}

#[async_trait]
impl ChainStatsSource for BtcStatsSource {
    fn chain(&self) -> Chain {
        Chain::Btc
    }

    async fn fetch_stats(&self, address: &str) -> WalletStats {
        match self.try_fetch(address).await {
            Ok(stats) => stats,
            Err(e) => {
                error!("❌ BTC stats fetch failed for {}: {}", address, e);
                WalletStats::zeroed()
            }
        }
    }
}
