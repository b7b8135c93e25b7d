use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{ChainError, ChainStatsSource};
use crate::prices::PriceCache;
use crate::types::{Chain, LatestTransaction, TokenAsset, TxDirection, WalletStats};

const ETH_API_BASE: &str = "https://api.etherscan.io/api";
const BNB_API_BASE: &str = "https://api.bscscan.com/api";
// Shipped embedded, as the product always has. Swapping in a paid key is
// a deploy-time edit, which is an operational liability worth knowing.
const EXPLORER_API_KEY: &str = "YourApiKeyToken";
const WEI_PER_ETHER: f64 = 1e18;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Ethereum-family statistics from an etherscan-compatible JSON API.
/// One instance per network (ETH mainnet, BNB chain).
pub struct EvmStatsSource {
    client: Client,
    prices: Arc<PriceCache>,
    chain: Chain,
    api_base: String,
}

impl EvmStatsSource {
    pub fn new(client: Client, prices: Arc<PriceCache>, chain: Chain) -> Self {
        let api_base = match chain {
            Chain::Bnb => BNB_API_BASE,
            _ => ETH_API_BASE,
        };
        Self {
            client,
            prices,
            chain,
            api_base: api_base.to_string(),
        }
    }

    async fn api_call(&self, action: &str, extra: &str, address: &str) -> Result<Value, ChainError> {
        let url = format!(
            "{}?module=account&action={}&address={}{}&apikey={}",
            self.api_base, action, address, extra, EXPLORER_API_KEY
        );
        let response = self
            .client
            .get(&url)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ChainError::ApiError(format!(
                "explorer returned status {}",
                response.status()
            )));
        }
        let payload: Value = response.json().await?;
        // status "0" with a string result carries the API error message
        if payload.get("status").and_then(|s| s.as_str()) == Some("0") {
            if let Some(message) = payload.get("result").and_then(|r| r.as_str()) {
                if !message.is_empty() {
                    warn!("Explorer API note for {}: {}", action, message);
                }
            }
        }
        Ok(payload)
    }

    /// One transaction from a single-entry `txlist` page, newest or oldest
    /// depending on the sort order.
    async fn fetch_tx_page(&self, address: &str, sort: &str) -> Result<Option<Value>, ChainError> {
        let payload = self
            .api_call(
                "txlist",
                &format!("&startblock=0&endblock=99999999&page=1&offset=1&sort={}", sort),
                address,
            )
            .await?;
        Ok(payload
            .get("result")
            .and_then(|r| r.as_array())
            .and_then(|txs| txs.first())
            .cloned())
    }

    async fn try_fetch(&self, address: &str) -> Result<WalletStats, ChainError> {
        let mut stats = WalletStats::zeroed();

        let balance_payload = self.api_call("balance", "&tag=latest", address).await?;
        let wei: f64 = balance_payload
            .get("result")
            .and_then(|r| r.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ChainError::InvalidResponse("non-numeric balance".to_string()))?;
        stats.balance = wei / WEI_PER_ETHER;

        stats.price_usd = self.prices.get_price(self.chain.coin_id()).await;
        stats.amount_usd = stats.balance * stats.price_usd;

        // Two single-result pages: the API cannot return both ends of the
        // list in one call at offset=1, so newest and oldest are separate
        // requests.
        let latest = self.fetch_tx_page(address, "desc").await?;
        let first = self.fetch_tx_page(address, "asc").await?;

        if let Some(tx) = &latest {
            stats.latest_tx = Some(parse_latest_tx(tx, address, stats.price_usd));
            // Approximation: the account nonce of the newest outgoing
            // transaction, not a true count.
            stats.tx_count = tx
                .get("nonce")
                .and_then(|n| n.as_str())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|nonce| nonce + 1)
                .unwrap_or(0);
        }
        stats.first_tx_date = first
            .as_ref()
            .and_then(|tx| tx.get("timeStamp"))
            .and_then(|t| t.as_str())
            .and_then(|s| s.parse::<i64>().ok())
            .map(|secs| secs * 1000);

        // The explorer balance endpoint only covers the native asset;
        // holdings are rendered as that single entry.
        stats.tokens = vec![TokenAsset {
            symbol: self.chain.native_symbol().to_string(),
            name: match self.chain {
                Chain::Bnb => "BNB".to_string(),
                _ => "Ether".to_string(),
            },
            balance: stats.balance,
            decimals: 18,
            contract_address: "native".to_string(),
            chain: self.chain,
            logo_url: None,
            price_usd: Some(stats.price_usd),
            value_usd: Some(stats.amount_usd),
        }];

        info!(
            "✅ {} stats for {}: {:.6} native, ~{} txs",
            self.chain.as_str(),
            address,
            stats.balance,
            stats.tx_count
        );
        Ok(stats)
    }
}

fn parse_latest_tx(tx: &Value, address: &str, price_usd: f64) -> LatestTransaction {
    let field = |name: &str| -> String {
        tx.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let numeric = |name: &str| -> f64 {
        tx.get(name)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let to = field("to");
    let from = field("from");
    let direction = if to.eq_ignore_ascii_case(address) {
        TxDirection::In
    } else {
        TxDirection::Out
    };
    let counterparty = match direction {
        TxDirection::In => from,
        TxDirection::Out => to,
    };

    let amount = numeric("value") / WEI_PER_ETHER;

    LatestTransaction {
        hash: field("hash"),
        timestamp: (numeric("timeStamp") as i64) * 1000,
        direction,
        counterparties: if counterparty.is_empty() {
            Vec::new()
        } else {
            vec![counterparty]
        },
        fee: numeric("gasUsed") * numeric("gasPrice") / WEI_PER_ETHER,
        amount,
        amount_usd: amount * price_usd,
    }
}

#[async_trait]
impl ChainStatsSource for EvmStatsSource {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn fetch_stats(&self, address: &str) -> WalletStats {
        match self.try_fetch(address).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    "❌ {} stats fetch failed for {}: {}",
                    self.chain.as_str(),
                    address,
                    e
                );
                WalletStats::zeroed()
            }
        }
    }
}
