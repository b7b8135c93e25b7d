use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{json_f64, ChainError, ChainStatsSource};
use crate::addressing::mask_address;
use crate::prices::PriceCache;
use crate::types::{Chain, LatestTransaction, TokenAsset, TxDirection, WalletStats};

const SOL_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const SPL_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
const MIN_TOKEN_AMOUNT: f64 = 0.01;
const MAX_TOKEN_ENTRIES: usize = 10;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Solana statistics over plain JSON-RPC. This endpoint set cannot
/// produce a true transaction count or first-transaction date, and the
/// latest-activity entry carries placeholder amount/fee values (deriving
/// real ones would require fetching and parsing the full transaction).
pub struct SolanaStatsSource {
    client: Client,
    prices: Arc<PriceCache>,
    rpc_url: String,
}

impl SolanaStatsSource {
    pub fn new(client: Client, prices: Arc<PriceCache>) -> Self {
        Self {
            client,
            prices,
            rpc_url: SOL_RPC_URL.to_string(),
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?;
        let body: Value = response.json().await?;

        if let Some(rpc_error) = body.get("error") {
            return Err(ChainError::ApiError(format!("RPC error: {}", rpc_error)));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse("missing result".to_string()))
    }

    async fn try_fetch(&self, address: &str) -> Result<WalletStats, ChainError> {
        let mut stats = WalletStats::zeroed();

        let balance = self.rpc_call("getBalance", json!([address])).await?;
        let lamports = balance
            .get("value")
            .and_then(json_f64)
            .ok_or_else(|| ChainError::InvalidResponse("missing balance value".to_string()))?;
        stats.balance = lamports / LAMPORTS_PER_SOL;

        stats.price_usd = self.prices.get_price(Chain::Sol.coin_id()).await;
        stats.amount_usd = stats.balance * stats.price_usd;

        // Latest activity only; amount and fee are placeholders.
        let signatures = self
            .rpc_call("getSignaturesForAddress", json!([address, {"limit": 1}]))
            .await?;
        stats.latest_tx = signatures
            .as_array()
            .and_then(|sigs| sigs.first())
            .map(parse_latest_activity);

        let accounts = self
            .rpc_call(
                "getTokenAccountsByOwner",
                json!([
                    address,
                    { "programId": SPL_TOKEN_PROGRAM },
                    { "encoding": "jsonParsed" }
                ]),
            )
            .await?;
        stats.tokens = parse_token_accounts(&accounts);

        info!(
            "✅ SOL stats for {}: {:.9} SOL, {} token(s)",
            address,
            stats.balance,
            stats.tokens.len()
        );
        Ok(stats)
    }
}

fn parse_latest_activity(entry: &Value) -> LatestTransaction {
    LatestTransaction {
        hash: entry
            .get("signature")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string(),
        timestamp: entry
            .get("blockTime")
            .and_then(json_f64)
            .map(|secs| (secs as i64) * 1000)
            .unwrap_or(0),
        direction: TxDirection::Out,
        counterparties: Vec::new(),
        fee: 0.0,
        amount: 0.0,
        amount_usd: 0.0,
    }
}

/// Fungible SPL holdings from a `getTokenAccountsByOwner` result. Dust
/// positions below 0.01 are dropped and the list is capped at 10 entries.
fn parse_token_accounts(result: &Value) -> Vec<TokenAsset> {
    let mut tokens: Vec<TokenAsset> = result
        .get("value")
        .and_then(|v| v.as_array())
        .map(|accounts| {
            accounts
                .iter()
                .filter_map(|account| {
                    let info = account
                        .get("account")?
                        .get("data")?
                        .get("parsed")?
                        .get("info")?;
                    let mint = info.get("mint")?.as_str()?.to_string();
                    let token_amount = info.get("tokenAmount")?;
                    let balance = token_amount.get("uiAmount").and_then(json_f64)?;
                    let decimals = token_amount.get("decimals").and_then(|d| d.as_u64())? as u8;

                    if balance < MIN_TOKEN_AMOUNT {
                        return None;
                    }

                    Some(TokenAsset {
                        symbol: "SPL".to_string(),
                        name: format!("Token {}", mask_address(&mint)),
                        balance,
                        decimals,
                        contract_address: mint,
                        chain: Chain::Sol,
                        logo_url: None,
                        price_usd: None,
                        value_usd: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    tokens.truncate(MAX_TOKEN_ENTRIES);
    tokens
}

#[async_trait]
impl ChainStatsSource for SolanaStatsSource {
    fn chain(&self) -> Chain {
        Chain::Sol
    }

    async fn fetch_stats(&self, address: &str) -> WalletStats {
        match self.try_fetch(address).await {
            Ok(stats) => stats,
            Err(e) => {
                error!("❌ SOL stats fetch failed for {}: {}", address, e);
                WalletStats::zeroed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_account(mint: &str, ui_amount: f64, decimals: u8) -> Value {
        json!({
            "account": { "data": { "parsed": { "info": {
                "mint": mint,
                "tokenAmount": { "uiAmount": ui_amount, "decimals": decimals }
            }}}}
        })
    }

    #[test]
    fn test_token_accounts_filter_dust() {
        let result = json!({
            "value": [
                token_account("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 12.5, 6),
                token_account("So11111111111111111111111111111111111111112", 0.001, 9),
            ]
        });

        let tokens = parse_token_accounts(&result);
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].contract_address,
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        );
        assert_eq!(tokens[0].decimals, 6);
        assert_eq!(tokens[0].chain, Chain::Sol);
    }

    #[test]
    fn test_token_accounts_capped_at_ten() {
        let accounts: Vec<Value> = (0..15)
            .map(|i| token_account(&format!("Mint{:040}", i), 5.0, 6))
            .collect();
        let result = json!({ "value": accounts });

        let tokens = parse_token_accounts(&result);
        assert_eq!(tokens.len(), MAX_TOKEN_ENTRIES);
    }

    #[test]
    fn test_latest_activity_placeholders() {
        let entry = json!({
            "signature": "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7",
            "blockTime": 1700000000
        });

        let latest = parse_latest_activity(&entry);
        assert_eq!(latest.timestamp, 1_700_000_000_000);
        // Placeholder values, by contract of this endpoint set
        assert_eq!(latest.amount, 0.0);
        assert_eq!(latest.fee, 0.0);
        assert_eq!(latest.direction, TxDirection::Out);
    }
}
