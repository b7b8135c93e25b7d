use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info};

const COINGECKO_SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const PRICE_TTL: Duration = Duration::from_secs(60);
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Time source, injected so tests can drive the TTL.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Upstream USD price lookup for a batch of coin identifiers.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>>;
}

pub struct HttpPriceSource {
    client: Client,
}

impl HttpPriceSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_prices(&self, ids: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        let url = format!(
            "{}?ids={}&vs_currencies=usd",
            COINGECKO_SIMPLE_PRICE_URL,
            ids.join(",")
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "VerifiedOnChain/1.0")
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "price API returned status {}",
                response.status()
            ));
        }

        let payload: Value = response.json().await?;
        let mut prices = HashMap::new();
        for id in ids {
            if let Some(price) = payload
                .get(id)
                .and_then(|entry| entry.get("usd"))
                .and_then(|price| price.as_f64())
            {
                prices.insert(id.clone(), price);
            }
        }

        info!("💰 Refreshed {} price(s) from upstream", prices.len());
        Ok(prices)
    }
}

struct PriceEntry {
    price_usd: f64,
    fetched_at: Instant,
}

/// In-process price cache with a fixed TTL. Owned and passed by handle
/// rather than living in module state; the clock and upstream source are
/// injected so the TTL behavior is testable.
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<String, PriceEntry>>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_defaults(client: Client) -> Self {
        Self::new(
            Arc::new(HttpPriceSource::new(client)),
            Arc::new(SystemClock),
            PRICE_TTL,
        )
    }

    /// USD prices for the requested coin ids. Entries fetched within the
    /// TTL are served from memory; all missing or stale ids go upstream in
    /// one batched call. Upstream failure is swallowed: whatever is cached
    /// is returned and absent ids resolve to 0.0.
    pub async fn get_prices(&self, ids: &[&str]) -> HashMap<String, f64> {
        let now = self.clock.now();

        let stale: Vec<String> = {
            let entries = self.entries.read().await;
            ids.iter()
                .filter(|id| match entries.get(**id) {
                    Some(entry) => now.duration_since(entry.fetched_at) >= self.ttl,
                    None => true,
                })
                .map(|id| id.to_string())
                .collect()
        };

        if !stale.is_empty() {
            match self.source.fetch_prices(&stale).await {
                Ok(fresh) => {
                    let mut entries = self.entries.write().await;
                    for (id, price_usd) in fresh {
                        entries.insert(
                            id,
                            PriceEntry {
                                price_usd,
                                fetched_at: now,
                            },
                        );
                    }
                }
                Err(e) => {
                    // Degrade to cached (possibly zero) values.
                    error!("❌ Price refresh failed for {:?}: {}", stale, e);
                }
            }
        }

        let entries = self.entries.read().await;
        ids.iter()
            .map(|id| {
                let price = entries.get(*id).map(|entry| entry.price_usd).unwrap_or(0.0);
                (id.to_string(), price)
            })
            .collect()
    }

    /// Convenience for the single-coin case the chain fetchers use.
    pub async fn get_price(&self, id: &str) -> f64 {
        self.get_prices(&[id]).await.get(id).copied().unwrap_or(0.0)
    }
}
