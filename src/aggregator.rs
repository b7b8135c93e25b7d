use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::chains::{BtcStatsSource, ChainStatsSource, EvmStatsSource, SolanaStatsSource};
use crate::prices::PriceCache;
use crate::types::{Chain, ValuePoint, WalletStats};

pub const HISTORY_DAYS: usize = 365;
const DAY_MILLIS: i64 = 86_400_000;

/// Routes an (address, chain) pair to its statistics source and attaches
/// the simulated value history.
pub struct StatsAggregator {
    sources: HashMap<Chain, Arc<dyn ChainStatsSource>>,
    // Fixed seed for deterministic histories in tests; entropy otherwise.
    history_seed: Option<u64>,
}

impl StatsAggregator {
    pub fn new(client: Client, prices: Arc<PriceCache>) -> Self {
        let mut sources: HashMap<Chain, Arc<dyn ChainStatsSource>> = HashMap::new();
        sources.insert(
            Chain::Btc,
            Arc::new(BtcStatsSource::new(client.clone(), prices.clone())),
        );
        sources.insert(
            Chain::Eth,
            Arc::new(EvmStatsSource::new(client.clone(), prices.clone(), Chain::Eth)),
        );
        sources.insert(
            Chain::Bnb,
            Arc::new(EvmStatsSource::new(client.clone(), prices.clone(), Chain::Bnb)),
        );
        sources.insert(Chain::Sol, Arc::new(SolanaStatsSource::new(client, prices)));

        Self {
            sources,
            history_seed: None,
        }
    }

    /// Custom source set, used by tests to substitute mock backends.
    pub fn from_sources(sources: HashMap<Chain, Arc<dyn ChainStatsSource>>) -> Self {
        Self {
            sources,
            history_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.history_seed = Some(seed);
        self
    }

    /// Full wallet analytics for one address. The per-chain source never
    /// fails outward, so neither does this; an unregistered chain yields
    /// zeroed stats.
    pub async fn fetch_wallet_stats(&self, address: &str, chain: Chain) -> WalletStats {
        let mut stats = match self.sources.get(&chain) {
            Some(source) => source.fetch_stats(address).await,
            None => WalletStats::zeroed(),
        };

        let mut rng = match self.history_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        stats.history = synthesize_history(stats.amount_usd, Utc::now().timestamp_millis(), &mut rng);
        stats.is_simulated_history = true;

        info!(
            "📊 Aggregated {} stats for {}: ${:.2}",
            chain.as_str(),
            address,
            stats.amount_usd
        );
        stats
    }
}

/// Fabricates a 365-day value history anchored to the real current USD
/// value: walking backward from today, each prior day is the next day's
/// value divided by a pseudo-random factor in [0.95, 1.05). The series is
/// entirely synthetic -- callers see `isSimulatedHistory` and must
/// disclose it. The newest point is pinned to the exact real value.
pub fn synthesize_history(current_value: f64, now_millis: i64, rng: &mut StdRng) -> Vec<ValuePoint> {
    let mut values = vec![0.0; HISTORY_DAYS];
    values[HISTORY_DAYS - 1] = current_value;

    for i in (0..HISTORY_DAYS - 1).rev() {
        let daily_factor: f64 = rng.gen_range(0.95..1.05);
        values[i] = values[i + 1] / daily_factor;
    }

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| ValuePoint {
            date: now_millis - ((HISTORY_DAYS - 1 - i) as i64) * DAY_MILLIS,
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedSource {
        chain: Chain,
        amount_usd: f64,
    }

    #[async_trait]
    impl ChainStatsSource for FixedSource {
        fn chain(&self) -> Chain {
            self.chain
        }

        async fn fetch_stats(&self, _address: &str) -> WalletStats {
            let mut stats = WalletStats::zeroed();
            stats.balance = 1.0;
            stats.price_usd = self.amount_usd;
            stats.amount_usd = self.amount_usd;
            stats
        }
    }

    fn test_aggregator(amount_usd: f64) -> StatsAggregator {
        let mut sources: HashMap<Chain, Arc<dyn ChainStatsSource>> = HashMap::new();
        sources.insert(
            Chain::Btc,
            Arc::new(FixedSource {
                chain: Chain::Btc,
                amount_usd,
            }),
        );
        StatsAggregator::from_sources(sources).with_seed(42)
    }

    #[tokio::test]
    async fn test_history_shape_and_anchor() {
        let aggregator = test_aggregator(12_345.67);
        let stats = aggregator
            .fetch_wallet_stats("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Chain::Btc)
            .await;

        assert_eq!(stats.history.len(), HISTORY_DAYS);
        assert!(stats.is_simulated_history);

        // Ascending day-step dates with no gaps
        for pair in stats.history.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, DAY_MILLIS);
        }

        // The newest point is the exact real value
        assert_eq!(stats.history.last().unwrap().value, 12_345.67);
    }

    #[tokio::test]
    async fn test_history_factors_bounded() {
        let aggregator = test_aggregator(1_000.0);
        let stats = aggregator
            .fetch_wallet_stats("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Chain::Btc)
            .await;

        for pair in stats.history.windows(2) {
            if pair[0].value > 0.0 {
                let factor = pair[1].value / pair[0].value;
                // Small epsilon: the factor is recovered through division
                assert!(
                    factor > 0.95 - 1e-9 && factor < 1.05 + 1e-9,
                    "factor {} out of range",
                    factor
                );
            }
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_sequence() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let history_a = synthesize_history(500.0, 1_700_000_000_000, &mut rng_a);
        let history_b = synthesize_history(500.0, 1_700_000_000_000, &mut rng_b);
        assert_eq!(history_a, history_b);
    }

    #[test]
    fn test_zero_balance_history_is_flat_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let history = synthesize_history(0.0, 1_700_000_000_000, &mut rng);
        assert_eq!(history.len(), HISTORY_DAYS);
        assert!(history.iter().all(|point| point.value == 0.0));
    }

    #[tokio::test]
    async fn test_unknown_chain_yields_zeroed_stats() {
        let aggregator = test_aggregator(1.0);
        let stats = aggregator
            .fetch_wallet_stats("0xABCDEF0123456789abcdef0123456789ABCDEF01", Chain::Eth)
            .await;

        assert_eq!(stats.balance, 0.0);
        assert_eq!(stats.history.len(), HISTORY_DAYS);
        assert!(stats.is_simulated_history);
    }
}
