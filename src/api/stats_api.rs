use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::ApiResponse;
use crate::addressing::is_valid_address;
use crate::aggregator::StatsAggregator;
use crate::types::{Chain, WalletStats};

#[derive(Clone)]
pub struct StatsApiState {
    pub aggregator: Arc<StatsAggregator>,
}

impl StatsApiState {
    pub fn new(aggregator: Arc<StatsAggregator>) -> Self {
        Self { aggregator }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub address: String,
    pub chain: String,
}

pub fn create_stats_router() -> Router<StatsApiState> {
    Router::new().route("/", get(get_wallet_stats))
}

async fn get_wallet_stats(
    State(state): State<StatsApiState>,
    Query(query): Query<StatsQuery>,
) -> Json<ApiResponse<WalletStats>> {
    let chain = match Chain::from_str(&query.chain) {
        Some(chain) => chain,
        None => {
            return Json(ApiResponse::error(format!(
                "unsupported chain: {}",
                query.chain
            )))
        }
    };

    if !is_valid_address(&query.address, chain) {
        return Json(ApiResponse::error(format!(
            "invalid {} address: {}",
            chain.as_str(),
            query.address
        )));
    }

    info!("Fetching {} stats for {}", chain.as_str(), query.address);
    // Upstream failures never surface here; the aggregator degrades to
    // zeroed stats on its own.
    let stats = state.aggregator.fetch_wallet_stats(&query.address, chain).await;
    Json(ApiResponse::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::HISTORY_DAYS;
    use crate::chains::ChainStatsSource;
    use async_trait::async_trait;
    use axum_test::TestServer;
    use std::collections::HashMap;

    struct StubSource;

    #[async_trait]
    impl ChainStatsSource for StubSource {
        fn chain(&self) -> Chain {
            Chain::Eth
        }

        async fn fetch_stats(&self, _address: &str) -> WalletStats {
            let mut stats = WalletStats::zeroed();
            stats.balance = 2.0;
            stats.price_usd = 1500.0;
            stats.amount_usd = 3000.0;
            stats
        }
    }

    fn test_server() -> TestServer {
        let mut sources: HashMap<Chain, Arc<dyn ChainStatsSource>> = HashMap::new();
        sources.insert(Chain::Eth, Arc::new(StubSource));
        let aggregator = Arc::new(StatsAggregator::from_sources(sources).with_seed(42));
        let app = create_stats_router().with_state(StatsApiState::new(aggregator));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_stats_envelope_with_history() {
        let server = test_server();

        let response = server
            .get("/")
            .add_query_param("address", "0xABCDEF0123456789abcdef0123456789ABCDEF01")
            .add_query_param("chain", "ETH")
            .await;
        let body: ApiResponse<WalletStats> = response.json();

        assert!(body.success);
        let stats = body.data.unwrap();
        assert_eq!(stats.history.len(), HISTORY_DAYS);
        assert!(stats.is_simulated_history);
        assert_eq!(stats.history.last().unwrap().value, 3000.0);
    }

    #[tokio::test]
    async fn test_bad_chain_rejected() {
        let server = test_server();

        let response = server
            .get("/")
            .add_query_param("address", "0xABCDEF0123456789abcdef0123456789ABCDEF01")
            .add_query_param("chain", "DOGE")
            .await;
        let body: ApiResponse<WalletStats> = response.json();

        assert!(!body.success);
        assert!(body.error.unwrap().contains("DOGE"));
    }

    #[tokio::test]
    async fn test_bad_address_rejected() {
        let server = test_server();

        let response = server
            .get("/")
            .add_query_param("address", "not-an-address")
            .add_query_param("chain", "ETH")
            .await;
        let body: ApiResponse<WalletStats> = response.json();

        assert!(!body.success);
        assert!(body.error.unwrap().contains("ETH"));
    }
}
