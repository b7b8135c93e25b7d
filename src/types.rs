use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    Btc,
    Eth,
    Sol,
    Bnb,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Btc => "BTC",
            Chain::Eth => "ETH",
            Chain::Sol => "SOL",
            Chain::Bnb => "BNB",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BTC" | "BITCOIN" => Some(Chain::Btc),
            "ETH" | "ETHEREUM" => Some(Chain::Eth),
            "SOL" | "SOLANA" => Some(Chain::Sol),
            "BNB" | "BSC" => Some(Chain::Bnb),
            _ => None,
        }
    }

    /// CoinGecko identifier of the chain's native coin.
    pub fn coin_id(&self) -> &'static str {
        match self {
            Chain::Btc => "bitcoin",
            Chain::Eth => "ethereum",
            Chain::Sol => "solana",
            Chain::Bnb => "binancecoin",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Btc => "BTC",
            Chain::Eth => "ETH",
            Chain::Sol => "SOL",
            Chain::Bnb => "BNB",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    In,
    Out,
}

/// One day of (simulated) portfolio value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    pub date: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAsset {
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    pub decimals: u8,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    pub chain: Chain,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    #[serde(rename = "priceUSD")]
    pub price_usd: Option<f64>,
    #[serde(rename = "valueUSD")]
    pub value_usd: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestTransaction {
    pub hash: String,
    pub timestamp: i64,
    pub direction: TxDirection,
    pub counterparties: Vec<String>,
    pub fee: f64,
    pub amount: f64,
    #[serde(rename = "amountUSD")]
    pub amount_usd: f64,
}

/// Ephemeral wallet analytics, recomputed on every request. The value
/// history is fabricated (see the aggregator) and carries a disclosure
/// flag that callers must surface to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStats {
    pub balance: f64,
    #[serde(rename = "txCount")]
    pub tx_count: u64,
    #[serde(rename = "firstTxDate")]
    pub first_tx_date: Option<i64>,
    pub history: Vec<ValuePoint>,
    #[serde(rename = "isSimulatedHistory")]
    pub is_simulated_history: bool,
    pub tokens: Vec<TokenAsset>,
    #[serde(rename = "latestTx")]
    pub latest_tx: Option<LatestTransaction>,
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    #[serde(rename = "amountUSD")]
    pub amount_usd: f64,
}

impl WalletStats {
    /// Degraded default returned whenever an upstream source fails.
    pub fn zeroed() -> Self {
        Self {
            balance: 0.0,
            tx_count: 0,
            first_tx_date: None,
            history: Vec::new(),
            is_simulated_history: true,
            tokens: Vec::new(),
            latest_tx: None,
            price_usd: 0.0,
            amount_usd: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalletProviderKind {
    Evm,
    Solana,
}

/// Transient session value produced by the wallet-connect flow and
/// discarded after profile submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedWallet {
    pub address: String,
    pub chain: Chain,
    pub provider: WalletProviderKind,
}
