pub mod profiles_api;
pub mod stats_api;
pub mod wallet_api;

pub use profiles_api::{create_profiles_router, ProfilesApiState, SubmitProfileParams};
pub use stats_api::{create_stats_router, StatsApiState, StatsQuery};
pub use wallet_api::{
    create_wallet_router, MessageResponse, VerifyParams, VerifyResponse, WalletApiState,
};

use serde::{Deserialize, Serialize};

/// Uniform response envelope. Degraded data still rides a success
/// envelope; only validation and storage-write failures surface as
/// errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_secs(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: now_secs(),
        }
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
