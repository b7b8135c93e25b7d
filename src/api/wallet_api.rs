use axum::{response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiResponse;
use crate::types::Chain;
use crate::wallet::{create_verification_message, verify_evm_signature, verify_solana_signature};

/// Stateless: challenges are not stored server-side, so there is no
/// replay tracking.
#[derive(Clone, Default)]
pub struct WalletApiState;

#[derive(Debug, Deserialize)]
pub struct MessageParams {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub address: String,
    pub chain: Chain,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub chain: Chain,
}

pub fn create_wallet_router() -> Router<WalletApiState> {
    Router::new()
        .route("/message", post(create_message))
        .route("/verify", post(verify_signature))
}

async fn create_message(Json(params): Json<MessageParams>) -> Json<ApiResponse<MessageResponse>> {
    let message = create_verification_message(&params.address);
    Json(ApiResponse::success(MessageResponse { message }))
}

async fn verify_signature(Json(params): Json<VerifyParams>) -> Json<ApiResponse<VerifyResponse>> {
    let verified = match params.chain {
        Chain::Eth | Chain::Bnb => {
            let raw = params.signature.trim_start_matches("0x");
            match hex::decode(raw) {
                Ok(bytes) => verify_evm_signature(&params.address, &params.message, &bytes),
                Err(_) => false,
            }
        }
        Chain::Sol => {
            let bytes = bs58::decode(&params.signature)
                .into_vec()
                .ok()
                .or_else(|| hex::decode(params.signature.trim_start_matches("0x")).ok());
            match bytes {
                Some(bytes) => verify_solana_signature(&params.address, &params.message, &bytes),
                None => false,
            }
        }
        Chain::Btc => {
            return Json(ApiResponse::error(
                "BTC profiles use manual entry; no signature verification".to_string(),
            ))
        }
    };

    info!(
        "Signature verification for {} on {}: {}",
        params.address,
        params.chain.as_str(),
        verified
    );
    // A mismatch is a result, not an error; callers may retry
    Json(ApiResponse::success(VerifyResponse {
        verified,
        chain: params.chain,
    }))
}
