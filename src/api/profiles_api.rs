use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::ApiResponse;
use crate::addressing::is_valid_address;
use crate::database::{is_valid_username, NewProfile, ProfileStore, Socials, UserProfile};
use crate::types::Chain;
use crate::wallet::{verify_evm_signature, verify_solana_signature};

#[derive(Clone)]
pub struct ProfilesApiState {
    pub store: Arc<dyn ProfileStore>,
}

impl ProfilesApiState {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }
}

/// Submission payload. `signature`/`message` are present only on the
/// wallet-connect path; manual entry submits without them.
#[derive(Debug, Deserialize)]
pub struct SubmitProfileParams {
    pub username: String,
    pub address: String,
    pub chain: Chain,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    pub socials: Option<Socials>,
    pub signature: Option<String>,
    pub message: Option<String>,
}

pub fn create_profiles_router() -> Router<ProfilesApiState> {
    Router::new()
        .route("/", get(list_profiles).post(submit_profile))
        .route("/:username", get(get_profile))
}

async fn list_profiles(
    State(state): State<ProfilesApiState>,
) -> Json<ApiResponse<Vec<UserProfile>>> {
    let profiles = state.store.get_all_profiles().await;
    info!("Listing {} profile(s)", profiles.len());
    Json(ApiResponse::success(profiles))
}

async fn get_profile(
    State(state): State<ProfilesApiState>,
    Path(username): Path<String>,
) -> Json<ApiResponse<UserProfile>> {
    match state.store.get_profile_by_username(&username).await {
        Some(profile) => Json(ApiResponse::success(profile)),
        None => Json(ApiResponse::error(format!(
            "profile not found: {}",
            username
        ))),
    }
}

async fn submit_profile(
    State(state): State<ProfilesApiState>,
    Json(params): Json<SubmitProfileParams>,
) -> Json<ApiResponse<UserProfile>> {
    if !is_valid_username(&params.username) {
        return Json(ApiResponse::error(
            "username must be 3-20 characters, letters/numbers/underscores only".to_string(),
        ));
    }

    if !is_valid_address(&params.address, params.chain) {
        warn!(
            "Rejected submission with invalid {} address: {}",
            params.chain.as_str(),
            params.address
        );
        return Json(ApiResponse::error(format!(
            "invalid {} address: {}",
            params.chain.as_str(),
            params.address
        )));
    }

    // Wallet-connect submissions carry a signed ownership challenge;
    // manual entry skips signing entirely.
    if let (Some(signature), Some(message)) = (&params.signature, &params.message) {
        if !verify_ownership(&params.address, params.chain, message, signature) {
            return Json(ApiResponse::error(
                "signature verification failed: signer does not match address".to_string(),
            ));
        }
    }

    let new_profile = NewProfile {
        username: params.username,
        address: params.address,
        chain: params.chain,
        logo_url: params.logo_url,
        socials: params.socials,
    };

    match state.store.create_profile(new_profile).await {
        Ok(profile) => Json(ApiResponse::success(profile)),
        Err(e) => {
            // Storage-write failures are the one class that propagates
            error!("❌ Profile creation failed: {}", e);
            Json(ApiResponse::error(format!("profile creation failed: {}", e)))
        }
    }
}

fn verify_ownership(address: &str, chain: Chain, message: &str, signature: &str) -> bool {
    match chain {
        Chain::Eth | Chain::Bnb => {
            let raw = signature.trim_start_matches("0x");
            match hex::decode(raw) {
                Ok(bytes) => verify_evm_signature(address, message, &bytes),
                Err(_) => false,
            }
        }
        Chain::Sol => {
            let bytes = bs58::decode(signature)
                .into_vec()
                .ok()
                .or_else(|| hex::decode(signature.trim_start_matches("0x")).ok());
            match bytes {
                Some(bytes) => verify_solana_signature(address, message, &bytes),
                None => false,
            }
        }
        // BTC profiles arrive through manual entry; no signature flow
        Chain::Btc => false,
    }
}
