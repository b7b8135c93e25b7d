use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use verifiedonchain_backend::aggregator::StatsAggregator;
use verifiedonchain_backend::api::{
    create_profiles_router, create_stats_router, create_wallet_router, ProfilesApiState,
    StatsApiState, WalletApiState,
};
use verifiedonchain_backend::database::{
    InMemoryProfileStore, MigrationRunner, PgProfileStore, ProfileStore,
};
use verifiedonchain_backend::prices::PriceCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let client = reqwest::Client::new();

    let prices = Arc::new(PriceCache::with_defaults(client.clone()));
    let aggregator = Arc::new(StatsAggregator::new(client, prices));
    info!("✅ Wallet stats aggregator initialized");

    let store = connect_profile_store().await;

    let app = Router::new()
        .nest(
            "/api/profiles",
            create_profiles_router().with_state(ProfilesApiState::new(store)),
        )
        .nest(
            "/api/stats",
            create_stats_router().with_state(StatsApiState::new(aggregator)),
        )
        .nest(
            "/api/wallet",
            create_wallet_router().with_state(WalletApiState),
        )
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive());

    info!("🔧 Routes configured:");
    info!("  - /api/profiles/* (Directory listing and submission)");
    info!("  - /api/stats (Per-wallet analytics)");
    info!("  - /api/wallet/* (Ownership verification)");
    info!("  - /health");
    info!("🚀 Starting server on 0.0.0.0:3000");

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Postgres when `DATABASE_URL` is reachable, in-memory otherwise. The
/// directory stays browsable either way; in-memory contents do not
/// survive a restart.
async fn connect_profile_store() -> Arc<dyn ProfileStore> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            warn!("⚠️ DATABASE_URL not set, using in-memory profile store");
            return Arc::new(InMemoryProfileStore::new());
        }
    };

    match PgPoolOptions::new().max_connections(5).connect(&url).await {
        Ok(pool) => {
            if let Err(e) = MigrationRunner::new(pool.clone()).run_migrations().await {
                warn!("⚠️ Migrations failed ({}), using in-memory profile store", e);
                return Arc::new(InMemoryProfileStore::new());
            }
            info!("✅ Profile store connected");
            Arc::new(PgProfileStore::new(pool))
        }
        Err(e) => {
            warn!(
                "⚠️ Database connection failed ({}), using in-memory profile store",
                e
            );
            Arc::new(InMemoryProfileStore::new())
        }
    }
}

async fn health_check() -> &'static str {
    info!("Health check requested");
    "OK"
}
