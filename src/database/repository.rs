use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use super::models::{NewProfile, Socials, UserProfile};
use crate::types::Chain;

/// Profile persistence seam. Reads degrade (empty list / `None`) on
/// storage failure; creation is the one operation whose errors propagate
/// to the caller.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_all_profiles(&self) -> Vec<UserProfile>;

    async fn get_profile_by_username(&self, username: &str) -> Option<UserProfile>;

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile>;
}

fn build_profile(new_profile: NewProfile) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4().to_string(),
        username: new_profile.username,
        address: new_profile.address,
        chain: new_profile.chain,
        created_at: Utc::now().timestamp_millis(),
        logo_url: new_profile.logo_url,
        socials: new_profile.socials,
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: &sqlx::postgres::PgRow) -> UserProfile {
        let socials = row
            .get::<Option<serde_json::Value>, _>("socials")
            .and_then(|value| serde_json::from_value::<Socials>(value).ok());
        let chain: String = row.get("chain");

        UserProfile {
            id: row.get("id"),
            username: row.get("username"),
            address: row.get("address"),
            // Rows predating a chain rename fall back to ETH
            chain: Chain::from_str(&chain).unwrap_or(Chain::Eth),
            created_at: row.get("created_at"),
            logo_url: row.get("logo_url"),
            socials,
        }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_all_profiles(&self) -> Vec<UserProfile> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, address, chain, created_at, logo_url, socials
            FROM profiles
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        match rows {
            Ok(rows) => rows.iter().map(Self::row_to_profile).collect(),
            Err(e) => {
                error!("❌ Failed to list profiles: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_profile_by_username(&self, username: &str) -> Option<UserProfile> {
        let row = sqlx::query(
            r#"
            SELECT id, username, address, chain, created_at, logo_url, socials
            FROM profiles
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await;

        match row {
            // No row is the expected miss, not an error
            Ok(row) => row.as_ref().map(Self::row_to_profile),
            Err(e) => {
                error!("❌ Profile lookup failed for {}: {}", username, e);
                None
            }
        }
    }

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile> {
        let profile = build_profile(new_profile);
        let socials = profile
            .socials
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, address, chain, created_at, logo_url, socials)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.address)
        .bind(profile.chain.as_str())
        .bind(profile.created_at)
        .bind(&profile.logo_url)
        .bind(socials)
        .execute(&self.pool)
        .await?;

        info!("Created profile: {} ({})", profile.username, profile.id);
        Ok(profile)
    }
}

/// In-memory store used by tests and as the boot fallback when no
/// database is reachable.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_all_profiles(&self) -> Vec<UserProfile> {
        let profiles = self.profiles.read().await;
        let mut all: Vec<UserProfile> = profiles.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    async fn get_profile_by_username(&self, username: &str) -> Option<UserProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(&username.to_lowercase()).cloned()
    }

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let key = new_profile.username.to_lowercase();
        if profiles.contains_key(&key) {
            return Err(anyhow::anyhow!(
                "username {} is already taken",
                new_profile.username
            ));
        }
        let profile = build_profile(new_profile);
        profiles.insert(key, profile.clone());
        Ok(profile)
    }
}
