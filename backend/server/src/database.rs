//! # Redis
//!
//! Shared view store for deployments running more than one server.
//!
//! ## Implementation
//!
//! - One string key per view under the `pulse:` prefix
//! - Value is the tagged JSON of the [`View`]
//! - Lifetime is handled by Redis through `SET ... EX`, rounded up to a whole second
//! - A value that no longer decodes reads as a miss and gets recomputed
use std::time::Duration;

use async_trait::async_trait;
use process::models::{View, ViewKind};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::warn;

use crate::{cache::Store, error::AppError};

const KEY_PREFIX: &str = "pulse:";

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        Ok(Self { connection })
    }

    fn key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<View>, AppError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(Self::key(key)).await?;

        Ok(raw.and_then(|json| {
            serde_json::from_str(&json)
                .map_err(|e| warn!(key, "Discarding undecodable view: {e}"))
                .ok()
        }))
    }

    async fn set(&self, key: &str, view: View, ttl: Duration) -> Result<(), AppError> {
        let json = serde_json::to_string(&view)?;
        let seconds = ttl.as_secs().max(1);

        let mut connection = self.connection.clone();
        let _: () = connection.set_ex(Self::key(key), json, seconds).await?;

        Ok(())
    }

    async fn flush(&self) -> Result<(), AppError> {
        let keys: Vec<String> = ViewKind::ALL.iter().map(|kind| Self::key(kind.key())).collect();

        let mut connection = self.connection.clone();
        let _: () = connection.del(keys).await?;

        Ok(())
    }
}
