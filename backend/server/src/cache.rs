//! # View Store
//!
//! Keyed storage for computed views with a per-entry time to live.
//!
//! - [`TtlCache`] keeps entries in process memory and is the default
//! - [`RedisStore`](crate::database::RedisStore) is used when `REDIS_URL` is set
//! - An expired entry reads as absent, it is never served
//! - A write replaces the previous entry and restarts its lifetime

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use process::models::View;
use tokio::{sync::RwLock, time::Instant};

use crate::error::AppError;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<View>, AppError>;

    async fn set(&self, key: &str, view: View, ttl: Duration) -> Result<(), AppError>;

    async fn flush(&self) -> Result<(), AppError>;
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;

        entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };

        self.entries.write().await.insert(key.into(), entry);
    }

    pub async fn flush(&self) {
        self.entries.write().await.clear();
    }

    /// Includes entries that expired but were not overwritten yet.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Store for TtlCache<View> {
    async fn get(&self, key: &str) -> Result<Option<View>, AppError> {
        Ok(TtlCache::get(self, key).await)
    }

    async fn set(&self, key: &str, view: View, ttl: Duration) -> Result<(), AppError> {
        TtlCache::set(self, key, view, ttl).await;
        Ok(())
    }

    async fn flush(&self) -> Result<(), AppError> {
        TtlCache::flush(self).await;
        Ok(())
    }
}
