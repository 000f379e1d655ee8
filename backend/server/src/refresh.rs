//! # Refresh
//!
//! Decides when a view is served from the store and when it is recomputed.
//!
//! ## Read Path
//! - Hit on an unexpired entry is returned without any upstream traffic
//! - Miss or expiry computes the view, stores it with the view's TTL, returns it
//! - If the user listing is unreachable on a miss, an empty view is served and not stored
//!
//! ## Scheduled Path
//! - Recomputes regardless of what is stored and overwrites the entry
//! - A failed cycle leaves the previous entry untouched
//!
//! Concurrent misses may each compute, the last write wins.

use std::{sync::Arc, time::Duration};

use process::{
    Aggregator,
    models::{View, ViewKind},
};
use tracing::{debug, info, warn};

use crate::{cache::Store, config::Config, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPolicy {
    pub ttl: Duration,
    pub refresh_every: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPolicies {
    pub users: ViewPolicy,
    pub posts: ViewPolicy,
}

impl ViewPolicies {
    pub fn from_config(config: &Config) -> Self {
        Self {
            users: ViewPolicy {
                ttl: config.users_ttl,
                refresh_every: config.users_refresh,
            },
            posts: ViewPolicy {
                ttl: config.posts_ttl,
                refresh_every: config.posts_refresh,
            },
        }
    }

    pub fn for_view(&self, kind: ViewKind) -> ViewPolicy {
        match kind {
            ViewKind::TopUsers => self.users,
            ViewKind::LatestPosts | ViewKind::PopularPosts => self.posts,
        }
    }
}

pub struct Orchestrator {
    aggregator: Aggregator,
    store: Arc<dyn Store>,
    policies: ViewPolicies,
}

impl Orchestrator {
    pub fn new(aggregator: Aggregator, store: Arc<dyn Store>, policies: ViewPolicies) -> Self {
        Self {
            aggregator,
            store,
            policies,
        }
    }

    pub fn policies(&self) -> &ViewPolicies {
        &self.policies
    }

    pub async fn get_or_compute(&self, kind: ViewKind) -> Result<View, AppError> {
        match self.store.get(kind.key()).await {
            Ok(Some(view)) => {
                debug!(view = %kind, "Cache hit");
                return Ok(view);
            }
            Ok(None) => debug!(view = %kind, "Cache miss"),
            Err(e) => warn!(view = %kind, "Cache read failed, recomputing: {e}"),
        }

        let view = match self.aggregator.compute(kind).await {
            Ok(view) => view,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(view = %kind, "Serving empty view: {e}");
                return Ok(kind.empty());
            }
        };

        let ttl = self.policies.for_view(kind).ttl;
        if let Err(e) = self.store.set(kind.key(), view.clone(), ttl).await {
            warn!(view = %kind, "Failed to cache view: {e}");
        }

        Ok(view)
    }

    pub async fn scheduled_refresh(&self, kind: ViewKind) -> Result<(), AppError> {
        let view = self.aggregator.compute(kind).await?;
        let items = view.len();

        self.store
            .set(kind.key(), view, self.policies.for_view(kind).ttl)
            .await?;

        info!(view = %kind, items, "View refreshed");
        Ok(())
    }

    pub async fn flush(&self) -> Result<(), AppError> {
        self.store.flush().await?;

        info!("View store flushed");
        Ok(())
    }
}
