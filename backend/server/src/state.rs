use std::{sync::Arc, time::Duration};

use process::{Aggregator, models::View};
use tracing::info;
use upstream::{Authenticator, HttpAuthenticator, HttpSource, Source, TokenProvider};

use super::{
    cache::{Store, TtlCache},
    config::Config,
    database::RedisStore,
    error::AppError,
    refresh::{Orchestrator, ViewPolicies},
};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

pub struct State {
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
    pub tokens: Arc<TokenProvider>,
}

impl State {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(upstream::SourceError::from)?;

        let authenticator: Arc<dyn Authenticator> = Arc::new(HttpAuthenticator::new(
            http.clone(),
            &config.upstream_url,
            config.credentials.clone(),
        ));
        let tokens = Arc::new(TokenProvider::new(authenticator, config.token_margin));
        let source: Arc<dyn Source> =
            Arc::new(HttpSource::new(http, &config.upstream_url, tokens.clone()));

        let store: Arc<dyn Store> = match &config.redis_url {
            Some(redis_url) => {
                info!("Using Redis view store");
                Arc::new(RedisStore::connect(redis_url).await?)
            }
            None => {
                info!("Using in-memory view store");
                Arc::new(TtlCache::<View>::new())
            }
        };

        let aggregator = Aggregator::new(source).with_concurrency(config.fetch_concurrency);
        let orchestrator = Arc::new(Orchestrator::new(
            aggregator,
            store,
            ViewPolicies::from_config(&config),
        ));

        // drop views left behind by a previous run
        orchestrator.flush().await?;

        Ok(Self {
            config,
            orchestrator,
            tokens,
        })
    }
}
