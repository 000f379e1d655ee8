//! # Session Tokens
//!
//! Every collaborator call carries a bearer token obtained from `POST /auth`.
//!
//! ## Lifecycle
//! - `Unauthenticated`: nothing held, the first [`TokenProvider::token`] call exchanges credentials
//! - `Authenticated`: one token held, handed out until it expires
//! - `Authenticated(renewing)`: the renewal job re-exchanges at `expiry - margin`, readers keep
//!   the old token meanwhile
//!
//! A failed exchange leaves the held state untouched and is never retried by the
//! provider itself. The next caller that needs a token triggers a fresh exchange.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};

use crate::{error::SourceError, models::AuthResponse};

/// `expires_in` values above this are absolute Unix timestamps rather than lifetimes.
const ABSOLUTE_EXPIRY_THRESHOLD: i64 = 1_000_000_000;

/// Earliest renewal after issue, however short the token lives.
const MIN_RENEW_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "companyName", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "ownerName", skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(rename = "ownerEmail", skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(rename = "rollNo", skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            company_name: None,
            owner_name: None,
            owner_email: None,
            roll_no: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("company_name", &self.company_name)
            .field("owner_name", &self.owner_name)
            .field("owner_email", &self.owner_email)
            .field("roll_no", &self.roll_no)
            .finish()
    }
}

#[derive(Clone)]
pub struct Token {
    access_token: String,
    token_type: String,
    issued_at: Instant,
    expires_at: Instant,
}

impl Token {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let issued_at = Instant::now();

        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            issued_at,
            expires_at: issued_at + lifetime,
        }
    }

    pub fn from_response(response: AuthResponse) -> Self {
        let lifetime = lifetime_from(response.expires_in);

        Self::new(response.access_token, response.token_type, lifetime)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.issued_at
    }

    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }

    /// Falls back to half the lifetime when the margin would swallow all of it.
    /// Never earlier than `MIN_RENEW_DELAY` after issue.
    pub fn renew_at(&self, margin: Duration) -> Instant {
        let lifetime = self.lifetime();

        let delay = if lifetime > margin {
            lifetime - margin
        } else {
            lifetime / 2
        };

        self.issued_at + delay.max(MIN_RENEW_DELAY)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("lifetime", &self.lifetime())
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

fn lifetime_from(expires_in: i64) -> Duration {
    if expires_in > ABSOLUTE_EXPIRY_THRESHOLD {
        return DateTime::<Utc>::from_timestamp(expires_in, 0)
            .and_then(|expires_at| (expires_at - Utc::now()).to_std().ok())
            .unwrap_or(Duration::ZERO);
    }

    Duration::from_secs(expires_in.max(0) as u64)
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn exchange(&self) -> Result<Token, SourceError>;
}

pub struct HttpAuthenticator {
    http: reqwest::Client,
    url: String,
    credentials: Credentials,
}

impl HttpAuthenticator {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            http,
            url: format!("{}/auth", base_url.trim_end_matches('/')),
            credentials,
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn exchange(&self) -> Result<Token, SourceError> {
        let response = self
            .http
            .post(&self.url)
            .json(&self.credentials)
            .send()
            .await
            .map_err(|e| SourceError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Auth(format!("{status} from {}", self.url)));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Auth(format!("malformed auth response: {e}")))?;

        Ok(Token::from_response(body))
    }
}

pub struct TokenProvider {
    authenticator: Arc<dyn Authenticator>,
    margin: Duration,
    current: Mutex<Option<Token>>,
    renewed: Notify,
}

impl TokenProvider {
    pub fn new(authenticator: Arc<dyn Authenticator>, margin: Duration) -> Self {
        Self {
            authenticator,
            margin,
            current: Mutex::new(None),
            renewed: Notify::new(),
        }
    }

    /// Current token, exchanging credentials first when none is valid.
    pub async fn token(&self) -> Result<Token, SourceError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref().filter(|token| token.is_valid()) {
            return Ok(token.clone());
        }

        debug!("No valid session token, exchanging credentials");
        let token = self.authenticator.exchange().await?;
        info!(lifetime_secs = token.lifetime().as_secs(), "Session token acquired");

        *current = Some(token.clone());
        self.renewed.notify_one();

        Ok(token)
    }

    /// Exchanges unconditionally. Readers keep the held token until this succeeds.
    pub async fn renew(&self) -> Result<Token, SourceError> {
        let token = self.authenticator.exchange().await?;
        info!(lifetime_secs = token.lifetime().as_secs(), "Session token renewed");

        *self.current.lock().await = Some(token.clone());
        self.renewed.notify_one();

        Ok(token)
    }

    /// Drops the held token so the next caller exchanges credentials again.
    pub async fn invalidate(&self) {
        if self.current.lock().await.take().is_some() {
            warn!("Dropping session token rejected by upstream");
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|token| token.is_valid())
    }

    pub fn spawn_renewal(self: &Arc<Self>) -> JoinHandle<()> {
        let provider = Arc::clone(self);

        tokio::spawn(async move { provider.renewal_loop().await })
    }

    async fn renewal_loop(&self) {
        loop {
            let renew_at = self
                .current
                .lock()
                .await
                .as_ref()
                .map(|token| token.renew_at(self.margin));

            let Some(renew_at) = renew_at else {
                self.renewed.notified().await;
                continue;
            };

            tokio::select! {
                _ = sleep_until(renew_at) => {
                    if let Err(e) = self.renew().await {
                        warn!("Session token renewal failed, waiting for the next exchange: {e}");
                        self.renewed.notified().await;
                    }
                }
                _ = self.renewed.notified() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use tokio::time::sleep;

    use super::*;

    struct Scripted {
        outcomes: StdMutex<VecDeque<Result<Duration, String>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<Duration, String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: StdMutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authenticator for Scripted {
        async fn exchange(&self) -> Result<Token, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err("script exhausted".to_string()));

            outcome
                .map(|lifetime| Token::new(format!("token-{call}"), "Bearer", lifetime))
                .map_err(SourceError::Auth)
        }
    }

    fn provider(script: &Arc<Scripted>, margin: Duration) -> Arc<TokenProvider> {
        let authenticator: Arc<dyn Authenticator> = script.clone();
        Arc::new(TokenProvider::new(authenticator, margin))
    }

    #[test]
    fn renew_at_respects_margin() {
        let margin = Duration::from_secs(60);

        let token = Token::new("t", "Bearer", Duration::from_secs(300));
        assert_eq!(token.renew_at(margin) - token.issued_at, Duration::from_secs(240));

        let short = Token::new("t", "Bearer", Duration::from_secs(40));
        assert_eq!(short.renew_at(margin) - short.issued_at, Duration::from_secs(20));

        let dead = Token::new("t", "Bearer", lifetime_from(0));
        assert_eq!(dead.renew_at(margin) - dead.issued_at, MIN_RENEW_DELAY);
    }

    #[test]
    fn relative_and_absolute_expiry() {
        assert_eq!(lifetime_from(300), Duration::from_secs(300));
        assert_eq!(lifetime_from(-5), Duration::ZERO);

        let in_ten_minutes = Utc::now().timestamp() + 600;
        let lifetime = lifetime_from(in_ten_minutes);
        assert!(lifetime > Duration::from_secs(590) && lifetime <= Duration::from_secs(600));

        assert_eq!(lifetime_from(ABSOLUTE_EXPIRY_THRESHOLD + 1), Duration::ZERO);
    }

    #[test]
    fn authorization_header_and_redaction() {
        let token = Token::new("secret-value", "Bearer", Duration::from_secs(10));

        assert_eq!(token.authorization(), "Bearer secret-value");
        assert!(!format!("{token:?}").contains("secret-value"));
        assert!(!format!("{:?}", Credentials::new("id", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn credentials_skip_unset_fields() {
        let mut credentials = Credentials::new("id", "secret");
        credentials.roll_no = Some("42".to_string());

        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "clientID": "id", "clientSecret": "secret", "rollNo": "42" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_reused_while_valid() {
        let script = Scripted::new(vec![Ok(Duration::from_secs(300))]);
        let tokens = provider(&script, Duration::from_secs(60));

        let first = tokens.token().await.unwrap();
        let second = tokens.token().await.unwrap();

        assert_eq!(first.access_token(), second.access_token());
        assert_eq!(script.calls(), 1);
        assert!(tokens.is_authenticated().await);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_triggers_exchange() {
        let script = Scripted::new(vec![Ok(Duration::from_secs(10)), Ok(Duration::from_secs(10))]);
        let tokens = provider(&script, Duration::from_secs(2));

        tokens.token().await.unwrap();
        sleep(Duration::from_secs(11)).await;
        assert!(!tokens.is_authenticated().await);

        let token = tokens.token().await.unwrap();
        assert_eq!(token.access_token(), "token-1");
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exchange_failure_reaches_caller_without_retry() {
        let script = Scripted::new(vec![Err("denied".to_string()), Ok(Duration::from_secs(60))]);
        let tokens = provider(&script, Duration::from_secs(10));

        let error = tokens.token().await.unwrap_err();
        assert!(error.is_fatal());
        assert_eq!(script.calls(), 1);
        assert!(!tokens.is_authenticated().await);

        // the next request is a fresh attempt
        assert!(tokens.token().await.is_ok());
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_runs_before_expiry() {
        let lifetime = Duration::from_secs(120);
        let script = Scripted::new(vec![Ok(lifetime), Ok(lifetime)]);
        let tokens = provider(&script, Duration::from_secs(30));
        let job = tokens.spawn_renewal();

        assert_eq!(tokens.token().await.unwrap().access_token(), "token-0");
        sleep(Duration::from_secs(91)).await;

        assert_eq!(script.calls(), 2);
        assert_eq!(tokens.token().await.unwrap().access_token(), "token-1");
        assert_eq!(script.calls(), 2);

        job.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_lifetime_renewal_is_throttled() {
        let script = Scripted::new(vec![Ok(lifetime_from(0)); 10]);
        let tokens = provider(&script, Duration::from_secs(60));
        let job = tokens.spawn_renewal();

        tokens.token().await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(script.calls(), 1);

        // one renewal per MIN_RENEW_DELAY at most
        sleep(Duration::from_millis(3_400)).await;
        assert!(script.calls() >= 2);
        assert!(script.calls() <= 4);

        job.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_token_is_exchanged_again() {
        let lifetime = Duration::from_secs(300);
        let script = Scripted::new(vec![Ok(lifetime), Ok(lifetime)]);
        let tokens = provider(&script, Duration::from_secs(60));

        assert_eq!(tokens.token().await.unwrap().access_token(), "token-0");
        tokens.invalidate().await;
        assert!(!tokens.is_authenticated().await);

        assert_eq!(tokens.token().await.unwrap().access_token(), "token-1");
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_renewal_is_not_retried() {
        let script = Scripted::new(vec![
            Ok(Duration::from_secs(100)),
            Err("upstream down".to_string()),
            Ok(Duration::from_secs(100)),
        ]);
        let tokens = provider(&script, Duration::from_secs(50));
        let job = tokens.spawn_renewal();

        tokens.token().await.unwrap();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(script.calls(), 2);

        // old token still valid, no further attempts from the timer
        sleep(Duration::from_secs(30)).await;
        assert_eq!(script.calls(), 2);
        assert_eq!(tokens.token().await.unwrap().access_token(), "token-0");

        // once it expires a caller triggers the exchange
        sleep(Duration::from_secs(20)).await;
        assert_eq!(tokens.token().await.unwrap().access_token(), "token-2");
        assert_eq!(script.calls(), 3);

        job.abort();
    }
}
