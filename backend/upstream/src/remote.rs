use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    Source,
    auth::TokenProvider,
    error::SourceError,
    models::{Comment, CommentsPayload, Post, PostsPayload, User, UsersPayload},
};

/// [`Source`] over the collaborator's HTTP API, every request authorized.
///
/// A rejected token is dropped and surfaces as a fatal [`SourceError::Auth`].
pub struct HttpSource {
    http: Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
}

impl HttpSource {
    pub fn new(http: Client, base_url: &str, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}{path}", self.base_url);
        let token = self.tokens.token().await?;

        debug!(url = %url, "Fetching from upstream");
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, token.authorization())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.tokens.invalidate().await;
            return Err(SourceError::Auth(format!("{status} from {url}")));
        }
        if !status.is_success() {
            return Err(SourceError::Status { url, status });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn users(&self) -> Result<Vec<User>, SourceError> {
        let payload: UsersPayload = self.get("/users").await?;

        Ok(payload.into_users())
    }

    async fn user_posts(&self, user_id: u64) -> Result<Vec<Post>, SourceError> {
        let payload: PostsPayload = self.get(&format!("/users/{user_id}/posts")).await?;

        Ok(payload.into())
    }

    async fn post_comments(&self, post_id: u64) -> Result<Vec<Comment>, SourceError> {
        let payload: CommentsPayload = self.get(&format!("/posts/{post_id}/comments")).await?;

        Ok(payload.into())
    }
}
