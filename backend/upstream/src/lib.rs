//! # Upstream
//!
//! Everything the rankings read comes from one remote collaborator.
//!
//! ## Endpoints
//! - `POST /auth`: credential exchange, returns `{access_token, token_type, expires_in}`
//! - `GET /users`: id to name mapping
//! - `GET /users/{id}/posts`: posts owned by a user
//! - `GET /posts/{id}/comments`: comments on a post, only the count matters here
//!
//! All reads go through the [`Source`] trait so the aggregation layer never sees
//! HTTP. [`remote::HttpSource`] is the real thing, [`fixture::Fixture`] an
//! in-memory stand-in.

use async_trait::async_trait;

pub mod auth;
pub mod error;
pub mod fixture;
pub mod models;
pub mod remote;

pub use auth::{Authenticator, Credentials, HttpAuthenticator, Token, TokenProvider};
pub use error::SourceError;
pub use fixture::Fixture;
pub use models::{Comment, Post, User};
pub use remote::HttpSource;

#[async_trait]
pub trait Source: Send + Sync {
    /// Known users, in upstream enumeration order.
    async fn users(&self) -> Result<Vec<User>, SourceError>;

    async fn user_posts(&self, user_id: u64) -> Result<Vec<Post>, SourceError>;

    async fn post_comments(&self, post_id: u64) -> Result<Vec<Comment>, SourceError>;
}
