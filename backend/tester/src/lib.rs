//! # Mock Collaborator
//!
//! Serves a [`Fixture`] over the same HTTP surface the real collaborator has,
//! for local runs and for exercising the HTTP client end to end.
//!
//! - `POST /auth` trades any credentials for a bearer token
//! - Every other route rejects requests without an `Authorization` header
//! - Fixture failures become `500`, fixture auth rejection becomes `401`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use upstream::{Fixture, Source, SourceError};

pub const TOKEN: &str = "tester-token";
pub const TOKEN_LIFETIME_SECS: i64 = 300;

pub fn router(fixture: Arc<Fixture>) -> Router {
    Router::new()
        .route("/auth", post(auth_handler))
        .route("/users", get(users_handler))
        .route("/users/{id}/posts", get(posts_handler))
        .route("/posts/{id}/comments", get(comments_handler))
        .with_state(fixture)
}

async fn auth_handler(
    State(fixture): State<Arc<Fixture>>,
    Json(credentials): Json<Value>,
) -> Response {
    if fixture.rejects_auth() {
        warn!("Rejecting credentials");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    debug!(client = %credentials["clientID"], "Issuing token");
    Json(json!({
        "access_token": TOKEN,
        "token_type": "Bearer",
        "expires_in": TOKEN_LIFETIME_SECS,
    }))
    .into_response()
}

async fn users_handler(State(fixture): State<Arc<Fixture>>, headers: HeaderMap) -> Response {
    if let Err(status) = authorize(&headers) {
        return status.into_response();
    }

    match fixture.users().await {
        Ok(users) => {
            let users: Map<String, Value> = users
                .into_iter()
                .map(|user| (user.id.to_string(), Value::String(user.name)))
                .collect();

            Json(json!({ "users": users })).into_response()
        }
        Err(e) => failure(e),
    }
}

async fn posts_handler(
    State(fixture): State<Arc<Fixture>>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if let Err(status) = authorize(&headers) {
        return status.into_response();
    }

    match fixture.user_posts(user_id).await {
        Ok(posts) => Json(json!({ "posts": posts })).into_response(),
        Err(e) => failure(e),
    }
}

async fn comments_handler(
    State(fixture): State<Arc<Fixture>>,
    Path(post_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if let Err(status) = authorize(&headers) {
        return status.into_response();
    }

    match fixture.post_comments(post_id).await {
        Ok(comments) => Json(json!({ "comments": comments })).into_response(),
        Err(e) => failure(e),
    }
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");

    match headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn failure(error: SourceError) -> Response {
    let status = match error {
        SourceError::Auth(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
