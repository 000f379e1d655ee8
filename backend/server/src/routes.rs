use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use process::models::ViewKind;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::AppError, refresh::Orchestrator};

#[derive(Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn users_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
) -> Result<Json<Value>, AppError> {
    let view = orchestrator.get_or_compute(ViewKind::TopUsers).await?;

    Ok(Json(view.items()?))
}

pub async fn posts_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Value>, AppError> {
    let kind: ViewKind = query.kind.ok_or(AppError::MissingPostsType)?.parse()?;
    let view = orchestrator.get_or_compute(kind).await?;

    Ok(Json(view.items()?))
}
