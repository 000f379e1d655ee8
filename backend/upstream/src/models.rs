use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(rename = "userid", alias = "userId", default)]
    pub user_id: u64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(rename = "postid", alias = "postId", default)]
    pub post_id: u64,
    #[serde(default)]
    pub content: String,
}

/// `GET /users`: id to name, either bare or under `users`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum UsersPayload {
    Wrapped { users: Map<String, Value> },
    Bare(Map<String, Value>),
}

impl UsersPayload {
    /// Keeps upstream enumeration order.
    pub(crate) fn into_users(self) -> Vec<User> {
        let map = match self {
            UsersPayload::Wrapped { users } => users,
            UsersPayload::Bare(users) => users,
        };

        map.into_iter()
            .filter_map(|(key, value)| {
                let id = key
                    .trim()
                    .parse()
                    .map_err(|e| warn!(key = %key, "Skipping user with invalid id: {e}"))
                    .ok()?;

                let name = match value {
                    Value::String(name) => name,
                    other => other.to_string(),
                };

                Some(User { id, name })
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum PostsPayload {
    Wrapped { posts: Vec<Post> },
    Bare(Vec<Post>),
}

impl From<PostsPayload> for Vec<Post> {
    fn from(payload: PostsPayload) -> Self {
        match payload {
            PostsPayload::Wrapped { posts } => posts,
            PostsPayload::Bare(posts) => posts,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum CommentsPayload {
    Wrapped { comments: Vec<Comment> },
    Bare(Vec<Comment>),
}

impl From<CommentsPayload> for Vec<Comment> {
    fn from(payload: CommentsPayload) -> Self {
        match payload {
            CommentsPayload::Wrapped { comments } => comments,
            CommentsPayload::Bare(comments) => comments,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
