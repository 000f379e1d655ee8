use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Users view and latest posts view size.
pub const VIEW_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUser {
    pub id: u64,
    pub name: String,
    #[serde(rename = "postCount")]
    pub post_count: usize,
}

/// Post tagged with its owner's name, plus a comment count once one was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPost {
    pub id: u64,
    #[serde(rename = "userid")]
    pub user_id: u64,
    pub username: String,
    pub content: String,
    #[serde(rename = "commentCount", default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    TopUsers,
    LatestPosts,
    PopularPosts,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [
        ViewKind::TopUsers,
        ViewKind::LatestPosts,
        ViewKind::PopularPosts,
    ];

    /// Cache key.
    pub fn key(&self) -> &'static str {
        match self {
            ViewKind::TopUsers => "users:top",
            ViewKind::LatestPosts => "posts:latest",
            ViewKind::PopularPosts => "posts:popular",
        }
    }

    pub fn empty(&self) -> View {
        match self {
            ViewKind::TopUsers => View::Users(Vec::new()),
            ViewKind::LatestPosts | ViewKind::PopularPosts => View::Posts(Vec::new()),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPostsType(pub String);

impl fmt::Display for UnknownPostsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown posts type '{}', expected 'latest' or 'popular'", self.0)
    }
}

impl std::error::Error for UnknownPostsType {}

/// Parses the `type` query value of `GET /posts`.
impl FromStr for ViewKind {
    type Err = UnknownPostsType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(ViewKind::LatestPosts),
            "popular" => Ok(ViewKind::PopularPosts),
            other => Err(UnknownPostsType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum View {
    Users(Vec<RankedUser>),
    Posts(Vec<RankedPost>),
}

impl View {
    pub fn len(&self) -> usize {
        match self {
            View::Users(users) => users.len(),
            View::Posts(posts) => posts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bare JSON array as served to clients, without the storage tag.
    pub fn items(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            View::Users(users) => serde_json::to_value(users),
            View::Posts(posts) => serde_json::to_value(posts),
        }
    }
}
