//! # Fixture
//!
//! In-memory [`Source`] with deterministic data and per-entity failure injection.
//! Backs the mock collaborator and every test that needs an upstream.

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    Source,
    error::SourceError,
    models::{Comment, Post, User},
};

const SAMPLE_NAMES: [&str; 10] = [
    "Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret", "Dennis", "Frances", "Edsger", "Radia",
];

#[derive(Debug, Default)]
pub struct Fixture {
    users: Vec<User>,
    posts: HashMap<u64, Vec<Post>>,
    comments: HashMap<u64, usize>,
    failing_users: HashSet<u64>,
    failing_posts: HashSet<u64>,
    fail_listing: bool,
    fail_auth: bool,
    calls: AtomicUsize,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// `users` users, user `n` owning `(n * 7) % posts_per_user + 1` posts.
    /// Post ids increase globally.
    pub fn sample(users: u64, posts_per_user: u64) -> Self {
        let mut fixture = Self::new();
        let mut next_post = 1;

        for user_id in 1..=users {
            let base = SAMPLE_NAMES[(user_id as usize - 1) % SAMPLE_NAMES.len()];
            let name = match (user_id as usize - 1) / SAMPLE_NAMES.len() {
                0 => base.to_string(),
                round => format!("{base} {}", round + 1),
            };
            fixture = fixture.with_user(user_id, &name);

            for _ in 0..(user_id * 7) % posts_per_user.max(1) + 1 {
                fixture = fixture
                    .with_post(user_id, next_post, &format!("post {next_post} by {name}"))
                    .with_comments(next_post, ((next_post * 13) % 6) as usize);
                next_post += 1;
            }
        }

        fixture
    }

    pub fn with_user(mut self, id: u64, name: &str) -> Self {
        self.users.push(User {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_post(mut self, user_id: u64, post_id: u64, content: &str) -> Self {
        self.posts.entry(user_id).or_default().push(Post {
            id: post_id,
            user_id,
            content: content.to_string(),
        });
        self
    }

    pub fn with_comments(mut self, post_id: u64, count: usize) -> Self {
        self.comments.insert(post_id, count);
        self
    }

    pub fn fail_posts_for(mut self, user_id: u64) -> Self {
        self.failing_users.insert(user_id);
        self
    }

    pub fn fail_comments_for(mut self, post_id: u64) -> Self {
        self.failing_posts.insert(post_id);
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn fail_auth(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    /// Number of [`Source`] calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rejects_auth(&self) -> bool {
        self.fail_auth
    }

    fn record(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_auth {
            return Err(SourceError::Auth("fixture rejects credentials".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl Source for Fixture {
    async fn users(&self) -> Result<Vec<User>, SourceError> {
        self.record()?;

        if self.fail_listing {
            return Err(SourceError::Unavailable("user listing".to_string()));
        }

        Ok(self.users.clone())
    }

    async fn user_posts(&self, user_id: u64) -> Result<Vec<Post>, SourceError> {
        self.record()?;

        if self.failing_users.contains(&user_id) {
            return Err(SourceError::Unavailable(format!("posts for user {user_id}")));
        }

        Ok(self.posts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn post_comments(&self, post_id: u64) -> Result<Vec<Comment>, SourceError> {
        self.record()?;

        if self.failing_posts.contains(&post_id) {
            return Err(SourceError::Unavailable(format!("comments for post {post_id}")));
        }

        let count = self.comments.get(&post_id).copied().unwrap_or(0);
        let comments = (1..=count as u64)
            .map(|n| Comment {
                id: post_id * 1000 + n,
                post_id,
                content: format!("comment {n}"),
            })
            .collect();

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_is_deterministic() {
        let a = Fixture::sample(12, 4);
        let b = Fixture::sample(12, 4);

        let users = a.users().await.unwrap();
        assert_eq!(users, b.users().await.unwrap());
        assert_eq!(users.len(), 12);
        assert_eq!(users[10].name, "Ada 2");

        for user in &users {
            let posts = a.user_posts(user.id).await.unwrap();
            assert!(!posts.is_empty());
            assert!(posts.iter().all(|post| post.user_id == user.id));
        }
    }

    #[tokio::test]
    async fn failures_are_per_entity() {
        let fixture = Fixture::new()
            .with_user(1, "Ada")
            .with_user(2, "Grace")
            .with_post(1, 10, "a")
            .with_post(2, 20, "b")
            .with_comments(10, 2)
            .fail_posts_for(2)
            .fail_comments_for(20);

        assert_eq!(fixture.user_posts(1).await.unwrap().len(), 1);
        assert!(fixture.user_posts(2).await.is_err());
        assert_eq!(fixture.post_comments(10).await.unwrap().len(), 2);
        assert!(fixture.post_comments(20).await.is_err());
        assert_eq!(fixture.calls(), 4);
    }

    #[tokio::test]
    async fn auth_failure_is_fatal() {
        let fixture = Fixture::new().with_user(1, "Ada").fail_auth();

        assert!(fixture.users().await.unwrap_err().is_fatal());
        assert!(fixture.user_posts(1).await.unwrap_err().is_fatal());
    }
}
