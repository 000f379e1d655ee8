//! # Aggregation
//!
//! Builds the scored entity sets behind every view from [`Source`] fetches.
//!
//! ## Failure Isolation
//! - The user listing is the only fetch that can fail a whole cycle
//! - A failed posts fetch counts that user as `0` posts and contributes no posts
//! - A failed comments fetch counts that post as `0` comments
//! - Fatal errors (credential exchange) are never downgraded, they end the cycle
//!
//! ## Fan-out
//! Per-entity fetches run through an ordered buffer of `concurrency` in-flight
//! requests. `1` gives a strictly sequential chain of round trips. Output order is
//! the upstream enumeration order either way.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};
use upstream::{Source, SourceError, User};

pub mod models;
pub mod rankings;

use models::{RankedPost, RankedUser, View, ViewKind};
use rankings::{latest_posts, popular_posts, top_users};

#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn Source>,
    concurrency: usize,
}

impl Aggregator {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn aggregate_user_activity(&self) -> Result<Vec<RankedUser>, SourceError> {
        let users = self.source.users().await?;
        let source = &self.source;

        stream::iter(users)
            .map(|user| async move {
                let post_count = match source.user_posts(user.id).await {
                    Ok(posts) => posts.len(),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(user_id = user.id, "Counting user as inactive: {e}");
                        0
                    }
                };

                Ok(RankedUser {
                    id: user.id,
                    name: user.name,
                    post_count,
                })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    pub async fn aggregate_all_posts(&self) -> Result<Vec<RankedPost>, SourceError> {
        let users = self.source.users().await?;
        let source = &self.source;

        let per_user: Vec<Vec<RankedPost>> = stream::iter(users)
            .map(|user| async move {
                match source.user_posts(user.id).await {
                    Ok(posts) => Ok(tag_posts(&user, posts)),
                    Err(e) if e.is_fatal() => Err(e),
                    Err(e) => {
                        warn!(user_id = user.id, "Skipping posts for user: {e}");
                        Ok(Vec::new())
                    }
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(per_user.into_iter().flatten().collect())
    }

    pub async fn aggregate_post_comments(&self, post: &RankedPost) -> Result<usize, SourceError> {
        match self.source.post_comments(post.id).await {
            Ok(comments) => Ok(comments.len()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(post_id = post.id, "Counting post as uncommented: {e}");
                Ok(0)
            }
        }
    }

    /// One full aggregation and selection pass.
    pub async fn compute(&self, kind: ViewKind) -> Result<View, SourceError> {
        debug!(view = %kind, "Computing view");

        let view = match kind {
            ViewKind::TopUsers => View::Users(top_users(self.aggregate_user_activity().await?)),
            ViewKind::LatestPosts => View::Posts(latest_posts(self.aggregate_all_posts().await?)),
            ViewKind::PopularPosts => {
                let posts = self.aggregate_all_posts().await?;
                View::Posts(popular_posts(self.with_comment_counts(posts).await?))
            }
        };

        info!(view = %kind, items = view.len(), "View computed");
        Ok(view)
    }

    async fn with_comment_counts(
        &self,
        posts: Vec<RankedPost>,
    ) -> Result<Vec<RankedPost>, SourceError> {
        stream::iter(posts)
            .map(|mut post| async move {
                let count = self.aggregate_post_comments(&post).await?;
                post.comment_count = Some(count);

                Ok::<_, SourceError>(post)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

fn tag_posts(user: &User, posts: Vec<upstream::Post>) -> Vec<RankedPost> {
    posts
        .into_iter()
        .map(|post| RankedPost {
            id: post.id,
            user_id: user.id,
            username: user.name.clone(),
            content: post.content,
            comment_count: None,
        })
        .collect()
}
