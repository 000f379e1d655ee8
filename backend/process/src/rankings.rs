//! # Rankings
//!
//! Reduces aggregated entities to the served views.
//!
//! | View | Primitive | Score | Cardinality |
//! |---|---|---|---|
//! | top users | bounded [`TopK`] | post count, then id | 5 |
//! | latest posts | max [`Heap`] + [`take_top`] | id | 5 |
//! | popular posts | max [`Heap`] + [`take_tied`] | comment count | every post tied for first |
//!
//! Ids are issued monotonically upstream, which is what makes id a recency score.

use std::cmp::Ordering;

use rank::{By, Heap, TopK, take_tied, take_top};

use crate::models::{RankedPost, RankedUser, VIEW_SIZE};

fn by_activity(a: &RankedUser, b: &RankedUser) -> Ordering {
    a.post_count.cmp(&b.post_count).then(a.id.cmp(&b.id))
}

fn by_recency(a: &RankedPost, b: &RankedPost) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_comments(a: &RankedPost, b: &RankedPost) -> Ordering {
    a.comment_count
        .cmp(&b.comment_count)
        .then(a.id.cmp(&b.id))
}

pub fn top_users(users: impl IntoIterator<Item = RankedUser>) -> Vec<RankedUser> {
    let mut top = TopK::new(VIEW_SIZE, By(by_activity));
    top.extend(users);

    top.into_sorted_vec()
}

pub fn latest_posts(posts: impl IntoIterator<Item = RankedPost>) -> Vec<RankedPost> {
    let mut heap = Heap::new(By(by_recency));
    heap.extend(posts);

    take_top(&mut heap, VIEW_SIZE)
}

/// Posts without a fetched comment count score as zero.
pub fn popular_posts(posts: impl IntoIterator<Item = RankedPost>) -> Vec<RankedPost> {
    let mut heap = Heap::new(By(by_comments));
    heap.extend(posts.into_iter().map(|mut post| {
        post.comment_count = Some(post.comment_count.unwrap_or(0));
        post
    }));

    let mut tied = take_tied(&mut heap, |post| post.comment_count);
    tied.sort_by(|a, b| b.id.cmp(&a.id));

    tied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, post_count: usize) -> RankedUser {
        RankedUser {
            id,
            name: format!("user {id}"),
            post_count,
        }
    }

    fn post(id: u64, comment_count: Option<usize>) -> RankedPost {
        RankedPost {
            id,
            user_id: 1,
            username: "user 1".to_string(),
            content: String::new(),
            comment_count,
        }
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> u64) -> Vec<u64> {
        items.iter().map(id).collect()
    }

    #[test]
    fn top_users_by_post_count() {
        let users =
            [(1, 4), (2, 9), (3, 0), (4, 7), (5, 2), (6, 8), (7, 1)].map(|(id, n)| user(id, n));

        let top = top_users(users);
        assert_eq!(ids(&top, |u| u.id), vec![2, 6, 4, 1, 5]);
    }

    #[test]
    fn top_users_ties_prefer_higher_id() {
        let users = (1..=7).map(|id| user(id, 3));

        let top = top_users(users);
        assert_eq!(ids(&top, |u| u.id), vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn top_users_fewer_than_five() {
        let top = top_users([user(1, 1), user(2, 5)]);

        assert_eq!(ids(&top, |u| u.id), vec![2, 1]);
    }

    #[test]
    fn latest_takes_five_newest() {
        let posts = [3, 8, 1, 6, 2, 7, 5, 4].map(|id| post(id, None));

        assert_eq!(ids(&latest_posts(posts), |p| p.id), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn popular_returns_every_tie_newest_first() {
        let posts = [(1, 3), (2, 5), (3, 5), (4, 2), (5, 5)].map(|(id, n)| post(id, Some(n)));

        let popular = popular_posts(posts);
        assert_eq!(ids(&popular, |p| p.id), vec![5, 3, 2]);
        assert!(popular.iter().all(|p| p.comment_count == Some(5)));
    }

    #[test]
    fn popular_counts_missing_as_zero() {
        let popular = popular_posts([post(1, None), post(2, None)]);

        assert_eq!(ids(&popular, |p| p.id), vec![2, 1]);
        assert!(popular.iter().all(|p| p.comment_count == Some(0)));
    }

    #[test]
    fn empty_inputs_give_empty_views() {
        assert!(top_users(Vec::new()).is_empty());
        assert!(latest_posts(Vec::new()).is_empty());
        assert!(popular_posts(Vec::new()).is_empty());
    }
}
