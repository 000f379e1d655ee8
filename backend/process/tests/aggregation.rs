use std::sync::Arc;

use process::{
    Aggregator,
    models::{View, ViewKind},
};
use upstream::{Fixture, Source};

fn aggregator(fixture: Fixture) -> (Arc<Fixture>, Aggregator) {
    let fixture = Arc::new(fixture);
    let source: Arc<dyn Source> = fixture.clone();

    (fixture, Aggregator::new(source))
}

fn four_users() -> Fixture {
    Fixture::new()
        .with_user(1, "u1")
        .with_user(2, "u2")
        .with_user(3, "u3")
        .with_user(4, "u4")
        .with_post(1, 10, "a")
        .with_post(1, 11, "b")
        .with_post(2, 20, "c")
        .with_post(3, 30, "d")
        .with_post(3, 31, "e")
        .with_post(3, 32, "f")
        .with_post(4, 40, "g")
}

#[tokio::test]
async fn failing_user_is_isolated() {
    let (_, aggregator) = aggregator(four_users().fail_posts_for(3));

    let posts = aggregator.aggregate_all_posts().await.unwrap();
    let owners: Vec<&str> = posts.iter().map(|post| post.username.as_str()).collect();
    assert_eq!(owners, vec!["u1", "u1", "u2", "u4"]);

    let View::Users(users) = aggregator.compute(ViewKind::TopUsers).await.unwrap() else {
        panic!("expected users view");
    };
    let u3 = users.iter().find(|user| user.id == 3).unwrap();
    assert_eq!(u3.post_count, 0);
    assert_eq!(users.len(), 4);
}

#[tokio::test]
async fn user_activity_keeps_listing_order() {
    let (_, aggregator) = aggregator(four_users());

    let activity = aggregator.aggregate_user_activity().await.unwrap();
    let counts: Vec<(u64, usize)> = activity
        .iter()
        .map(|user| (user.id, user.post_count))
        .collect();

    assert_eq!(counts, vec![(1, 2), (2, 1), (3, 3), (4, 1)]);
}

#[tokio::test]
async fn latest_view_is_five_newest() {
    let mut fixture = Fixture::new().with_user(1, "Ada").with_user(2, "Grace");
    for id in 1..=8 {
        fixture = fixture.with_post(id % 2 + 1, id, "post");
    }
    let (_, aggregator) = aggregator(fixture);

    let View::Posts(posts) = aggregator.compute(ViewKind::LatestPosts).await.unwrap() else {
        panic!("expected posts view");
    };
    let ids: Vec<u64> = posts.iter().map(|post| post.id).collect();

    assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    assert!(posts.iter().all(|post| post.comment_count.is_none()));
}

#[tokio::test]
async fn popular_view_returns_all_ties() {
    let mut fixture = Fixture::new().with_user(1, "Ada");
    for (id, comments) in [(1, 3), (2, 5), (3, 5), (4, 2), (5, 5)] {
        fixture = fixture.with_post(1, id, "post").with_comments(id, comments);
    }
    let (_, aggregator) = aggregator(fixture);

    let View::Posts(posts) = aggregator.compute(ViewKind::PopularPosts).await.unwrap() else {
        panic!("expected posts view");
    };
    let ids: Vec<u64> = posts.iter().map(|post| post.id).collect();

    assert_eq!(ids, vec![5, 3, 2]);
    assert!(posts.iter().all(|post| post.comment_count == Some(5)));
}

#[tokio::test]
async fn failing_comments_count_as_zero() {
    let fixture = Fixture::new()
        .with_user(1, "Ada")
        .with_post(1, 1, "quiet")
        .with_post(1, 2, "loud")
        .with_comments(1, 1)
        .with_comments(2, 9)
        .fail_comments_for(2);
    let (_, aggregator) = aggregator(fixture);

    let View::Posts(posts) = aggregator.compute(ViewKind::PopularPosts).await.unwrap() else {
        panic!("expected posts view");
    };

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, 1);
    assert_eq!(posts[0].comment_count, Some(1));
}

#[tokio::test]
async fn no_users_gives_empty_views() {
    let (_, aggregator) = aggregator(Fixture::new());

    for kind in ViewKind::ALL {
        let view = aggregator.compute(kind).await.unwrap();
        assert!(view.is_empty(), "{kind} should be empty");
    }
}

#[tokio::test]
async fn listing_failure_fails_the_cycle() {
    let (_, aggregator) = aggregator(four_users().fail_listing());

    let error = aggregator.compute(ViewKind::TopUsers).await.unwrap_err();
    assert!(!error.is_fatal());
}

#[tokio::test]
async fn auth_failure_is_not_downgraded() {
    let (_, aggregator) = aggregator(four_users().fail_auth());

    let error = aggregator.compute(ViewKind::LatestPosts).await.unwrap_err();
    assert!(error.is_fatal());
}

#[tokio::test]
async fn concurrent_fan_out_matches_sequential() {
    let (_, sequential) = aggregator(Fixture::sample(23, 6).fail_posts_for(7));
    let (fixture, concurrent) = aggregator(Fixture::sample(23, 6).fail_posts_for(7));
    let concurrent = concurrent.with_concurrency(8);

    for kind in ViewKind::ALL {
        assert_eq!(
            sequential.compute(kind).await.unwrap(),
            concurrent.compute(kind).await.unwrap()
        );
    }
    assert!(fixture.calls() > 0);
}

#[tokio::test]
async fn one_fetch_per_user_for_activity() {
    let (fixture, aggregator) = aggregator(four_users());

    aggregator.aggregate_user_activity().await.unwrap();

    // listing plus one posts fetch per user
    assert_eq!(fixture.calls(), 5);
}
