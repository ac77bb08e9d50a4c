mod common;

use common::{harness, harness_with, register, ScriptedClassifier, CLEAN};
use interaction_service::models::{
    CreatePostOutcome, LikeStatus, NotificationKind, UnlikeStatus, MAX_CONTENT_CHARS,
};
use interaction_service::moderation::ModerationError;
use interaction_service::services::{CreatePostInput, InteractionService, ModerationPolicy};
use interaction_service::AppError;
use uuid::Uuid;

const FLAGGED_SPAM_2: &str = r#"{"status":"flagged","issues":[{"type":"spam","severity":2,"reason":"promotional link"}]}"#;

fn text(content: &str) -> CreatePostInput {
    CreatePostInput {
        content: content.to_string(),
        ..Default::default()
    }
}

fn reply(parent: Uuid, content: &str) -> CreatePostInput {
    CreatePostInput {
        content: content.to_string(),
        parent_post_id: Some(parent),
        image_url: None,
    }
}

async fn post(service: &InteractionService, author: Uuid, input: CreatePostInput) -> Uuid {
    match service.create_post(author, input).await.expect("create post") {
        CreatePostOutcome::Stored { post_id, .. } => post_id,
        other => panic!("expected stored post, got {:?}", other),
    }
}

#[tokio::test]
async fn created_post_is_visible_with_zero_aggregates() {
    let h = harness();
    let author = register(&h.service, "Ada").await;

    let post_id = post(&h.service, author, text("  first post  ")).await;
    let view = h.service.detail(author, post_id).await.unwrap();

    assert_eq!(view.content, "first post");
    assert_eq!(view.author_display_name, "Ada");
    assert_eq!(view.likes_count, 0);
    assert_eq!(view.reply_count, 0);
    assert!(!view.is_liked_by_me);
    assert_eq!(h.classifier.calls(), 1);
}

#[tokio::test]
async fn hello_world_like_scenario() {
    let h = harness();
    let u1 = register(&h.service, "U1").await;
    let u2 = register(&h.service, "U2").await;

    let a = post(&h.service, u1, text("hello world")).await;

    assert_eq!(h.service.like(a, u2).await.unwrap(), LikeStatus::Created);
    assert_eq!(h.service.like(a, u2).await.unwrap(), LikeStatus::Conflict);
    assert_eq!(h.store.like_rows(a, u2).await, 1);

    let seen_by_author = h.service.detail(u1, a).await.unwrap();
    assert_eq!(seen_by_author.likes_count, 1);
    assert!(!seen_by_author.is_liked_by_me);

    let seen_by_liker = h.service.detail(u2, a).await.unwrap();
    assert!(seen_by_liker.is_liked_by_me);
}

#[tokio::test]
async fn unlike_without_like_is_not_found_and_changes_nothing() {
    let h = harness();
    let author = register(&h.service, "Author").await;
    let other = register(&h.service, "Other").await;
    let post_id = post(&h.service, author, text("nothing to unlike")).await;

    let before = h.service.detail(other, post_id).await.unwrap();
    assert_eq!(
        h.service.unlike(post_id, other).await.unwrap(),
        UnlikeStatus::NotFound
    );
    let after = h.service.detail(other, post_id).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn like_then_unlike_restores_counts() {
    let h = harness();
    let author = register(&h.service, "Author").await;
    let fan = register(&h.service, "Fan").await;
    let post_id = post(&h.service, author, text("round trip")).await;
    h.service.like(post_id, author).await.unwrap();

    let before = h.service.detail(fan, post_id).await.unwrap().likes_count;
    h.service.like(post_id, fan).await.unwrap();
    assert_eq!(
        h.service.unlike(post_id, fan).await.unwrap(),
        UnlikeStatus::Removed
    );
    let view = h.service.detail(fan, post_id).await.unwrap();

    assert!(!view.is_liked_by_me);
    assert_eq!(view.likes_count, before);
}

#[tokio::test]
async fn replies_read_oldest_first_and_bump_reply_count() {
    let h = harness();
    let author = register(&h.service, "Author").await;
    let replier = register(&h.service, "Replier").await;
    let parent = post(&h.service, author, text("parent")).await;

    let first = post(&h.service, replier, reply(parent, "first reply")).await;
    let before = h.service.detail(author, parent).await.unwrap().reply_count;
    let second = post(&h.service, author, reply(parent, "second reply")).await;
    let after = h.service.detail(author, parent).await.unwrap().reply_count;

    assert_eq!(after, before + 1);

    let thread = h.service.thread(author, parent).await.unwrap();
    let ids: Vec<Uuid> = thread.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(thread.iter().all(|v| v.parent_post_id == Some(parent)));
}

#[tokio::test]
async fn feed_is_newest_first_and_excludes_replies() {
    let h = harness();
    let author = register(&h.service, "Author").await;
    let older = post(&h.service, author, text("older")).await;
    let newer = post(&h.service, author, text("newer")).await;
    post(&h.service, author, reply(older, "a reply")).await;

    let feed = h.service.feed(author, None).await.unwrap();
    let ids: Vec<Uuid> = feed.iter().map(|v| v.id).collect();

    assert_eq!(ids, vec![newer, older]);
    assert_eq!(feed[1].reply_count, 1);
}

#[tokio::test]
async fn feed_search_matches_content_or_author_case_insensitively() {
    let h = harness();
    let grace = register(&h.service, "Grace Hopper").await;
    let alan = register(&h.service, "Alan").await;
    let by_content = post(&h.service, alan, text("Found a real BUG today")).await;
    let by_author = post(&h.service, grace, text("compilers are fun")).await;

    let hits = h.service.feed(alan, Some("bug")).await.unwrap();
    assert_eq!(hits.iter().map(|v| v.id).collect::<Vec<_>>(), vec![by_content]);

    let hits = h.service.feed(alan, Some("hopper")).await.unwrap();
    assert_eq!(hits.iter().map(|v| v.id).collect::<Vec<_>>(), vec![by_author]);

    assert!(h.service.feed(alan, Some("zebra")).await.unwrap().is_empty());
    assert_eq!(h.service.feed(alan, Some("   ")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unparseable_verdict_fails_closed_without_storing() {
    let h = harness_with(
        ScriptedClassifier::replying("Sure! This looks fine to me."),
        ModerationPolicy::default(),
    );
    let author = register(&h.service, "Author").await;

    let err = h
        .service
        .create_post(author, text("hello world"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ModerationUnavailable(_)));
    assert_eq!(h.store.post_count().await, 0);
}

#[tokio::test]
async fn classifier_outage_fails_closed_without_storing() {
    let h = harness_with(
        ScriptedClassifier::failing(ModerationError::Classifier("HTTP 502".to_string())),
        ModerationPolicy::default(),
    );
    let author = register(&h.service, "Author").await;

    let err = h.service.create_post(author, text("hi")).await.unwrap_err();

    assert!(matches!(err, AppError::ModerationUnavailable(_)));
    assert_eq!(h.store.post_count().await, 0);
}

#[tokio::test]
async fn flagged_post_is_rejected_with_issues() {
    let h = harness_with(
        ScriptedClassifier::replying(FLAGGED_SPAM_2),
        ModerationPolicy::default(),
    );
    let author = register(&h.service, "Author").await;

    let outcome = h
        .service
        .create_post(author, text("buy now at example.com"))
        .await
        .unwrap();

    match outcome {
        CreatePostOutcome::Rejected { issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].kind, "spam");
            assert_eq!(issues[0].severity, 2);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(h.store.post_count().await, 0);
}

#[tokio::test]
async fn flagged_below_threshold_is_stored_with_warnings() {
    let h = harness_with(
        ScriptedClassifier::replying(FLAGGED_SPAM_2),
        ModerationPolicy::new(4).unwrap(),
    );
    let author = register(&h.service, "Author").await;

    let outcome = h
        .service
        .create_post(author, text("buy now at example.com"))
        .await
        .unwrap();

    match outcome {
        CreatePostOutcome::Stored { warnings, .. } => {
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].kind, "spam");
        }
        other => panic!("expected stored post, got {:?}", other),
    }
    assert_eq!(h.store.post_count().await, 1);
}

#[tokio::test]
async fn invalid_content_never_reaches_the_classifier() {
    let h = harness();
    let author = register(&h.service, "Author").await;

    let empty = h.service.create_post(author, text("   ")).await.unwrap_err();
    assert!(matches!(empty, AppError::Validation(_)));

    let too_long = "x".repeat(MAX_CONTENT_CHARS as usize + 1);
    let long = h.service.create_post(author, text(&too_long)).await.unwrap_err();
    assert!(matches!(long, AppError::Validation(_)));

    let bad_image = CreatePostInput {
        content: "with image".to_string(),
        parent_post_id: None,
        image_url: Some("not a url".to_string()),
    };
    let image = h.service.create_post(author, bad_image).await.unwrap_err();
    assert!(matches!(image, AppError::Validation(_)));

    assert_eq!(h.classifier.calls(), 0);
}

#[tokio::test]
async fn content_limit_counts_characters_not_bytes() {
    let h = harness();
    let author = register(&h.service, "Author").await;
    let accented = "é".repeat(MAX_CONTENT_CHARS as usize);

    post(&h.service, author, text(&accented)).await;
}

#[tokio::test]
async fn reply_to_missing_parent_is_not_found() {
    let h = harness();
    let author = register(&h.service, "Author").await;

    let err = h
        .service
        .create_post(author, reply(Uuid::new_v4(), "orphan"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.store.post_count().await, 0);
}

#[tokio::test]
async fn posting_without_profile_is_a_validation_error() {
    let h = harness();

    let err = h
        .service
        .create_post(Uuid::new_v4(), text("who am i"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn like_on_missing_post_is_not_found() {
    let h = harness();
    let user = register(&h.service, "User").await;

    let err = h.service.like(Uuid::new_v4(), user).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn missing_post_reads_are_not_found() {
    let h = harness();
    let viewer = register(&h.service, "Viewer").await;

    assert!(matches!(
        h.service.detail(viewer, Uuid::new_v4()).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        h.service.thread(viewer, Uuid::new_v4()).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn profile_validation_and_update() {
    let h = harness();
    let user_id = Uuid::new_v4();

    let err = h.service.upsert_profile(user_id, "  ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h
        .service
        .upsert_profile(user_id, &"n".repeat(65), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    h.service.upsert_profile(user_id, "Old", None).await.unwrap();
    let profile = h
        .service
        .upsert_profile(user_id, " New ", Some("https://cdn.example.com/me.png"))
        .await
        .unwrap();
    assert_eq!(profile.display_name, "New");

    let post_id = post(&h.service, user_id, text("renamed")).await;
    let view = h.service.detail(user_id, post_id).await.unwrap();
    assert_eq!(view.author_display_name, "New");
    assert_eq!(
        view.author_image_url.as_deref(),
        Some("https://cdn.example.com/me.png")
    );
}

#[tokio::test]
async fn notifications_list_others_likes_and_replies_newest_first() {
    let h = harness();
    let owner = register(&h.service, "Owner").await;
    let fan = register(&h.service, "Fan").await;
    let post_id = post(&h.service, owner, text("notify me")).await;

    h.service.like(post_id, owner).await.unwrap();
    post(&h.service, owner, reply(post_id, "talking to myself")).await;
    h.service.like(post_id, fan).await.unwrap();
    let reply_id = post(&h.service, fan, reply(post_id, "nice")).await;

    let notifications = h.service.notifications(owner).await.unwrap();

    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].kind, NotificationKind::Reply);
    assert_eq!(notifications[0].reply_post_id, Some(reply_id));
    assert_eq!(notifications[0].actor_display_name, "Fan");
    assert_eq!(notifications[1].kind, NotificationKind::Like);
    assert_eq!(notifications[1].actor_id, fan);
    assert_eq!(notifications[1].post_id, post_id);

    assert!(h.service.notifications(fan).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_likes_on_same_pair_yield_one_row() {
    let h = harness_with(ScriptedClassifier::replying(CLEAN), ModerationPolicy::default());
    let author = register(&h.service, "Author").await;
    let fan = register(&h.service, "Fan").await;
    let post_id = post(&h.service, author, text("race")).await;

    let service = std::sync::Arc::new(h.service);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.like(post_id, fan).await }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == LikeStatus::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(h.store.like_rows(post_id, fan).await, 1);
}
