/// Database access layer
///
/// This module provides:
/// - The `InteractionStore` trait the service depends on
/// - `PgInteractionStore`, its PostgreSQL implementation
/// - Repository functions for posts, likes, users and derived notifications
///
/// Every write runs inside its own transaction. A `sqlx::Transaction` that is
/// dropped without `commit` rolls back, so any early return through `?`
/// leaves nothing behind.
pub mod like_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod user_repo;

use async_trait::async_trait;
use sqlx::PgPool;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ClearLikeOutcome, NewPost, Notification, PostView, SetLikeOutcome, UserProfile,
};

/// Row a foreign key pointed at that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    ParentPost,
    Post,
    User,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::ParentPost => write!(f, "parent post"),
            Reference::Post => write!(f, "post"),
            Reference::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("referenced {0} does not exist")]
    MissingReference(Reference),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// PostgreSQL foreign key violation error code
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Recover constraint-shaped failures into `StoreError::MissingReference`.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            let reference = match db_err.constraint() {
                Some("posts_parent_fk") => Some(Reference::ParentPost),
                Some("likes_post_fk") => Some(Reference::Post),
                Some("posts_author_fk") | Some("likes_user_fk") => Some(Reference::User),
                _ => None,
            };
            if let Some(reference) = reference {
                return StoreError::MissingReference(reference);
            }
        }
    }
    StoreError::Database(err)
}

/// Atomic operations over posts, likes and profiles.
///
/// Aggregates (`likes_count`, `reply_count`, `is_liked_by_me`) are computed
/// per read; implementations never keep counters.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Insert or replace the caller's own profile
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile>;

    /// Insert a post under a freshly generated identifier
    async fn create_post(&self, new_post: &NewPost) -> StoreResult<Uuid>;

    async fn set_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<SetLikeOutcome>;

    async fn clear_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<ClearLikeOutcome>;

    /// Top-level posts, newest first, optionally filtered by a
    /// case-insensitive substring of content or author name
    async fn list_top_level(
        &self,
        viewer_id: Uuid,
        search_term: Option<&str>,
    ) -> StoreResult<Vec<PostView>>;

    /// Direct replies of `post_id`, oldest first
    async fn list_replies(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Vec<PostView>>;

    async fn get_detail(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Option<PostView>>;

    async fn post_exists(&self, post_id: Uuid) -> StoreResult<bool>;

    /// Likes and replies by others on `recipient_id`'s posts, newest first
    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgInteractionStore {
    pool: PgPool,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile> {
        let mut tx = self.pool.begin().await?;
        let stored = user_repo::upsert_user(&mut tx, profile).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn create_post(&self, new_post: &NewPost) -> StoreResult<Uuid> {
        let post_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        post_repo::insert_post(&mut tx, post_id, new_post)
            .await
            .map_err(classify)?;
        tx.commit().await?;

        Ok(post_id)
    }

    async fn set_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<SetLikeOutcome> {
        let mut tx = self.pool.begin().await?;
        let inserted = like_repo::insert_like(&mut tx, Uuid::new_v4(), post_id, user_id)
            .await
            .map_err(classify)?;
        tx.commit().await?;

        Ok(if inserted {
            SetLikeOutcome::Created
        } else {
            SetLikeOutcome::AlreadyExists
        })
    }

    async fn clear_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<ClearLikeOutcome> {
        let mut tx = self.pool.begin().await?;
        let removed = like_repo::delete_like(&mut tx, post_id, user_id).await?;
        tx.commit().await?;

        Ok(if removed {
            ClearLikeOutcome::Removed
        } else {
            ClearLikeOutcome::NotFound
        })
    }

    async fn list_top_level(
        &self,
        viewer_id: Uuid,
        search_term: Option<&str>,
    ) -> StoreResult<Vec<PostView>> {
        Ok(post_repo::list_top_level(&self.pool, viewer_id, search_term).await?)
    }

    async fn list_replies(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Vec<PostView>> {
        Ok(post_repo::list_replies(&self.pool, viewer_id, post_id).await?)
    }

    async fn get_detail(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Option<PostView>> {
        Ok(post_repo::find_view(&self.pool, viewer_id, post_id).await?)
    }

    async fn post_exists(&self, post_id: Uuid) -> StoreResult<bool> {
        Ok(post_repo::post_exists(&self.pool, post_id).await?)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(notification_repo::list_for_recipient(&self.pool, recipient_id, limit).await?)
    }
}
