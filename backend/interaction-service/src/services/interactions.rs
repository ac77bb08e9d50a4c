/// Interaction service - moderation-gated post creation, likes and reads
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::InteractionStore;
use crate::error::{AppError, Result};
use crate::models::{
    CreatePostOutcome, Issue, LikeStatus, NewPost, Notification, PostView, UnlikeStatus,
    UserProfile, VerdictStatus, MAX_CONTENT_CHARS, MAX_DISPLAY_NAME_CHARS, NOTIFICATION_LIMIT,
};
use crate::moderation::ModerationGateway;

/// What to do with a flagged verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationPolicy {
    reject_severity: u8,
}

impl ModerationPolicy {
    /// Any issue at or above `reject_severity` (1-5) rejects the post
    pub fn new(reject_severity: u8) -> Result<Self> {
        if !(Issue::MIN_SEVERITY..=Issue::MAX_SEVERITY).contains(&reject_severity) {
            return Err(AppError::Validation(format!(
                "reject severity must be between {} and {}, got {}",
                Issue::MIN_SEVERITY,
                Issue::MAX_SEVERITY,
                reject_severity
            )));
        }
        Ok(Self { reject_severity })
    }

    pub fn reject_severity(&self) -> u8 {
        self.reject_severity
    }
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            reject_severity: Issue::MIN_SEVERITY,
        }
    }
}

/// Request payload for creating a post or reply
#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub content: String,
    pub parent_post_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct InteractionService {
    store: Arc<dyn InteractionStore>,
    moderation: ModerationGateway,
    policy: ModerationPolicy,
}

impl InteractionService {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        moderation: ModerationGateway,
        policy: ModerationPolicy,
    ) -> Self {
        Self {
            store,
            moderation,
            policy,
        }
    }

    /// Create or replace the caller's display profile
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
        image_url: Option<&str>,
    ) -> Result<UserProfile> {
        let profile = UserProfile {
            id: user_id,
            display_name: display_name.trim().to_string(),
            image_url: normalize_optional(image_url),
        };
        profile.validate().map_err(|errors| {
            if errors.field_errors().contains_key("display_name") {
                AppError::Validation(format!(
                    "display name must be 1 to {} characters",
                    MAX_DISPLAY_NAME_CHARS
                ))
            } else {
                AppError::from(errors)
            }
        })?;

        let stored = self.store.upsert_profile(&profile).await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(stored)
    }

    /// Moderate, then store. Nothing is persisted unless the verdict allows it.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        input: CreatePostInput,
    ) -> Result<CreatePostOutcome> {
        let new_post = NewPost {
            author_id,
            content: input.content.trim().to_string(),
            parent_post_id: input.parent_post_id,
            image_url: normalize_optional(input.image_url.as_deref()),
        };
        new_post.validate().map_err(|errors| {
            if errors.field_errors().contains_key("content") {
                AppError::Validation(format!(
                    "content must be 1 to {} characters",
                    MAX_CONTENT_CHARS
                ))
            } else {
                AppError::from(errors)
            }
        })?;

        let evaluation = self.moderation.evaluate(&new_post.content).await;
        let verdict = evaluation.verdict;

        let warnings = match verdict.status {
            VerdictStatus::Error => {
                let reason = evaluation
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "classifier error".to_string());
                warn!(author_id = %author_id, reason = %reason, "Post refused: moderation unavailable");
                return Err(AppError::ModerationUnavailable(reason));
            }
            VerdictStatus::Flagged if verdict.max_severity() >= self.policy.reject_severity => {
                info!(
                    author_id = %author_id,
                    issues = verdict.issues.len(),
                    max_severity = verdict.max_severity(),
                    "Post rejected by moderation"
                );
                return Ok(CreatePostOutcome::Rejected {
                    issues: verdict.issues,
                });
            }
            VerdictStatus::Flagged => verdict.issues,
            VerdictStatus::Clean => Vec::new(),
        };

        let post_id = self.store.create_post(&new_post).await?;

        info!(
            post_id = %post_id,
            author_id = %author_id,
            parent_post_id = ?new_post.parent_post_id,
            warnings = warnings.len(),
            "Post stored"
        );

        Ok(CreatePostOutcome::Stored { post_id, warnings })
    }

    /// Like a post. A second like for the same pair is a `Conflict`, not an error.
    pub async fn like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus> {
        let status = LikeStatus::from(self.store.set_like(post_id, user_id).await?);
        debug!(post_id = %post_id, user_id = %user_id, ?status, "Like processed");
        Ok(status)
    }

    pub async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> Result<UnlikeStatus> {
        let status = UnlikeStatus::from(self.store.clear_like(post_id, user_id).await?);
        debug!(post_id = %post_id, user_id = %user_id, ?status, "Unlike processed");
        Ok(status)
    }

    /// Top-level posts, newest first
    pub async fn feed(&self, viewer_id: Uuid, search_term: Option<&str>) -> Result<Vec<PostView>> {
        let search_term = search_term.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.store.list_top_level(viewer_id, search_term).await?)
    }

    /// Direct replies of a post, oldest first
    pub async fn thread(&self, viewer_id: Uuid, post_id: Uuid) -> Result<Vec<PostView>> {
        if !self.store.post_exists(post_id).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        Ok(self.store.list_replies(viewer_id, post_id).await?)
    }

    pub async fn detail(&self, viewer_id: Uuid, post_id: Uuid) -> Result<PostView> {
        self.store
            .get_detail(viewer_id, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    /// Likes and replies others left on the caller's posts
    pub async fn notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .store
            .list_notifications(user_id, NOTIFICATION_LIMIT)
            .await?)
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
