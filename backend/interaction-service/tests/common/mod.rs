//! In-memory test doubles for the store and the classifier.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use interaction_service::db::{InteractionStore, Reference, StoreError, StoreResult};
use interaction_service::models::{
    ClearLikeOutcome, NewPost, Notification, NotificationKind, PostView, SetLikeOutcome,
    UserProfile,
};
use interaction_service::moderation::{ModerationError, ModerationGateway, TextClassifier};
use interaction_service::services::{InteractionService, ModerationPolicy};

pub const CLEAN: &str = r#"{"status":"clean","issues":[]}"#;

#[derive(Debug, Clone)]
struct StoredPost {
    id: Uuid,
    author_id: Uuid,
    content: String,
    parent_post_id: Option<Uuid>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredLike {
    post_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserProfile>,
    posts: Vec<StoredPost>,
    likes: Vec<StoredLike>,
    ticks: i64,
}

impl Tables {
    /// Strictly increasing timestamps, like `clock_timestamp()`
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.timestamp_millis_opt(1_700_000_000_000 + self.ticks)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn user(&self, id: Uuid) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    fn view(&self, viewer_id: Uuid, post: &StoredPost) -> PostView {
        let author = self.user(post.author_id);
        PostView {
            id: post.id,
            author_id: post.author_id,
            author_display_name: author.map(|u| u.display_name.clone()).unwrap_or_default(),
            content: post.content.clone(),
            parent_post_id: post.parent_post_id,
            created_at: post.created_at,
            likes_count: self.likes.iter().filter(|l| l.post_id == post.id).count() as i64,
            reply_count: self
                .posts
                .iter()
                .filter(|p| p.parent_post_id == Some(post.id))
                .count() as i64,
            is_liked_by_me: self
                .likes
                .iter()
                .any(|l| l.post_id == post.id && l.user_id == viewer_id),
            author_image_url: author.and_then(|u| u.image_url.clone()),
            post_image_url: post.image_url.clone(),
        }
    }
}

/// Store double that enforces the same constraints as the schema:
/// foreign keys on author, parent, liked post and liker, and one like per pair.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.tables.lock().await.posts.len()
    }

    pub async fn like_rows(&self, post_id: Uuid, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .await
            .likes
            .iter()
            .filter(|l| l.post_id == post_id && l.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => tables.users.push(profile.clone()),
        }
        Ok(profile.clone())
    }

    async fn create_post(&self, new_post: &NewPost) -> StoreResult<Uuid> {
        let mut tables = self.tables.lock().await;
        if tables.user(new_post.author_id).is_none() {
            return Err(StoreError::MissingReference(Reference::User));
        }
        if let Some(parent) = new_post.parent_post_id {
            if !tables.posts.iter().any(|p| p.id == parent) {
                return Err(StoreError::MissingReference(Reference::ParentPost));
            }
        }

        let post = StoredPost {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            content: new_post.content.clone(),
            parent_post_id: new_post.parent_post_id,
            image_url: new_post.image_url.clone(),
            created_at: tables.next_timestamp(),
        };
        let id = post.id;
        tables.posts.push(post);
        Ok(id)
    }

    async fn set_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<SetLikeOutcome> {
        let mut tables = self.tables.lock().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(StoreError::MissingReference(Reference::Post));
        }
        if tables.user(user_id).is_none() {
            return Err(StoreError::MissingReference(Reference::User));
        }
        if tables
            .likes
            .iter()
            .any(|l| l.post_id == post_id && l.user_id == user_id)
        {
            return Ok(SetLikeOutcome::AlreadyExists);
        }

        let created_at = tables.next_timestamp();
        tables.likes.push(StoredLike {
            post_id,
            user_id,
            created_at,
        });
        Ok(SetLikeOutcome::Created)
    }

    async fn clear_like(&self, post_id: Uuid, user_id: Uuid) -> StoreResult<ClearLikeOutcome> {
        let mut tables = self.tables.lock().await;
        let before = tables.likes.len();
        tables
            .likes
            .retain(|l| !(l.post_id == post_id && l.user_id == user_id));
        Ok(if tables.likes.len() < before {
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
        let tables = self.tables.lock().await;
        let needle = search_term.map(str::to_lowercase);

        let mut views: Vec<PostView> = tables
            .posts
            .iter()
            .filter(|p| p.parent_post_id.is_none())
            .map(|p| tables.view(viewer_id, p))
            .filter(|v| match &needle {
                Some(needle) => {
                    v.content.to_lowercase().contains(needle)
                        || v.author_display_name.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    async fn list_replies(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Vec<PostView>> {
        let tables = self.tables.lock().await;
        let mut views: Vec<PostView> = tables
            .posts
            .iter()
            .filter(|p| p.parent_post_id == Some(post_id))
            .map(|p| tables.view(viewer_id, p))
            .collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(views)
    }

    async fn get_detail(&self, viewer_id: Uuid, post_id: Uuid) -> StoreResult<Option<PostView>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| tables.view(viewer_id, p)))
    }

    async fn post_exists(&self, post_id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().await.posts.iter().any(|p| p.id == post_id))
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        let tables = self.tables.lock().await;
        let owned = |post_id: Uuid| {
            tables
                .posts
                .iter()
                .any(|p| p.id == post_id && p.author_id == recipient_id)
        };
        let name = |user_id: Uuid| {
            tables
                .user(user_id)
                .map(|u| u.display_name.clone())
                .unwrap_or_default()
        };

        let mut notifications: Vec<Notification> = tables
            .likes
            .iter()
            .filter(|l| l.user_id != recipient_id && owned(l.post_id))
            .map(|l| Notification {
                kind: NotificationKind::Like,
                actor_id: l.user_id,
                actor_display_name: name(l.user_id),
                post_id: l.post_id,
                reply_post_id: None,
                created_at: l.created_at,
            })
            .chain(
                tables
                    .posts
                    .iter()
                    .filter(|r| r.author_id != recipient_id)
                    .filter_map(|r| r.parent_post_id.filter(|p| owned(*p)).map(|p| (r, p)))
                    .map(|(r, parent)| Notification {
                        kind: NotificationKind::Reply,
                        actor_id: r.author_id,
                        actor_display_name: name(r.author_id),
                        post_id: parent,
                        reply_post_id: Some(r.id),
                        created_at: r.created_at,
                    }),
            )
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit.max(0) as usize);
        Ok(notifications)
    }
}

/// Classifier double returning the same scripted reply and counting calls
pub struct ScriptedClassifier {
    reply: Result<String, ModerationError>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: ModerationError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextClassifier for ScriptedClassifier {
    async fn generate(&self, _prompt: &str) -> Result<String, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub struct Harness {
    pub service: InteractionService,
    pub store: Arc<InMemoryStore>,
    pub classifier: Arc<ScriptedClassifier>,
}

pub fn harness_with(classifier: Arc<ScriptedClassifier>, policy: ModerationPolicy) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let gateway = ModerationGateway::new(classifier.clone(), Duration::from_secs(2));
    let service = InteractionService::new(store.clone(), gateway, policy);
    Harness {
        service,
        store,
        classifier,
    }
}

/// Service over an empty store with a classifier that always says clean
pub fn harness() -> Harness {
    harness_with(ScriptedClassifier::replying(CLEAN), ModerationPolicy::default())
}

/// Register a profile so the user can post and like
pub async fn register(service: &InteractionService, display_name: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    service
        .upsert_profile(user_id, display_name, None)
        .await
        .expect("profile upsert");
    user_id
}
