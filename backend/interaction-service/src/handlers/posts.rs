/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::CreatePostOutcome;
use crate::services::{CreatePostInput, InteractionService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
    pub parent_post_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub search: Option<String>,
}

/// Create a post or a reply.
///
/// 201 with `{"status":"stored","postId":...}` when stored, 422 with
/// `{"status":"rejected","issues":[...]}` when moderation refuses it.
pub async fn create_post(
    service: web::Data<InteractionService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let outcome = service
        .create_post(
            user_id.0,
            CreatePostInput {
                content: req.content,
                parent_post_id: req.parent_post_id,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok(match outcome {
        CreatePostOutcome::Stored { .. } => HttpResponse::Created().json(outcome),
        CreatePostOutcome::Rejected { .. } => HttpResponse::UnprocessableEntity().json(outcome),
    })
}

/// Top-level posts, newest first, optionally filtered by `?search=`
pub async fn get_feed(
    service: web::Data<InteractionService>,
    user_id: UserId,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let posts = service.feed(user_id.0, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    service: web::Data<InteractionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service.detail(user_id.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Direct replies, oldest first
pub async fn get_replies(
    service: web::Data<InteractionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let replies = service.thread(user_id.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(replies))
}
