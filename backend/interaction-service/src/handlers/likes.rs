use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::models::{LikeStatus, UnlikeStatus};
use crate::services::InteractionService;

/// POST /posts/{post_id}/like
pub async fn like_post(
    service: web::Data<InteractionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let status = service.like(post_id.into_inner(), user_id.0).await?;

    Ok(match status {
        LikeStatus::Created => HttpResponse::Created().json(status),
        LikeStatus::Conflict => HttpResponse::Conflict().json(status),
    })
}

/// DELETE /posts/{post_id}/like
pub async fn unlike_post(
    service: web::Data<InteractionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let status = service.unlike(post_id.into_inner(), user_id.0).await?;

    Ok(match status {
        UnlikeStatus::Removed => HttpResponse::Ok().json(status),
        UnlikeStatus::NotFound => HttpResponse::NotFound().json(status),
    })
}
