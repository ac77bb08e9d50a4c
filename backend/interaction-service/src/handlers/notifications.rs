use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::InteractionService;

pub async fn list_notifications(
    service: web::Data<InteractionService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let notifications = service.notifications(user_id.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}
