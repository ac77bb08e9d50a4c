use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::InteractionService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    #[serde(default)]
    pub display_name: String,
    pub image_url: Option<String>,
}

/// PUT /users/me - the caller can only write their own profile
pub async fn upsert_profile(
    service: web::Data<InteractionService>,
    user_id: UserId,
    req: web::Json<UpsertProfileRequest>,
) -> Result<HttpResponse> {
    let profile = service
        .upsert_profile(user_id.0, &req.display_name, req.image_url.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}
