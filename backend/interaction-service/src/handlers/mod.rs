/// HTTP handlers for interaction endpoints
///
/// This module contains handlers for:
/// - Profiles: create or replace the caller's display profile
/// - Posts: moderated creation, feed with search, detail and replies
/// - Likes: like / unlike with typed outcomes
/// - Notifications: likes and replies others left on the caller's posts
///
/// Every route expects a `UserId` resolved by `BearerAuthMiddleware`.
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod users;

pub use likes::{like_post, unlike_post};
pub use notifications::list_notifications;
pub use posts::{create_post, get_feed, get_post, get_replies};
pub use users::upsert_profile;

use actix_web::web;

use crate::error::AppError;

/// Register the authenticated API routes. Mount inside the `/api/v1` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(16 * 1024)
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .service(web::resource("/users/me").route(web::put().to(upsert_profile)))
    .service(
        web::scope("/posts")
            .service(
                web::resource("")
                    .route(web::post().to(create_post))
                    .route(web::get().to(get_feed)),
            )
            .service(web::resource("/{post_id}").route(web::get().to(get_post)))
            .service(web::resource("/{post_id}/replies").route(web::get().to(get_replies)))
            .service(
                web::resource("/{post_id}/like")
                    .route(web::post().to(like_post))
                    .route(web::delete().to(unlike_post)),
            ),
    )
    .service(web::resource("/notifications").route(web::get().to(list_notifications)));
}
