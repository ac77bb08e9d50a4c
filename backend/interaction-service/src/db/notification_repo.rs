use crate::models::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Likes and replies other users left on the recipient's posts.
/// Nothing is stored for notifications; they are derived on every read.
pub async fn list_for_recipient(
    pool: &PgPool,
    recipient_id: Uuid,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT kind, actor_id, actor_display_name, post_id, reply_post_id, created_at
        FROM (
            SELECT
                'like'::text AS kind,
                l.user_id AS actor_id,
                COALESCE(u.display_name, '') AS actor_display_name,
                p.id AS post_id,
                NULL::uuid AS reply_post_id,
                l.created_at
            FROM likes l
            JOIN posts p ON p.id = l.post_id
            LEFT JOIN users u ON u.id = l.user_id
            WHERE p.author_id = $1 AND l.user_id <> $1

            UNION ALL

            SELECT
                'reply'::text AS kind,
                r.author_id AS actor_id,
                COALESCE(u.display_name, '') AS actor_display_name,
                p.id AS post_id,
                r.id AS reply_post_id,
                r.created_at
            FROM posts r
            JOIN posts p ON p.id = r.parent_post_id
            LEFT JOIN users u ON u.id = r.author_id
            WHERE p.author_id = $1 AND r.author_id <> $1
        ) n
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(recipient_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut notifications = Vec::with_capacity(rows.len());
    for row in rows {
        let kind: String = row.try_get("kind")?;
        let kind = NotificationKind::parse(&kind).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown notification kind: {kind}").into())
        })?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        notifications.push(Notification {
            kind,
            actor_id: row.try_get("actor_id")?,
            actor_display_name: row.try_get("actor_display_name")?,
            post_id: row.try_get("post_id")?,
            reply_post_id: row.try_get("reply_post_id")?,
            created_at,
        });
    }

    Ok(notifications)
}
