use crate::models::{NewPost, PostView};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Columns shared by every post read. `$1` is always the viewer.
const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.author_id,
        COALESCE(u.display_name, '') AS author_display_name,
        p.content,
        p.parent_post_id,
        p.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        (SELECT COUNT(*) FROM posts r WHERE r.parent_post_id = p.id) AS reply_count,
        EXISTS(
            SELECT 1 FROM likes ml
            WHERE ml.post_id = p.id AND ml.user_id = $1
        ) AS is_liked_by_me,
        u.image_url AS author_image_url,
        p.image_url AS post_image_url
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id
"#;

/// Insert a post row. `created_at` is assigned by the database.
pub async fn insert_post(
    conn: &mut PgConnection,
    post_id: Uuid,
    new_post: &NewPost,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, author_id, content, parent_post_id, image_url)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(post_id)
    .bind(new_post.author_id)
    .bind(&new_post.content)
    .bind(new_post.parent_post_id)
    .bind(new_post.image_url.as_deref())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Top-level posts, newest first
pub async fn list_top_level(
    pool: &PgPool,
    viewer_id: Uuid,
    search_term: Option<&str>,
) -> Result<Vec<PostView>, sqlx::Error> {
    let pattern = search_term
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(like_pattern);

    let sql = format!(
        r#"{POST_VIEW_SELECT}
        WHERE p.parent_post_id IS NULL
          AND ($2::text IS NULL OR p.content ILIKE $2 OR u.display_name ILIKE $2)
        ORDER BY p.created_at DESC, p.id DESC
        "#
    );

    sqlx::query_as::<_, PostView>(&sql)
        .bind(viewer_id)
        .bind(pattern)
        .fetch_all(pool)
        .await
}

/// Direct replies to a post in reading order (oldest first)
pub async fn list_replies(
    pool: &PgPool,
    viewer_id: Uuid,
    post_id: Uuid,
) -> Result<Vec<PostView>, sqlx::Error> {
    let sql = format!(
        r#"{POST_VIEW_SELECT}
        WHERE p.parent_post_id = $2
        ORDER BY p.created_at ASC, p.id ASC
        "#
    );

    sqlx::query_as::<_, PostView>(&sql)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_all(pool)
        .await
}

/// Single post annotated for the viewer
pub async fn find_view(
    pool: &PgPool,
    viewer_id: Uuid,
    post_id: Uuid,
) -> Result<Option<PostView>, sqlx::Error> {
    let sql = format!("{POST_VIEW_SELECT} WHERE p.id = $2");

    sqlx::query_as::<_, PostView>(&sql)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn post_exists(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// Build an ILIKE pattern matching `term` as a literal substring
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
