use sqlx::PgConnection;
use uuid::Uuid;

/// Insert a like for (post, user).
/// Returns false when the pair already exists; the unique constraint decides
/// races between concurrent requests.
pub async fn insert_like(
    conn: &mut PgConnection,
    like_id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO likes (id, post_id, user_id)
        VALUES ($1, $2, $3)
        ON CONFLICT ON CONSTRAINT likes_post_user_key DO NOTHING
        "#,
    )
    .bind(like_id)
    .bind(post_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete the like for (post, user). Returns false if there was none.
pub async fn delete_like(
    conn: &mut PgConnection,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM likes
        WHERE post_id = $1 AND user_id = $2
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
