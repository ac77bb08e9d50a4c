use crate::models::UserProfile;
use sqlx::PgConnection;

/// Create or replace a user's display profile
pub async fn upsert_user(
    conn: &mut PgConnection,
    profile: &UserProfile,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO users (id, display_name, image_url)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET display_name = EXCLUDED.display_name,
            image_url = EXCLUDED.image_url,
            updated_at = clock_timestamp()
        RETURNING id, display_name, image_url
        "#,
    )
    .bind(profile.id)
    .bind(&profile.display_name)
    .bind(profile.image_url.as_deref())
    .fetch_one(&mut *conn)
    .await
}
