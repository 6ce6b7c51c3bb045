use sqlx::PgPool;

use crate::models::{CategoryEntity, TagEntity, VideoEntity, VideoStatus};

const VIDEO_COLUMNS: &str = "id, title, description, file_key, file_size, mime_type, status, \
     hls_url, owner_id, created_at, updated_at";

pub async fn create_video(
    pool: &PgPool,
    owner_id: i64,
    title: &str,
    description: Option<&str>,
    file_key: &str,
    file_size: i64,
    mime_type: &str,
) -> Result<VideoEntity, sqlx::Error> {
    sqlx::query_as::<_, VideoEntity>(&format!(
        r#"
        INSERT INTO videos (title, description, file_key, file_size, mime_type, status, owner_id)
        VALUES ($1, $2, $3, $4, $5, 'pending', $6)
        RETURNING {VIDEO_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(description)
    .bind(file_key)
    .bind(file_size)
    .bind(mime_type)
    .bind(owner_id)
    .fetch_one(pool)
    .await
}

pub async fn get_video(pool: &PgPool, id: i64) -> Result<Option<VideoEntity>, sqlx::Error> {
    sqlx::query_as::<_, VideoEntity>(&format!(
        r#"SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_videos_by_owner(
    pool: &PgPool,
    owner_id: i64,
) -> Result<Vec<VideoEntity>, sqlx::Error> {
    sqlx::query_as::<_, VideoEntity>(&format!(
        r#"SELECT {VIDEO_COLUMNS} FROM videos WHERE owner_id = $1 ORDER BY created_at DESC"#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_video(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM videos WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Unconditional status update, used for the PROCESSING transition at job
/// start (duplicate delivery and explicit retries are allowed to re-enter).
pub async fn set_status(
    pool: &PgPool,
    id: i64,
    status: VideoStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE videos SET status = $2, updated_at = NOW() WHERE id = $1"#)
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

/// Guarded transition: succeeds only when the row is currently in `from`.
/// Returns false when the guard did not match.
pub async fn transition_status(
    pool: &PgPool,
    id: i64,
    from: VideoStatus,
    to: VideoStatus,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        r#"UPDATE videos SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2"#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Terminal success: status and manifest URL land in one atomic update.
pub async fn mark_processed(pool: &PgPool, id: i64, hls_url: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE videos SET status = 'processed', hls_url = $2, updated_at = NOW() WHERE id = $1"#,
    )
    .bind(id)
    .bind(hls_url)
    .execute(pool)
    .await?;
    Ok(())
}

/// Terminal failure: clears any stale manifest URL so `hls_url` stays
/// non-null only on processed videos.
pub async fn mark_failed(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE videos SET status = 'failed', hls_url = NULL, updated_at = NOW() WHERE id = $1"#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Demote PROCESSING rows whose last update is older than `max_age_seconds`
/// to FAILED. Returns how many rows were demoted.
pub async fn fail_stale_processing(
    pool: &PgPool,
    max_age_seconds: i64,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        r#"
        UPDATE videos
        SET status = 'failed', hls_url = NULL, updated_at = NOW()
        WHERE status = 'processing'
          AND updated_at < NOW() - make_interval(secs => $1::double precision)
        "#,
    )
    .bind(max_age_seconds)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn tags_for_video(pool: &PgPool, video_id: i64) -> Result<Vec<TagEntity>, sqlx::Error> {
    sqlx::query_as::<_, TagEntity>(
        r#"
        SELECT t.id, t.name
        FROM tags t
        JOIN video_tags vt ON vt.tag_id = t.id
        WHERE vt.video_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(video_id)
    .fetch_all(pool)
    .await
}

pub async fn categories_for_video(
    pool: &PgPool,
    video_id: i64,
) -> Result<Vec<CategoryEntity>, sqlx::Error> {
    sqlx::query_as::<_, CategoryEntity>(
        r#"
        SELECT c.id, c.name
        FROM categories c
        JOIN video_categories vc ON vc.category_id = c.id
        WHERE vc.video_id = $1
        ORDER BY c.name
        "#,
    )
    .bind(video_id)
    .fetch_all(pool)
    .await
}

pub async fn add_tag(pool: &PgPool, video_id: i64, tag_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO video_tags (video_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
    )
    .bind(video_id)
    .bind(tag_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_tag(pool: &PgPool, video_id: i64, tag_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM video_tags WHERE video_id = $1 AND tag_id = $2"#)
        .bind(video_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_category(
    pool: &PgPool,
    video_id: i64,
    category_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO video_categories (video_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
    )
    .bind(video_id)
    .bind(category_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_category(
    pool: &PgPool,
    video_id: i64,
    category_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM video_categories WHERE video_id = $1 AND category_id = $2"#)
        .bind(video_id)
        .bind(category_id)
        .execute(pool)
        .await?;
    Ok(())
}
