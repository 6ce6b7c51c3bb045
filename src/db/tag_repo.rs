use sqlx::PgPool;

use crate::models::TagEntity;

pub async fn create_tag(pool: &PgPool, name: &str) -> Result<TagEntity, sqlx::Error> {
    sqlx::query_as::<_, TagEntity>(r#"INSERT INTO tags (name) VALUES ($1) RETURNING id, name"#)
        .bind(name)
        .fetch_one(pool)
        .await
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<TagEntity>, sqlx::Error> {
    sqlx::query_as::<_, TagEntity>(r#"SELECT id, name FROM tags WHERE name = $1"#)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn get_tag(pool: &PgPool, id: i64) -> Result<Option<TagEntity>, sqlx::Error> {
    sqlx::query_as::<_, TagEntity>(r#"SELECT id, name FROM tags WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_tags(pool: &PgPool) -> Result<Vec<TagEntity>, sqlx::Error> {
    sqlx::query_as::<_, TagEntity>(r#"SELECT id, name FROM tags ORDER BY name"#)
        .fetch_all(pool)
        .await
}

pub async fn delete_tag(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM tags WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
