use sqlx::PgPool;

use crate::models::CategoryEntity;

pub async fn create_category(pool: &PgPool, name: &str) -> Result<CategoryEntity, sqlx::Error> {
    sqlx::query_as::<_, CategoryEntity>(
        r#"INSERT INTO categories (name) VALUES ($1) RETURNING id, name"#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<CategoryEntity>, sqlx::Error> {
    sqlx::query_as::<_, CategoryEntity>(r#"SELECT id, name FROM categories WHERE name = $1"#)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryEntity>, sqlx::Error> {
    sqlx::query_as::<_, CategoryEntity>(r#"SELECT id, name FROM categories WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryEntity>, sqlx::Error> {
    sqlx::query_as::<_, CategoryEntity>(r#"SELECT id, name FROM categories ORDER BY name"#)
        .fetch_all(pool)
        .await
}

pub async fn delete_category(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM categories WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
