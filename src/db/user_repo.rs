use sqlx::PgPool;

use crate::models::UserEntity;

const USER_COLUMNS: &str = "id, email, username, hashed_password, full_name, avatar_url, \
     is_active, is_superuser, created_at, updated_at";

pub async fn create_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    hashed_password: &str,
    full_name: Option<&str>,
) -> Result<UserEntity, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(&format!(
        r#"
        INSERT INTO users (email, username, hashed_password, full_name)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(username)
    .bind(hashed_password)
    .bind(full_name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserEntity>, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE username = $1"#
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    email: Option<&str>,
    username: Option<&str>,
    full_name: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<UserEntity, sqlx::Error> {
    sqlx::query_as::<_, UserEntity>(&format!(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            username = COALESCE($3, username),
            full_name = COALESCE($4, full_name),
            avatar_url = COALESCE($5, avatar_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email)
    .bind(username)
    .bind(full_name)
    .bind(avatar_url)
    .fetch_one(pool)
    .await
}
