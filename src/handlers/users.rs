/// Current-user profile handlers
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::user_repo;
use crate::error::AppError;
use crate::middleware::UserId;
use crate::models::{UserResponse, UserUpdateRequest};

/// Get the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse, AppError> {
    let user = user_repo::find_by_id(&state.pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Update the authenticated user's profile. Password changes go through a
/// dedicated flow, not this endpoint.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "Users",
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn update_me(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<UserUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let current = user_repo::find_by_id(&state.pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(username) = &payload.username {
        if username != &current.username {
            if let Some(existing) = user_repo::find_by_username(&state.pool, username).await? {
                if existing.id != current.id {
                    return Err(AppError::Conflict("Username already taken".to_string()));
                }
            }
        }
    }

    if let Some(email) = &payload.email {
        if email != &current.email {
            if let Some(existing) = user_repo::find_by_email(&state.pool, email).await? {
                if existing.id != current.id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
        }
    }

    let updated = user_repo::update_profile(
        &state.pool,
        current.id,
        payload.email.as_deref(),
        payload.username.as_deref(),
        payload.full_name.as_deref(),
        payload.avatar_url.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}
