/// Authentication handlers: registration and login
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::user_repo;
use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::security::password;

/// Register a new user account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    if user_repo::find_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if user_repo::find_by_username(&state.pool, &payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let hashed_password = password::hash_password(&payload.password)?;
    let user = user_repo::create_user(
        &state.pool,
        &payload.email,
        &payload.username,
        &hashed_password,
        payload.full_name.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and issue an access token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
        (status = 403, description = "Inactive user")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = user_repo::find_by_username(&state.pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect username or password".to_string()))?;

    password::verify_password(&payload.password, &user.hashed_password)?;

    if !user.is_active {
        return Err(AppError::Forbidden("Inactive user".to_string()));
    }

    let access_token = state.jwt_keys.generate_access_token(
        user.id,
        &user.username,
        state.config.auth.access_token_expiry_minutes,
    )?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
