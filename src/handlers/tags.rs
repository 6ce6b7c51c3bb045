/// Tag CRUD handlers
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::tag_repo;
use crate::error::AppError;
use crate::models::{TagCreateRequest, TagResponse};

#[utoipa::path(
    post,
    path = "/api/v1/tags",
    tag = "Tags",
    request_body = TagCreateRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 409, description = "Tag already exists")
    )
)]
pub async fn create_tag(
    state: web::Data<AppState>,
    payload: web::Json<TagCreateRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    if tag_repo::find_by_name(&state.pool, &payload.name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Tag already exists".to_string()));
    }

    let tag = tag_repo::create_tag(&state.pool, &payload.name).await?;
    Ok(HttpResponse::Created().json(TagResponse::from(tag)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    responses((status = 200, description = "All tags", body = [TagResponse]))
)]
pub async fn list_tags(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let tags: Vec<TagResponse> = tag_repo::list_tags(&state.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/{tag_id}",
    tag = "Tags",
    params(("tag_id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found")
    )
)]
pub async fn get_tag(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let tag = tag_repo::get_tag(&state.pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tags/{tag_id}",
    tag = "Tags",
    params(("tag_id" = i64, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found")
    )
)]
pub async fn delete_tag(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    if !tag_repo::delete_tag(&state.pool, path.into_inner()).await? {
        return Err(AppError::NotFound("Tag not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}
