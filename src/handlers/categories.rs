/// Category CRUD handlers
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::category_repo;
use crate::error::AppError;
use crate::models::{CategoryCreateRequest, CategoryResponse};

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CategoryCreateRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn create_category(
    state: web::Data<AppState>,
    payload: web::Json<CategoryCreateRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    if category_repo::find_by_name(&state.pool, &payload.name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let category = category_repo::create_category(&state.pool, &payload.name).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    responses((status = 200, description = "All categories", body = [CategoryResponse]))
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories: Vec<CategoryResponse> = category_repo::list_categories(&state.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}",
    tag = "Categories",
    params(("category_id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let category = category_repo::get_category(&state.pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "Categories",
    params(("category_id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    if !category_repo::delete_category(&state.pool, path.into_inner()).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }
    Ok(HttpResponse::NoContent().finish())
}
