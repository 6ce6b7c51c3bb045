/// OpenAPI document covering the REST endpoints
use utoipa::OpenApi;

use crate::models::{
    CategoryCreateRequest, CategoryResponse, LoginRequest, RegisterRequest, TagCreateRequest,
    TagResponse, TokenResponse, UploadCompleteRequest, UploadRequestResponse, UserResponse,
    UserUpdateRequest, VideoCreateRequest, VideoResponse, VideoStatus,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::users::me,
        crate::handlers::users::update_me,
        crate::handlers::videos::upload_request,
        crate::handlers::videos::upload_complete,
        crate::handlers::videos::list_videos,
        crate::handlers::videos::get_video,
        crate::handlers::videos::add_tag,
        crate::handlers::videos::remove_tag,
        crate::handlers::videos::add_category,
        crate::handlers::videos::remove_category,
        crate::handlers::tags::create_tag,
        crate::handlers::tags::list_tags,
        crate::handlers::tags::get_tag,
        crate::handlers::tags::delete_tag,
        crate::handlers::categories::create_category,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::delete_category
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        UserResponse,
        UserUpdateRequest,
        VideoCreateRequest,
        VideoResponse,
        VideoStatus,
        UploadRequestResponse,
        UploadCompleteRequest,
        TagCreateRequest,
        TagResponse,
        CategoryCreateRequest,
        CategoryResponse
    )),
    tags(
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Users", description = "Profile management"),
        (name = "Videos", description = "Upload flow, metadata and tagging"),
        (name = "Tags", description = "Tag management"),
        (name = "Categories", description = "Category management")
    )
)]
pub struct ApiDoc;
