pub mod category;
pub mod tag;
pub mod user;
pub mod video;

pub use category::{CategoryCreateRequest, CategoryEntity, CategoryResponse};
pub use tag::{TagCreateRequest, TagEntity, TagResponse};
pub use user::{
    LoginRequest, RegisterRequest, TokenResponse, UserEntity, UserResponse, UserUpdateRequest,
};
pub use video::{
    UploadCompleteRequest, UploadRequestResponse, VideoCreateRequest, VideoEntity, VideoResponse,
    VideoStatus,
};
