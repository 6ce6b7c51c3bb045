/// Tag entity and schemas
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct TagEntity {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TagCreateRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<TagEntity> for TagResponse {
    fn from(tag: TagEntity) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}
