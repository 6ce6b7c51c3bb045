/// Video entity, processing status and request/response schemas
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{CategoryResponse, TagResponse};

/// Processing status of a video.
///
/// Transitions are one-directional: PENDING -> UPLOADED -> PROCESSING ->
/// {PROCESSED | FAILED}. Re-running a job on a FAILED video is an explicit
/// retry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "video_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Processed => "processed",
            VideoStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Database row for a video.
///
/// `file_key` is immutable after creation; `hls_url` is set only together
/// with the PROCESSED status and cleared on FAILED.
#[derive(Debug, Clone, FromRow)]
pub struct VideoEntity {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub status: VideoStatus,
    pub hls_url: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VideoCreateRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub file_name: String,
    #[validate(range(min = 1))]
    pub file_size: i64,
    pub mime_type: String,
}

/// Response to an upload request: where to PUT the file, and the record
/// created for it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadRequestResponse {
    pub video_id: i64,
    pub upload_url: String,
    pub file_key: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadCompleteRequest {
    pub video_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub status: VideoStatus,
    pub hls_url: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<TagResponse>,
    pub categories: Vec<CategoryResponse>,
}

impl VideoResponse {
    pub fn from_entity(
        video: VideoEntity,
        tags: Vec<TagResponse>,
        categories: Vec<CategoryResponse>,
    ) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            file_key: video.file_key,
            file_size: video.file_size,
            mime_type: video.mime_type,
            status: video.status,
            hls_url: video.hls_url,
            owner_id: video.owner_id,
            created_at: video.created_at,
            updated_at: video.updated_at,
            tags,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&VideoStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::from_str::<VideoStatus>("\"failed\"").unwrap(),
            VideoStatus::Failed
        );
    }

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(VideoStatus::Processed.to_string(), "processed");
    }
}
