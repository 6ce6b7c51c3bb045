/// Video handlers: presigned upload flow, metadata reads, tagging
use std::time::Duration;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{category_repo, tag_repo, video_repo};
use crate::error::AppError;
use crate::middleware::UserId;
use crate::models::{
    UploadCompleteRequest, UploadRequestResponse, VideoCreateRequest, VideoEntity, VideoResponse,
    VideoStatus,
};
use crate::services::video_jobs::TranscodeJob;

/// Request a presigned URL for direct upload to object storage.
///
/// Creates the video record (status PENDING) first; if presigning fails the
/// record is removed again so no orphan rows accumulate.
#[utoipa::path(
    post,
    path = "/api/v1/videos/upload-request",
    tag = "Videos",
    request_body = VideoCreateRequest,
    responses(
        (status = 201, description = "Upload URL issued", body = UploadRequestResponse),
        (status = 400, description = "File too large or unsupported MIME type")
    )
)]
pub async fn upload_request(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<VideoCreateRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let upload_cfg = &state.config.upload;
    if payload.file_size > upload_cfg.max_file_size_bytes {
        return Err(AppError::BadRequest(format!(
            "File size exceeds the {} byte limit",
            upload_cfg.max_file_size_bytes
        )));
    }
    if !upload_cfg
        .allowed_mime_types
        .iter()
        .any(|m| m == &payload.mime_type)
    {
        return Err(AppError::BadRequest(format!(
            "Unsupported MIME type: {}. Allowed types are {}",
            payload.mime_type,
            upload_cfg.allowed_mime_types.join(", ")
        )));
    }

    let file_key = build_file_key(
        user_id.0,
        &payload.title,
        &payload.file_name,
        Utc::now().timestamp(),
    );

    let video = video_repo::create_video(
        &state.pool,
        user_id.0,
        &payload.title,
        payload.description.as_deref(),
        &file_key,
        payload.file_size,
        &payload.mime_type,
    )
    .await?;

    let upload_url = match state
        .storage
        .presign_put(
            &file_key,
            &payload.mime_type,
            Duration::from_secs(upload_cfg.presign_expiry_secs),
        )
        .await
    {
        Ok(url) => url,
        Err(e) => {
            // Roll the record back; the client never learned its id.
            if let Err(del) = video_repo::delete_video(&state.pool, video.id).await {
                tracing::error!(
                    "Failed to remove video {} after presign failure: {}",
                    video.id,
                    del
                );
            }
            return Err(e);
        }
    };

    Ok(HttpResponse::Created().json(UploadRequestResponse {
        video_id: video.id,
        upload_url,
        file_key,
    }))
}

/// Confirm that the direct upload finished. Verifies the object actually
/// exists, moves the record to UPLOADED and enqueues the transcode job.
#[utoipa::path(
    post,
    path = "/api/v1/videos/upload-complete",
    tag = "Videos",
    request_body = UploadCompleteRequest,
    responses(
        (status = 200, description = "Upload confirmed, transcoding queued", body = VideoResponse),
        (status = 404, description = "Video not found"),
        (status = 409, description = "Video is not awaiting upload confirmation")
    )
)]
pub async fn upload_complete(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<UploadCompleteRequest>,
) -> Result<HttpResponse, AppError> {
    let video = video_repo::get_video(&state.pool, payload.video_id)
        .await?
        .filter(|v| v.owner_id == user_id.0)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    if !state.storage.object_exists(&video.file_key).await? {
        return Err(AppError::BadRequest(
            "Uploaded object not found in storage".to_string(),
        ));
    }

    let transitioned = video_repo::transition_status(
        &state.pool,
        video.id,
        VideoStatus::Pending,
        VideoStatus::Uploaded,
    )
    .await?;
    if !transitioned {
        return Err(AppError::Conflict(
            "Video is not awaiting upload confirmation".to_string(),
        ));
    }

    state
        .jobs
        .send(TranscodeJob { video_id: video.id })
        .await
        .map_err(|_| AppError::Internal("Transcode queue is closed".to_string()))?;

    let video = video_repo::get_video(&state.pool, video.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    let response = video_response(&state, video).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// List the authenticated user's videos.
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "Videos",
    responses((status = 200, description = "Videos owned by the caller", body = [VideoResponse]))
)]
pub async fn list_videos(
    state: web::Data<AppState>,
    user_id: UserId,
) -> Result<HttpResponse, AppError> {
    let videos = video_repo::list_videos_by_owner(&state.pool, user_id.0).await?;

    let mut responses = Vec::with_capacity(videos.len());
    for video in videos {
        responses.push(video_response(&state, video).await?);
    }

    Ok(HttpResponse::Ok().json(responses))
}

/// Get details of a specific video.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{video_id}",
    tag = "Videos",
    params(("video_id" = i64, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video details", body = VideoResponse),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let video = fetch_video(&state, path.into_inner()).await?;
    let response = video_response(&state, video).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Attach a tag to a video. Idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/videos/{video_id}/tags/{tag_id}",
    tag = "Videos",
    params(
        ("video_id" = i64, Path, description = "Video id"),
        ("tag_id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Video with updated tags", body = VideoResponse),
        (status = 404, description = "Video or tag not found")
    )
)]
pub async fn add_tag(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (video_id, tag_id) = path.into_inner();
    let video = fetch_video(&state, video_id).await?;

    tag_repo::get_tag(&state.pool, tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    video_repo::add_tag(&state.pool, video.id, tag_id).await?;

    let response = video_response(&state, video).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Detach a tag from a video. Idempotent.
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}/tags/{tag_id}",
    tag = "Videos",
    params(
        ("video_id" = i64, Path, description = "Video id"),
        ("tag_id" = i64, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Video with updated tags", body = VideoResponse),
        (status = 404, description = "Video or tag not found")
    )
)]
pub async fn remove_tag(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (video_id, tag_id) = path.into_inner();
    let video = fetch_video(&state, video_id).await?;

    tag_repo::get_tag(&state.pool, tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    video_repo::remove_tag(&state.pool, video.id, tag_id).await?;

    let response = video_response(&state, video).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Attach a category to a video. Idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/videos/{video_id}/categories/{category_id}",
    tag = "Videos",
    params(
        ("video_id" = i64, Path, description = "Video id"),
        ("category_id" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Video with updated categories", body = VideoResponse),
        (status = 404, description = "Video or category not found")
    )
)]
pub async fn add_category(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (video_id, category_id) = path.into_inner();
    let video = fetch_video(&state, video_id).await?;

    category_repo::get_category(&state.pool, category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    video_repo::add_category(&state.pool, video.id, category_id).await?;

    let response = video_response(&state, video).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Detach a category from a video. Idempotent.
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}/categories/{category_id}",
    tag = "Videos",
    params(
        ("video_id" = i64, Path, description = "Video id"),
        ("category_id" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Video with updated categories", body = VideoResponse),
        (status = 404, description = "Video or category not found")
    )
)]
pub async fn remove_category(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (video_id, category_id) = path.into_inner();
    let video = fetch_video(&state, video_id).await?;

    category_repo::get_category(&state.pool, category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    video_repo::remove_category(&state.pool, video.id, category_id).await?;

    let response = video_response(&state, video).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn fetch_video(state: &AppState, video_id: i64) -> Result<VideoEntity, AppError> {
    video_repo::get_video(&state.pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

async fn video_response(state: &AppState, video: VideoEntity) -> Result<VideoResponse, AppError> {
    let tags = video_repo::tags_for_video(&state.pool, video.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let categories = video_repo::categories_for_video(&state.pool, video.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(VideoResponse::from_entity(video, tags, categories))
}

/// Storage key for a fresh upload: `<owner>/<title>_<timestamp>.<ext>`,
/// with whitespace flattened so keys stay URL-friendly.
fn build_file_key(owner_id: i64, title: &str, file_name: &str, timestamp: i64) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("bin");
    let sanitized: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}/{}_{}.{}", owner_id, sanitized, timestamp, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_key_flattens_whitespace_and_keeps_extension() {
        let key = build_file_key(7, "My Holiday Movie", "clip.final.mp4", 1_700_000_000);
        assert_eq!(key, "7/My_Holiday_Movie_1700000000.mp4");
    }

    #[test]
    fn file_key_without_extension_gets_fallback() {
        let key = build_file_key(7, "raw", "dump", 123);
        assert_eq!(key, "7/raw_123.bin");
    }
}
