//! Integration tests: transcode pipeline state machine
//!
//! Runs the job against a real Postgres (testcontainers) with in-memory
//! storage and scripted encoders. Covers the terminal-state guarantees,
//! the hls_url invariant, scratch-directory cleanup on every failure
//! branch, duplicate delivery and the end-to-end success scenario.

mod common;

use std::sync::Arc;

use common::{
    fetch_status_and_url, insert_user, insert_video, leftover_scratch_dirs, setup_test_db,
    FailingEncoder, FakeEncoder, FakeStorage,
};
use videoflow::models::VideoStatus;
use videoflow::services::transcoder::Rendition;
use videoflow::services::video_jobs::{process_transcode_job, TranscodeContext};

fn context(pool: sqlx::PgPool, storage: Arc<FakeStorage>) -> TranscodeContext {
    TranscodeContext {
        pool,
        storage,
        encoder: Arc::new(FakeEncoder),
        renditions: Rendition::default_ladder(),
    }
}

#[tokio::test]
async fn uploaded_video_ends_processed_with_manifest() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 42, owner, "7/movie.mp4", VideoStatus::Uploaded).await;

    let storage = Arc::new(FakeStorage::new());
    storage.seed("7/movie.mp4", b"not really an mp4");

    let ctx = context(pool.clone(), storage.clone());
    process_transcode_job(&ctx, video_id).await.expect("job");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Processed);
    assert_eq!(
        hls_url.as_deref(),
        Some("http://minio.test:9000/videoflow/hls/42/master.m3u8")
    );

    let published = storage.keys_with_prefix("hls/42/");
    assert!(published.contains(&"hls/42/master.m3u8".to_string()));
    assert!(published.contains(&"hls/42/stream_360p.m3u8".to_string()));
    assert!(published.contains(&"hls/42/stream_720p.m3u8".to_string()));
    assert!(published.contains(&"hls/42/360p_000.ts".to_string()));
    assert!(published.contains(&"hls/42/720p_000.ts".to_string()));

    assert!(leftover_scratch_dirs(video_id).is_empty());
}

#[tokio::test]
async fn missing_source_ends_failed_without_partial_output() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 43, owner, "7/gone.mp4", VideoStatus::Uploaded).await;

    // Nothing seeded: the source object does not exist.
    let storage = Arc::new(FakeStorage::new());

    let ctx = context(pool.clone(), storage.clone());
    process_transcode_job(&ctx, video_id).await.expect("job");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Failed);
    assert_eq!(hls_url, None);
    assert!(storage.keys_with_prefix("hls/").is_empty());
    assert!(leftover_scratch_dirs(video_id).is_empty());
}

#[tokio::test]
async fn encoder_failure_ends_failed_and_cleans_scratch() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 44, owner, "7/movie.mp4", VideoStatus::Uploaded).await;

    let storage = Arc::new(FakeStorage::new());
    storage.seed("7/movie.mp4", b"bytes");

    let ctx = TranscodeContext {
        pool: pool.clone(),
        storage: storage.clone(),
        encoder: Arc::new(FailingEncoder),
        renditions: Rendition::default_ladder(),
    };
    process_transcode_job(&ctx, video_id).await.expect("job");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Failed);
    assert_eq!(hls_url, None);
    assert!(storage.keys_with_prefix("hls/").is_empty());
    assert!(leftover_scratch_dirs(video_id).is_empty());
}

#[tokio::test]
async fn upload_failure_ends_failed_and_cleans_scratch() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 45, owner, "7/movie.mp4", VideoStatus::Uploaded).await;

    let storage = Arc::new(FakeStorage::failing_uploads());
    storage.seed("7/movie.mp4", b"bytes");

    let ctx = context(pool.clone(), storage.clone());
    process_transcode_job(&ctx, video_id).await.expect("job");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Failed);
    assert_eq!(hls_url, None);
    assert!(leftover_scratch_dirs(video_id).is_empty());
}

#[tokio::test]
async fn duplicate_delivery_is_safe_to_retry() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 46, owner, "7/movie.mp4", VideoStatus::Uploaded).await;

    let storage = Arc::new(FakeStorage::new());
    storage.seed("7/movie.mp4", b"bytes");

    let ctx = context(pool.clone(), storage.clone());
    process_transcode_job(&ctx, video_id).await.expect("first run");
    process_transcode_job(&ctx, video_id).await.expect("second run");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Processed);
    assert!(hls_url.is_some());
    assert!(leftover_scratch_dirs(video_id).is_empty());
}

#[tokio::test]
async fn failed_video_can_be_retried_explicitly() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 47, owner, "7/movie.mp4", VideoStatus::Uploaded).await;

    let storage = Arc::new(FakeStorage::new());
    storage.seed("7/movie.mp4", b"bytes");

    let failing = TranscodeContext {
        pool: pool.clone(),
        storage: storage.clone(),
        encoder: Arc::new(FailingEncoder),
        renditions: Rendition::default_ladder(),
    };
    process_transcode_job(&failing, video_id).await.expect("failing run");
    let (status, _) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Failed);

    // Explicit retry with a healthy encoder overwrites the failure.
    let healthy = context(pool.clone(), storage.clone());
    process_transcode_job(&healthy, video_id).await.expect("retry");

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Processed);
    assert!(hls_url.is_some());
}

#[tokio::test]
async fn unknown_video_is_a_silent_noop() {
    let pool = setup_test_db().await.expect("test database");

    let storage = Arc::new(FakeStorage::new());
    let ctx = context(pool.clone(), storage.clone());

    process_transcode_job(&ctx, 99_999).await.expect("no-op job");
    assert!(storage.keys_with_prefix("hls/").is_empty());
}

#[tokio::test]
async fn stale_processing_rows_are_demoted_to_failed() {
    let pool = setup_test_db().await.expect("test database");
    let owner = insert_user(&pool).await;
    let video_id = insert_video(&pool, 48, owner, "7/stuck.mp4", VideoStatus::Processing).await;

    // Backdate the row past the processing deadline.
    sqlx::query(r#"UPDATE videos SET updated_at = NOW() - INTERVAL '2 hours' WHERE id = $1"#)
        .bind(video_id)
        .execute(&pool)
        .await
        .expect("backdate");

    let demoted = videoflow::db::video_repo::fail_stale_processing(&pool, 3600)
        .await
        .expect("sweep");
    assert_eq!(demoted, 1);

    let (status, hls_url) = fetch_status_and_url(&pool, video_id).await;
    assert_eq!(status, VideoStatus::Failed);
    assert_eq!(hls_url, None);

    // Fresh PROCESSING rows are left alone.
    let video_id2 = insert_video(&pool, 49, owner, "7/active.mp4", VideoStatus::Processing).await;
    let demoted = videoflow::db::video_repo::fail_stale_processing(&pool, 3600)
        .await
        .expect("sweep");
    assert_eq!(demoted, 0);
    let (status, _) = fetch_status_and_url(&pool, video_id2).await;
    assert_eq!(status, VideoStatus::Processing);
}
