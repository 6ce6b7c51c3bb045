/// Background job queue for asynchronous video transcoding
///
/// Jobs are submitted to a bounded channel and drained by worker tasks that
/// drive one video at a time through the pipeline: download the original,
/// encode every rendition in a single ffmpeg invocation, publish the HLS
/// output to object storage and persist the terminal status.
///
/// Failure handling: every stage error is converted into a persisted FAILED
/// status at the job boundary; nothing is re-raised to the dispatcher.
/// Scratch directories are `TempDir`s owned by the pipeline scope, so their
/// removal does not depend on which stage failed.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::db::video_repo;
use crate::error::{AppError, Result};
use crate::models::VideoStatus;
use crate::services::storage::ObjectStorage;
use crate::services::transcoder::{Rendition, VideoEncoder};

/// Transcode request delivered to a worker. Delivery is at-least-once;
/// the pipeline tolerates duplicates by redoing all work from scratch.
#[derive(Debug, Clone, Copy)]
pub struct TranscodeJob {
    pub video_id: i64,
}

pub type JobSender = mpsc::Sender<TranscodeJob>;
pub type JobReceiver = mpsc::Receiver<TranscodeJob>;

/// Create a bounded job queue. The sender side lives in the HTTP state and
/// can be cloned freely.
pub fn create_job_queue(capacity: usize) -> (JobSender, JobReceiver) {
    mpsc::channel(capacity)
}

/// Everything a worker needs to run jobs. Collaborators are injected
/// explicitly so tests can swap in fakes.
pub struct TranscodeContext {
    pub pool: PgPool,
    pub storage: Arc<dyn ObjectStorage>,
    pub encoder: Arc<dyn VideoEncoder>,
    pub renditions: Vec<Rendition>,
}

/// Spawn `count` worker tasks draining the shared queue. Each worker
/// processes one job at a time; distinct videos transcode concurrently on
/// distinct workers.
pub fn spawn_workers(
    ctx: Arc<TranscodeContext>,
    receiver: JobReceiver,
    count: usize,
) -> Vec<tokio::task::JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));

    (0..count)
        .map(|worker| {
            let ctx = ctx.clone();
            let receiver = receiver.clone();
            tokio::spawn(async move {
                info!("Transcode worker {} started", worker);
                loop {
                    let job = { receiver.lock().await.recv().await };
                    let Some(job) = job else {
                        break;
                    };

                    info!(
                        "Worker {} processing transcode job for video {}",
                        worker, job.video_id
                    );
                    if let Err(e) = process_transcode_job(&ctx, job.video_id).await {
                        // Only bookkeeping failures surface here; pipeline
                        // failures are already persisted as FAILED.
                        error!(
                            "Transcode job for video {} could not be recorded: {}",
                            job.video_id, e
                        );
                    }
                }
                info!("Transcode worker {} stopped (queue closed)", worker);
            })
        })
        .collect()
}

/// Drive one video from UPLOADED to a terminal state.
///
/// A missing record is a reportable anomaly, not an error: the job logs and
/// returns without touching any state. Otherwise PROCESSING is persisted
/// before any I/O so the in-flight state is externally observable, and the
/// job always ends by persisting exactly one terminal status.
pub async fn process_transcode_job(ctx: &TranscodeContext, video_id: i64) -> Result<()> {
    let Some(video) = video_repo::get_video(&ctx.pool, video_id).await? else {
        warn!("Transcode job for unknown video {}, skipping", video_id);
        return Ok(());
    };

    video_repo::set_status(&ctx.pool, video_id, VideoStatus::Processing).await?;

    match run_pipeline(ctx, video_id, &video.file_key).await {
        Ok(hls_url) => {
            video_repo::mark_processed(&ctx.pool, video_id, &hls_url).await?;
            info!("Video {} processed, manifest at {}", video_id, hls_url);
        }
        Err(e) => {
            error!("Transcoding video {} failed: {}", video_id, e);
            video_repo::mark_failed(&ctx.pool, video_id).await?;
        }
    }

    Ok(())
}

/// Stages 1-4 of the pipeline. Returns the public manifest URL on success.
/// Both scratch directories are removed when this function returns, on
/// every path.
async fn run_pipeline(ctx: &TranscodeContext, video_id: i64, file_key: &str) -> Result<String> {
    // Stage 1: acquire the source into a fresh scratch directory.
    let source_dir = scratch_dir(video_id, "src")?;
    let file_name = file_key
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("source");
    let source_path = source_dir.path().join(file_name);
    ctx.storage.download(file_key, &source_path).await?;

    // Stages 2+3: encode the full rendition ladder in one invocation.
    let output_dir = scratch_dir(video_id, "hls")?;
    ctx.encoder
        .encode(&source_path, output_dir.path(), &ctx.renditions)
        .await?;

    // Stage 4: publish, preserving relative paths so manifest references
    // stay resolvable. The first failed upload aborts the rest; objects
    // already uploaded stay in place and are overwritten on retry.
    let prefix = format!("hls/{}", video_id);
    for (path, rel) in collect_output_files(output_dir.path())? {
        let key = format!("{}/{}", prefix, rel);
        ctx.storage
            .upload(&path, &key, content_type_for_key(&key))
            .await?;
    }

    Ok(ctx.storage.public_url(&format!("{}/master.m3u8", prefix)))
}

fn scratch_dir(video_id: i64, stage: &str) -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("videoflow_{}_{}_", stage, video_id))
        .tempdir()
        .map_err(|e| AppError::Internal(format!("Failed to create scratch dir: {}", e)))
}

/// Walk `root` recursively, returning absolute paths paired with their
/// `/`-separated relative key paths, in a stable order.
fn collect_output_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .map_err(|e| AppError::Internal(format!("Bad output path: {}", e)))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, rel));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn content_type_for_key(key: &str) -> Option<&'static str> {
    if key.ends_with(".m3u8") {
        Some("application/vnd.apple.mpegurl")
    } else if key.ends_with(".ts") {
        Some("video/mp2t")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_for_hls_artifacts() {
        assert_eq!(
            content_type_for_key("hls/1/master.m3u8"),
            Some("application/vnd.apple.mpegurl")
        );
        assert_eq!(content_type_for_key("hls/1/360p_000.ts"), Some("video/mp2t"));
        assert_eq!(content_type_for_key("hls/1/preview.jpg"), None);
    }

    #[test]
    fn collect_output_files_preserves_relative_structure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("master.m3u8"), "#EXTM3U").unwrap();
        std::fs::create_dir(dir.path().join("segments")).unwrap();
        std::fs::write(dir.path().join("segments/360p_000.ts"), b"x").unwrap();

        let files = collect_output_files(dir.path()).unwrap();
        let rels: Vec<&str> = files.iter().map(|(_, r)| r.as_str()).collect();
        assert_eq!(rels, vec!["master.m3u8", "segments/360p_000.ts"]);
    }

    #[test]
    fn job_queue_delivers_in_fifo_order() {
        let (sender, mut receiver) = create_job_queue(10);

        tokio_test::block_on(async {
            sender.send(TranscodeJob { video_id: 1 }).await.unwrap();
            sender.send(TranscodeJob { video_id: 2 }).await.unwrap();

            assert_eq!(receiver.recv().await.unwrap().video_id, 1);
            assert_eq!(receiver.recv().await.unwrap().video_id, 2);
        });
    }

    #[test]
    fn job_queue_closes_when_senders_drop() {
        let (sender, mut receiver) = create_job_queue(10);
        drop(sender);

        tokio_test::block_on(async {
            assert!(receiver.recv().await.is_none());
        });
    }
}
