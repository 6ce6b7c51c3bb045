/// Recovery for jobs lost to worker death
///
/// A crash mid-job leaves the video stuck in PROCESSING with nobody coming
/// back for it. The sweeper periodically demotes PROCESSING rows older than
/// the configured maximum processing age to FAILED; re-running those videos
/// is an explicit retry.
use sqlx::PgPool;
use tracing::{error, warn};

use crate::db::video_repo;

/// Spawn the periodic sweep task.
pub fn spawn_stale_job_sweeper(
    pool: PgPool,
    stale_after_seconds: i64,
    sweep_interval_seconds: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval_seconds));
        // The first tick fires immediately; skip it so a restart does not
        // sweep before workers have had a chance to resume.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match video_repo::fail_stale_processing(&pool, stale_after_seconds).await {
                Ok(0) => {}
                Ok(n) => warn!(
                    "Demoted {} video(s) stuck in processing for over {}s to failed",
                    n, stale_after_seconds
                ),
                Err(e) => error!("Stale job sweep failed: {}", e),
            }
        }
    })
}
