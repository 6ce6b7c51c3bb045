/// Shared application state injected into handlers
///
/// Collaborators (storage, job queue, signing keys) are constructed once in
/// `main` and passed in explicitly.
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::security::jwt::JwtKeys;
use crate::services::storage::ObjectStorage;
use crate::services::video_jobs::JobSender;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub storage: Arc<dyn ObjectStorage>,
    pub jobs: JobSender,
    pub jwt_keys: Arc<JwtKeys>,
}
