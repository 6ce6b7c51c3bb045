/// Configuration management for the VideoFlow backend
///
/// Loads configuration from environment variables with sensible defaults.
use anyhow::Context;

use crate::services::transcoder::Rendition;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub s3: S3Config,
    pub upload: UploadConfig,
    pub transcoding: TranscodingConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// S3-compatible endpoint override (MinIO and friends). Also the base of
    /// public object URLs when set.
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size_bytes: i64,
    pub allowed_mime_types: Vec<String>,
    pub presign_expiry_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TranscodingConfig {
    pub ffmpeg_path: String,
    /// HLS segment duration target in seconds.
    pub segment_seconds: u32,
    pub job_timeout_seconds: u64,
    pub worker_count: usize,
    pub queue_capacity: usize,
    /// PROCESSING rows older than this are demoted to FAILED by the sweeper.
    pub stale_after_seconds: i64,
    pub sweep_interval_seconds: u64,
    pub renditions: Vec<Rendition>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            app: AppConfig {
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_parse("APP_PORT", 8080),
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/videoflow".to_string()),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
            },
            auth: AuthConfig {
                jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                access_token_expiry_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
            },
            s3: S3Config {
                bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "videoflow".to_string()),
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
            },
            upload: UploadConfig {
                max_file_size_bytes: env_parse("UPLOAD_MAX_FILE_SIZE_BYTES", 2 * 1024 * 1024 * 1024),
                allowed_mime_types: std::env::var("UPLOAD_ALLOWED_MIME_TYPES")
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_else(|_| {
                        vec![
                            "video/mp4".to_string(),
                            "video/webm".to_string(),
                            "video/quicktime".to_string(),
                        ]
                    }),
                presign_expiry_secs: env_parse("UPLOAD_PRESIGN_EXPIRY_SECS", 900),
            },
            transcoding: TranscodingConfig {
                ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
                segment_seconds: env_parse("HLS_SEGMENT_SECONDS", 10),
                job_timeout_seconds: env_parse("TRANSCODE_JOB_TIMEOUT_SECONDS", 3600),
                worker_count: env_parse("TRANSCODE_WORKER_COUNT", 2),
                queue_capacity: env_parse("TRANSCODE_QUEUE_CAPACITY", 100),
                stale_after_seconds: env_parse("TRANSCODE_STALE_AFTER_SECONDS", 7200),
                sweep_interval_seconds: env_parse("TRANSCODE_SWEEP_INTERVAL_SECONDS", 300),
                renditions: match std::env::var("TRANSCODE_RENDITIONS") {
                    Ok(raw) => Rendition::parse_ladder(&raw)?,
                    Err(_) => Rendition::default_ladder(),
                },
            },
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing() {
        assert_eq!(env_parse("DEFINITELY_NOT_SET_12345", 42u32), 42);
    }
}
