/// Object storage access for video files
///
/// The [`ObjectStorage`] trait is the seam between the application and the
/// store: handlers and the transcode worker receive a handle rather than
/// building clients themselves, and tests substitute an in-memory fake.
/// The production implementation targets S3-compatible storage (AWS or
/// MinIO via endpoint override).
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::S3Config;
use crate::error::{AppError, Result};

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create the backing bucket if it does not exist yet.
    async fn ensure_bucket(&self) -> Result<()>;

    /// Generate a presigned URL for uploading an object via HTTP PUT.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String>;

    /// Check whether an object exists without downloading it.
    async fn object_exists(&self, key: &str) -> Result<bool>;

    /// Download an object to a local file.
    async fn download(&self, key: &str, dest: &Path) -> Result<()>;

    /// Upload a local file under the given key.
    async fn upload(&self, src: &Path, key: &str, content_type: Option<&str>) -> Result<()>;

    /// Public URL under which an object is reachable.
    fn public_url(&self, key: &str) -> String;
}

/// S3-backed implementation of [`ObjectStorage`].
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    /// Build an S3 client from the provided configuration.
    pub async fn new(config: &S3Config) -> Result<Self> {
        let mut shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        // Explicit credentials if provided, default chain otherwise.
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "videoflow",
            );
            shared = shared.credentials_provider(credentials);
        }

        let shared_config = shared.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            if !endpoint.trim().is_empty() {
                // Path-style addressing keeps object URLs in the
                // <endpoint>/<bucket>/<key> shape MinIO serves.
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }
        }

        let public_base = match &config.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => format!(
                "{}/{}",
                endpoint.trim_end_matches('/'),
                config.bucket
            ),
            _ => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            ),
        };

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base,
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn ensure_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("404") || msg.contains("NotFound") {
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!(
                                "Failed to create bucket {}: {}",
                                self.bucket, e
                            ))
                        })?;
                    tracing::info!("Created storage bucket {}", self.bucket);
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Bucket {} not reachable: {}",
                        self.bucket, e
                    )))
                }
            }
        }
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presign_cfg = PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create presign config: {e}")))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_cfg)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn object_exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("404") || msg.contains("NotFound") {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check object {}: {}",
                        key, e
                    )))
                }
            }
        }
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download {}: {}", key, e)))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read body of {}: {}", key, e)))?;

        tokio::fs::write(dest, body.into_bytes())
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", dest.display(), e)))?;

        Ok(())
    }

    async fn upload(&self, src: &Path, key: &str, content_type: Option<&str>) -> Result<()> {
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", src.display(), e)))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("NoSuchBucket") {
                AppError::Storage(format!("Bucket not found: {}", self.bucket))
            } else {
                AppError::Storage(format!("Failed to upload {}: {}", key, e))
            }
        })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_endpoint(endpoint: Option<&str>) -> S3Config {
        S3Config {
            bucket: "videoflow".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: Some("minio".to_string()),
            secret_access_key: Some("minio123".to_string()),
            endpoint: endpoint.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn public_url_uses_endpoint_when_configured() {
        let storage = S3Storage::new(&config_with_endpoint(Some("http://minio:9000")))
            .await
            .unwrap();
        assert_eq!(
            storage.public_url("hls/42/master.m3u8"),
            "http://minio:9000/videoflow/hls/42/master.m3u8"
        );
    }

    #[tokio::test]
    async fn public_url_falls_back_to_aws_shape() {
        let storage = S3Storage::new(&config_with_endpoint(None)).await.unwrap();
        assert_eq!(
            storage.public_url("hls/42/master.m3u8"),
            "https://videoflow.s3.us-east-1.amazonaws.com/hls/42/master.m3u8"
        );
    }
}
