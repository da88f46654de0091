use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::PlatformError;

/// A stored file as returned by `upload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FsItem {
    pub path: String,
    pub name: String,
    pub size: u64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `bytes` under `dir` with a fresh unique path.
    async fn upload(
        &self,
        dir: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<FsItem, PlatformError>;

    async fn read(&self, path: &str) -> Result<Bytes, PlatformError>;

    async fn delete(&self, path: &str) -> Result<(), PlatformError>;
}

/// `<dir>/<uuid>-<name>`, with anything outside `[A-Za-z0-9._-]` replaced.
pub fn unique_path(dir: &str, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "file".to_string() } else { safe };
    format!("{}/{}-{}", dir.trim_end_matches('/'), Uuid::new_v4().simple(), safe)
}

/// S3 / MinIO backed file store.
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn upload(
        &self,
        dir: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<FsItem, PlatformError> {
        let path = unique_path(dir, file_name);
        let size = bytes.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| PlatformError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, path);

        Ok(FsItem {
            path,
            name: file_name.to_string(),
            size,
        })
    }

    async fn read(&self, path: &str) -> Result<Bytes, PlatformError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    PlatformError::NotFound(path.to_string())
                } else {
                    PlatformError::Storage(format!("S3 read failed: {e}"))
                }
            })?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| PlatformError::Storage(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, path: &str) -> Result<(), PlatformError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| PlatformError::Storage(format!("S3 delete failed: {e}")))?;
        info!("Deleted s3://{}/{}", self.bucket, path);
        Ok(())
    }
}
