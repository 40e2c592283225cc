use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{future, stream};
use rusoto_core::ByteStream;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3Client, S3};
use tokio::io::AsyncRead;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::path::RemotePath;

pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, path: &RemotePath) -> Result<ObjectReader>;

    async fn put(&self, path: &RemotePath, body: Bytes) -> Result<()>;
}

/// S3 store that only builds its client on the first request, so local
/// copies never touch credentials.
pub struct S3Store {
    config: ClientConfig,
    client: OnceCell<S3Client>,
}

impl S3Store {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&S3Client> {
        self.client
            .get_or_try_init(|| async { self.config.s3_client() })
            .await
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, path: &RemotePath) -> Result<ObjectReader> {
        debug!(bucket = %path.bucket, key = %path.key, "get object");
        let request = GetObjectRequest {
            bucket: path.bucket.to_owned(),
            key: path.key.to_owned(),
            ..Default::default()
        };

        let output = self
            .client()
            .await?
            .get_object(request)
            .await
            .map_err(|e| Error::remote(format!("get {}", path), e))?;

        let body = output
            .body
            .ok_or_else(|| Error::remote(format!("get {}", path), "response has no body"))?;

        Ok(Box::new(body.into_async_read()))
    }

    async fn put(&self, path: &RemotePath, body: Bytes) -> Result<()> {
        let size = body.len();
        debug!(bucket = %path.bucket, key = %path.key, size, "put object");

        let body = ByteStream::new_with_size(
            stream::once(future::ready(Ok::<_, std::io::Error>(body))),
            size,
        );
        let request = PutObjectRequest {
            bucket: path.bucket.to_owned(),
            key: path.key.to_owned(),
            content_length: Some(size as i64),
            body: Some(body),
            ..Default::default()
        };

        self.client()
            .await?
            .put_object(request)
            .await
            .map_err(|e| Error::remote(format!("put {}", path), e))?;

        Ok(())
    }
}
