//! S3 writes behind a trait so uploads can be checked without a bucket.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
#[cfg(test)]
use mockall::automock;

/// An object to store, with its base64 SHA-256 for S3 to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
    pub checksum_sha256: String,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `object`, returning the new version id when the bucket is versioned.
    async fn put(&self, object: PutObject) -> Result<Option<String>>;
}

/// [`ObjectStore`] backed by the S3 API.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, object: PutObject) -> Result<Option<String>> {
        let out = self
            .client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_type(object.content_type)
            .checksum_sha256(object.checksum_sha256)
            .body(ByteStream::from(object.body))
            .send()
            .await
            .with_context(|| {
                format!("failed to upload s3://{}/{}", object.bucket, object.key)
            })?;
        Ok(out.version_id().map(str::to_owned))
    }
}
