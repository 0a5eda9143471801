use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use derive_new::new;

use crate::{Error, LogKey};

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// Destination of assembled log bodies.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Stores `body` at `key`, replacing whatever was there.
    async fn put_log(&self, key: &LogKey, body: String) -> Result<(), Error>;
}

#[derive(Clone, Debug, new)]
pub struct S3LogStore {
    s3_client: aws_sdk_s3::Client,
    bucket: String,
}

#[async_trait]
impl LogStore for S3LogStore {
    async fn put_log(&self, key: &LogKey, body: String) -> Result<(), Error> {
        tracing::info!("Writing {} bytes to s3://{}/{}", body.len(), self.bucket, key);

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(body.into_bytes()))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| Error::Write {
                key: key.to_string(),
                source: Box::new(e),
            })
    }
}
