use async_trait::async_trait;
use aws_sdk_s3::{
    error::ProvideErrorMetadata,
    types::{Delete, ObjectIdentifier},
};
use derive_new::new;
use lambda_runtime::Error;

#[cfg(test)]
use mockall::automock;

pub(crate) const AUTO_DELETE_TAG: &str = "aws-cdk:auto-delete-objects";

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait BucketPurger: Send + Sync {
    /// Whether the bucket exists and still carries the auto-delete tag.
    async fn auto_delete_enabled(&self, bucket: &str) -> Result<bool, Error>;

    /// Deletes every object, returning how many were removed.
    async fn empty_bucket(&self, bucket: &str) -> Result<usize, Error>;
}

#[derive(Clone, Debug, new)]
pub(crate) struct S3BucketPurger {
    s3_client: aws_sdk_s3::Client,
}

#[async_trait]
impl BucketPurger for S3BucketPurger {
    async fn auto_delete_enabled(&self, bucket: &str) -> Result<bool, Error> {
        let result = self.s3_client.get_bucket_tagging().bucket(bucket).send().await;

        match result {
            Ok(output) => Ok(output
                .tag_set()
                .iter()
                .any(|tag| tag.key() == AUTO_DELETE_TAG && tag.value() == "true")),
            Err(e) => {
                let missing = matches!(
                    e.as_service_error().and_then(|se| se.code()),
                    Some("NoSuchBucket") | Some("NoSuchTagSet")
                );
                if missing {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<usize, Error> {
        let mut deleted = 0;
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .s3_client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await?;

            let objects = page
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()?;

            if !objects.is_empty() {
                let count = objects.len();
                let delete = Delete::builder()
                    .set_objects(Some(objects))
                    .quiet(true)
                    .build()?;

                let output = self
                    .s3_client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await?;

                if let Some(failure) = output.errors().first() {
                    return Err(format!(
                        "Failed to delete {}: {}",
                        failure.key().unwrap_or_default(),
                        failure.message().unwrap_or_default()
                    )
                    .into());
                }

                deleted += count;
                tracing::info!("Deleted {} objects from {}", count, bucket);
            }

            match page.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(deleted)
    }
}
