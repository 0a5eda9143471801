use derive_new::new;
use lambda_runtime::{Error, LambdaEvent};

use crate::{
    purger::BucketPurger,
    request::{CustomResourceRequest, CustomResourceResponse, RequestType, ResponseStatus},
    responder::Responder,
};

#[derive(new)]
pub(crate) struct HandlerDeps<P: BucketPurger, R: Responder> {
    pub purger: P,
    pub responder: R,
}

/// Empties the traffic bucket before CloudFormation deletes it.
///
/// The outcome is always reported to `ResponseURL`; an error is returned only
/// when that report itself cannot be sent.
pub(crate) async fn handle<P: BucketPurger, R: Responder>(
    deps: &HandlerDeps<P, R>,
    event: LambdaEvent<CustomResourceRequest>,
) -> Result<(), Error> {
    let request = event.payload;
    tracing::info!(
        "{:?} request for {}",
        request.request_type,
        request.resource_properties.bucket_name
    );

    let response = match apply(&deps.purger, &request).await {
        Ok(()) => CustomResourceResponse::for_request(&request, ResponseStatus::Success, None),
        Err(e) => {
            tracing::error!("Failed to empty bucket: {}", e);
            CustomResourceResponse::for_request(
                &request,
                ResponseStatus::Failed,
                Some(e.to_string()),
            )
        }
    };

    deps.responder
        .respond(&request.response_url, &response)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send response: {}", e);
            e
        })
}

async fn apply<P: BucketPurger>(purger: &P, request: &CustomResourceRequest) -> Result<(), Error> {
    match request.request_type {
        RequestType::Create => Ok(()),
        // A renamed bucket means the old one is replaced and deleted later.
        RequestType::Update => match &request.old_resource_properties {
            Some(old) if old.bucket_name != request.resource_properties.bucket_name => {
                purge(purger, &old.bucket_name).await
            }
            _ => Ok(()),
        },
        RequestType::Delete => purge(purger, &request.resource_properties.bucket_name).await,
    }
}

async fn purge<P: BucketPurger>(purger: &P, bucket: &str) -> Result<(), Error> {
    if !purger.auto_delete_enabled(bucket).await? {
        tracing::info!("Bucket {} is gone or not tagged for auto delete", bucket);
        return Ok(());
    }

    let deleted = purger.empty_bucket(bucket).await?;
    tracing::info!("Emptied bucket {} ({} objects)", bucket, deleted);
    Ok(())
}
