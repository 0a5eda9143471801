use aws_lambda_events::kinesis::KinesisEvent;
use derive_new::new;
use lambda_runtime::{Error, LambdaEvent};
use pipeline::{assemble_body, Clock, LogKey, LogStore};
use serde::Serialize;

#[derive(new)]
pub(crate) struct HandlerDeps<S: LogStore, C: Clock> {
    pub store: S,
    pub clock: C,
    pub key_prefix: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, new)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IngestResponse {
    pub status_code: u16,
    pub body: String,
}

impl IngestResponse {
    fn success() -> Result<Self, Error> {
        Ok(IngestResponse::new(200, serde_json::to_string("Success!")?))
    }
}

/// Writes the whole batch as one object under today's key.
///
/// Any failure is returned to the runtime so the batch is redelivered; there
/// are no partial batch responses.
pub(crate) async fn handle<S: LogStore, C: Clock>(
    deps: &HandlerDeps<S, C>,
    event: LambdaEvent<KinesisEvent>,
) -> Result<IngestResponse, Error> {
    let records = event.payload.records;
    tracing::info!("Processing {} Kinesis records", records.len());

    let key = LogKey::with_prefix(&deps.key_prefix, deps.clock.today());

    let body = assemble_body(&records).map_err(|e| {
        tracing::error!("Failed to decode batch: {}", e);
        e
    })?;

    deps.store.put_log(&key, body).await.map_err(|e| {
        tracing::error!("Failed to store batch: {}", e);
        e
    })?;

    tracing::info!("Stored {} records at {}", records.len(), key);

    IngestResponse::success()
}
