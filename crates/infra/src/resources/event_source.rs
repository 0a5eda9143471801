use serde::Serialize;

use super::Construct;
use crate::{template::Resource, Expr, InfraError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartingPosition {
    /// Only records added after the mapping is created.
    Latest,
    TrimHorizon,
}

/// Failure handling for the stream binding. Every field unset leaves the
/// platform defaults: retry until the records expire, no dead-letter target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `-1` retries until the record expires.
    pub maximum_retry_attempts: Option<i32>,
    pub bisect_batch_on_function_error: Option<bool>,
    /// SQS queue or SNS topic ARN receiving metadata of discarded batches.
    pub on_failure_destination: Option<String>,
}

/// Polls the stream and invokes the function with batches.
#[derive(Clone, Debug)]
pub struct EventBinding {
    pub logical_id: String,
    pub function_name: Expr,
    pub stream_arn: Expr,
    pub batch_size: u32,
    pub starting_position: StartingPosition,
    pub retry: RetryPolicy,
    /// Resources deleted only after the binding stops polling.
    pub depends_on: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct OnFailure {
    destination: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DestinationConfig {
    on_failure: OnFailure,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MappingProperties {
    function_name: Expr,
    event_source_arn: Expr,
    batch_size: u32,
    starting_position: StartingPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_retry_attempts: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bisect_batch_on_function_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_config: Option<DestinationConfig>,
}

impl Construct for EventBinding {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn resource(&self) -> Result<Resource, InfraError> {
        let properties = MappingProperties {
            function_name: self.function_name.clone(),
            event_source_arn: self.stream_arn.clone(),
            batch_size: self.batch_size,
            starting_position: self.starting_position,
            maximum_retry_attempts: self.retry.maximum_retry_attempts,
            bisect_batch_on_function_error: self.retry.bisect_batch_on_function_error,
            destination_config: self.retry.on_failure_destination.as_ref().map(|arn| {
                DestinationConfig {
                    on_failure: OnFailure {
                        destination: arn.clone(),
                    },
                }
            }),
        };

        let resource = Resource::new("AWS::Lambda::EventSourceMapping", &properties)?;
        Ok(self
            .depends_on
            .iter()
            .fold(resource, |resource, id| resource.depends_on(id.clone())))
    }
}
